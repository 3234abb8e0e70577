//! ELO rating math and rank tiers.
//!
//! ELO deltas are banded by the final overall score and scaled by difficulty,
//! then clamped. Only ranked debates move ELO; the caller enforces that.

use serde::Serialize;

use super::session::Difficulty;

/// Rank tiers: Bronze (0-99), Silver (100-199), Gold (200+).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rank {
    Bronze,
    Silver,
    Gold,
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::Bronze => write!(f, "Bronze"),
            Rank::Silver => write!(f, "Silver"),
            Rank::Gold => write!(f, "Gold"),
        }
    }
}

pub fn rank_for(elo: i64) -> Rank {
    if elo < 100 {
        Rank::Bronze
    } else if elo < 200 {
        Rank::Silver
    } else {
        Rank::Gold
    }
}

/// Progress toward the next rank tier, for display.
#[derive(Debug, Clone, Serialize)]
pub struct RankProgress {
    pub current: i64,
    pub needed: Option<i64>,
    pub percentage: i64,
    pub next_rank: Option<Rank>,
}

pub fn rank_progress(elo: i64) -> RankProgress {
    match rank_for(elo) {
        Rank::Bronze => RankProgress {
            current: elo,
            needed: Some(100),
            percentage: elo.min(100),
            next_rank: Some(Rank::Silver),
        },
        Rank::Silver => RankProgress {
            current: elo - 100,
            needed: Some(100),
            percentage: (elo - 100).min(100),
            next_rank: Some(Rank::Gold),
        },
        Rank::Gold => RankProgress {
            current: elo,
            needed: None,
            percentage: 100,
            next_rank: None,
        },
    }
}

/// A debate is won when the final overall score reaches this threshold.
pub const WIN_THRESHOLD: f64 = 6.0;

/// ELO delta for a finished debate.
///
/// Score bands: below 4 loses points, 4-6 is a minor win, 6-8 a solid win,
/// 8+ a dominant win. The banded base is scaled by the difficulty multiplier
/// and clamped to [-20, 60].
pub fn elo_gain(overall_score: f64, difficulty: Difficulty) -> i64 {
    let multiplier = match difficulty {
        Difficulty::Easy => 1.0,
        Difficulty::Medium => 1.5,
        Difficulty::Hard => 2.0,
    };

    let base = if overall_score < 4.0 {
        // Score 0 maps to -15, score 3.9 to roughly -5.
        (-15.0 + overall_score * 2.5) as i64
    } else if overall_score < 6.0 {
        (5.0 + (overall_score - 4.0) * 2.5) as i64
    } else if overall_score < 8.0 {
        (12.0 + (overall_score - 6.0) * 3.0) as i64
    } else {
        (20.0 + (overall_score - 8.0) * 5.0) as i64
    };

    ((base as f64 * multiplier) as i64).clamp(-20, 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_tiers() {
        assert_eq!(rank_for(0), Rank::Bronze);
        assert_eq!(rank_for(99), Rank::Bronze);
        assert_eq!(rank_for(100), Rank::Silver);
        assert_eq!(rank_for(199), Rank::Silver);
        assert_eq!(rank_for(200), Rank::Gold);
        assert_eq!(rank_for(1000), Rank::Gold);
    }

    #[test]
    fn test_elo_score_bands() {
        // Loss band.
        assert_eq!(elo_gain(0.0, Difficulty::Easy), -15);
        assert!(elo_gain(3.9, Difficulty::Easy) > elo_gain(0.0, Difficulty::Easy));
        assert!(elo_gain(3.9, Difficulty::Easy) < 0);

        // Minor win band.
        assert_eq!(elo_gain(4.0, Difficulty::Easy), 5);
        assert_eq!(elo_gain(6.0, Difficulty::Easy), 12);

        // Dominant win band.
        assert_eq!(elo_gain(8.0, Difficulty::Easy), 20);
        assert_eq!(elo_gain(10.0, Difficulty::Easy), 30);
    }

    #[test]
    fn test_difficulty_multiplier() {
        assert_eq!(elo_gain(8.0, Difficulty::Medium), 30);
        assert_eq!(elo_gain(8.0, Difficulty::Hard), 40);
    }

    #[test]
    fn test_elo_clamped() {
        // 10.0 on hard would be 60 raw; anything above clamps.
        assert_eq!(elo_gain(10.0, Difficulty::Hard), 60);
        // Hard losses scale past -20 before the clamp.
        assert_eq!(elo_gain(0.0, Difficulty::Hard), -20);
    }

    #[test]
    fn test_rank_progress() {
        let progress = rank_progress(40);
        assert_eq!(progress.current, 40);
        assert_eq!(progress.needed, Some(100));
        assert_eq!(progress.next_rank, Some(Rank::Silver));

        let progress = rank_progress(150);
        assert_eq!(progress.current, 50);
        assert_eq!(progress.next_rank, Some(Rank::Gold));

        let progress = rank_progress(250);
        assert_eq!(progress.needed, None);
        assert_eq!(progress.percentage, 100);
        assert!(progress.next_rank.is_none());
    }
}
