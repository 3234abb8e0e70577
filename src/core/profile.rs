//! Player profile: stats, streaks, and ELO, persisted to a JSON flat file.
//!
//! Persistence is best-effort; a failed write is logged and the in-memory
//! profile stays authoritative for the rest of the process lifetime.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::rating::{self, Rank, RankProgress, WIN_THRESHOLD};
use super::session::{Difficulty, GameMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub username: String,
    pub elo: i64,
    pub streak_days: u32,
    pub best_streak: u32,
    pub last_played: Option<NaiveDate>,
    pub total_debates: u32,
    pub wins: u32,
    pub losses: u32,
    pub ranked_played: u32,
    pub hot_takes_played: u32,
    pub podcast_played: u32,
    pub average_score: f64,
}

impl Default for PlayerProfile {
    fn default() -> Self {
        Self {
            username: "Player".to_string(),
            elo: 0,
            streak_days: 0,
            best_streak: 0,
            last_played: None,
            total_debates: 0,
            wins: 0,
            losses: 0,
            ranked_played: 0,
            hot_takes_played: 0,
            podcast_played: 0,
            average_score: 0.0,
        }
    }
}

impl PlayerProfile {
    pub fn rank(&self) -> Rank {
        rating::rank_for(self.elo)
    }

    pub fn win_rate(&self) -> f64 {
        let total = self.wins + self.losses;
        if total == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(total) * 100.0
    }

    pub fn rank_progress(&self) -> RankProgress {
        rating::rank_progress(self.elo)
    }
}

/// Result of recording a finished debate against the profile.
#[derive(Debug, Clone, Serialize)]
pub struct DebateRecord {
    pub won: bool,
    pub elo_change: i64,
    pub new_elo: i64,
    pub new_rank: Rank,
}

/// Profile store backed by a JSON file.
pub struct ProfileStore {
    path: PathBuf,
    profile: Mutex<PlayerProfile>,
}

impl ProfileStore {
    /// Load the profile from `path`, falling back to a fresh default when the
    /// file is missing or unreadable.
    pub fn load(path: PathBuf) -> Self {
        let profile = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(profile) => profile,
                Err(e) => {
                    warn!("Corrupt profile at {:?}, starting fresh: {}", path, e);
                    PlayerProfile::default()
                }
            },
            Err(_) => PlayerProfile::default(),
        };
        Self {
            path,
            profile: Mutex::new(profile),
        }
    }

    pub fn snapshot(&self) -> PlayerProfile {
        self.profile.lock().clone()
    }

    /// Record a completed debate: win/loss, mode counters, average score,
    /// streak, and (for ranked mode only) the ELO delta.
    pub fn record_debate(
        &self,
        mode: GameMode,
        overall_score: f64,
        difficulty: Difficulty,
    ) -> DebateRecord {
        let record = {
            let mut profile = self.profile.lock();
            profile.total_debates += 1;

            let won = overall_score >= WIN_THRESHOLD;
            if won {
                profile.wins += 1;
            } else {
                profile.losses += 1;
            }

            match mode {
                GameMode::Ranked => profile.ranked_played += 1,
                GameMode::HotTakes => profile.hot_takes_played += 1,
                GameMode::Podcast => profile.podcast_played += 1,
            }

            let elo_change = if mode == GameMode::Ranked {
                let change = rating::elo_gain(overall_score, difficulty);
                profile.elo = (profile.elo + change).max(0);
                change
            } else {
                0
            };

            let total = f64::from(profile.total_debates);
            profile.average_score =
                (profile.average_score * (total - 1.0) + overall_score) / total;

            update_streak(&mut profile, Local::now().date_naive());

            info!(
                "Debate recorded: mode={} score={:.1} won={} elo_change={:+} elo={} rank={}",
                mode,
                overall_score,
                won,
                elo_change,
                profile.elo,
                profile.rank()
            );

            DebateRecord {
                won,
                elo_change,
                new_elo: profile.elo,
                new_rank: profile.rank(),
            }
        };

        self.persist();
        record
    }

    fn persist(&self) {
        let json = {
            let profile = self.profile.lock();
            serde_json::to_string_pretty(&*profile)
        };
        match json {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!("Failed to persist profile to {:?}: {}", self.path, e);
                }
            }
            Err(e) => warn!("Failed to serialize profile: {}", e),
        }
    }
}

fn update_streak(profile: &mut PlayerProfile, today: NaiveDate) {
    match profile.last_played {
        Some(last) => {
            let days = (today - last).num_days();
            if days == 0 {
                // Already counted today.
            } else if days == 1 {
                profile.streak_days += 1;
            } else {
                profile.streak_days = 1;
            }
        }
        None => profile.streak_days = 1,
    }
    profile.best_streak = profile.best_streak.max(profile.streak_days);
    profile.last_played = Some(today);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ProfileStore {
        let dir = tempfile::tempdir().unwrap();
        // Keep the directory alive for the duration of the test.
        let path = dir.keep().join("profile.json");
        ProfileStore::load(path)
    }

    #[test]
    fn test_default_profile() {
        let store = store();
        let profile = store.snapshot();
        assert_eq!(profile.elo, 0);
        assert_eq!(profile.rank(), Rank::Bronze);
        assert_eq!(profile.win_rate(), 0.0);
    }

    #[test]
    fn test_ranked_debate_moves_elo() {
        let store = store();
        let record = store.record_debate(GameMode::Ranked, 8.0, Difficulty::Medium);
        assert!(record.won);
        assert_eq!(record.elo_change, 30);
        assert_eq!(record.new_elo, 30);

        let profile = store.snapshot();
        assert_eq!(profile.wins, 1);
        assert_eq!(profile.ranked_played, 1);
        assert_eq!(profile.average_score, 8.0);
    }

    #[test]
    fn test_unranked_modes_leave_elo_alone() {
        let store = store();
        let record = store.record_debate(GameMode::HotTakes, 9.0, Difficulty::Hard);
        assert!(record.won);
        assert_eq!(record.elo_change, 0);
        assert_eq!(record.new_elo, 0);
        assert_eq!(store.snapshot().hot_takes_played, 1);
    }

    #[test]
    fn test_elo_floor_at_zero() {
        let store = store();
        let record = store.record_debate(GameMode::Ranked, 1.0, Difficulty::Easy);
        assert!(!record.won);
        assert!(record.elo_change < 0);
        assert_eq!(record.new_elo, 0);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");

        let store = ProfileStore::load(path.clone());
        store.record_debate(GameMode::Ranked, 7.0, Difficulty::Hard);
        let elo = store.snapshot().elo;
        assert!(elo > 0);

        let reloaded = ProfileStore::load(path);
        assert_eq!(reloaded.snapshot().elo, elo);
        assert_eq!(reloaded.snapshot().total_debates, 1);
    }

    #[test]
    fn test_streak_tracking() {
        let mut profile = PlayerProfile::default();
        let day1 = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap();
        let day9 = NaiveDate::from_ymd_opt(2026, 8, 9).unwrap();

        update_streak(&mut profile, day1);
        assert_eq!(profile.streak_days, 1);

        // Same day does not double count.
        update_streak(&mut profile, day1);
        assert_eq!(profile.streak_days, 1);

        update_streak(&mut profile, day2);
        assert_eq!(profile.streak_days, 2);
        assert_eq!(profile.best_streak, 2);

        // A gap resets the streak but keeps the best.
        update_streak(&mut profile, day9);
        assert_eq!(profile.streak_days, 1);
        assert_eq!(profile.best_streak, 2);
    }

    #[test]
    fn test_average_score_running_mean() {
        let store = store();
        store.record_debate(GameMode::Podcast, 6.0, Difficulty::Easy);
        store.record_debate(GameMode::Podcast, 8.0, Difficulty::Easy);
        assert_eq!(store.snapshot().average_score, 7.0);
    }
}
