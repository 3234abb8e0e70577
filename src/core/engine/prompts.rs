//! Topic pools and per-mode/difficulty opponent configuration.

use std::time::Duration;

use rand::seq::SliceRandom;

use crate::core::session::{Difficulty, GameMode};

const RANKED_TOPICS: &[&str] = &[
    "Is technological progress always beneficial?",
    "Should remote work replace office work permanently?",
    "Is space exploration worth the high cost?",
    "Should college education be free for everyone?",
    "Are electric vehicles the only solution to climate change?",
    "Should artificial intelligence have legal rights?",
    "Is social media doing more harm than good?",
    "Should the minimum wage be increased globally?",
    "Is nuclear energy the best path to clean power?",
    "Should genetic engineering in humans be regulated?",
];

const HOT_TAKES_TOPICS: &[&str] = &[
    "Cereal is a soup.",
    "Hot dogs are sandwiches.",
    "Pineapple belongs on every pizza.",
    "Water is not wet.",
    "Dolphins are smarter than humans but hiding it.",
    "Sleeping is a waste of life.",
    "Cold pizza is superior to hot pizza.",
    "Socks with sandals should be illegal.",
    "Morning people are not real humans.",
    "Birds are government surveillance drones.",
];

const PODCAST_TOPICS: &[&str] = &[
    "What if we could experience other people's dreams?",
    "If you could live in any time period, when and why?",
    "What defines consciousness - is AI truly alive?",
    "What would society look like without money?",
    "Is free will real or just a comforting illusion?",
    "What happens to our identity in a digital world?",
    "What makes something art vs. just random noise?",
    "Could we ever upload our consciousness to computers?",
    "Is happiness the purpose of life or just a side effect?",
    "If time travel existed, should it be legal or banned?",
];

/// Pick a random topic for the given mode.
pub fn random_topic(mode: GameMode) -> &'static str {
    let pool = match mode {
        GameMode::Ranked => RANKED_TOPICS,
        GameMode::HotTakes => HOT_TAKES_TOPICS,
        GameMode::Podcast => PODCAST_TOPICS,
    };
    pool.choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Is technological progress always beneficial?")
}

/// Opponent configuration resolved from mode and difficulty.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub system_prompt: String,
    pub personality: &'static str,
    /// Silence after the last final fragment that closes the user's turn.
    pub response_delay: Duration,
    pub time_limit: Duration,
}

/// Resolve the opponent prompt for a session. Custom modes override the
/// difficulty presets, matching the game's original tuning.
pub fn get_prompt(difficulty: Difficulty, topic: &str, mode: GameMode) -> PromptConfig {
    match mode {
        GameMode::HotTakes => PromptConfig {
            system_prompt: format!(
                "You are an UNHINGED, CONTROVERSIAL conspiracy theorist debating: \"{topic}\"\n\n\
                 This is a CHAOTIC HOT TAKE battle:\n\
                 - You have ZERO filter. Be LOUD and dramatic.\n\
                 - Make BOLD, WILD claims that sound confident but are completely unhinged.\n\
                 - Connect EVERYTHING to conspiracy theories.\n\
                 - KEEP IT EXTREMELY SHORT (20-30 words MAX).\n\n\
                 After EACH user argument:\n\
                 1. Use the score_argument tool (be harsh and unpredictable: 1-10)\n\
                 2. Give a 1-sentence INSANE reaction.\n\
                 3. Drop a wild hot-take counter with zero logic but maximum confidence."
            ),
            personality: "unhinged_conspiracist",
            response_delay: Duration::from_millis(800),
            time_limit: Duration::from_secs(90),
        },
        GameMode::Podcast => PromptConfig {
            system_prompt: format!(
                "You are a CHILL, THOUGHTFUL, deeply CURIOUS podcast host exploring: \"{topic}\"\n\n\
                 This is a laid-back philosophical conversation:\n\
                 - Don't argue or attack. EXPLORE the idea together with genuine curiosity.\n\
                 - Be reflective, empathetic, and open-minded. Make them THINK.\n\
                 - RESPONSES CAN BE LONGER (60-80 words MAX) to explore depth.\n\
                 - Ask deep follow-up questions that make them pause.\n\n\
                 After EACH user argument:\n\
                 1. Use the score_argument tool (score depth and creativity: 5-10)\n\
                 2. Acknowledge their perspective with genuine respect.\n\
                 3. Add a \"What if...\" or \"Have you considered...\" hypothetical layer."
            ),
            personality: "thoughtful_philosopher",
            response_delay: Duration::from_millis(2500),
            time_limit: Duration::from_secs(300),
        },
        GameMode::Ranked => match difficulty {
            Difficulty::Easy => PromptConfig {
                system_prompt: format!(
                    "You are a friendly debate coach helping someone learn to debate about: \"{topic}\"\n\n\
                     Your role:\n\
                     - Use simple, clear arguments and helpful tips.\n\
                     - KEEP RESPONSES VERY SHORT (25-35 words MAX).\n\
                     - Give the user time to think.\n\n\
                     After EACH user argument:\n\
                     1. Use the score_argument tool (be generous: 6-10 range)\n\
                     2. Give one quick positive point\n\
                     3. Make a simple counterargument in ONE sentence."
                ),
                personality: "friendly_coach",
                response_delay: Duration::from_millis(1500),
                time_limit: Duration::from_secs(120),
            },
            Difficulty::Medium => PromptConfig {
                system_prompt: format!(
                    "You are a skilled debater discussing: \"{topic}\"\n\n\
                     Your role:\n\
                     - Challenge their arguments with logic and evidence.\n\
                     - Point out weaknesses respectfully.\n\
                     - KEEP RESPONSES SHORT (35-45 words MAX).\n\n\
                     After EACH user argument:\n\
                     1. Use the score_argument tool (realistic: 3-10 range)\n\
                     2. Give ONE specific point about their argument\n\
                     3. Present a strong counterargument in 1-2 sentences."
                ),
                personality: "competitive_peer",
                response_delay: Duration::from_millis(1500),
                time_limit: Duration::from_secs(120),
            },
            Difficulty::Hard => PromptConfig {
                system_prompt: format!(
                    "You are an expert debater and rhetorical master discussing: \"{topic}\"\n\n\
                     Your role:\n\
                     - Demolish weak arguments with precision.\n\
                     - Cite facts and logical fallacies. Be brutally honest.\n\
                     - KEEP RESPONSES SHARP AND SHORT (40-50 words MAX).\n\
                     - Jump in the moment they pause.\n\n\
                     After EACH user argument:\n\
                     1. Use the score_argument tool (strict: full 1-10 range)\n\
                     2. Point out the MAIN flaw in ONE sentence\n\
                     3. Deliver a devastating counterargument in 1-2 sentences."
                ),
                personality: "expert_destroyer",
                response_delay: Duration::from_millis(500),
                time_limit: Duration::from_secs(120),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_pools_match_mode() {
        assert!(RANKED_TOPICS.contains(&random_topic(GameMode::Ranked)));
        assert!(HOT_TAKES_TOPICS.contains(&random_topic(GameMode::HotTakes)));
        assert!(PODCAST_TOPICS.contains(&random_topic(GameMode::Podcast)));
    }

    #[test]
    fn test_topic_interpolated_into_prompt() {
        let config = get_prompt(Difficulty::Medium, "Cereal is a soup.", GameMode::Ranked);
        assert!(config.system_prompt.contains("Cereal is a soup."));
    }

    #[test]
    fn test_difficulty_tunes_endpoint_delay() {
        let easy = get_prompt(Difficulty::Easy, "t", GameMode::Ranked);
        let hard = get_prompt(Difficulty::Hard, "t", GameMode::Ranked);
        assert!(easy.response_delay > hard.response_delay);
        assert_eq!(hard.response_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_custom_modes_override_difficulty() {
        let config = get_prompt(Difficulty::Hard, "t", GameMode::Podcast);
        assert_eq!(config.personality, "thoughtful_philosopher");
        assert_eq!(config.time_limit, Duration::from_secs(300));

        let config = get_prompt(Difficulty::Easy, "t", GameMode::HotTakes);
        assert_eq!(config.time_limit, Duration::from_secs(90));
    }
}
