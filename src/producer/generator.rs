use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub const ADJECTIVES: [&str; 5] = ["amazing", "funny", "boring", "exciting", "weird"];
pub const ACTIONS: [&str; 5] = ["found", "saw", "tried", "shared", "loved"];
pub const TOPICS: [&str; 5] = ["a movie", "a meme", "an app", "a trick", "a story"];
pub const LOCATIONS: [&str; 5] = [
    "in the park",
    "at the beach",
    "on the subway",
    "at the office",
    "at a friend's place",
];
pub const EMOTIONS: [&str; 5] = ["happy", "confused", "thrilled", "disappointed", "amazed"];

/// Endless stream of randomized "buzz" sentences.
///
/// Each call to `next` builds one sentence on demand; nothing is buffered.
pub struct MessageGenerator<R = StdRng> {
    rng: R,
}

impl MessageGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MessageGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn pick(&mut self, choices: &[&'static str]) -> &'static str {
        // Choice lists are non-empty constants
        choices.choose(&mut self.rng).copied().unwrap_or_default()
    }
}

impl<R: Rng> Iterator for MessageGenerator<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let adjective = self.pick(&ADJECTIVES);
        let action = self.pick(&ACTIONS);
        let topic = self.pick(&TOPICS);
        let location = self.pick(&LOCATIONS);
        let emotion = self.pick(&EMOTIONS);

        Some(format!(
            "I just {action} {topic} {location}! It was {adjective}, and now I feel {emotion}."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_messages_follow_template() {
        let re = Regex::new(
            r"^I just (\w+) (a movie|a meme|an app|a trick|a story) (.+)! It was (\w+), and now I feel (\w+)\.$",
        )
        .unwrap();

        for message in MessageGenerator::seeded(7).take(50) {
            let caps = re.captures(&message).unwrap();
            assert!(ACTIONS.contains(&&caps[1]));
            assert!(LOCATIONS.contains(&&caps[3]));
            assert!(ADJECTIVES.contains(&&caps[4]));
            assert!(EMOTIONS.contains(&&caps[5]));
            assert!(!message.contains('\n'));
        }
    }

    #[test]
    fn test_seeded_generators_agree() {
        let a: Vec<String> = MessageGenerator::seeded(42).take(10).collect();
        let b: Vec<String> = MessageGenerator::seeded(42).take(10).collect();
        assert_eq!(a, b);
    }
}
