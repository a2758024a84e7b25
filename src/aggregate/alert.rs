use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Words counted towards the positive sentiment alert when none are configured.
pub const DEFAULT_VOCABULARY: [&str; 7] = [
    "amazing", "funny", "exciting", "loved", "happy", "thrilled", "amazed",
];

pub const DEFAULT_ALERT_THRESHOLD: u64 = 5;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+").expect("token pattern is valid"))
}

/// Split text into lowercase word-character tokens, dropping punctuation.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    token_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
}

/// Fixed set of trigger words, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    words: HashSet<String>,
}

impl Vocabulary {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    /// Number of tokens in `text` that are trigger words. Repeats count each time.
    pub fn count_matches(&self, text: &str) -> u64 {
        tokenize(text).filter(|token| self.contains(token)).count() as u64
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_VOCABULARY)
    }
}

/// Emitted when the cumulative trigger word count reaches the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertReport {
    pub total: u64,
}

/// Cumulative trigger word counter. Resets to zero every time an alert fires,
/// so counts never carry over from one alert cycle into the next.
#[derive(Debug, Clone)]
pub struct AlertState {
    cumulative_count: u64,
    threshold: u64,
    vocabulary: Vocabulary,
}

impl AlertState {
    /// `threshold` must be positive; a zero threshold is raised to one.
    pub fn new(threshold: u64, vocabulary: Vocabulary) -> Self {
        Self {
            cumulative_count: 0,
            threshold: threshold.max(1),
            vocabulary,
        }
    }

    pub fn record_message(&mut self, text: &str) -> Option<AlertReport> {
        self.cumulative_count += self.vocabulary.count_matches(text);

        if self.cumulative_count < self.threshold {
            return None;
        }

        let report = AlertReport {
            total: self.cumulative_count,
        };
        self.cumulative_count = 0;
        Some(report)
    }

    pub fn cumulative_count(&self) -> u64 {
        self.cumulative_count
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}

impl Default for AlertState {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_THRESHOLD, Vocabulary::default())
    }
}
