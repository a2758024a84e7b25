use crate::aggregate::alert::{DEFAULT_ALERT_THRESHOLD, DEFAULT_VOCABULARY};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub file: FileConfig,
    #[serde(default)]
    pub producer: ProducerConfig,
    #[serde(default)]
    pub consumer: ConsumerConfig,
}

/// The shared append-only file written by the producer and tailed by the consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default = "default_file_path")]
    pub path: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: default_file_path(),
        }
    }
}

fn default_file_path() -> PathBuf {
    PathBuf::from("logs/buzz.log")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProducerConfig {
    /// Delay between generated messages
    #[serde(with = "duration_format", default = "default_message_interval")]
    pub interval: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            interval: default_message_interval(),
        }
    }
}

fn default_message_interval() -> Duration {
    Duration::from_secs(3)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerConfig {
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: u64,
    #[serde(with = "duration_format", default = "default_window")]
    pub window: Duration,
    /// Backoff between read attempts when no complete line is available
    #[serde(with = "duration_format", default = "default_poll_interval")]
    pub poll_interval: Duration,
    #[serde(default = "default_vocabulary")]
    pub vocabulary: Vec<String>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            alert_threshold: default_alert_threshold(),
            window: default_window(),
            poll_interval: default_poll_interval(),
            vocabulary: default_vocabulary(),
        }
    }
}

fn default_alert_threshold() -> u64 {
    DEFAULT_ALERT_THRESHOLD
}

fn default_window() -> Duration {
    Duration::from_secs(60)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_vocabulary() -> Vec<String> {
    DEFAULT_VOCABULARY.iter().map(|w| w.to_string()).collect()
}

// Durations are written as "<n>ms", "<n>s", "<n>m" or "<n>h"
pub(crate) mod duration_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty duration string".to_string());
        }

        let (value_str, unit) = if let Some(v) = s.strip_suffix("ms") {
            (v, "ms")
        } else if let Some(v) = s.strip_suffix('s') {
            (v, "s")
        } else if let Some(v) = s.strip_suffix('m') {
            (v, "m")
        } else if let Some(v) = s.strip_suffix('h') {
            (v, "h")
        } else {
            return Err(format!("invalid duration format: {}", s));
        };

        let value: u64 = value_str
            .trim()
            .parse()
            .map_err(|_| format!("invalid numeric value: {}", value_str))?;

        let duration = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(
                value
                    .checked_mul(60)
                    .ok_or_else(|| format!("duration too large: {}", s))?,
            ),
            "h" => Duration::from_secs(
                value
                    .checked_mul(3600)
                    .ok_or_else(|| format!("duration too large: {}", s))?,
            ),
            _ => return Err(format!("unknown unit: {}", unit)),
        };

        Ok(duration)
    }

    pub fn format_duration(d: Duration) -> String {
        let secs = d.as_secs();
        if d.subsec_nanos() != 0 || secs == 0 {
            format!("{}ms", d.as_millis())
        } else if secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::duration_format::{format_duration, parse_duration};
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("3s").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("xs").is_err());
    }

    #[test]
    fn test_parse_duration_overflow_is_an_error() {
        assert_eq!(
            parse_duration("6000000000000000h").unwrap_err(),
            "duration too large: 6000000000000000h"
        );
        assert!(parse_duration("600000000000000000m").is_err());

        let result: Result<Config, _> =
            serde_yaml::from_str("consumer:\n  window: 6000000000000000h\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(60)), "1m");
        assert_eq!(format_duration(Duration::from_secs(90)), "90s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format_duration(Duration::from_secs(7200)), "2h");
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.file.path, PathBuf::from("logs/buzz.log"));
        assert_eq!(config.producer.interval, Duration::from_secs(3));
        assert_eq!(config.consumer.alert_threshold, 5);
        assert_eq!(config.consumer.window, Duration::from_secs(60));
        assert_eq!(config.consumer.poll_interval, Duration::from_secs(1));
        assert_eq!(config.consumer.vocabulary.len(), 7);
    }
}
