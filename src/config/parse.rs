use super::types::*;
use crate::config::expand_tilde;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Overrides `consumer.alert_threshold`
pub const ENV_ALERT_THRESHOLD: &str = "ALERT_THRESHOLD";
/// Overrides `producer.interval`, in whole seconds
pub const ENV_MESSAGE_INTERVAL_SECONDS: &str = "MESSAGE_INTERVAL_SECONDS";
/// Overrides `file.path`
pub const ENV_FILE_PATH: &str = "BUZZTAIL_FILE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("invalid value for {var}: '{value}' (expected a positive integer)")]
    InvalidEnv { var: &'static str, value: String },

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),
}

/// Load a config file, or built-in defaults when no file is given, then apply
/// environment overrides and validate.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |var| std::env::var(var).ok())
}

/// Load configuration with an explicit environment lookup.
pub fn load_config_with_env<F>(path: Option<&Path>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    };

    apply_env_overrides(&mut config, env)?;
    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    // An empty file is a valid config made entirely of defaults
    if yaml_string.trim().is_empty() {
        return Ok(Config::default());
    }

    let config: Config = serde_yaml::from_str(&yaml_string)?;
    Ok(config)
}

/// Missing variables leave the configured value alone; malformed ones are rejected.
fn apply_env_overrides<F>(config: &mut Config, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env(ENV_ALERT_THRESHOLD) {
        config.consumer.alert_threshold = parse_positive(ENV_ALERT_THRESHOLD, &value)?;
    }

    if let Some(value) = env(ENV_MESSAGE_INTERVAL_SECONDS) {
        let secs = parse_positive(ENV_MESSAGE_INTERVAL_SECONDS, &value)?;
        config.producer.interval = Duration::from_secs(secs);
    }

    if let Some(value) = env(ENV_FILE_PATH) {
        if !value.trim().is_empty() {
            config.file.path = PathBuf::from(value.trim());
        }
    }

    Ok(())
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}

fn expand_paths(config: &mut Config) {
    config.file.path = expand_tilde(&config.file.path);
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.file.path.as_os_str().is_empty() {
        errors.push("file.path cannot be empty".to_string());
    }

    if config.producer.interval.is_zero() {
        errors.push("producer.interval must be greater than zero".to_string());
    }

    if config.consumer.alert_threshold == 0 {
        errors.push("consumer.alert_threshold must be a positive integer".to_string());
    }

    if config.consumer.window.is_zero() {
        errors.push("consumer.window must be greater than zero".to_string());
    }

    if config.consumer.poll_interval.is_zero() {
        errors.push("consumer.poll_interval must be greater than zero".to_string());
    }

    if config.consumer.vocabulary.iter().all(|w| w.trim().is_empty()) {
        errors.push("consumer.vocabulary must contain at least one word".to_string());
    }

    for (i, word) in config.consumer.vocabulary.iter().enumerate() {
        if word.trim().chars().any(|c| !(c.is_alphanumeric() || c == '_')) {
            errors.push(format!(
                "consumer.vocabulary[{}]: '{}' is not a single word",
                i, word
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_config_with_env(None, env_from(&[])).unwrap();
        assert_eq!(config.consumer.alert_threshold, 5);
        assert_eq!(config.producer.interval, Duration::from_secs(3));
    }

    #[test]
    fn test_env_overrides() {
        let config = load_config_with_env(
            None,
            env_from(&[
                ("ALERT_THRESHOLD", "12"),
                ("MESSAGE_INTERVAL_SECONDS", " 7 "),
                ("BUZZTAIL_FILE", "/tmp/stream.log"),
            ]),
        )
        .unwrap();

        assert_eq!(config.consumer.alert_threshold, 12);
        assert_eq!(config.producer.interval, Duration::from_secs(7));
        assert_eq!(config.file.path, PathBuf::from("/tmp/stream.log"));
    }

    #[test]
    fn test_malformed_env_fails_fast() {
        let err = load_config_with_env(None, env_from(&[("ALERT_THRESHOLD", "five")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { var: "ALERT_THRESHOLD", .. }
        ));

        let err = load_config_with_env(None, env_from(&[("MESSAGE_INTERVAL_SECONDS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { var: "MESSAGE_INTERVAL_SECONDS", .. }
        ));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = Config::default();
        config.consumer.alert_threshold = 0;
        config.consumer.window = Duration::ZERO;
        config.consumer.vocabulary = vec!["two words".to_string()];

        match validate_config(&config) {
            Err(ConfigError::ValidationList(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation errors, got {:?}", other),
        }
    }
}
