//! Configuration management for the election core
//!
//! Loads configuration from environment variables with validation.

use crate::lifecycle::TransitionPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Lifecycle rules for elections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Whether a transition may skip a status (default: adjacent only)
    pub transition_policy: TransitionPolicy,

    /// Advance elections automatically when their time window is reached
    pub auto_transition: bool,

    /// How often the scheduler checks elections, in seconds (default: 60)
    pub schedule_check_interval_seconds: u64,

    /// Maximum election title length in characters (default: 200)
    pub max_title_length: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            transition_policy: TransitionPolicy::Adjacent,
            auto_transition: false,
            schedule_check_interval_seconds: 60,
            max_title_length: 200,
        }
    }
}

impl LifecycleConfig {
    /// Load lifecycle configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let transition_policy = std::env::var("ELECTION_TRANSITION_POLICY")
            .unwrap_or_else(|_| "adjacent".to_string())
            .parse()?;

        let auto_transition = match std::env::var("ELECTION_AUTO_TRANSITION") {
            Ok(value) => parse_bool(&value)
                .ok_or_else(|| Error::config("Invalid ELECTION_AUTO_TRANSITION"))?,
            Err(_) => false,
        };

        let schedule_check_interval_seconds =
            std::env::var("ELECTION_SCHEDULE_CHECK_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| Error::config("Invalid ELECTION_SCHEDULE_CHECK_INTERVAL_SECONDS"))?;

        let max_title_length = std::env::var("ELECTION_MAX_TITLE_LENGTH")
            .unwrap_or_else(|_| "200".to_string())
            .parse()
            .map_err(|_| Error::config("Invalid ELECTION_MAX_TITLE_LENGTH"))?;

        let config = Self {
            transition_policy,
            auto_transition,
            schedule_check_interval_seconds,
            max_title_length,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        Self {
            schedule_check_interval_seconds: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.schedule_check_interval_seconds == 0 {
            return Err(Error::config(
                "ELECTION_SCHEDULE_CHECK_INTERVAL_SECONDS must be greater than zero",
            ));
        }
        if self.max_title_length == 0 {
            return Err(Error::config("ELECTION_MAX_TITLE_LENGTH must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub lifecycle: LifecycleConfig,
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        let lifecycle = LifecycleConfig::from_env()?;

        let logging = LoggingConfig {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
        };

        Ok(Self { lifecycle, logging })
    }

    /// Create configuration for testing
    pub fn for_testing() -> Self {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        };

        Self {
            lifecycle: LifecycleConfig::for_testing(),
            logging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_defaults() {
        let config = LifecycleConfig::default();

        assert_eq!(config.transition_policy, TransitionPolicy::Adjacent);
        assert!(!config.auto_transition);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lifecycle_validation() {
        let zero_interval = LifecycleConfig {
            schedule_check_interval_seconds: 0,
            ..LifecycleConfig::default()
        };
        assert!(matches!(zero_interval.validate(), Err(Error::Config { .. })));

        let zero_title = LifecycleConfig {
            max_title_length: 0,
            ..LifecycleConfig::default()
        };
        assert!(zero_title.validate().is_err());
    }

    #[test]
    fn test_bool_parsing() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_testing_config() {
        let config = Config::for_testing();
        assert_eq!(config.logging.format, "pretty");
        assert!(config.lifecycle.schedule_check_interval_seconds > 0);
    }
}
