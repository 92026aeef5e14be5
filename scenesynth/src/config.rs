//! Tool configuration.
//!
//! Loaded from a TOML file when one is given, with defaults mirroring the
//! reference pipeline otherwise. The serde structs here convert into the
//! runtime types the pipeline actually carries.

use crate::error::SynthError;
use crate::synthesis::{ActionMatching, SynthesisSettings};
use crate::vlm::{RetryPolicy, VlmProviderConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Retry behavior for classifier and generator calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    pub initial_delay_secs: f64,
    pub backoff_multiplier: f64,
    pub max_delay_secs: f64,
    /// None retries transient failures indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            initial_delay_secs: 1.0,
            backoff_multiplier: 1.1,
            max_delay_secs: 20.0,
            max_attempts: None,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_secs_f64(self.initial_delay_secs),
            multiplier: self.backoff_multiplier,
            max_delay: Duration::from_secs_f64(self.max_delay_secs),
            max_attempts: self.max_attempts,
        }
    }
}

/// Synthesis regeneration budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    pub max_attempts: u32,
    pub attempt_delay_secs: u64,
    pub action_matching: ActionMatching,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        SynthesisConfig {
            max_attempts: 7,
            attempt_delay_secs: 5,
            action_matching: ActionMatching::default(),
        }
    }
}

impl SynthesisConfig {
    pub fn settings(&self) -> SynthesisSettings {
        SynthesisSettings {
            max_attempts: self.max_attempts,
            attempt_delay: Duration::from_secs(self.attempt_delay_secs),
            matching: self.action_matching,
        }
    }
}

/// Top-level tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthConfig {
    #[serde(default)]
    pub provider: VlmProviderConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

impl SynthConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SynthError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| SynthError::Invalid(format!("{}: {}", path.display(), e)))
    }

    /// Validate the configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.provider.model.is_empty() {
            errors.push("provider.model must not be empty".to_string());
        }
        for (name, value) in [
            (
                "provider.classify_temperature",
                self.provider.classify_temperature,
            ),
            (
                "provider.synthesis_temperature",
                self.provider.synthesis_temperature,
            ),
        ] {
            if !(0.0..=2.0).contains(&value) {
                errors.push(format!("{} must be between 0.0 and 2.0", name));
            }
        }

        if self.retry.initial_delay_secs < 0.0 || self.retry.max_delay_secs < 0.0 {
            errors.push("retry delays must not be negative".to_string());
        }
        if self.retry.backoff_multiplier < 1.0 {
            errors.push("retry.backoff_multiplier must be at least 1.0".to_string());
        }
        if self.retry.max_attempts == Some(0) {
            errors.push("retry.max_attempts must be greater than 0 when set".to_string());
        }

        if self.synthesis.max_attempts == 0 {
            errors.push("synthesis.max_attempts must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SynthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
            [retry]
            initial_delay_secs = 0.5
            backoff_multiplier = 2.0
            max_delay_secs = 10.0
            max_attempts = 3

            [synthesis]
            max_attempts = 4
            attempt_delay_secs = 1
            action_matching = "exact"
        "#;
        let config: SynthConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.retry.max_attempts, Some(3));
        assert_eq!(config.synthesis.max_attempts, 4);
        assert_eq!(config.synthesis.action_matching, ActionMatching::Exact);
        // The missing [provider] table falls back to the defaults.
        assert!(!config.provider.model.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let mut config = SynthConfig::default();
        config.provider.model = String::new();
        config.retry.backoff_multiplier = 0.5;
        config.synthesis.max_attempts = 0;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_settings_conversion() {
        let config = SynthConfig::default();
        let settings = config.synthesis.settings();
        assert_eq!(settings.max_attempts, 7);
        assert_eq!(settings.attempt_delay, Duration::from_secs(5));
        let policy = config.retry.policy();
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(20));
    }
}
