//! Engine configuration

use crate::{ConfigError, LessonLogResult};
use serde::{Deserialize, Serialize};

/// Largest supported rounding precision for progress percentages.
pub const MAX_PERCENT_PRECISION: u32 = 6;

/// Longest allowed prefix for generated idempotency tokens.
pub const MAX_TOKEN_PREFIX_LEN: usize = 32;

/// Tunables of the progression engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Decimal places kept when rounding progress percentages.
    pub percent_precision: u32,
    /// Guard each commit with the user's observed head within the course so
    /// that racing transitions with different tokens cannot both succeed.
    /// Writes by the same user in other courses do not trip the guard.
    pub optimistic_concurrency: bool,
    /// Prefix of tokens generated for internally initiated transitions.
    pub generated_token_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            percent_precision: 2,
            optimistic_concurrency: true,
            generated_token_prefix: "auto-".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `LESSONLOG_PERCENT_PRECISION`: rounding precision (default: 2)
    /// - `LESSONLOG_OPTIMISTIC_CONCURRENCY`: `true`/`1` to guard commits (default: true)
    /// - `LESSONLOG_TOKEN_PREFIX`: prefix for generated tokens (default: `auto-`)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            percent_precision: std::env::var("LESSONLOG_PERCENT_PRECISION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.percent_precision),
            optimistic_concurrency: std::env::var("LESSONLOG_OPTIMISTIC_CONCURRENCY")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(defaults.optimistic_concurrency),
            generated_token_prefix: std::env::var("LESSONLOG_TOKEN_PREFIX")
                .unwrap_or(defaults.generated_token_prefix),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LessonLogResult<()> {
        if self.percent_precision > MAX_PERCENT_PRECISION {
            return Err(ConfigError::InvalidValue {
                field: "percent_precision".to_string(),
                value: self.percent_precision.to_string(),
                reason: format!("percent_precision must be at most {}", MAX_PERCENT_PRECISION),
            }
            .into());
        }

        if self.generated_token_prefix.len() > MAX_TOKEN_PREFIX_LEN {
            return Err(ConfigError::InvalidValue {
                field: "generated_token_prefix".to_string(),
                value: self.generated_token_prefix.clone(),
                reason: format!("prefix cannot exceed {} bytes", MAX_TOKEN_PREFIX_LEN),
            }
            .into());
        }

        if self.generated_token_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                field: "generated_token_prefix".to_string(),
                value: self.generated_token_prefix.clone(),
                reason: "prefix cannot contain whitespace".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, LessonLogError};

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_precision_upper_bound() {
        let config = EngineConfig {
            percent_precision: MAX_PERCENT_PRECISION + 1,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, LessonLogError::Config(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_prefix_rules() {
        let long = EngineConfig {
            generated_token_prefix: "p".repeat(MAX_TOKEN_PREFIX_LEN + 1),
            ..Default::default()
        };
        assert!(long.validate().is_err());

        let spaced = EngineConfig {
            generated_token_prefix: "my prefix".to_string(),
            ..Default::default()
        };
        assert!(spaced.validate().is_err());

        let empty = EngineConfig {
            generated_token_prefix: String::new(),
            ..Default::default()
        };
        assert!(empty.validate().is_ok());
    }
}
