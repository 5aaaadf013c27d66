//! Engine configuration
//!
//! Settings can be built in code, read from `DYNDEX_*` environment variables, or
//! parsed from JSON. Every constructor validates before returning.

use crate::error::{IndexError, IndexResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Highest number of simultaneously active predicates supported by default
pub const DEFAULT_MAX_ARITY: usize = 3;

const ENV_MAX_ARITY: &str = "DYNDEX_MAX_ARITY";
const ENV_SLOW_BUILD_MS: &str = "DYNDEX_SLOW_BUILD_MS";
const ENV_VERBOSE: &str = "DYNDEX_VERBOSE";

/// Configuration for a [`DynamicIndex`](crate::DynamicIndex)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum number of active predicates a query may carry
    pub max_arity: usize,
    /// Index builds slower than this are logged at `warn`
    pub slow_build_threshold_ms: u64,
    /// Log every lookup at `debug`, not just builds
    pub verbose_logging: bool,
    /// Capacity hint for the group table of a new index
    pub initial_group_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_arity: DEFAULT_MAX_ARITY,
            slow_build_threshold_ms: 250,
            verbose_logging: false,
            initial_group_capacity: 0,
        }
    }
}

impl IndexConfig {
    /// Read overrides from the environment on top of the defaults
    pub fn from_env() -> IndexResult<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_MAX_ARITY) {
            config.max_arity = parse_setting(ENV_MAX_ARITY, &raw)?;
        }
        if let Ok(raw) = std::env::var(ENV_SLOW_BUILD_MS) {
            config.slow_build_threshold_ms = parse_setting(ENV_SLOW_BUILD_MS, &raw)?;
        }
        if let Ok(raw) = std::env::var(ENV_VERBOSE) {
            config.verbose_logging = matches!(raw.trim(), "1" | "true" | "yes" | "on");
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> IndexResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| IndexError::Configuration {
            message: format!("invalid JSON configuration: {e}"),
            setting: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Builder-style override of the arity bound
    pub fn with_max_arity(mut self, max_arity: usize) -> Self {
        self.max_arity = max_arity;
        self
    }

    /// Check invariants that the engine relies on
    pub fn validate(&self) -> IndexResult<()> {
        if self.max_arity == 0 {
            return Err(IndexError::configuration("max_arity", "max_arity must be at least 1"));
        }
        Ok(())
    }

    /// Slow-build threshold as a [`Duration`]
    pub fn slow_build_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_build_threshold_ms)
    }

    /// Get a descriptive string for the current configuration
    pub fn description(&self) -> String {
        format!(
            "max arity {}, slow build threshold {}ms, verbose {}",
            self.max_arity, self.slow_build_threshold_ms, self.verbose_logging
        )
    }
}

fn parse_setting<T: std::str::FromStr>(setting: &str, raw: &str) -> IndexResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| IndexError::configuration(setting, format!("cannot parse '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IndexConfig::default();
        assert_eq!(config.max_arity, 3);
        assert!(config.validate().is_ok());
        assert_eq!(config.slow_build_threshold(), Duration::from_millis(250));
    }

    #[test]
    fn test_from_json_partial() {
        let config = IndexConfig::from_json(r#"{ "max_arity": 5 }"#).unwrap();
        assert_eq!(config.max_arity, 5);
        assert_eq!(config.slow_build_threshold_ms, 250);
        assert!(!config.verbose_logging);
    }

    #[test]
    fn test_from_json_rejects_zero_arity() {
        let err = IndexConfig::from_json(r#"{ "max_arity": 0 }"#).unwrap_err();
        assert!(matches!(err, IndexError::Configuration { .. }));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = IndexConfig::from_json("not json").unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    // The only test that touches DYNDEX_* variables
    #[test]
    fn test_from_env_overrides() {
        fn set(key: &str, value: &str) {
            unsafe { std::env::set_var(key, value) }
        }
        fn clear() {
            for key in [ENV_MAX_ARITY, ENV_SLOW_BUILD_MS, ENV_VERBOSE] {
                unsafe { std::env::remove_var(key) }
            }
        }

        clear();
        assert_eq!(IndexConfig::from_env().unwrap(), IndexConfig::default());

        set(ENV_MAX_ARITY, "5");
        set(ENV_SLOW_BUILD_MS, " 40 ");
        set(ENV_VERBOSE, "true");
        let config = IndexConfig::from_env().unwrap();
        assert_eq!(config.max_arity, 5);
        assert_eq!(config.slow_build_threshold(), Duration::from_millis(40));
        assert!(config.verbose_logging);

        set(ENV_VERBOSE, "off");
        assert!(!IndexConfig::from_env().unwrap().verbose_logging);

        set(ENV_MAX_ARITY, "lots");
        let err = IndexConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            IndexError::Configuration { setting: Some(ref s), .. } if s == ENV_MAX_ARITY
        ));

        set(ENV_MAX_ARITY, "0");
        let err = IndexConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            IndexError::Configuration { setting: Some(ref s), .. } if s == "max_arity"
        ));

        set(ENV_MAX_ARITY, "3");
        set(ENV_SLOW_BUILD_MS, "-1");
        let err = IndexConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            IndexError::Configuration { setting: Some(ref s), .. } if s == ENV_SLOW_BUILD_MS
        ));

        clear();
    }

    #[test]
    fn test_parse_setting() {
        assert_eq!(parse_setting::<usize>("x", " 4 ").unwrap(), 4);
        assert!(parse_setting::<usize>("x", "four").is_err());
    }
}
