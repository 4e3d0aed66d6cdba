use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Runtime configuration, read once at startup.
///
/// Every field has a default, so the service starts with no environment at
/// all. The admission policy (window length and request cap) is fixed at
/// compile time and deliberately not configurable here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Log level applied to this crate's tracing target.
    pub log_level: String,
    /// Upper bound on a single tag-generation call.
    pub generation_timeout: Duration,
    /// How often idle client windows are swept out of the limiter.
    pub cleanup_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            log_level: "info".to_string(),
            generation_timeout: Duration::from_secs(20),
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();
        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            generation_timeout: Duration::from_secs(parse_var(
                "GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout.as_secs(),
            )?),
            cleanup_interval: Duration::from_secs(parse_var(
                "CLEANUP_INTERVAL",
                defaults.cleanup_interval.as_secs(),
            )?),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.generation_timeout, Duration::from_secs(20));
        assert_eq!(config.cleanup_interval, Duration::from_secs(300));
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_parse_var_prefers_the_environment() {
        std::env::set_var("TAGX_TEST_PARSE_VAR", "9100");
        assert_eq!(parse_var("TAGX_TEST_PARSE_VAR", 8000u16).unwrap(), 9100);
        std::env::remove_var("TAGX_TEST_PARSE_VAR");
    }

    #[test]
    fn test_parse_var_falls_back_when_unset() {
        assert_eq!(parse_var("TAGX_TEST_UNSET_VAR", 8000u16).unwrap(), 8000);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        std::env::set_var("TAGX_TEST_BAD_VAR", "not-a-port");
        let err = parse_var("TAGX_TEST_BAD_VAR", 8000u16).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TAGX_TEST_BAD_VAR", .. }));
        std::env::remove_var("TAGX_TEST_BAD_VAR");
    }
}
