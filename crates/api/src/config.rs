//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use commands::CommandConfig;
use domain::{InputPolicy, TransitionPolicy};
use notifications::DispatcherConfig;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `8080`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default `text`)
/// - `ORDER_INPUT_POLICY`: `strict` or `lenient` (default `strict`)
/// - `ORDER_TRANSITION_POLICY`: `any` or `forward` (default `any`)
/// - `PUBLISH_MAX_ATTEMPTS` (default `1`), `PUBLISH_RETRY_DELAY_MS` (default `50`)
/// - `UPDATE_MAX_ATTEMPTS` (default `3`)
/// - `SESSION_BUFFER`: per-session queue capacity (default `64`)
///
/// Unparseable values fall back to the default and are reported by
/// [`Config::warnings`] so they can be logged once tracing is up.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub input_policy: InputPolicy,
    pub transition_policy: TransitionPolicy,
    pub publish_max_attempts: u32,
    pub publish_retry_delay_ms: u64,
    pub update_max_attempts: u32,
    pub session_buffer: usize,
    warnings: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let mut warnings = Vec::new();

        let mut parsed = |key: &str, default: u64| parse_or(&lookup, key, default, &mut warnings);
        let port = parsed("PORT", u64::from(defaults.port));
        let publish_max_attempts = parsed("PUBLISH_MAX_ATTEMPTS", u64::from(defaults.publish_max_attempts));
        let publish_retry_delay_ms = parsed("PUBLISH_RETRY_DELAY_MS", defaults.publish_retry_delay_ms);
        let update_max_attempts = parsed("UPDATE_MAX_ATTEMPTS", u64::from(defaults.update_max_attempts));
        let session_buffer = parsed("SESSION_BUFFER", defaults.session_buffer as u64);

        let port = u16::try_from(port).unwrap_or_else(|_| {
            warnings.push(format!("ignoring out-of-range PORT={port}, using default"));
            defaults.port
        });
        let log_format = parse_or(&lookup, "LOG_FORMAT", defaults.log_format, &mut warnings);
        let input_policy = parse_or(&lookup, "ORDER_INPUT_POLICY", defaults.input_policy, &mut warnings);
        let transition_policy = parse_or(
            &lookup,
            "ORDER_TRANSITION_POLICY",
            defaults.transition_policy,
            &mut warnings,
        );

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            input_policy,
            transition_policy,
            publish_max_attempts: publish_max_attempts.clamp(1, u32::MAX as u64) as u32,
            publish_retry_delay_ms,
            update_max_attempts: update_max_attempts.clamp(1, u32::MAX as u64) as u32,
            session_buffer: session_buffer.max(1) as usize,
            warnings,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns one message per variable that was set but could not be parsed.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn command_config(&self) -> CommandConfig {
        CommandConfig::default()
            .with_input_policy(self.input_policy)
            .with_transition_policy(self.transition_policy)
            .with_publish_retries(
                self.publish_max_attempts,
                Duration::from_millis(self.publish_retry_delay_ms),
            )
            .with_update_max_attempts(self.update_max_attempts)
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            session_buffer: self.session_buffer,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let commands = CommandConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            input_policy: commands.input_policy,
            transition_policy: commands.transition_policy,
            publish_max_attempts: commands.publish_max_attempts,
            publish_retry_delay_ms: commands.publish_retry_delay.as_millis() as u64,
            update_max_attempts: commands.update_max_attempts,
            session_buffer: DispatcherConfig::default().session_buffer,
            warnings: Vec::new(),
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warnings.push(format!("ignoring invalid {key}={raw:?}, using default"));
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.input_policy, InputPolicy::Strict);
        assert_eq!(config.transition_policy, TransitionPolicy::Any);
        assert_eq!(config.publish_max_attempts, 1);
        assert_eq!(config.publish_retry_delay_ms, 50);
        assert_eq!(config.update_max_attempts, 3);
        assert_eq!(config.session_buffer, 64);
    }

    #[test]
    fn test_empty_environment_matches_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_addr_formatting() {
        let config = from_pairs(&[("HOST", "127.0.0.1"), ("PORT", "9000")]);
        assert_eq!(config.addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_policies_and_limits_are_read() {
        let config = from_pairs(&[
            ("LOG_FORMAT", "JSON"),
            ("ORDER_INPUT_POLICY", "lenient"),
            ("ORDER_TRANSITION_POLICY", "Forward"),
            ("PUBLISH_MAX_ATTEMPTS", "4"),
            ("PUBLISH_RETRY_DELAY_MS", "10"),
            ("UPDATE_MAX_ATTEMPTS", "7"),
            ("SESSION_BUFFER", "16"),
        ]);

        assert_eq!(config.log_format, LogFormat::Json);
        let commands = config.command_config();
        assert_eq!(commands.input_policy, InputPolicy::Lenient);
        assert_eq!(commands.transition_policy, TransitionPolicy::Forward);
        assert_eq!(commands.publish_max_attempts, 4);
        assert_eq!(commands.publish_retry_delay, Duration::from_millis(10));
        assert_eq!(commands.update_max_attempts, 7);
        assert_eq!(config.dispatcher_config().session_buffer, 16);
    }

    #[test]
    fn test_invalid_values_fall_back_with_warning() {
        let config = from_pairs(&[
            ("PORT", "eighty"),
            ("ORDER_INPUT_POLICY", "sloppy"),
            ("SESSION_BUFFER", "-1"),
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.input_policy, InputPolicy::Strict);
        assert_eq!(config.session_buffer, 64);
        assert_eq!(config.warnings().len(), 3);
        assert!(config.warnings()[0].contains("PORT"));
    }

    #[test]
    fn test_zero_limits_are_raised_to_one() {
        let config = from_pairs(&[("PUBLISH_MAX_ATTEMPTS", "0"), ("SESSION_BUFFER", "0")]);
        assert_eq!(config.publish_max_attempts, 1);
        assert_eq!(config.session_buffer, 1);
    }
}
