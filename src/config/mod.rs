//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (for the `handoff` binary)
//!
//! All timeouts are liveness tuning knobs. Correctness of the handshake never
//! depends on them; they only bound how long a missed signal can delay a
//! thread before it re-checks the real predicate.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HandoffError, Result};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Session / handshake configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Decompressor configuration
    #[serde(default)]
    pub decompressor: DecompressorConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| HandoffError::Config(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Default config file location (`<config dir>/handoff/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("handoff").join("config.toml"))
    }

    /// Load the default config file if it exists, then apply environment overrides
    pub fn load() -> Result<Self> {
        let base = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };

        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `HANDOFF_*` environment variables on top of this config
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(val) = env_parse("HANDOFF_POLL_INTERVAL_US") {
            self.session.poll_interval_us = val;
        }
        if let Some(val) = env_parse("HANDOFF_RESUME_INTERVAL_MS") {
            self.session.resume_interval_ms = val;
        }
        if let Some(val) = env_parse("HANDOFF_CANCEL_GRACE_MS") {
            self.session.cancel_grace_ms = val;
        }
        if let Ok(name) = std::env::var("HANDOFF_THREAD_NAME") {
            self.session.thread_name = name;
        }
        if let Some(val) = env_parse("HANDOFF_CHUNK_SIZE") {
            self.decompressor.chunk_size = val;
        }

        self
    }

    /// Reject values that would make a wait unbounded in practice
    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        if self.decompressor.chunk_size == 0 {
            return Err(HandoffError::Config(
                "decompressor.chunk_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Session (handshake) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Controller poll timeout in microseconds
    pub poll_interval_us: u64,

    /// Stalled worker re-check timeout in milliseconds
    pub resume_interval_ms: u64,

    /// How long teardown waits for a cancelled worker to exit, in milliseconds
    pub cancel_grace_ms: u64,

    /// Name given to worker threads
    pub thread_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_us: 50,
            resume_interval_ms: 10,
            cancel_grace_ms: 500,
            thread_name: "handoff-worker".to_string(),
        }
    }
}

impl SessionConfig {
    /// Controller poll timeout
    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }

    /// Stalled worker wait timeout
    pub fn resume_interval(&self) -> Duration {
        Duration::from_millis(self.resume_interval_ms)
    }

    /// Cancellation grace period
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }

    /// Set the controller poll timeout
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_us = interval.as_micros() as u64;
        self
    }

    /// Set the stalled worker wait timeout
    pub fn with_resume_interval(mut self, interval: Duration) -> Self {
        self.resume_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the cancellation grace period
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace_ms = grace.as_millis() as u64;
        self
    }

    /// Set the worker thread name
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Check that every timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_us == 0 {
            return Err(HandoffError::Config(
                "session.poll_interval_us must be non-zero".to_string(),
            ));
        }
        if self.resume_interval_ms == 0 {
            return Err(HandoffError::Config(
                "session.resume_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.thread_name.contains('\0') {
            return Err(HandoffError::Config(
                "session.thread_name must not contain NUL".to_string(),
            ));
        }
        Ok(())
    }
}

/// Decompressor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompressorConfig {
    /// Output bytes requested per `decode_chunk` round
    pub chunk_size: usize,
}

impl Default for DecompressorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.session.poll_interval(), Duration::from_micros(50));
        assert_eq!(config.session.resume_interval(), Duration::from_millis(10));
        assert_eq!(config.session.thread_name, "handoff-worker");
        assert_eq!(config.decompressor.chunk_size, 65536);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [session]
            poll_interval_us = 200
            resume_interval_ms = 5
            cancel_grace_ms = 100
            thread_name = "ppmd-decoder"

            [decompressor]
            chunk_size = 4096
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.session.poll_interval_us, 200);
        assert_eq!(config.session.cancel_grace(), Duration::from_millis(100));
        assert_eq!(config.session.thread_name, "ppmd-decoder");
        assert_eq!(config.decompressor.chunk_size, 4096);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[session]\npoll_interval_us = 75\n").unwrap();
        assert_eq!(config.session.poll_interval_us, 75);
        assert_eq!(config.session.resume_interval_ms, 10);
        assert_eq!(config.decompressor.chunk_size, 65536);
    }

    #[test]
    fn test_from_file_rejects_zero_interval() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\npoll_interval_us = 0").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, HandoffError::Config(_)));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[decompressor]\nchunk_size = 128").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.decompressor.chunk_size, 128);
    }

    #[test]
    fn test_builders() {
        let session = SessionConfig::default()
            .with_poll_interval(Duration::from_micros(10))
            .with_resume_interval(Duration::from_millis(1))
            .with_cancel_grace(Duration::from_millis(20))
            .with_thread_name("w");
        assert_eq!(session.poll_interval_us, 10);
        assert_eq!(session.resume_interval_ms, 1);
        assert_eq!(session.cancel_grace_ms, 20);
        assert_eq!(session.thread_name, "w");
    }

    #[test]
    fn test_zero_chunk_size_invalid() {
        let mut config = Config::default();
        config.decompressor.chunk_size = 0;
        assert!(config.validate().is_err());
    }
}
