//! Tracing subscriber setup
//!
//! `RUST_LOG` overrides the configured level when set.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Builds the filter from `RUST_LOG`, falling back to the configured level
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_lowercase()))
        .with_context(|| format!("invalid log level '{}'", config.level))
}

/// Install the global subscriber, writing to stderr or to `config.file`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    if config.file.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!(e))?;
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file)
            .with_context(|| format!("failed to open log file {}", config.file))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|e| anyhow!(e))?;
    }

    tracing::debug!(level = %config.level, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_configured_levels() {
        for level in ["trace", "debug", "INFO", "warn", "error", "off"] {
            let config = LoggingConfig {
                level: level.to_string(),
                file: String::new(),
            };
            assert!(build_filter(&config).is_ok(), "level {level}");
        }
    }

    #[test]
    fn test_init_logging_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memscope.log");
        let config = LoggingConfig {
            level: "debug".to_string(),
            file: path.display().to_string(),
        };

        // Another test may already own the global subscriber
        if init_logging(&config).is_ok() {
            tracing::info!("written to file");
            assert!(path.exists());
        }
    }
}
