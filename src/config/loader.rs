//! Configuration loader for memscope
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub pattern: PatternConfig,

    #[serde(default)]
    pub pointer: PointerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Value scan configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_scan_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_alignment")]
    pub alignment: usize,
    #[serde(default = "default_progress_step")]
    pub progress_step_percent: u8,
}

/// Pattern search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default = "default_pattern_max_results")]
    pub max_results: usize,
    #[serde(default = "default_pattern_chunk_size")]
    pub chunk_size: usize,
}

/// Pointer chain configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerConfig {
    /// Pointer width of the target in bits, 32 or 64
    #[serde(default = "default_pointer_width")]
    pub pointer_width: u32,
    #[serde(default = "default_max_offset")]
    pub max_offset: u64,
    #[serde(default = "default_pointer_max_results")]
    pub max_results: usize,
    #[serde(default = "default_pointer_chunk_size")]
    pub chunk_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path; empty logs to stderr
    #[serde(default = "default_log_file")]
    pub file: String,
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration or returns defaults if file doesn't exist
    pub fn load_or_default(&self) -> Config {
        self.load().unwrap_or_else(|_| Config::default())
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    let loader = ConfigLoader::new("memscope.toml");
    Ok(loader.load_or_default())
}

impl Default for ScannerConfig {
    fn default() -> Self {
        let defaults = default_config();
        ScannerConfig {
            chunk_size: defaults.scanner.chunk_size,
            alignment: defaults.scanner.alignment,
            progress_step_percent: defaults.scanner.progress_step_percent,
        }
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        let defaults = default_config();
        PatternConfig {
            max_results: defaults.pattern.max_results,
            chunk_size: defaults.pattern.chunk_size,
        }
    }
}

impl Default for PointerConfig {
    fn default() -> Self {
        let defaults = default_config();
        PointerConfig {
            pointer_width: defaults.pointer.pointer_width,
            max_offset: defaults.pointer.max_offset,
            max_results: defaults.pointer.max_results,
            chunk_size: defaults.pointer.chunk_size,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let defaults = default_config();
        LoggingConfig {
            level: defaults.logging.level,
            file: defaults.logging.file,
        }
    }
}

// Individual field defaults
fn default_scan_chunk_size() -> usize {
    default_config().scanner.chunk_size
}

fn default_alignment() -> usize {
    default_config().scanner.alignment
}

fn default_progress_step() -> u8 {
    default_config().scanner.progress_step_percent
}

fn default_pattern_max_results() -> usize {
    default_config().pattern.max_results
}

fn default_pattern_chunk_size() -> usize {
    default_config().pattern.chunk_size
}

fn default_pointer_width() -> u32 {
    default_config().pointer.pointer_width
}

fn default_max_offset() -> u64 {
    default_config().pointer.max_offset
}

fn default_pointer_max_results() -> usize {
    default_config().pointer.max_results
}

fn default_pointer_chunk_size() -> usize {
    default_config().pointer.chunk_size
}

fn default_log_level() -> String {
    default_config().logging.level
}

fn default_log_file() -> String {
    default_config().logging.file
}
