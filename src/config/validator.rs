//! Configuration validator for memscope
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LoggingConfig, PatternConfig, PointerConfig, ScannerConfig};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_pattern(&config.pattern)?;
        Self::validate_pointer(&config.pointer)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates value scan configuration
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        validate_chunk_size("Scanner", scanner.chunk_size)?;

        if scanner.alignment == 0 {
            return Err(ConfigError::Invalid(
                "Scan alignment must be at least 1".to_string(),
            ));
        }

        if scanner.progress_step_percent == 0 || scanner.progress_step_percent > 100 {
            return Err(ConfigError::Invalid(format!(
                "Progress step must be between 1 and 100, got {}",
                scanner.progress_step_percent
            )));
        }

        Ok(())
    }

    /// Validates pattern search configuration
    fn validate_pattern(pattern: &PatternConfig) -> Result<(), ConfigError> {
        validate_chunk_size("Pattern", pattern.chunk_size)?;

        if pattern.max_results == 0 {
            return Err(ConfigError::Invalid(
                "Pattern max results must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates pointer chain configuration
    fn validate_pointer(pointer: &PointerConfig) -> Result<(), ConfigError> {
        if pointer.pointer_width != 32 && pointer.pointer_width != 64 {
            return Err(ConfigError::Invalid(format!(
                "Pointer width must be 32 or 64, got {}",
                pointer.pointer_width
            )));
        }

        validate_chunk_size("Pointer", pointer.chunk_size)?;

        if pointer.max_results == 0 {
            return Err(ConfigError::Invalid(
                "Pointer max results must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

// Chunk sizes must be a power of 2 so chunks stay page aligned
fn validate_chunk_size(section: &str, chunk_size: usize) -> Result<(), ConfigError> {
    if chunk_size == 0 || !chunk_size.is_power_of_two() {
        return Err(ConfigError::Invalid(format!(
            "{} chunk size must be a power of 2",
            section
        )));
    }
    Ok(())
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut config = Config::default();
        config.scanner.chunk_size = 0;
        assert!(validate_config(&config).is_err());

        config.scanner.chunk_size = 1000; // Not power of 2
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Scanner chunk size"));

        let mut config = Config::default();
        config.pattern.chunk_size = 3;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_alignment_and_step() {
        let mut config = Config::default();
        config.scanner.alignment = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.scanner.progress_step_percent = 0;
        assert!(validate_config(&config).is_err());

        config.scanner.progress_step_percent = 101;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_pointer_width() {
        let mut config = Config::default();
        config.pointer.pointer_width = 16;
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Pointer width"));
    }

    #[test]
    fn test_zero_result_caps() {
        let mut config = Config::default();
        config.pattern.max_results = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.pointer.max_results = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("log level"));
    }

    #[test]
    fn test_edge_cases() {
        let mut config = Config::default();

        // Test minimum valid values
        config.scanner.chunk_size = 1;
        config.scanner.alignment = 1;
        config.scanner.progress_step_percent = 1;
        config.pattern.max_results = 1;
        config.pointer.pointer_width = 32;
        config.pointer.max_offset = 0;
        config.logging.level = "TRACE".to_string();

        assert!(validate_config(&config).is_ok());

        // Test maximum valid values
        config.scanner.progress_step_percent = 100;
        config.scanner.chunk_size = 1 << 30;

        assert!(validate_config(&config).is_ok());
    }
}
