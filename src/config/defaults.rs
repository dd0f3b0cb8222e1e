//! Default configuration values for memscope

use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub scanner: ScannerDefaults,
    pub pattern: PatternDefaults,
    pub pointer: PointerDefaults,
    pub logging: LoggingDefaults,
}

/// Default value scan configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub chunk_size: usize,
    pub alignment: usize,
    pub progress_step_percent: u8,
}

/// Default pattern search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDefaults {
    pub max_results: usize,
    pub chunk_size: usize,
}

/// Default pointer chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerDefaults {
    pub pointer_width: u32,
    pub max_offset: u64,
    pub max_results: usize,
    pub chunk_size: usize,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    pub file: String,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        scanner: ScannerDefaults {
            chunk_size: 4096, // one page
            alignment: 4,
            progress_step_percent: 1,
        },
        pattern: PatternDefaults {
            max_results: 1000,
            chunk_size: 65536, // 64KB
        },
        pointer: PointerDefaults {
            pointer_width: 64,
            max_offset: 4096,
            max_results: 1000,
            chunk_size: 65536,
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
            // empty = stderr
            file: String::new(),
        },
    }
}
