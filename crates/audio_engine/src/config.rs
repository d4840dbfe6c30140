//! Audio configuration
//!
//! Serde-backed settings for the subsystem, loadable from TOML or RON
//! files. Configuration is read once during subsystem start-up, before
//! any gameplay code requests playback; in particular the pool capacity
//! cannot change after the first request.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::backend::BackendConfig;
use crate::pool::DEFAULT_CAPACITY;

/// Top-level audio subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Admission-control settings for the source pool
    pub pool: PoolConfig,
    /// Native backend settings
    pub backend: BackendConfig,
}

/// Source pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of simultaneous playback channels
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl AudioConfig {
    /// Load configuration from a `.toml` or `.ron` file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to a `.toml` or `.ron` file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialize(String),

    /// Unsupported file extension
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AudioConfig::default();
        assert_eq!(config.pool.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.backend.sample_rate, 44100);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AudioConfig::default();
        config.pool.capacity = 12;
        config.backend.sample_rate = 48000;

        let text = toml::to_string_pretty(&config).unwrap();
        let loaded: AudioConfig = toml::from_str(&text).unwrap();
        assert_eq!(loaded.pool.capacity, 12);
        assert_eq!(loaded.backend.sample_rate, 48000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let loaded: AudioConfig = toml::from_str("[pool]\ncapacity = 4\n").unwrap();
        assert_eq!(loaded.pool.capacity, 4);
        assert_eq!(loaded.backend.channels, 2);
    }

    #[test]
    fn test_file_round_trip_and_format_detection() {
        let dir = std::env::temp_dir();
        let path = dir.join("audio_engine_config_test.toml");

        let mut config = AudioConfig::default();
        config.pool.capacity = 6;
        config.save_to_file(&path).unwrap();

        let loaded = AudioConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.pool.capacity, 6);

        let bad = dir.join("audio_engine_config_test.yaml");
        std::fs::write(&bad, "pool: {}").unwrap();
        assert!(matches!(
            AudioConfig::load_from_file(&bad),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(bad);
    }
}
