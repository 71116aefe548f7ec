//! Analyzer configuration
//!
//! Limits for the reassembly buffers and the certificate scanner, stored as
//! JSON. Every field has a default so partial files are accepted.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "BIP_TLS_TRACE_CONFIG";

const CONFIG_DIR: &str = "bip-tls-trace";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Per-direction reassembly buffer cap; overflowing clears the buffer
    pub max_buffer_bytes: usize,
    /// Largest handshake body accepted before the assembler resynchronises
    pub max_handshake_message_len: usize,
    /// Smallest DER SEQUENCE the certificate scanner tries to decode
    pub min_der_certificate_len: usize,
    /// Scan raw handshake bytes when no Certificate message was assembled
    pub certificate_scan_fallback: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: 256 * 1024,
            max_handshake_message_len: 256 * 1024,
            min_der_certificate_len: 256,
            certificate_scan_fallback: true,
        }
    }
}

impl AnalyzerConfig {
    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded analyzer config from {:?}", path);
        Ok(config)
    }

    /// Location checked by [`AnalyzerConfig::discover`]
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the config from the default location, falling back to defaults
    pub fn discover() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        }
    }

    /// Load `path` if it exists; a broken file is logged and ignored
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!("No analyzer config at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}", e);
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)?;
        debug!("Saved analyzer config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.max_buffer_bytes, 262_144);
        assert_eq!(config.max_handshake_message_len, 262_144);
        assert_eq!(config.min_der_certificate_len, 256);
        assert!(config.certificate_scan_fallback);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"min_der_certificate_len": 512}"#).unwrap();

        let config = AnalyzerConfig::load(&path).unwrap();
        assert_eq!(config.min_der_certificate_len, 512);
        assert_eq!(config.max_buffer_bytes, 262_144);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");
        let config = AnalyzerConfig {
            certificate_scan_fallback: false,
            ..AnalyzerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AnalyzerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_broken_file_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(AnalyzerConfig::load(&path), Err(ConfigError::Parse { .. })));
        assert_eq!(AnalyzerConfig::load_or_default(&path), AnalyzerConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");
        assert!(matches!(AnalyzerConfig::load(&path), Err(ConfigError::Io { .. })));
        assert_eq!(AnalyzerConfig::load_or_default(&path), AnalyzerConfig::default());
    }
}
