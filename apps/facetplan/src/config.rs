//! # Server Configuration File
//!
//! Optional `facetplan.toml` read by `facetplan server`:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [preferences]
//! path = "preferences.json"
//! ```
//!
//! Every key is optional. Command-line flags take precedence over the file.

use facetplan_core::FacetError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "facetplan.toml";

/// Maximum configuration file size (64 KiB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub preferences: PreferencesSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreferencesSection {
    pub path: Option<PathBuf>,
}

impl FileConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self, FacetError> {
        toml::from_str(raw)
            .map_err(|e| FacetError::SerializationError(format!("Invalid configuration: {}", e)))
    }

    /// Read configuration from a file.
    pub fn load(path: &Path) -> Result<Self, FacetError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            FacetError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(FacetError::IoError(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            FacetError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&raw)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load an explicit config file, or `facetplan.toml` when it exists.
    ///
    /// A missing default file yields the empty configuration; a missing
    /// explicit file is an error.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, FacetError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Effective server settings after merging flags over the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub preferences: Option<PathBuf>,
}

impl ServerSettings {
    /// Merge command-line values over the file configuration.
    #[must_use]
    pub fn resolve(
        file: FileConfig,
        host: Option<String>,
        port: Option<u16>,
        preferences: Option<PathBuf>,
    ) -> Self {
        Self {
            host: host
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            preferences: preferences.or(file.preferences.path),
        }
    }

    /// `host:port` bind address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================
