//! Vault configuration with a TOML file provider.

use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::VaultError;

/// Configuration for one vault.
///
/// `echo_ttl_ms` bounds how long a self-originated write is recognized when
/// it echoes back from the filesystem. It must exceed the platform's real
/// write+notify round-trip latency; 300 ms covers typical native watchers
/// with margin. See [`crate::echo`] for the trade-off this encodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault root directory; node IDs are paths relative to it.
    pub root: PathBuf,
    #[serde(default = "default_echo_ttl_ms")]
    pub echo_ttl_ms: u64,
    /// Debounce window for the file watcher (`service` feature).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Directory names skipped during loading and watching, in addition to
    /// dot-directories and the built-in exclusions.
    #[serde(default)]
    pub excluded_dirs: Vec<String>,
}

fn default_echo_ttl_ms() -> u64 {
    300
}

fn default_debounce_ms() -> u64 {
    300
}

impl VaultConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        VaultConfig {
            root: root.into(),
            echo_ttl_ms: default_echo_ttl_ms(),
            debounce_ms: default_debounce_ms(),
            excluded_dirs: Vec::new(),
        }
    }

    pub fn echo_ttl(&self) -> Duration {
        Duration::from_millis(self.echo_ttl_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VaultError> {
        tracing::debug!("Reading vault config from {:?}", path.as_ref());
        let content = read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), VaultError> {
        tracing::debug!("Writing vault config to {:?}", path.as_ref());
        let toml_string = toml::to_string(self)?;
        Ok(write(path, toml_string)?)
    }
}
