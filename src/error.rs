use std::{fmt, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "service")]
use notify::{Error as NotifyError, ErrorKind as NotifyErrorKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum VaultError {
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("File system error: {0}")]
    Io(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Watch service error: {0}")]
    Watch(String),
}

impl From<io::Error> for VaultError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => VaultError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => VaultError::PermissionDenied,
            _ => VaultError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for VaultError {
    fn from(x: fmt::Error) -> Self {
        VaultError::Codec(format!("{x}"))
    }
}

impl From<serde_yaml::Error> for VaultError {
    fn from(src: serde_yaml::Error) -> VaultError {
        VaultError::Serialization(format!("YAML (de)serialization error: {src}"))
    }
}

impl From<toml::de::Error> for VaultError {
    fn from(src: toml::de::Error) -> VaultError {
        VaultError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for VaultError {
    fn from(src: toml::ser::Error) -> VaultError {
        VaultError::Serialization(format!("Toml serialization error: {src}"))
    }
}

#[cfg(feature = "service")]
impl From<NotifyError> for VaultError {
    fn from(notify_error: NotifyError) -> Self {
        match notify_error.kind {
            NotifyErrorKind::Generic(msg) => VaultError::Watch(format!(
                "notify-debouncer: {}, paths: {:?}",
                msg, notify_error.paths
            )),
            NotifyErrorKind::Io(io_error) => VaultError::Watch(format!(
                "notify-debouncer: io error {}, paths: {:?}",
                io_error.kind(),
                notify_error.paths
            )),
            NotifyErrorKind::PathNotFound => VaultError::NotFound(format!(
                "notify-debouncer: path(s) not found: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::WatchNotFound => VaultError::NotFound(format!(
                "notify-debouncer: watch not found, paths: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::InvalidConfig(_) => {
                VaultError::Watch("notify-debouncer invalid config".to_string())
            }
            NotifyErrorKind::MaxFilesWatch => {
                VaultError::Watch("notify-debouncer max file watch limit reached".to_string())
            }
        }
    }
}
