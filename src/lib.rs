//! modsettings - Read and edit Factorio `mod-settings.dat` files.
//!
//! The library is split into layers, leaves first:
//! - [`codec`] - little-endian primitive readers/writers over an explicit cursor
//! - [`tree`] - the 8-kind property tree value plus its decoder and encoder
//! - [`settings`] - the three-stage settings document and its on-disk store
//!
//! The [`cli`], [`commands`] and [`config`] modules back the `modsettings` binary.

pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod log;
pub mod settings;
pub mod tree;

pub use settings::{SettingsDocument, SettingsStore, Stage, Version};
pub use tree::{Decoder, PropertyType, PropertyValue, ValueKind};

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    use crate::log::{LogLevel, Logger};

    /// Logger that keeps every event in memory so tests can assert on them.
    #[derive(Debug, Default)]
    pub struct MemoryLogger {
        pub events: Mutex<Vec<(LogLevel, String)>>,
    }

    impl MemoryLogger {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn messages(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl Logger for MemoryLogger {
        fn log(&self, level: LogLevel, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        }
    }

    /// A temporary mod directory for store tests.
    pub struct TestEnv {
        pub mod_dir: TempDir,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self {
                mod_dir: TempDir::new().unwrap(),
            }
        }

        pub fn path(&self) -> &Path {
            self.mod_dir.path()
        }

        pub fn settings_path(&self) -> PathBuf {
            self.path().join("mod-settings.dat")
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Library-level error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },

    #[error("String is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Unknown property tree type tag: {0}")]
    UnknownTypeTag(u8),

    #[error("Property tree nesting exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("Corrupt settings file: {0}")]
    CorruptFile(String),

    #[error("Setting {name} is a {found} setting, not a {requested} setting")]
    WrongStage {
        name: String,
        found: String,
        requested: String,
    },

    #[error("Setting {name} should be of type {expected}, got {got}")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        got: ValueKind,
    },

    #[error("{0} is not a valid setting stage")]
    InvalidStage(String),

    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for settings operations.
pub type Result<T> = std::result::Result<T, Error>;
