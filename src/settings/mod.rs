//! The mod settings domain layer.
//!
//! - [`document`] - the three-stage [`SettingsDocument`] with validated get/set
//! - [`store`] - reading and writing settings files, backups, batch updates
//! - [`overrides`] - stage-keyed batches of native values

pub mod document;
pub mod overrides;
pub mod store;

pub use document::{SettingsDocument, Stage, StageSettings, Version};
pub use overrides::StageOverrides;
pub use store::{DEFAULT_BACKUP_SUFFIX, DEFAULT_SETTINGS_FILE, SettingsStore};
