//! On-disk access to a settings file.
//!
//! Every operation opens the file, reads or writes it completely, and closes
//! it before returning, including when decoding fails.
//!
//! Saving deletes the existing file and writes a fresh one. There is no
//! atomic rename, so an interrupted save can leave the file missing or
//! truncated.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::log::Logger;
use crate::settings::{SettingsDocument, StageOverrides};
use crate::tree::Decoder;
use crate::{Error, Result};

/// File name the game uses for mod settings.
pub const DEFAULT_SETTINGS_FILE: &str = "mod-settings.dat";

/// Suffix appended to the settings file name for backups.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// A settings file at a fixed path.
#[derive(Clone)]
pub struct SettingsStore {
    path: PathBuf,
    decoder: Decoder,
    logger: Arc<dyn Logger>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("path", &self.path)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>, decoder: Decoder, logger: Arc<dyn Logger>) -> Self {
        Self {
            path: path.into(),
            decoder,
            logger,
        }
    }

    /// A store for `file_name` inside a mod directory.
    pub fn in_mod_directory(
        mod_directory: &Path,
        file_name: &str,
        decoder: Decoder,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::new(mod_directory.join(file_name), decoder, logger)
    }

    /// A store for another file next to this one, sharing decoder and logger.
    pub fn sibling(&self, file_name: &str) -> Self {
        let path = match self.path.parent() {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        };
        Self::new(path, self.decoder, Arc::clone(&self.logger))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Path of the backup copy for `suffix`.
    pub fn backup_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Read and decode the settings file.
    pub fn load(&self) -> Result<SettingsDocument> {
        let bytes = read_file(&self.path)?;
        match SettingsDocument::decode(&bytes, &self.decoder) {
            Ok(doc) => {
                self.logger.info(&format!(
                    "Loaded {} (version {})",
                    self.path.display(),
                    doc.version()
                ));
                Ok(doc)
            }
            Err(e) => {
                self.logger
                    .error(&format!("Failed to decode {}: {}", self.path.display(), e));
                Err(e)
            }
        }
    }

    /// Encode `doc` and replace the settings file with it.
    pub fn save(&self, doc: &SettingsDocument) -> Result<()> {
        let bytes = doc.encode()?;
        replace_file(&self.path, &bytes)?;
        self.logger.info(&format!(
            "Wrote {} (version {})",
            self.path.display(),
            doc.version()
        ));
        Ok(())
    }

    /// Apply a batch of overrides to `doc`, stopping at the first failure.
    ///
    /// Returns the number of settings written.
    pub fn apply(&self, doc: &mut SettingsDocument, overrides: &StageOverrides) -> Result<usize> {
        let mut applied = 0;
        for (stage, name, value) in overrides.to_property_values()? {
            if let Err(e) = doc.set_setting(stage, name, value) {
                self.logger.error(&format!("Failed to set {}: {}", name, e));
                return Err(e);
            }
            applied += 1;
        }
        self.logger
            .info(&format!("Applied {} setting(s) to {}", applied, self.path.display()));
        Ok(applied)
    }

    /// Copy the current settings file to its backup path.
    pub fn backup(&self, suffix: &str) -> Result<PathBuf> {
        let bytes = read_file(&self.path)?;
        // Refuse to back up something that isn't a settings file.
        SettingsDocument::decode(&bytes, &self.decoder)?;
        let backup = self.backup_path(suffix);
        replace_file(&backup, &bytes)?;
        self.logger.info(&format!(
            "Backed up {} to {}",
            self.path.display(),
            backup.display()
        ));
        Ok(backup)
    }

    /// Write the backup copy back over the settings file.
    pub fn restore(&self, suffix: &str) -> Result<PathBuf> {
        let backup = self.backup_path(suffix);
        let bytes = read_file(&backup)?;
        SettingsDocument::decode(&bytes, &self.decoder)?;
        replace_file(&self.path, &bytes)?;
        self.logger.info(&format!(
            "Restored {} from {}",
            self.path.display(),
            backup.display()
        ));
        Ok(backup)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::NotFound(format!("settings file {}", path.display())),
        _ => Error::Io(e),
    })
}

/// Delete `path` if present, then write `bytes` to a fresh file.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(Error::Io(e)),
    }
    fs::write(path, bytes)?;
    Ok(())
}
