//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (or their environment variables, handled by clap)
//! 2. config.kdl (`--config`, `MODSETTINGS_CONFIG`, or `~/.config/modsettings/config.kdl`)
//! 3. Values derived from other settings (mod directory = `<user data>/mods`)
//! 4. Built-in defaults

use std::fs;
use std::path::{Path, PathBuf};

use kdl::KdlDocument;

use crate::config::{ModSettingsConfig, OutputFormat};
use crate::settings::{DEFAULT_BACKUP_SUFFIX, DEFAULT_SETTINGS_FILE};
use crate::tree::DEFAULT_MAX_DEPTH;
use crate::{Error, Result};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "MODSETTINGS_CONFIG";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from a CLI flag or its environment variable
    CliFlag,
    /// Value from the config file at the given path
    ConfigFile(String),
    /// Value derived from another resolved value
    Derived,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::ConfigFile(path) => write!(f, "config:{}", path),
            ValueSource::Derived => write!(f, "derived"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub user_data_directory: Resolved<PathBuf>,
    pub mod_directory: Resolved<PathBuf>,
    pub settings_file: Resolved<String>,
    pub max_depth: Resolved<usize>,
    pub output_format: Resolved<OutputFormat>,
    pub log_file: Option<Resolved<PathBuf>>,
    pub backup_suffix: Resolved<String>,
}

impl ResolvedConfig {
    /// Full path of the settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.mod_directory.value.join(&self.settings_file.value)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth.value
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_ref().map(|r| r.value.as_path())
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub user_data_directory: Option<PathBuf>,
    pub mod_directory: Option<PathBuf>,
    pub settings_file: Option<String>,
    pub max_depth: Option<usize>,
    pub output_format: Option<OutputFormat>,
    pub log_file: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_data_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_directory = Some(dir.into());
        self
    }

    pub fn with_mod_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mod_directory = Some(dir.into());
        self
    }

    pub fn with_settings_file(mut self, name: impl Into<String>) -> Self {
        self.settings_file = Some(name.into());
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// The overrides as a config file would hold them.
    pub fn to_config(&self) -> ModSettingsConfig {
        ModSettingsConfig {
            user_data_directory: self.user_data_directory.clone(),
            mod_directory: self.mod_directory.clone(),
            settings_file: self.settings_file.clone(),
            max_depth: self.max_depth,
            output_format: self.output_format,
            log_file: self.log_file.clone(),
            backup_suffix: None,
        }
    }
}

/// A loaded config file and where it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: ModSettingsConfig,
    pub path: Option<PathBuf>,
}

/// Default location of config.kdl.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("modsettings").join("config.kdl"))
}

/// Default game user data directory for this platform.
pub fn default_user_data_directory() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::config_dir().map(|d| d.join("Factorio"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir().map(|d| d.join("factorio"))
    } else {
        dirs::home_dir().map(|d| d.join(".factorio"))
    }
}

/// Expand ~ in path to home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// The config file to use: `explicit` if given, else the default location.
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(expand_home(path)),
        None => default_config_path(),
    }
}

/// Read a config file.
///
/// An explicitly named file must exist. The default location is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let required = explicit.is_some();
    let Some(path) = config_file_path(explicit) else {
        return Ok(LoadedConfig::default());
    };

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            return Ok(LoadedConfig::default());
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let doc: KdlDocument = text
        .parse()
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    let config = ModSettingsConfig::from_kdl(&doc);
    config
        .validate()
        .map_err(|msg| Error::Config(format!("{}: {}", path.display(), msg)))?;

    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(LoadedConfig {
        config,
        path: Some(path),
    })
}

/// Merge `overrides` over `base` and write the result to `path`.
pub fn save_config(
    path: &Path,
    base: &ModSettingsConfig,
    overrides: &ConfigOverrides,
) -> Result<ModSettingsConfig> {
    let mut config = base.clone();
    config.merge(&overrides.to_config());
    config
        .validate()
        .map_err(|msg| Error::Config(format!("{}: {}", path.display(), msg)))?;

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let mut doc = config.to_kdl();
    doc.autoformat();
    fs::write(path, doc.to_string())?;

    tracing::debug!(path = %path.display(), "saved config file");
    Ok(config)
}

/// Resolve configuration with full precedence chain.
pub fn resolve_config(
    loaded: &LoadedConfig,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let file_source = || {
        ValueSource::ConfigFile(
            loaded
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        )
    };
    let config = &loaded.config;

    let user_data_directory = if let Some(ref dir) = overrides.user_data_directory {
        Resolved::new(expand_home(dir), ValueSource::CliFlag)
    } else if let Some(ref dir) = config.user_data_directory {
        Resolved::new(expand_home(dir), file_source())
    } else {
        let dir = default_user_data_directory().ok_or_else(|| {
            Error::Config(
                "could not determine the user data directory; pass --user-data-directory"
                    .to_string(),
            )
        })?;
        Resolved::new(dir, ValueSource::Default)
    };

    let mod_directory = if let Some(ref dir) = overrides.mod_directory {
        Resolved::new(expand_home(dir), ValueSource::CliFlag)
    } else if let Some(ref dir) = config.mod_directory {
        Resolved::new(expand_home(dir), file_source())
    } else {
        Resolved::new(user_data_directory.value.join("mods"), ValueSource::Derived)
    };

    let settings_file = if let Some(ref name) = overrides.settings_file {
        Resolved::new(name.clone(), ValueSource::CliFlag)
    } else if let Some(ref name) = config.settings_file {
        Resolved::new(name.clone(), file_source())
    } else {
        Resolved::new(DEFAULT_SETTINGS_FILE.to_string(), ValueSource::Default)
    };

    let max_depth = if let Some(depth) = overrides.max_depth {
        Resolved::new(depth, ValueSource::CliFlag)
    } else if let Some(depth) = config.max_depth {
        Resolved::new(depth, file_source())
    } else {
        Resolved::new(DEFAULT_MAX_DEPTH, ValueSource::Default)
    };

    let output_format = if let Some(format) = overrides.output_format {
        Resolved::new(format, ValueSource::CliFlag)
    } else if let Some(format) = config.output_format {
        Resolved::new(format, file_source())
    } else {
        Resolved::new(OutputFormat::Json, ValueSource::Default)
    };

    let log_file = if let Some(ref path) = overrides.log_file {
        Some(Resolved::new(expand_home(path), ValueSource::CliFlag))
    } else {
        config
            .log_file
            .as_ref()
            .map(|path| Resolved::new(expand_home(path), file_source()))
    };

    let backup_suffix = match config.backup_suffix {
        Some(ref suffix) => Resolved::new(suffix.clone(), file_source()),
        None => Resolved::new(DEFAULT_BACKUP_SUFFIX.to_string(), ValueSource::Default),
    };

    // CLI values get the same checks as the config file.
    ModSettingsConfig {
        settings_file: Some(settings_file.value.clone()),
        max_depth: Some(max_depth.value),
        ..Default::default()
    }
    .validate()
    .map_err(Error::Config)?;

    Ok(ResolvedConfig {
        user_data_directory,
        mod_directory,
        settings_file,
        max_depth,
        output_format,
        log_file,
        backup_suffix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn loaded(config: ModSettingsConfig) -> LoadedConfig {
        LoadedConfig {
            config,
            path: Some(PathBuf::from("/etc/modsettings.kdl")),
        }
    }

    // ==================== ValueSource Tests ====================

    #[test]
    fn test_value_source_display() {
        assert_eq!(format!("{}", ValueSource::CliFlag), "cli");
        assert_eq!(format!("{}", ValueSource::Derived), "derived");
        assert_eq!(format!("{}", ValueSource::Default), "default");
        assert_eq!(
            format!("{}", ValueSource::ConfigFile("/a/config.kdl".to_string())),
            "config:/a/config.kdl"
        );
    }

    // ==================== Resolution Tests ====================

    #[test]
    fn test_resolve_defaults_with_user_data_override() {
        let overrides = ConfigOverrides::new().with_user_data_directory("/games/factorio");
        let config = resolve_config(&LoadedConfig::default(), &overrides).unwrap();

        assert_eq!(config.user_data_directory.source, ValueSource::CliFlag);
        assert_eq!(config.mod_directory.value, PathBuf::from("/games/factorio/mods"));
        assert_eq!(config.mod_directory.source, ValueSource::Derived);
        assert_eq!(config.settings_file.value, "mod-settings.dat");
        assert_eq!(config.max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.backup_suffix.value, ".bak");
        assert!(config.log_file.is_none());
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/games/factorio/mods/mod-settings.dat")
        );
    }

    #[test]
    fn test_resolve_from_config_file() {
        let file = ModSettingsConfig {
            mod_directory: Some(PathBuf::from("/srv/mods")),
            settings_file: Some("other.dat".to_string()),
            max_depth: Some(12),
            output_format: Some(OutputFormat::Human),
            ..Default::default()
        };
        let overrides = ConfigOverrides::new().with_user_data_directory("/unused");
        let config = resolve_config(&loaded(file), &overrides).unwrap();

        assert_eq!(config.mod_directory.value, PathBuf::from("/srv/mods"));
        assert_eq!(
            config.mod_directory.source,
            ValueSource::ConfigFile("/etc/modsettings.kdl".to_string())
        );
        assert_eq!(config.settings_file.value, "other.dat");
        assert_eq!(config.max_depth(), 12);
        assert_eq!(config.output_format(), OutputFormat::Human);
    }

    #[test]
    fn test_resolve_cli_overrides_config_file() {
        let file = ModSettingsConfig {
            mod_directory: Some(PathBuf::from("/srv/mods")),
            max_depth: Some(12),
            log_file: Some(PathBuf::from("/tmp/a.log")),
            ..Default::default()
        };
        let overrides = ConfigOverrides::new()
            .with_user_data_directory("/data")
            .with_mod_directory("/cli/mods")
            .with_max_depth(5)
            .with_output_format(OutputFormat::Human)
            .with_log_file("/tmp/b.log");
        let config = resolve_config(&loaded(file), &overrides).unwrap();

        assert_eq!(config.mod_directory.value, PathBuf::from("/cli/mods"));
        assert_eq!(config.mod_directory.source, ValueSource::CliFlag);
        assert_eq!(config.max_depth(), 5);
        assert_eq!(config.log_file(), Some(Path::new("/tmp/b.log")));
    }

    #[test]
    fn test_resolve_rejects_invalid_cli_values() {
        let overrides = ConfigOverrides::new()
            .with_user_data_directory("/data")
            .with_max_depth(0);
        assert!(matches!(
            resolve_config(&LoadedConfig::default(), &overrides),
            Err(Error::Config(_))
        ));

        let overrides = ConfigOverrides::new()
            .with_user_data_directory("/data")
            .with_settings_file("../escape.dat");
        assert!(matches!(
            resolve_config(&LoadedConfig::default(), &overrides),
            Err(Error::Config(_))
        ));
    }

    // ==================== Loading Tests ====================

    #[test]
    fn test_load_explicit_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        fs::write(&path, "settings-file \"x.dat\"\nmax-depth 9\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.settings_file.as_deref(), Some("x.dat"));
        assert_eq!(loaded.config.max_depth, Some(9));
    }

    #[test]
    fn test_load_missing_explicit_config_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.kdl");
        assert!(matches!(load_config(Some(&path)), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_invalid_kdl_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        fs::write(&path, "max-depth {{{").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_invalid_values_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        fs::write(&path, "max-depth 0\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("max-depth must be"));
    }

    // ==================== Saving Tests ====================

    #[test]
    fn test_save_config_merges_overrides_over_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.kdl");
        let base = ModSettingsConfig {
            settings_file: Some("x.dat".into()),
            max_depth: Some(9),
            ..Default::default()
        };
        let overrides = ConfigOverrides::default().with_max_depth(12);

        let saved = save_config(&path, &base, &overrides).unwrap();
        assert_eq!(saved.settings_file.as_deref(), Some("x.dat"));
        assert_eq!(saved.max_depth, Some(12));

        let reloaded = load_config(Some(&path)).unwrap();
        assert_eq!(reloaded.config, saved);
    }

    #[test]
    fn test_save_config_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        let overrides = ConfigOverrides::default().with_max_depth(0);

        let err = save_config(&path, &ModSettingsConfig::default(), &overrides).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_config_file_path_prefers_explicit() {
        let explicit = Path::new("/etc/modsettings.kdl");
        assert_eq!(config_file_path(Some(explicit)), Some(explicit.to_path_buf()));
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
    }
}
