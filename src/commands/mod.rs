//! Command implementations for the modsettings CLI.
//!
//! Each command takes the resolved configuration and a logger, does its work
//! through a [`SettingsStore`], and returns a result that can be printed as
//! JSON or as human-readable text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::{
    ConfigOverrides, LoadedConfig, ModSettingsConfig, ResolvedConfig, ValueSource,
};
use crate::log::Logger;
use crate::settings::{SettingsDocument, SettingsStore, StageOverrides, Version};
use crate::tree::{Decoder, PropertyValue, ValueKind};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Everything a command needs to reach the settings file.
pub struct Context {
    pub config: ResolvedConfig,
    pub logger: Arc<dyn Logger>,
}

impl Context {
    pub fn new(config: ResolvedConfig, logger: Arc<dyn Logger>) -> Self {
        Self { config, logger }
    }

    pub fn decoder(&self) -> Decoder {
        Decoder::with_max_depth(self.config.max_depth())
    }

    /// Store for the configured settings file.
    pub fn store(&self) -> SettingsStore {
        SettingsStore::in_mod_directory(
            &self.config.mod_directory.value,
            &self.config.settings_file.value,
            self.decoder(),
            Arc::clone(&self.logger),
        )
    }
}

/// Parse a command-line value: JSON if it parses, otherwise a plain string.
pub fn parse_value(text: &str) -> Result<PropertyValue> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(native) => PropertyValue::from_native(&native),
        Err(_) => Ok(PropertyValue::string(text)),
    }
}

// === show ===

#[derive(Serialize)]
pub struct SettingEntry {
    pub name: String,
    pub kind: ValueKind,
    pub value: PropertyValue,
}

#[derive(Serialize)]
pub struct StageView {
    pub name: String,
    pub settings: Vec<SettingEntry>,
}

#[derive(Serialize)]
pub struct ShowResult {
    pub path: PathBuf,
    pub version: Version,
    pub stages: Vec<StageView>,
}

impl Output for ShowResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("{} (version {})", self.path.display(), self.version)];
        for stage in &self.stages {
            lines.push(String::new());
            lines.push(format!("{} ({} settings)", stage.name, stage.settings.len()));
            for entry in &stage.settings {
                lines.push(format!("  {} = {} [{}]", entry.name, entry.value, entry.kind));
            }
        }
        lines.join("\n")
    }
}

/// Show the file version and every setting.
pub fn show(ctx: &Context) -> Result<ShowResult> {
    let store = ctx.store();
    let doc = store.load()?;
    let stages = doc
        .stages()
        .iter()
        .map(|stage| StageView {
            name: stage.name.clone(),
            settings: stage
                .values()
                .map(|(name, value)| SettingEntry {
                    name: name.to_string(),
                    kind: value.kind(),
                    value: value.clone(),
                })
                .collect(),
        })
        .collect();
    Ok(ShowResult {
        path: store.path().to_path_buf(),
        version: doc.version(),
        stages,
    })
}

// === get ===

#[derive(Serialize)]
pub struct GetResult {
    pub stage: String,
    pub name: String,
    pub kind: ValueKind,
    pub value: PropertyValue,
}

impl Output for GetResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        self.value.to_string()
    }
}

/// Read one setting.
pub fn get(ctx: &Context, stage: &str, name: &str) -> Result<GetResult> {
    let doc = ctx.store().load()?;
    let value = doc
        .get_setting(stage, name)
        .ok_or_else(|| Error::NotFound(format!("setting '{}' in stage '{}'", name, stage)))?;
    Ok(GetResult {
        stage: stage.to_string(),
        name: name.to_string(),
        kind: value.kind(),
        value: value.clone(),
    })
}

// === set ===

#[derive(Debug, Serialize)]
pub struct SetResult {
    pub stage: String,
    pub name: String,
    pub value: PropertyValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<PropertyValue>,
    pub path: PathBuf,
}

impl Output for SetResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        match self.previous {
            Some(ref previous) => format!(
                "Set {}/{} = {} (was {})\nWrote {}",
                self.stage,
                self.name,
                self.value,
                previous,
                self.path.display()
            ),
            None => format!(
                "Added {}/{} = {}\nWrote {}",
                self.stage,
                self.name,
                self.value,
                self.path.display()
            ),
        }
    }
}

/// Set one setting and save the file, or write to `output` next to it.
pub fn set(
    ctx: &Context,
    stage: &str,
    name: &str,
    value: &str,
    output: Option<&str>,
) -> Result<SetResult> {
    let store = ctx.store();
    let mut doc = store.load()?;
    let value = parse_value(value)?;
    let previous = doc.get_setting(stage, name).cloned();

    if let Err(e) = doc.set_setting(stage, name, value.clone()) {
        ctx.logger
            .error(&format!("Failed to set {}/{}: {}", stage, name, e));
        return Err(e);
    }

    let target = output_store(&store, output);
    target.save(&doc)?;
    Ok(SetResult {
        stage: stage.to_string(),
        name: name.to_string(),
        value,
        previous,
        path: target.path().to_path_buf(),
    })
}

fn output_store(store: &SettingsStore, output: Option<&str>) -> SettingsStore {
    match output {
        Some(file_name) => store.sibling(file_name),
        None => store.clone(),
    }
}

// === apply ===

#[derive(Serialize)]
pub struct ApplyResult {
    pub applied: usize,
    pub path: PathBuf,
    pub dry_run: bool,
}

impl Output for ApplyResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        if self.dry_run {
            format!(
                "Would apply {} setting(s) to {} (dry run)",
                self.applied,
                self.path.display()
            )
        } else {
            format!("Applied {} setting(s) to {}", self.applied, self.path.display())
        }
    }
}

fn read_overrides(path: &Path) -> Result<StageOverrides> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            Error::NotFound(format!("overrides file {}", path.display()))
        }
        _ => Error::Io(e),
    })?;
    StageOverrides::from_json_str(&text)
}

/// Apply a JSON file of settings.
///
/// Nothing is written unless every setting applies cleanly.
pub fn apply(
    ctx: &Context,
    overrides: &Path,
    defaults: Option<&Path>,
    output: Option<&str>,
    dry_run: bool,
) -> Result<ApplyResult> {
    let mut batch = read_overrides(overrides)?;
    if let Some(defaults) = defaults {
        batch.merge_defaults(&read_overrides(defaults)?);
    }

    let store = ctx.store();
    let mut doc = store.load()?;
    let applied = store.apply(&mut doc, &batch)?;

    let target = output_store(&store, output);
    if !dry_run {
        target.save(&doc)?;
    }
    Ok(ApplyResult {
        applied,
        path: target.path().to_path_buf(),
        dry_run,
    })
}

// === init ===

#[derive(Serialize)]
pub struct InitResult {
    pub path: PathBuf,
    pub version: Version,
    pub replaced: bool,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let verb = if self.replaced { "Replaced" } else { "Created" };
        format!("{} {} (version {})", verb, self.path.display(), self.version)
    }
}

/// Create a settings file with three empty stages.
pub fn init(ctx: &Context, file_version: &str, force: bool) -> Result<InitResult> {
    let version: Version = file_version.parse()?;
    let store = ctx.store();
    let replaced = store.exists();
    if replaced && !force {
        return Err(Error::InvalidInput(format!(
            "{} already exists; use --force to replace it",
            store.path().display()
        )));
    }
    if let Some(dir) = store.path().parent() {
        std::fs::create_dir_all(dir)?;
    }
    store.save(&SettingsDocument::new(version))?;
    Ok(InitResult {
        path: store.path().to_path_buf(),
        version,
        replaced,
    })
}

// === backup / restore ===

#[derive(Serialize)]
pub struct BackupResult {
    pub path: PathBuf,
    pub backup: PathBuf,
    #[serde(skip)]
    restored: bool,
}

impl Output for BackupResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        if self.restored {
            format!(
                "Restored {} from {}",
                self.path.display(),
                self.backup.display()
            )
        } else {
            format!(
                "Backed up {} to {}",
                self.path.display(),
                self.backup.display()
            )
        }
    }
}

fn suffix<'a>(ctx: &'a Context, suffix: Option<&'a str>) -> Result<&'a str> {
    let suffix = suffix.unwrap_or(ctx.config.backup_suffix.value.as_str());
    if suffix.is_empty() {
        return Err(Error::InvalidInput("backup suffix must not be empty".to_string()));
    }
    Ok(suffix)
}

/// Copy the settings file to its backup path.
pub fn backup(ctx: &Context, suffix_arg: Option<&str>) -> Result<BackupResult> {
    let store = ctx.store();
    let backup = store.backup(suffix(ctx, suffix_arg)?)?;
    Ok(BackupResult {
        path: store.path().to_path_buf(),
        backup,
        restored: false,
    })
}

/// Write the backup copy back over the settings file.
pub fn restore(ctx: &Context, suffix_arg: Option<&str>) -> Result<BackupResult> {
    let store = ctx.store();
    let backup = store.restore(suffix(ctx, suffix_arg)?)?;
    Ok(BackupResult {
        path: store.path().to_path_buf(),
        backup,
        restored: true,
    })
}

// === dump ===

#[derive(Serialize)]
pub struct DumpResult {
    pub version: Version,
    pub tree: serde_json::Value,
    #[serde(skip)]
    root: PropertyValue,
}

impl Output for DumpResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("version {}", self.version)];
        dump_lines(&self.root, None, 0, &mut lines);
        lines.join("\n")
    }
}

fn dump_lines(value: &PropertyValue, key: Option<&str>, indent: usize, lines: &mut Vec<String>) {
    let pad = "  ".repeat(indent);
    let label = key.map(|k| format!("{}: ", k)).unwrap_or_default();
    match value {
        PropertyValue::List(items) => {
            lines.push(format!("{}{}list ({})", pad, label, items.len()));
            for item in items {
                dump_lines(item, None, indent + 1, lines);
            }
        }
        PropertyValue::Dictionary(entries) => {
            lines.push(format!("{}{}dictionary ({})", pad, label, entries.len()));
            for (k, v) in entries {
                dump_lines(v, Some(k), indent + 1, lines);
            }
        }
        other => lines.push(format!(
            "{}{}{} {}",
            pad,
            label,
            other.property_type(),
            other
        )),
    }
}

/// Print the whole property tree with node types.
pub fn dump(ctx: &Context) -> Result<DumpResult> {
    let doc = ctx.store().load()?;
    let root = doc.to_property_tree();
    Ok(DumpResult {
        version: doc.version(),
        tree: root.to_tagged_json(),
        root,
    })
}

// === config ===

#[derive(Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub source: String,
}

#[derive(Serialize)]
pub struct ConfigResult {
    pub settings_path: PathBuf,
    pub entries: Vec<ConfigEntry>,
}

impl Output for ConfigResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let width = self.entries.iter().map(|e| e.key.len()).max().unwrap_or(0);
        let mut lines: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("{:width$}  {}  ({})", e.key, e.value, e.source, width = width))
            .collect();
        lines.push(format!("\nSettings file: {}", self.settings_path.display()));
        lines.join("\n")
    }
}

fn entry(key: &'static str, value: impl std::fmt::Display, source: &ValueSource) -> ConfigEntry {
    ConfigEntry {
        key,
        value: value.to_string(),
        source: source.to_string(),
    }
}

/// Show the resolved configuration and where each value came from.
pub fn config(ctx: &Context) -> ConfigResult {
    let c = &ctx.config;
    let mut entries = vec![
        entry(
            "user-data-directory",
            c.user_data_directory.value.display(),
            &c.user_data_directory.source,
        ),
        entry(
            "mod-directory",
            c.mod_directory.value.display(),
            &c.mod_directory.source,
        ),
        entry("settings-file", &c.settings_file.value, &c.settings_file.source),
        entry("max-depth", c.max_depth.value, &c.max_depth.source),
        entry("output-format", c.output_format.value, &c.output_format.source),
    ];
    if let Some(ref log_file) = c.log_file {
        entries.push(entry("log-file", log_file.value.display(), &log_file.source));
    }
    entries.push(entry(
        "backup-suffix",
        &c.backup_suffix.value,
        &c.backup_suffix.source,
    ));
    ConfigResult {
        settings_path: c.settings_path(),
        entries,
    }
}

#[derive(Serialize)]
pub struct SaveConfigResult {
    pub path: PathBuf,
    pub config: ModSettingsConfig,
}

impl Output for SaveConfigResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!("Saved config to {}", self.path.display())
    }
}

/// Write this run's flags into the config file at `path`, keeping its other values.
pub fn save_config(
    path: &Path,
    loaded: &LoadedConfig,
    overrides: &ConfigOverrides,
) -> Result<SaveConfigResult> {
    let config = crate::config::save_config(path, &loaded.config, overrides)?;
    Ok(SaveConfigResult {
        path: path.to_path_buf(),
        config,
    })
}
