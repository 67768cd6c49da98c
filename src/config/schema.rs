//! KDL schema for config.kdl.
//!
//! This module provides:
//! - The [`ModSettingsConfig`] struct mirroring the KDL schema
//! - Conversion to/from KDL documents
//! - Validation and merging

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound accepted for `max-depth`.
///
/// Decoding itself doesn't recurse, but encoding, printing and dropping a
/// tree do, so decoded trees stay within this many levels.
pub const MAX_DEPTH_LIMIT: usize = 512;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// user-data-directory "~/.factorio"
/// mod-directory "~/.factorio/mods"     // defaults to <user-data-directory>/mods
/// settings-file "mod-settings.dat"
/// max-depth 64
/// output-format "human"                // or "json"
/// log-file "~/.local/state/modsettings/events.log"
/// backup-suffix ".bak"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSettingsConfig {
    /// Game user data directory
    pub user_data_directory: Option<PathBuf>,

    /// Mods directory holding the settings file
    pub mod_directory: Option<PathBuf>,

    /// Settings file name inside the mods directory
    pub settings_file: Option<String>,

    /// Property tree nesting limit
    pub max_depth: Option<usize>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Event log file
    pub log_file: Option<PathBuf>,

    /// Suffix for backup copies
    pub backup_suffix: Option<String>,
}

impl ModSettingsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(depth) = self.max_depth {
            if depth == 0 || depth > MAX_DEPTH_LIMIT {
                return Err(format!(
                    "max-depth must be 1-{}, got {}",
                    MAX_DEPTH_LIMIT, depth
                ));
            }
        }
        if let Some(ref name) = self.settings_file {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(format!(
                    "settings-file must be a plain file name, got '{}'",
                    name
                ));
            }
        }
        if let Some(ref suffix) = self.backup_suffix {
            if suffix.is_empty() {
                return Err("backup-suffix must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes and values of the wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        config.user_data_directory = first_string(doc, "user-data-directory").map(PathBuf::from);
        config.mod_directory = first_string(doc, "mod-directory").map(PathBuf::from);
        config.settings_file = first_string(doc, "settings-file");
        config.output_format =
            first_string(doc, "output-format").and_then(|s| OutputFormat::parse(&s));
        config.log_file = first_string(doc, "log-file").map(PathBuf::from);
        config.backup_suffix = first_string(doc, "backup-suffix");

        if let Some(node) = doc.get("max-depth") {
            if let Some(entry) = node.entries().first() {
                if let Some(i) = entry.value().as_integer() {
                    if let Ok(depth) = usize::try_from(i) {
                        config.max_depth = Some(depth);
                    }
                }
            }
        }

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref dir) = self.user_data_directory {
            push_string(&mut doc, "user-data-directory", &dir.to_string_lossy());
        }
        if let Some(ref dir) = self.mod_directory {
            push_string(&mut doc, "mod-directory", &dir.to_string_lossy());
        }
        if let Some(ref name) = self.settings_file {
            push_string(&mut doc, "settings-file", name);
        }
        if let Some(depth) = self.max_depth {
            let mut node = KdlNode::new("max-depth");
            node.push(KdlEntry::new(KdlValue::Integer(depth as i128)));
            doc.nodes_mut().push(node);
        }
        if let Some(format) = self.output_format {
            push_string(&mut doc, "output-format", format.as_str());
        }
        if let Some(ref path) = self.log_file {
            push_string(&mut doc, "log-file", &path.to_string_lossy());
        }
        if let Some(ref suffix) = self.backup_suffix {
            push_string(&mut doc, "backup-suffix", suffix);
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &ModSettingsConfig) {
        if other.user_data_directory.is_some() {
            self.user_data_directory = other.user_data_directory.clone();
        }
        if other.mod_directory.is_some() {
            self.mod_directory = other.mod_directory.clone();
        }
        if other.settings_file.is_some() {
            self.settings_file = other.settings_file.clone();
        }
        if other.max_depth.is_some() {
            self.max_depth = other.max_depth;
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.log_file.is_some() {
            self.log_file = other.log_file.clone();
        }
        if other.backup_suffix.is_some() {
            self.backup_suffix = other.backup_suffix.clone();
        }
    }
}

fn first_string(doc: &KdlDocument, name: &str) -> Option<String> {
    let node = doc.get(name)?;
    let entry = node.entries().first()?;
    entry.value().as_string().map(|s| s.to_string())
}

fn push_string(doc: &mut KdlDocument, name: &str, value: &str) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    doc.nodes_mut().push(node);
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== OutputFormat Tests ====================

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("human"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("invalid"), None);
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(format!("{}", OutputFormat::Json), "json");
        assert_eq!(format!("{}", OutputFormat::Human), "human");
    }

    // ==================== ModSettingsConfig Tests ====================

    #[test]
    fn test_config_default() {
        let config = ModSettingsConfig::default();
        assert_eq!(config.mod_directory, None);
        assert_eq!(config.max_depth, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate_depth() {
        let config = ModSettingsConfig {
            max_depth: Some(0),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("max-depth must be"));

        let config = ModSettingsConfig {
            max_depth: Some(MAX_DEPTH_LIMIT + 1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_settings_file() {
        let config = ModSettingsConfig {
            settings_file: Some("mods/mod-settings.dat".to_string()),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("plain file name"));
    }

    #[test]
    fn test_config_from_kdl_empty() {
        let doc = KdlDocument::new();
        assert_eq!(ModSettingsConfig::from_kdl(&doc), ModSettingsConfig::default());
    }

    #[test]
    fn test_config_from_kdl_full() {
        let kdl = r#"
            user-data-directory "/games/factorio"
            mod-directory "/games/factorio/mods"
            settings-file "mod-settings.dat"
            max-depth 16
            output-format "human"
            log-file "/tmp/events.log"
            backup-suffix ".orig"
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = ModSettingsConfig::from_kdl(&doc);

        assert_eq!(config.user_data_directory, Some(PathBuf::from("/games/factorio")));
        assert_eq!(config.mod_directory, Some(PathBuf::from("/games/factorio/mods")));
        assert_eq!(config.settings_file.as_deref(), Some("mod-settings.dat"));
        assert_eq!(config.max_depth, Some(16));
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/events.log")));
        assert_eq!(config.backup_suffix.as_deref(), Some(".orig"));
    }

    #[test]
    fn test_config_from_kdl_ignores_wrong_types() {
        let kdl = r#"
            max-depth "deep"
            output-format "yaml"
            mod-directory 3
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = ModSettingsConfig::from_kdl(&doc);
        assert_eq!(config, ModSettingsConfig::default());
    }

    #[test]
    fn test_config_from_kdl_negative_depth_ignored() {
        let doc: KdlDocument = "max-depth -3".parse().unwrap();
        assert_eq!(ModSettingsConfig::from_kdl(&doc).max_depth, None);
    }

    #[test]
    fn test_config_to_kdl_roundtrip() {
        let config = ModSettingsConfig {
            user_data_directory: Some(PathBuf::from("/data")),
            mod_directory: None,
            settings_file: Some("other.dat".to_string()),
            max_depth: Some(8),
            output_format: Some(OutputFormat::Json),
            log_file: None,
            backup_suffix: Some(".orig".to_string()),
        };
        let doc = config.to_kdl();
        assert_eq!(ModSettingsConfig::from_kdl(&doc), config);
    }

    #[test]
    fn test_config_merge() {
        let mut base = ModSettingsConfig {
            settings_file: Some("a.dat".to_string()),
            max_depth: Some(10),
            ..Default::default()
        };
        let other = ModSettingsConfig {
            max_depth: Some(20),
            output_format: Some(OutputFormat::Human),
            ..Default::default()
        };
        base.merge(&other);
        assert_eq!(base.settings_file.as_deref(), Some("a.dat"));
        assert_eq!(base.max_depth, Some(20));
        assert_eq!(base.output_format, Some(OutputFormat::Human));
    }
}
