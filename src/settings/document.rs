//! The settings document: a version header and three stages of settings.
//!
//! # File layout
//!
//! ```text
//! version      4 x u16 (little-endian)
//! reserved     bool
//! root         Dictionary node with exactly three stage entries
//!   <stage>    Dictionary node: setting name -> Dictionary { "value": <scalar> }
//! ```

use serde::Serialize;

use crate::codec::{Reader, Writer};
use crate::tree::{Decoder, PropertyType, PropertyValue, write_header};
use crate::{Error, Result};

/// One of the three fixed configuration scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Startup,
    RuntimeGlobal,
    RuntimePerUser,
}

impl Stage {
    /// Canonical stage order, as written to disk.
    pub const ALL: [Stage; 3] = [Stage::Startup, Stage::RuntimeGlobal, Stage::RuntimePerUser];

    /// Parse a stage from its exact on-disk name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "startup" => Some(Self::Startup),
            "runtime-global" => Some(Self::RuntimeGlobal),
            "runtime-per-user" => Some(Self::RuntimePerUser),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::RuntimeGlobal => "runtime-global",
            Self::RuntimePerUser => "runtime-per-user",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Four-component version stored in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Version(pub [u16; 4]);

impl Version {
    pub fn new(major: u16, minor: u16, patch: u16, build: u16) -> Self {
        Self([major, minor, patch, build])
    }

    pub fn components(&self) -> [u16; 4] {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

impl std::str::FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 4 {
            return Err(Error::InvalidInput(format!(
                "version must have 4 components (a.b.c.d), got '{}'",
                s
            )));
        }
        let mut out = [0u16; 4];
        for (slot, part) in out.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| Error::InvalidInput(format!("invalid version component '{}'", part)))?;
        }
        Ok(Self(out))
    }
}

impl Serialize for Version {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The settings of one stage, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSettings {
    /// Stage name as read from the file.
    pub name: String,
    /// Setting name to payload, normally `Dictionary { "value": <scalar> }`.
    pub entries: Vec<(String, PropertyValue)>,
}

impl StageSettings {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Iterate `(setting name, value)` pairs, skipping payloads without a `"value"` entry.
    pub fn values(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries
            .iter()
            .filter_map(|(name, payload)| payload.get(VALUE_KEY).map(|v| (name.as_str(), v)))
    }
}

const VALUE_KEY: &str = "value";
const STAGE_COUNT: usize = 3;

/// A decoded settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDocument {
    version: Version,
    stages: Vec<StageSettings>,
}

impl SettingsDocument {
    /// A document with the given version and three empty stages.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            stages: Stage::ALL
                .iter()
                .map(|s| StageSettings::new(s.as_str()))
                .collect(),
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Stages in the order they were decoded.
    pub fn stages(&self) -> &[StageSettings] {
        &self.stages
    }

    /// The stage stored under `name`, if any.
    pub fn stage(&self, name: &str) -> Option<&StageSettings> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// The document as a single property tree, stages in stored order.
    pub fn to_property_tree(&self) -> PropertyValue {
        PropertyValue::Dictionary(
            self.stages
                .iter()
                .map(|s| (s.name.clone(), PropertyValue::Dictionary(s.entries.clone())))
                .collect(),
        )
    }

    /// Decode a settings file.
    ///
    /// Stage names are kept exactly as they appear in the file.
    pub fn decode(bytes: &[u8], decoder: &Decoder) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        let mut version = [0u16; 4];
        for component in version.iter_mut() {
            *component = reader.read_unsigned_short()?;
        }
        let _reserved = reader.read_bool()?;

        if decoder.max_depth() < 1 {
            return Err(Error::DepthExceeded {
                limit: decoder.max_depth(),
            });
        }
        if Decoder::read_header(&mut reader)? != PropertyType::Dictionary {
            return Err(Error::CorruptFile("root not dictionary".to_string()));
        }
        if reader.read_unsigned_integer(false)? as usize != STAGE_COUNT {
            return Err(Error::CorruptFile("unexpected stage count".to_string()));
        }

        let mut stages = Vec::with_capacity(STAGE_COUNT);
        for _ in 0..STAGE_COUNT {
            let name = reader.read_string()?.unwrap_or_default();
            let stage = decoder.decode_node_at(&mut reader, 2)?;
            let PropertyValue::Dictionary(entries) = stage else {
                return Err(Error::CorruptFile("stage not dictionary".to_string()));
            };
            stages.push(StageSettings { name, entries });
        }

        if !reader.is_empty() {
            tracing::warn!(
                trailing = reader.remaining(),
                "ignoring trailing bytes after settings tree"
            );
        }

        tracing::debug!(version = %Version(version), "decoded settings document");
        Ok(Self {
            version: Version(version),
            stages,
        })
    }

    /// Encode the document. Stages are always written in canonical order.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::with_capacity(256);

        for component in self.version.0 {
            writer.write_unsigned_short(component);
        }
        writer.write_bool(false);

        write_header(&mut writer, PropertyType::Dictionary);
        writer.write_count(Stage::ALL.len())?;
        for stage in Stage::ALL {
            let settings = self
                .stage(stage.as_str())
                .ok_or_else(|| Error::CorruptFile(format!("missing stage '{}'", stage)))?;
            writer.write_string(stage.as_str())?;
            write_header(&mut writer, PropertyType::Dictionary);
            writer.write_count(settings.entries.len())?;
            for (name, payload) in &settings.entries {
                writer.write_string(name)?;
                payload.encode_to(&mut writer)?;
            }
        }

        Ok(writer.into_bytes())
    }

    /// Look up a setting's value in one stage.
    pub fn get_setting(&self, stage: &str, name: &str) -> Option<&PropertyValue> {
        self.stage(stage)?
            .entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, payload)| payload.get(VALUE_KEY))
    }

    /// Stage indices in lookup order: canonical stages first, in canonical
    /// order, then any other stages in file order.
    fn search_order(&self) -> impl Iterator<Item = usize> + '_ {
        let canonical = Stage::ALL
            .iter()
            .filter_map(|stage| self.stages.iter().position(|s| s.name == stage.as_str()));
        let others = self
            .stages
            .iter()
            .enumerate()
            .filter(|(_, s)| Stage::parse(&s.name).is_none())
            .map(|(i, _)| i);
        canonical.chain(others)
    }

    /// Set a setting's value.
    ///
    /// An existing setting is looked up across all stages first (canonical
    /// stages in canonical order, then the rest): it must live
    /// in `stage` and keep its value kind, and is overwritten in place. Only
    /// when the setting exists nowhere is `stage` validated, and the setting
    /// appended to it.
    pub fn set_setting(&mut self, stage: &str, name: &str, value: PropertyValue) -> Result<()> {
        let existing = self.search_order().find_map(|si| {
            self.stages[si]
                .entries
                .iter()
                .position(|(n, _)| n == name)
                .map(|ei| (si, ei))
        });

        if let Some((si, ei)) = existing {
            let found = &mut self.stages[si];
            if found.name != stage {
                return Err(Error::WrongStage {
                    name: name.to_string(),
                    found: found.name.clone(),
                    requested: stage.to_string(),
                });
            }
            let slot = found.entries[ei].1.get_mut(VALUE_KEY).ok_or_else(|| {
                Error::CorruptFile(format!("setting '{}' has no value entry", name))
            })?;
            if slot.kind() != value.kind() {
                return Err(Error::TypeMismatch {
                    name: name.to_string(),
                    expected: slot.kind(),
                    got: value.kind(),
                });
            }
            tracing::debug!(stage, name, %value, "overwriting setting");
            *slot = value;
            return Ok(());
        }

        let canonical =
            Stage::parse(stage).ok_or_else(|| Error::InvalidStage(stage.to_string()))?;
        let target = self
            .stages
            .iter_mut()
            .find(|s| s.name == canonical.as_str())
            .ok_or_else(|| Error::CorruptFile(format!("missing stage '{}'", canonical)))?;

        tracing::debug!(stage, name, %value, "adding setting");
        target.entries.push((
            name.to_string(),
            PropertyValue::Dictionary(vec![(VALUE_KEY.to_string(), value)]),
        ));
        Ok(())
    }
}
