//! Batches of setting values keyed by stage.
//!
//! The JSON shape matches a test configuration's `settings` block:
//!
//! ```json
//! {
//!   "startup": { "angels-enable-industries": true },
//!   "runtime-global": { "angels-pavement-stack-size": 1000 }
//! }
//! ```
//!
//! Stage and setting order is kept as written.

use crate::tree::PropertyValue;
use crate::{Error, Result};

/// Native setting values grouped by stage, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOverrides {
    stages: Vec<(String, Vec<(String, serde_json::Value)>)>,
}

impl StageOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse overrides from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    /// Build overrides from a parsed JSON object of objects.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            Error::InvalidInput("overrides must be an object keyed by stage".to_string())
        })?;

        let mut overrides = Self::new();
        for (stage, settings) in object {
            let settings = settings.as_object().ok_or_else(|| {
                Error::InvalidInput(format!(
                    "overrides for stage '{}' must be an object keyed by setting name",
                    stage
                ))
            })?;
            for (name, value) in settings {
                overrides.insert(stage, name, value.clone());
            }
        }
        Ok(overrides)
    }

    /// Add (or replace) one value.
    pub fn insert(&mut self, stage: &str, name: &str, value: serde_json::Value) {
        let idx = match self.stages.iter().position(|(s, _)| s == stage) {
            Some(idx) => idx,
            None => {
                self.stages.push((stage.to_string(), Vec::new()));
                self.stages.len() - 1
            }
        };
        let settings = &mut self.stages[idx].1;
        match settings.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => settings.push((name.to_string(), value)),
        }
    }

    /// Fill in every value from `defaults` that this batch doesn't set.
    pub fn merge_defaults(&mut self, defaults: &StageOverrides) {
        for (stage, name, value) in defaults.iter() {
            if self.get(stage, name).is_none() {
                self.insert(stage, name, value.clone());
            }
        }
    }

    pub fn get(&self, stage: &str, name: &str) -> Option<&serde_json::Value> {
        self.stages
            .iter()
            .find(|(s, _)| s == stage)?
            .1
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate `(stage, name, value)` triples in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &serde_json::Value)> {
        self.stages.iter().flat_map(|(stage, settings)| {
            settings
                .iter()
                .map(move |(name, value)| (stage.as_str(), name.as_str(), value))
        })
    }

    pub fn len(&self) -> usize {
        self.stages.iter().map(|(_, s)| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wrap every value into a property tree node.
    pub fn to_property_values(&self) -> Result<Vec<(&str, &str, PropertyValue)>> {
        self.iter()
            .map(|(stage, name, value)| {
                Ok((stage, name, PropertyValue::from_native(value)?))
            })
            .collect()
    }
}
