//! The property tree value model.
//!
//! A property tree node is one of eight kinds, identified on the wire by a
//! one-byte type tag. Dictionaries are ordered lists of key/value pairs: file
//! order is kept and duplicate keys are allowed.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Wire type tag of a property tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PropertyType {
    None = 0,
    Bool = 1,
    Number = 2,
    String = 3,
    List = 4,
    Dictionary = 5,
    SignedLong = 6,
    UnsignedLong = 7,
}

impl PropertyType {
    /// Map a tag byte to its type, if known.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::Bool),
            2 => Some(Self::Number),
            3 => Some(Self::String),
            4 => Some(Self::List),
            5 => Some(Self::Dictionary),
            6 => Some(Self::SignedLong),
            7 => Some(Self::UnsignedLong),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::List => "list",
            Self::Dictionary => "dictionary",
            Self::SignedLong => "signed-long",
            Self::UnsignedLong => "unsigned-long",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of a value as seen by setting validation.
///
/// Signed and unsigned longs share the `Integer` kind: which of the two an
/// integer is written as depends only on its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    None,
    Bool,
    Number,
    String,
    List,
    Dictionary,
    Integer,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::List => "list",
            Self::Dictionary => "dictionary",
            Self::Integer => "integer",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ValueKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A node of a property tree.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    None,
    Bool(bool),
    Number(f64),
    /// `None` is the empty/null string, which carries no bytes on the wire.
    String(Option<String>),
    List(Vec<PropertyValue>),
    Dictionary(Vec<(String, PropertyValue)>),
    SignedLong(i64),
    UnsignedLong(u64),
}

impl PropertyValue {
    /// Build a string node, using the empty representation for `""`.
    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::String(None)
        } else {
            Self::String(Some(value))
        }
    }

    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::None => PropertyType::None,
            Self::Bool(_) => PropertyType::Bool,
            Self::Number(_) => PropertyType::Number,
            Self::String(_) => PropertyType::String,
            Self::List(_) => PropertyType::List,
            Self::Dictionary(_) => PropertyType::Dictionary,
            Self::SignedLong(_) => PropertyType::SignedLong,
            Self::UnsignedLong(_) => PropertyType::UnsignedLong,
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::None => ValueKind::None,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::List(_) => ValueKind::List,
            Self::Dictionary(_) => ValueKind::Dictionary,
            Self::SignedLong(_) | Self::UnsignedLong(_) => ValueKind::Integer,
        }
    }

    pub fn as_dictionary(&self) -> Option<&[(String, PropertyValue)]> {
        match self {
            Self::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Vec<(String, PropertyValue)>> {
        match self {
            Self::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }

    /// First value stored under `key` in a dictionary.
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.as_dictionary()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PropertyValue> {
        self.as_dictionary_mut()?
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// A kind-tagged JSON view of the tree, preserving duplicate keys.
    ///
    /// Dictionaries become arrays of `[key, node]` pairs.
    pub fn to_tagged_json(&self) -> serde_json::Value {
        use serde_json::json;

        let value = match self {
            Self::None => serde_json::Value::Null,
            Self::Bool(b) => json!(b),
            Self::Number(n) => json!(n),
            Self::String(s) => json!(s.as_deref().unwrap_or("")),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_tagged_json).collect())
            }
            Self::Dictionary(entries) => serde_json::Value::Array(
                entries
                    .iter()
                    .map(|(k, v)| json!([k, v.to_tagged_json()]))
                    .collect(),
            ),
            Self::SignedLong(i) => json!(i),
            Self::UnsignedLong(u) => json!(u),
        };
        json!({ "type": self.property_type().as_str(), "value": value })
    }
}

/// Structural equality. Numbers compare by bit pattern and the two empty
/// string representations are equal.
impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => {
                a.as_deref().unwrap_or("") == b.as_deref().unwrap_or("")
            }
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Dictionary(a), Self::Dictionary(b)) => a == b,
            (Self::SignedLong(a), Self::SignedLong(b)) => a == b,
            (Self::UnsignedLong(a), Self::UnsignedLong(b)) => a == b,
            _ => false,
        }
    }
}

/// Plain JSON view: scalars as JSON scalars, dictionaries as objects in file order.
impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s.as_deref().unwrap_or("")),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Dictionary(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::SignedLong(i) => serializer.serialize_i64(*i),
            Self::UnsignedLong(u) => serializer.serialize_u64(*u),
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{:?}", s.as_deref().unwrap_or("")),
            Self::SignedLong(i) => write!(f, "{}", i),
            Self::UnsignedLong(u) => write!(f, "{}", u),
            Self::List(_) | Self::Dictionary(_) => match serde_json::to_string(self) {
                Ok(json) => write!(f, "{}", json),
                Err(_) => Err(std::fmt::Error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags_roundtrip() {
        for tag in 0u8..=7 {
            let ty = PropertyType::from_tag(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
        assert_eq!(PropertyType::from_tag(8), None);
        assert_eq!(PropertyType::from_tag(255), None);
    }

    #[test]
    fn test_integer_kinds_share_kind() {
        assert_eq!(PropertyValue::SignedLong(-3).kind(), ValueKind::Integer);
        assert_eq!(PropertyValue::UnsignedLong(3).kind(), ValueKind::Integer);
        assert_ne!(
            PropertyValue::SignedLong(-3).property_type(),
            PropertyValue::UnsignedLong(3).property_type()
        );
    }

    #[test]
    fn test_number_equality_is_bitwise() {
        assert_ne!(PropertyValue::Number(0.0), PropertyValue::Number(-0.0));
        assert_eq!(PropertyValue::Number(f64::NAN), PropertyValue::Number(f64::NAN));
    }

    #[test]
    fn test_empty_strings_are_equal() {
        assert_eq!(PropertyValue::String(None), PropertyValue::String(Some(String::new())));
        assert_eq!(PropertyValue::string(""), PropertyValue::String(None));
    }

    #[test]
    fn test_dictionary_get_returns_first_match() {
        let dict = PropertyValue::Dictionary(vec![
            ("value".to_string(), PropertyValue::Bool(true)),
            ("value".to_string(), PropertyValue::Bool(false)),
        ]);
        assert_eq!(dict.get("value"), Some(&PropertyValue::Bool(true)));
        assert_eq!(dict.get("missing"), None);
        assert_eq!(PropertyValue::Bool(true).get("value"), None);
    }

    #[test]
    fn test_serialize_preserves_order() {
        let dict = PropertyValue::Dictionary(vec![
            ("zeta".to_string(), PropertyValue::UnsignedLong(1)),
            ("alpha".to_string(), PropertyValue::SignedLong(-1)),
            ("list".to_string(), PropertyValue::List(vec![PropertyValue::None])),
        ]);
        let json = serde_json::to_string(&dict).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":-1,"list":[null]}"#);
    }

    #[test]
    fn test_tagged_json_keeps_duplicates() {
        let dict = PropertyValue::Dictionary(vec![
            ("a".to_string(), PropertyValue::Bool(true)),
            ("a".to_string(), PropertyValue::string("x")),
        ]);
        let tagged = dict.to_tagged_json();
        assert_eq!(tagged["type"], "dictionary");
        assert_eq!(tagged["value"].as_array().unwrap().len(), 2);
        assert_eq!(tagged["value"][1][1]["type"], "string");
        assert_eq!(tagged["value"][1][1]["value"], "x");
    }

    #[test]
    fn test_display() {
        assert_eq!(PropertyValue::string("hi").to_string(), "\"hi\"");
        assert_eq!(PropertyValue::Bool(false).to_string(), "false");
        assert_eq!(PropertyValue::SignedLong(-4).to_string(), "-4");
    }
}
