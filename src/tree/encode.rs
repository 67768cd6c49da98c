//! Property tree encoding, the exact inverse of [`crate::tree::decode`].
//!
//! Also holds the rules for wrapping native scalars into tree nodes.

use crate::codec::Writer;
use crate::tree::{PropertyType, PropertyValue};
use crate::{Error, Result};

/// Write a node header: the type tag followed by the reserved flag (always false).
pub fn write_header(writer: &mut Writer, ty: PropertyType) {
    writer.write_byte(ty.tag());
    writer.write_bool(false);
}

impl PropertyValue {
    /// Encode this node and its children to a fresh buffer.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new();
        self.encode_to(&mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Append this node to `writer`. Containers are written in stored order.
    pub fn encode_to(&self, writer: &mut Writer) -> Result<()> {
        write_header(writer, self.property_type());
        match self {
            Self::None => {}
            Self::Bool(b) => writer.write_bool(*b),
            Self::Number(n) => writer.write_number(*n),
            Self::String(s) => writer.write_string(s.as_deref().unwrap_or(""))?,
            Self::List(items) => {
                writer.write_count(items.len())?;
                for item in items {
                    item.encode_to(writer)?;
                }
            }
            Self::Dictionary(entries) => {
                writer.write_count(entries.len())?;
                for (key, value) in entries {
                    writer.write_string(key)?;
                    value.encode_to(writer)?;
                }
            }
            Self::SignedLong(i) => writer.write_signed_long(*i),
            Self::UnsignedLong(u) => writer.write_unsigned_long(*u),
        }
        Ok(())
    }

    /// Wrap a native scalar into a node.
    ///
    /// Booleans become `Bool`, floating numbers `Number`, text `String`, and
    /// integers `SignedLong` when negative or `UnsignedLong` otherwise. Null,
    /// arrays and objects are rejected.
    pub fn from_native(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::String(s) => Ok(Self::string(s.as_str())),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Ok(Self::UnsignedLong(u))
                } else if let Some(i) = n.as_i64() {
                    Ok(Self::SignedLong(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Number(f))
                } else {
                    Err(Error::UnsupportedValueType(format!("number {}", n)))
                }
            }
            serde_json::Value::Null => Err(Error::UnsupportedValueType("null".to_string())),
            serde_json::Value::Array(_) => Err(Error::UnsupportedValueType("array".to_string())),
            serde_json::Value::Object(_) => {
                Err(Error::UnsupportedValueType("object".to_string()))
            }
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        if value < 0 {
            Self::SignedLong(value)
        } else {
            Self::UnsignedLong(value as u64)
        }
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        Self::UnsignedLong(value)
    }
}
