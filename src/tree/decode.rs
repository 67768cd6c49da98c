//! Decoding of property trees.
//!
//! Each node starts with a type tag byte and a reserved flag byte. The flag is
//! read and discarded; the tag selects the payload layout.

use crate::codec::Reader;
use crate::tree::{PropertyType, PropertyValue};
use crate::{Error, Result};

/// Default maximum nesting depth accepted by [`Decoder`].
///
/// Settings files nest four levels deep (root, stage, setting, value).
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Property tree decoder with a nesting limit.
///
/// The root node is at depth 1 and every list element or dictionary value is
/// one level deeper than its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    max_depth: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Decode one complete node from the start of `bytes`.
    ///
    /// Bytes after the node are ignored.
    pub fn decode(&self, bytes: &[u8]) -> Result<PropertyValue> {
        let mut reader = Reader::new(bytes);
        self.decode_node(&mut reader)
    }

    /// Decode one node at the reader's position.
    pub fn decode_node(&self, reader: &mut Reader<'_>) -> Result<PropertyValue> {
        self.decode_node_at(reader, 1)
    }

    /// Decode one node that sits at `depth` within an enclosing tree.
    ///
    /// Containers are tracked on an explicit stack, so input nesting never
    /// grows the call stack.
    pub fn decode_node_at(&self, reader: &mut Reader<'_>, depth: usize) -> Result<PropertyValue> {
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            if depth + stack.len() > self.max_depth {
                return Err(Error::DepthExceeded {
                    limit: self.max_depth,
                });
            }

            let mut value = match Self::read_header(reader)? {
                PropertyType::None => PropertyValue::None,
                PropertyType::Bool => PropertyValue::Bool(reader.read_bool()?),
                PropertyType::Number => PropertyValue::Number(reader.read_number()?),
                PropertyType::String => PropertyValue::String(reader.read_string()?),
                PropertyType::SignedLong => PropertyValue::SignedLong(reader.read_signed_long()?),
                PropertyType::UnsignedLong => {
                    PropertyValue::UnsignedLong(reader.read_unsigned_long()?)
                }
                PropertyType::List => {
                    let count = reader.read_unsigned_integer(false)? as usize;
                    if count == 0 {
                        PropertyValue::List(Vec::new())
                    } else {
                        // Every node is at least two bytes, so count <= remaining / 2.
                        let items = Vec::with_capacity(count.min(reader.remaining() / 2));
                        stack.push(Frame::List {
                            items,
                            remaining: count,
                        });
                        continue;
                    }
                }
                PropertyType::Dictionary => {
                    let count = reader.read_unsigned_integer(false)? as usize;
                    if count == 0 {
                        PropertyValue::Dictionary(Vec::new())
                    } else {
                        let entries = Vec::with_capacity(count.min(reader.remaining() / 3));
                        let key = reader.read_string()?.unwrap_or_default();
                        stack.push(Frame::Dictionary {
                            entries,
                            key,
                            remaining: count,
                        });
                        continue;
                    }
                }
            };

            // Hand the finished node to its container, closing every
            // container that this completes.
            loop {
                let Some(mut frame) = stack.pop() else {
                    return Ok(value);
                };
                if frame.push(reader, value)? {
                    stack.push(frame);
                    break;
                }
                value = frame.finish();
            }
        }
    }

    /// Read a node header, returning its type.
    pub fn read_header(reader: &mut Reader<'_>) -> Result<PropertyType> {
        let tag = reader.read_byte()?;
        let _reserved = reader.read_bool()?;
        PropertyType::from_tag(tag).ok_or(Error::UnknownTypeTag(tag))
    }
}

/// A container whose children are still being read.
enum Frame {
    List {
        items: Vec<PropertyValue>,
        remaining: usize,
    },
    Dictionary {
        entries: Vec<(String, PropertyValue)>,
        key: String,
        remaining: usize,
    },
}

impl Frame {
    /// Add a finished child. Returns true while more children follow; for a
    /// dictionary the next key has then already been read.
    fn push(&mut self, reader: &mut Reader<'_>, value: PropertyValue) -> Result<bool> {
        match self {
            Frame::List { items, remaining } => {
                items.push(value);
                *remaining -= 1;
                Ok(*remaining > 0)
            }
            Frame::Dictionary {
                entries,
                key,
                remaining,
            } => {
                entries.push((std::mem::take(key), value));
                *remaining -= 1;
                if *remaining == 0 {
                    return Ok(false);
                }
                *key = reader.read_string()?.unwrap_or_default();
                Ok(true)
            }
        }
    }

    fn finish(self) -> PropertyValue {
        match self {
            Frame::List { items, .. } => PropertyValue::List(items),
            Frame::Dictionary { entries, .. } => PropertyValue::Dictionary(entries),
        }
    }
}
