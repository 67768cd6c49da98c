//! Little-endian primitive readers and writers.
//!
//! Every scalar in a settings file is one of these primitives:
//!
//! - `bool`: 1 byte, non-zero is true
//! - `byte`: u8
//! - `unsigned short`: u16, 2 bytes
//! - `unsigned integer`: u32, either a fixed 4-byte field or space-optimised
//!   (one byte, or the marker `0xFF` followed by the full 4-byte field)
//! - `signed long` / `unsigned long`: i64 / u64, 8 bytes
//! - `number`: IEEE 754 double, 8 bytes
//! - `string`: empty flag, then (if not empty) a space-optimised length and UTF-8 bytes

use crate::{Error, Result};

/// Marker byte announcing that a space-optimised integer continues as a full u32.
pub const SPACE_OPTIMISED_MARKER: u8 = 0xFF;

/// A cursor over an in-memory byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader positioned at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current offset from the start of the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `len` bytes, advancing the cursor.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::TruncatedInput {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_byte()? != 0)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_unsigned_short(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    /// Read a u32, either as a fixed 4-byte field or in space-optimised form.
    pub fn read_unsigned_integer(&mut self, space_optimised: bool) -> Result<u32> {
        if space_optimised {
            let first = self.read_byte()?;
            if first != SPACE_OPTIMISED_MARKER {
                return Ok(u32::from(first));
            }
        }
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_signed_long(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn read_unsigned_long(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn read_number(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    /// Read a string. Returns `None` when the empty flag is set.
    pub fn read_string(&mut self) -> Result<Option<String>> {
        if self.read_bool()? {
            return Ok(None);
        }
        let len = self.read_unsigned_integer(true)? as usize;
        let bytes = self.take(len)?;
        Ok(Some(std::str::from_utf8(bytes)?.to_string()))
    }
}

/// An append-only byte sink mirroring [`Reader`].
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_byte(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_unsigned_short(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a u32; values below the marker take one byte when space-optimised.
    pub fn write_unsigned_integer(&mut self, value: u32, space_optimised: bool) {
        if space_optimised {
            if value < u32::from(SPACE_OPTIMISED_MARKER) {
                self.buf.push(value as u8);
                return;
            }
            self.buf.push(SPACE_OPTIMISED_MARKER);
        }
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_signed_long(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_unsigned_long(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_number(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a string. Empty strings use the empty flag and carry no length or bytes.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            self.write_bool(true);
            return Ok(());
        }
        let len = u32::try_from(value.len()).map_err(|_| {
            Error::InvalidInput(format!("string of {} bytes is too long", value.len()))
        })?;
        self.write_bool(false);
        self.write_unsigned_integer(len, true);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Write a container count as a fixed 4-byte field.
    pub fn write_count(&mut self, count: usize) -> Result<()> {
        let count = u32::try_from(count)
            .map_err(|_| Error::InvalidInput(format!("{} entries is too many", count)))?;
        self.write_unsigned_integer(count, false);
        Ok(())
    }
}
