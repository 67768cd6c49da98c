//! Byte-level codec shared by the property tree and the settings header.

pub mod primitive;

pub use primitive::{Reader, SPACE_OPTIMISED_MARKER, Writer};
