//! Property trees: the recursive tagged value format used by settings files.

pub mod decode;
pub mod encode;
pub mod value;

#[cfg(test)]
mod proptest_tests;

pub use decode::{DEFAULT_MAX_DEPTH, Decoder};
pub use encode::write_header;
pub use value::{PropertyType, PropertyValue, ValueKind};
