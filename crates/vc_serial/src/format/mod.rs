//! Format adapters: the concrete read/write primitives of a wire format.
//!
//! The [`Serializer`](crate::Serializer) drives the traversal and only calls
//! into a [`FormatWriter`] or a [`FormatReader`]. Swapping the adapter changes
//! the wire format without touching any traversal code.
//!
//! ## Keys
//!
//! Every call carries the key of the value it addresses. Inside an array,
//! values are positional and the key is `None`.
//!
//! ## Presence
//!
//! Fields that may be omitted (a default was supplied, or the field is
//! optional) go through [`FormatWriter::field_presence`] on write and
//! [`FormatReader::field_present`] on read. Structured documents can derive
//! presence from the key itself; sequential formats must store a marker.
//!
//! ## Adapters
//!
//! - [`json`]: a structured document built on `serde_json::Value`. (feature `json`)
//! - [`binary`]: a compact self-describing byte stream.

// -----------------------------------------------------------------------------
// Modules

pub mod binary;

#[cfg(feature = "json")]
pub mod json;

use alloc::string::String;
use alloc::vec::Vec;

use crate::SerialError;

// -----------------------------------------------------------------------------
// FormatWriter

/// Write half of a format adapter.
pub trait FormatWriter {
    /// Starts a keyed object, closed by [`end_object`](Self::end_object).
    fn begin_object(&mut self, key: Option<&str>) -> Result<(), SerialError>;

    fn end_object(&mut self) -> Result<(), SerialError>;

    /// Starts an array of `len` positional values, closed by [`end_array`](Self::end_array).
    fn begin_array(&mut self, key: Option<&str>, len: usize) -> Result<(), SerialError>;

    fn end_array(&mut self) -> Result<(), SerialError>;

    /// Records whether an omittable field follows.
    ///
    /// When `present` is `false`, nothing else is written for `key`.
    fn field_presence(&mut self, key: Option<&str>, present: bool) -> Result<(), SerialError>;

    /// Writes the explicit "no object" marker.
    fn write_null(&mut self, key: Option<&str>) -> Result<(), SerialError>;

    fn write_bool(&mut self, key: Option<&str>, value: bool) -> Result<(), SerialError>;

    fn write_i64(&mut self, key: Option<&str>, value: i64) -> Result<(), SerialError>;

    fn write_u64(&mut self, key: Option<&str>, value: u64) -> Result<(), SerialError>;

    fn write_f64(&mut self, key: Option<&str>, value: f64) -> Result<(), SerialError>;

    fn write_str(&mut self, key: Option<&str>, value: &str) -> Result<(), SerialError>;

    fn write_bytes(&mut self, key: Option<&str>, value: &[u8]) -> Result<(), SerialError>;
}

// -----------------------------------------------------------------------------
// FormatReader

/// Read half of a format adapter.
pub trait FormatReader {
    fn begin_object(&mut self, key: Option<&str>) -> Result<(), SerialError>;

    /// Leaves the current object.
    ///
    /// The cursor must end up after the object even if its body was not
    /// fully consumed, which lets the traversal skip unresolvable subtrees.
    fn end_object(&mut self) -> Result<(), SerialError>;

    /// Enters an array, returning its element count.
    fn begin_array(&mut self, key: Option<&str>) -> Result<usize, SerialError>;

    fn end_array(&mut self) -> Result<(), SerialError>;

    /// Counterpart of [`FormatWriter::field_presence`].
    fn field_present(&mut self, key: Option<&str>) -> Result<bool, SerialError>;

    /// Consumes the "no object" marker if it is next, returning whether it was.
    fn read_null(&mut self, key: Option<&str>) -> Result<bool, SerialError>;

    fn read_bool(&mut self, key: Option<&str>) -> Result<bool, SerialError>;

    fn read_i64(&mut self, key: Option<&str>) -> Result<i64, SerialError>;

    fn read_u64(&mut self, key: Option<&str>) -> Result<u64, SerialError>;

    fn read_f64(&mut self, key: Option<&str>) -> Result<f64, SerialError>;

    fn read_string(&mut self, key: Option<&str>) -> Result<String, SerialError>;

    fn read_bytes(&mut self, key: Option<&str>) -> Result<Vec<u8>, SerialError>;
}
