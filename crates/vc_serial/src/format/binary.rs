//! Compact self-describing byte stream.
//!
//! Keys are not stored: fields are positional, which is sound because a
//! traversal visits the same keys in the same order in both directions.
//! Every value starts with a one-byte tag so mismatches are detected
//! instead of silently misread.
//!
//! | value    | encoding                                      |
//! |----------|-----------------------------------------------|
//! | null     | `0x00`                                        |
//! | bool     | `0x01`, one byte                              |
//! | signed   | `0x02`, `i64` little-endian                   |
//! | unsigned | `0x03`, `u64` little-endian                   |
//! | float    | `0x04`, `f64` little-endian                   |
//! | string   | `0x05`, `u32` byte length, UTF-8 bytes        |
//! | bytes    | `0x06`, `u32` byte length, bytes              |
//! | object   | `0x07`, `u32` body length, body               |
//! | array    | `0x08`, `u32` element count, elements         |
//!
//! Presence markers are a single untagged `0` or `1` byte. The object body
//! length lets a reader skip an object it could not interpret.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::format::{FormatReader, FormatWriter};
use crate::registry::TypeRegistry;
use crate::{SerialError, SerializedObject};

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_UINT: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_STR: u8 = 5;
const TAG_BYTES: u8 = 6;
const TAG_OBJECT: u8 = 7;
const TAG_ARRAY: u8 = 8;

// -----------------------------------------------------------------------------
// BinaryWriter

/// Appends to an owned byte buffer.
#[derive(Default)]
pub struct BinaryWriter {
    buf: Vec<u8>,
    // Offsets of the length slots of open objects.
    objects: Vec<usize>,
}

impl BinaryWriter {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            objects: Vec::new(),
        }
    }

    /// Returns the encoded bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>, SerialError> {
        if !self.objects.is_empty() {
            return Err(SerialError::Unbalanced);
        }
        Ok(self.buf)
    }

    fn write_len(&mut self, len: usize) -> Result<(), SerialError> {
        let len = u32::try_from(len)
            .map_err(|_| SerialError::UnsupportedValue("length exceeds u32::MAX"))?;
        self.buf.extend_from_slice(&len.to_le_bytes());
        Ok(())
    }
}

impl FormatWriter for BinaryWriter {
    fn begin_object(&mut self, _key: Option<&str>) -> Result<(), SerialError> {
        self.buf.push(TAG_OBJECT);
        self.objects.push(self.buf.len());
        self.buf.extend_from_slice(&[0; 4]);
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), SerialError> {
        let slot = self.objects.pop().ok_or(SerialError::Unbalanced)?;
        let len = u32::try_from(self.buf.len() - slot - 4)
            .map_err(|_| SerialError::UnsupportedValue("object body exceeds u32::MAX bytes"))?;
        self.buf[slot..slot + 4].copy_from_slice(&len.to_le_bytes());
        Ok(())
    }

    fn begin_array(&mut self, _key: Option<&str>, len: usize) -> Result<(), SerialError> {
        self.buf.push(TAG_ARRAY);
        self.write_len(len)
    }

    #[inline]
    fn end_array(&mut self) -> Result<(), SerialError> {
        Ok(())
    }

    fn field_presence(&mut self, _key: Option<&str>, present: bool) -> Result<(), SerialError> {
        self.buf.push(u8::from(present));
        Ok(())
    }

    fn write_null(&mut self, _key: Option<&str>) -> Result<(), SerialError> {
        self.buf.push(TAG_NULL);
        Ok(())
    }

    fn write_bool(&mut self, _key: Option<&str>, value: bool) -> Result<(), SerialError> {
        self.buf.extend_from_slice(&[TAG_BOOL, u8::from(value)]);
        Ok(())
    }

    fn write_i64(&mut self, _key: Option<&str>, value: i64) -> Result<(), SerialError> {
        self.buf.push(TAG_INT);
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn write_u64(&mut self, _key: Option<&str>, value: u64) -> Result<(), SerialError> {
        self.buf.push(TAG_UINT);
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn write_f64(&mut self, _key: Option<&str>, value: f64) -> Result<(), SerialError> {
        self.buf.push(TAG_FLOAT);
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn write_str(&mut self, _key: Option<&str>, value: &str) -> Result<(), SerialError> {
        self.buf.push(TAG_STR);
        self.write_len(value.len())?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn write_bytes(&mut self, _key: Option<&str>, value: &[u8]) -> Result<(), SerialError> {
        self.buf.push(TAG_BYTES);
        self.write_len(value.len())?;
        self.buf.extend_from_slice(value);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// BinaryReader

/// Reads from a borrowed byte slice.
pub struct BinaryReader<'a> {
    data: &'a [u8],
    pos: usize,
    // End offsets of open objects.
    objects: Vec<usize>,
}

impl<'a> BinaryReader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            objects: Vec::new(),
        }
    }

    /// Number of bytes not consumed yet.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SerialError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(SerialError::UnexpectedEnd)?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], SerialError> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn byte(&mut self) -> Result<u8, SerialError> {
        Ok(self.array::<1>()?[0])
    }

    fn len(&mut self) -> Result<usize, SerialError> {
        Ok(u32::from_le_bytes(self.array()?) as usize)
    }

    /// Consumes a tag. A different value is skipped whole, so the cursor
    /// stays on a value boundary when the caller recovers.
    fn expect_tag(&mut self, key: Option<&str>, tag: u8, expected: &'static str) -> Result<(), SerialError> {
        let found = self.byte()?;
        if found == tag {
            return Ok(());
        }
        self.skip_value(found)?;
        Err(SerialError::malformed(key, expected))
    }

    /// Skips the payload of a value whose tag was already consumed.
    fn skip_value(&mut self, tag: u8) -> Result<(), SerialError> {
        let mut tag = tag;
        // Array elements still to skip.
        let mut pending = 0_usize;
        loop {
            match tag {
                TAG_NULL => {}
                TAG_BOOL => {
                    self.take(1)?;
                }
                TAG_INT | TAG_UINT | TAG_FLOAT => {
                    self.take(8)?;
                }
                TAG_STR | TAG_BYTES | TAG_OBJECT => {
                    let len = self.len()?;
                    self.take(len)?;
                }
                TAG_ARRAY => pending = pending.saturating_add(self.len()?),
                _ => return Err(SerialError::UnknownTag(tag)),
            }
            if pending == 0 {
                return Ok(());
            }
            pending -= 1;
            tag = self.byte()?;
        }
    }
}

impl FormatReader for BinaryReader<'_> {
    fn begin_object(&mut self, key: Option<&str>) -> Result<(), SerialError> {
        self.expect_tag(key, TAG_OBJECT, "an object")?;
        let len = self.len()?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(SerialError::UnexpectedEnd)?;
        self.objects.push(end);
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), SerialError> {
        let end = self.objects.pop().ok_or(SerialError::Unbalanced)?;
        if self.pos > end {
            return Err(SerialError::Unbalanced);
        }
        self.pos = end;
        Ok(())
    }

    fn begin_array(&mut self, key: Option<&str>) -> Result<usize, SerialError> {
        self.expect_tag(key, TAG_ARRAY, "an array")?;
        self.len()
    }

    #[inline]
    fn end_array(&mut self) -> Result<(), SerialError> {
        Ok(())
    }

    fn field_present(&mut self, key: Option<&str>) -> Result<bool, SerialError> {
        match self.byte()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SerialError::malformed(key, "a presence marker")),
        }
    }

    fn read_null(&mut self, _key: Option<&str>) -> Result<bool, SerialError> {
        match self.data.get(self.pos) {
            Some(&TAG_NULL) => {
                self.pos += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(SerialError::UnexpectedEnd),
        }
    }

    fn read_bool(&mut self, key: Option<&str>) -> Result<bool, SerialError> {
        self.expect_tag(key, TAG_BOOL, "a boolean")?;
        match self.byte()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SerialError::malformed(key, "a boolean")),
        }
    }

    fn read_i64(&mut self, key: Option<&str>) -> Result<i64, SerialError> {
        self.expect_tag(key, TAG_INT, "a signed integer")?;
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn read_u64(&mut self, key: Option<&str>) -> Result<u64, SerialError> {
        self.expect_tag(key, TAG_UINT, "an unsigned integer")?;
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn read_f64(&mut self, key: Option<&str>) -> Result<f64, SerialError> {
        self.expect_tag(key, TAG_FLOAT, "a float")?;
        Ok(f64::from_le_bytes(self.array()?))
    }

    fn read_string(&mut self, key: Option<&str>) -> Result<String, SerialError> {
        self.expect_tag(key, TAG_STR, "a string")?;
        let len = self.len()?;
        let bytes = self.take(len)?;
        match core::str::from_utf8(bytes) {
            Ok(text) => Ok(String::from(text)),
            Err(_) => Err(SerialError::malformed(key, "UTF-8 text")),
        }
    }

    fn read_bytes(&mut self, key: Option<&str>) -> Result<Vec<u8>, SerialError> {
        self.expect_tag(key, TAG_BYTES, "a byte array")?;
        let len = self.len()?;
        Ok(self.take(len)?.to_vec())
    }
}

// -----------------------------------------------------------------------------
// Convenience

/// Encodes `value` as the root object.
pub fn to_bytes<T: SerializedObject>(
    registry: &TypeRegistry,
    value: &mut T,
) -> Result<Vec<u8>, SerialError> {
    let mut writer = BinaryWriter::new();
    crate::to_writer(registry, &mut writer, value)?;
    writer.into_bytes()
}

/// Decodes a root object of type `T`.
pub fn from_bytes<T: SerializedObject + Default>(
    registry: &TypeRegistry,
    data: &[u8],
) -> Result<T, SerialError> {
    crate::from_reader(registry, &mut BinaryReader::new(data))
}

/// Encodes a polymorphic root object, tagged with its persisted type name.
pub fn to_bytes_dyn(
    registry: &TypeRegistry,
    value: &mut dyn SerializedObject,
) -> Result<Vec<u8>, SerialError> {
    let mut writer = BinaryWriter::new();
    crate::to_writer_dyn(registry, &mut writer, value)?;
    writer.into_bytes()
}

/// Decodes a polymorphic root object.
pub fn from_bytes_dyn(
    registry: &TypeRegistry,
    data: &[u8],
) -> Result<Box<dyn SerializedObject>, SerialError> {
    crate::from_reader_dyn(registry, &mut BinaryReader::new(data))
}

// -----------------------------------------------------------------------------
// Tests
