//! Structured-document adapter built on [`serde_json::Value`].
//!
//! Objects become JSON objects keyed by field name, arrays become JSON
//! arrays and the "no object" marker is `null`. Maps are arrays of
//! `{"key": .., "value": ..}` entries so integer keys survive unchanged.
//! Omitted fields are simply absent from their object.
//!
//! # Example
//!
//! ```
//! use vc_serial::format::json;
//! use vc_serial::registry::TypeRegistry;
//! use vc_serial::{FieldOptions, SerialError, SerializedObject, Serializer};
//!
//! #[derive(Default, Debug, PartialEq)]
//! struct Settings {
//!     volume: u8,
//!     name: String,
//! }
//!
//! impl SerializedObject for Settings {
//!     fn serialize(&mut self, s: &mut Serializer<'_>) -> Result<(), SerialError> {
//!         s.serialize_or("volume", &mut self.volume, 100, FieldOptions::PREFER_COMPACT)?;
//!         s.serialize("name", &mut self.name, FieldOptions::NONE)
//!     }
//! }
//!
//! let registry = TypeRegistry::new();
//! let mut input = Settings { volume: 100, name: "main".into() };
//!
//! let text = json::to_string(&registry, &mut input).unwrap();
//! assert_eq!(text, r#"{"$version":1,"name":"main"}"#);
//!
//! let output: Settings = json::from_str(&registry, &text).unwrap();
//! assert_eq!(output, input);
//! ```

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use serde_json::{Map, Number, Value};

use crate::format::{FormatReader, FormatWriter};
use crate::registry::TypeRegistry;
use crate::{SerialError, SerializedObject};

// -----------------------------------------------------------------------------
// JsonWriter

enum Container {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

/// Builds a [`Value`] tree.
#[derive(Default)]
pub struct JsonWriter {
    stack: Vec<(Option<String>, Container)>,
    root: Option<Value>,
}

impl JsonWriter {
    pub const fn new() -> Self {
        Self {
            stack: Vec::new(),
            root: None,
        }
    }

    /// Returns the finished document.
    pub fn into_value(self) -> Result<Value, SerialError> {
        if !self.stack.is_empty() {
            return Err(SerialError::Unbalanced);
        }
        Ok(self.root.unwrap_or(Value::Null))
    }

    fn put(&mut self, key: Option<&str>, value: Value) -> Result<(), SerialError> {
        match self.stack.last_mut() {
            Some((_, Container::Object(map))) => match key {
                Some(key) => {
                    map.insert(key.to_owned(), value);
                    Ok(())
                }
                None => Err(SerialError::malformed(key, "a keyed field")),
            },
            Some((_, Container::Array(items))) => {
                items.push(value);
                Ok(())
            }
            None => {
                self.root = Some(value);
                Ok(())
            }
        }
    }

    fn close(&mut self) -> Result<(), SerialError> {
        let (key, container) = self.stack.pop().ok_or(SerialError::Unbalanced)?;
        let value = match container {
            Container::Object(map) => Value::Object(map),
            Container::Array(items) => Value::Array(items),
        };
        self.put(key.as_deref(), value)
    }
}

impl FormatWriter for JsonWriter {
    fn begin_object(&mut self, key: Option<&str>) -> Result<(), SerialError> {
        self.stack
            .push((key.map(ToOwned::to_owned), Container::Object(Map::new())));
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), SerialError> {
        match self.stack.last() {
            Some((_, Container::Object(_))) => self.close(),
            _ => Err(SerialError::Unbalanced),
        }
    }

    fn begin_array(&mut self, key: Option<&str>, len: usize) -> Result<(), SerialError> {
        self.stack.push((
            key.map(ToOwned::to_owned),
            Container::Array(Vec::with_capacity(len)),
        ));
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), SerialError> {
        match self.stack.last() {
            Some((_, Container::Array(_))) => self.close(),
            _ => Err(SerialError::Unbalanced),
        }
    }

    #[inline]
    fn field_presence(&mut self, _key: Option<&str>, _present: bool) -> Result<(), SerialError> {
        Ok(())
    }

    fn write_null(&mut self, key: Option<&str>) -> Result<(), SerialError> {
        self.put(key, Value::Null)
    }

    fn write_bool(&mut self, key: Option<&str>, value: bool) -> Result<(), SerialError> {
        self.put(key, Value::Bool(value))
    }

    fn write_i64(&mut self, key: Option<&str>, value: i64) -> Result<(), SerialError> {
        self.put(key, Value::from(value))
    }

    fn write_u64(&mut self, key: Option<&str>, value: u64) -> Result<(), SerialError> {
        self.put(key, Value::from(value))
    }

    fn write_f64(&mut self, key: Option<&str>, value: f64) -> Result<(), SerialError> {
        let number = Number::from_f64(value)
            .ok_or(SerialError::UnsupportedValue("non-finite float in a JSON document"))?;
        self.put(key, Value::Number(number))
    }

    fn write_str(&mut self, key: Option<&str>, value: &str) -> Result<(), SerialError> {
        self.put(key, Value::String(value.to_owned()))
    }

    fn write_bytes(&mut self, key: Option<&str>, value: &[u8]) -> Result<(), SerialError> {
        let items = value.iter().map(|byte| Value::from(*byte)).collect();
        self.put(key, Value::Array(items))
    }
}

// -----------------------------------------------------------------------------
// JsonReader

#[derive(Clone, Copy)]
enum Frame<'a> {
    Object(&'a Map<String, Value>),
    Array { items: &'a [Value], next: usize },
}

/// Reads from a borrowed [`Value`] tree.
pub struct JsonReader<'a> {
    root: &'a Value,
    root_taken: bool,
    stack: Vec<Frame<'a>>,
}

impl<'a> JsonReader<'a> {
    pub const fn new(root: &'a Value) -> Self {
        Self {
            root,
            root_taken: false,
            stack: Vec::new(),
        }
    }

    fn peek(&self, key: Option<&str>) -> Result<&'a Value, SerialError> {
        match self.stack.last().copied() {
            Some(Frame::Object(map)) => match key {
                Some(name) => map.get(name).ok_or_else(|| SerialError::missing(key)),
                None => Err(SerialError::malformed(key, "a keyed field")),
            },
            Some(Frame::Array { items, next }) => items.get(next).ok_or(SerialError::UnexpectedEnd),
            None if self.root_taken => Err(SerialError::UnexpectedEnd),
            None => Ok(self.root),
        }
    }

    fn advance(&mut self) {
        match self.stack.last_mut() {
            Some(Frame::Array { next, .. }) => *next += 1,
            Some(Frame::Object(_)) => {}
            None => self.root_taken = true,
        }
    }

    fn take(&mut self, key: Option<&str>) -> Result<&'a Value, SerialError> {
        let value = self.peek(key)?;
        self.advance();
        Ok(value)
    }
}

impl FormatReader for JsonReader<'_> {
    fn begin_object(&mut self, key: Option<&str>) -> Result<(), SerialError> {
        let map = self
            .take(key)?
            .as_object()
            .ok_or_else(|| SerialError::malformed(key, "an object"))?;
        self.stack.push(Frame::Object(map));
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), SerialError> {
        match self.stack.pop() {
            Some(Frame::Object(_)) => Ok(()),
            _ => Err(SerialError::Unbalanced),
        }
    }

    fn begin_array(&mut self, key: Option<&str>) -> Result<usize, SerialError> {
        let items = self
            .take(key)?
            .as_array()
            .ok_or_else(|| SerialError::malformed(key, "an array"))?;
        self.stack.push(Frame::Array {
            items: items.as_slice(),
            next: 0,
        });
        Ok(items.len())
    }

    fn end_array(&mut self) -> Result<(), SerialError> {
        match self.stack.pop() {
            Some(Frame::Array { .. }) => Ok(()),
            _ => Err(SerialError::Unbalanced),
        }
    }

    fn field_present(&mut self, key: Option<&str>) -> Result<bool, SerialError> {
        Ok(match self.stack.last().copied() {
            Some(Frame::Object(map)) => key.is_some_and(|name| map.contains_key(name)),
            Some(Frame::Array { items, next }) => next < items.len(),
            None => !self.root_taken,
        })
    }

    fn read_null(&mut self, key: Option<&str>) -> Result<bool, SerialError> {
        if self.peek(key)?.is_null() {
            self.advance();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn read_bool(&mut self, key: Option<&str>) -> Result<bool, SerialError> {
        self.take(key)?
            .as_bool()
            .ok_or_else(|| SerialError::malformed(key, "a boolean"))
    }

    fn read_i64(&mut self, key: Option<&str>) -> Result<i64, SerialError> {
        self.take(key)?
            .as_i64()
            .ok_or_else(|| SerialError::malformed(key, "a signed integer"))
    }

    fn read_u64(&mut self, key: Option<&str>) -> Result<u64, SerialError> {
        self.take(key)?
            .as_u64()
            .ok_or_else(|| SerialError::malformed(key, "an unsigned integer"))
    }

    fn read_f64(&mut self, key: Option<&str>) -> Result<f64, SerialError> {
        self.take(key)?
            .as_f64()
            .ok_or_else(|| SerialError::malformed(key, "a number"))
    }

    fn read_string(&mut self, key: Option<&str>) -> Result<String, SerialError> {
        match self.take(key)?.as_str() {
            Some(text) => Ok(text.to_owned()),
            None => Err(SerialError::malformed(key, "a string")),
        }
    }

    fn read_bytes(&mut self, key: Option<&str>) -> Result<Vec<u8>, SerialError> {
        let items = self
            .take(key)?
            .as_array()
            .ok_or_else(|| SerialError::malformed(key, "a byte array"))?;
        items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|byte| u8::try_from(byte).ok())
                    .ok_or_else(|| SerialError::malformed(key, "a byte"))
            })
            .collect()
    }
}

// -----------------------------------------------------------------------------
// Convenience

/// Writes `value` as the root object of a new document.
pub fn to_value<T: SerializedObject>(
    registry: &TypeRegistry,
    value: &mut T,
) -> Result<Value, SerialError> {
    let mut writer = JsonWriter::new();
    crate::to_writer(registry, &mut writer, value)?;
    writer.into_value()
}

/// Writes `value` as compact JSON text.
pub fn to_string<T: SerializedObject>(
    registry: &TypeRegistry,
    value: &mut T,
) -> Result<String, SerialError> {
    Ok(serde_json::to_string(&to_value(registry, value)?)?)
}

/// Writes `value` as indented JSON text.
pub fn to_string_pretty<T: SerializedObject>(
    registry: &TypeRegistry,
    value: &mut T,
) -> Result<String, SerialError> {
    Ok(serde_json::to_string_pretty(&to_value(registry, value)?)?)
}

/// Reads a root object of type `T`.
pub fn from_value<T: SerializedObject + Default>(
    registry: &TypeRegistry,
    value: &Value,
) -> Result<T, SerialError> {
    crate::from_reader(registry, &mut JsonReader::new(value))
}

/// Parses JSON text and reads a root object of type `T`.
pub fn from_str<T: SerializedObject + Default>(
    registry: &TypeRegistry,
    text: &str,
) -> Result<T, SerialError> {
    let value: Value = serde_json::from_str(text)?;
    from_value(registry, &value)
}

/// Writes a polymorphic root object, tagged with its persisted type name.
pub fn to_value_dyn(
    registry: &TypeRegistry,
    value: &mut dyn SerializedObject,
) -> Result<Value, SerialError> {
    let mut writer = JsonWriter::new();
    crate::to_writer_dyn(registry, &mut writer, value)?;
    writer.into_value()
}

/// Writes a polymorphic root object as compact JSON text.
pub fn to_string_dyn(
    registry: &TypeRegistry,
    value: &mut dyn SerializedObject,
) -> Result<String, SerialError> {
    Ok(serde_json::to_string(&to_value_dyn(registry, value)?)?)
}

/// Reads a polymorphic root object.
pub fn from_value_dyn(
    registry: &TypeRegistry,
    value: &Value,
) -> Result<Box<dyn SerializedObject>, SerialError> {
    crate::from_reader_dyn(registry, &mut JsonReader::new(value))
}

/// Parses JSON text and reads a polymorphic root object.
pub fn from_str_dyn(
    registry: &TypeRegistry,
    text: &str,
) -> Result<Box<dyn SerializedObject>, SerialError> {
    let value: Value = serde_json::from_str(text)?;
    from_value_dyn(registry, &value)
}

// -----------------------------------------------------------------------------
// Tests
