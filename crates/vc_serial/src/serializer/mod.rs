//! The traversal engine.
//!
//! A [`Serializer`] is a single-direction session over one format adapter.
//! User types describe their fields once, in
//! [`SerializedObject::serialize`], and the same description is run for
//! both reading and writing. Every public operation is built from a handful
//! of primitives that dispatch on the direction, so both directions visit
//! the same keys in the same order by construction.
//!
//! Sessions are only created by the entry points of this module
//! ([`to_writer`], [`from_reader`], ...) and end when they return, so a
//! finished session can not be used again.
//!
//! ## Reserved keys
//!
//! - `$type`: persisted name of a polymorphic object.
//! - `$version`: version of an object, `1` when absent.

// -----------------------------------------------------------------------------
// Modules

mod collection_ops;
mod field_path;
mod scalar;
mod value_ops;

// -----------------------------------------------------------------------------
// Exports

pub use scalar::{MapKey, Scalar};

// -----------------------------------------------------------------------------
// Serializer

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::format::{FormatReader, FormatWriter};
use crate::registry::TypeRegistry;
use crate::{DEFAULT_VERSION, FieldOptions, SerialError, SerializedObject};

use field_path::FieldPath;

/// Key of the persisted type name of polymorphic objects.
pub const TYPE_KEY: &str = "$type";
/// Key of the persisted version of objects.
pub const VERSION_KEY: &str = "$version";

/// Direction of a [`Serializer`] session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Reading,
    Writing,
}

enum Mode<'a> {
    Reading(&'a mut dyn FormatReader),
    Writing(&'a mut dyn FormatWriter),
}

/// A single-direction traversal session.
///
/// See the [module docs](self) for an overview, and the `serialize*`,
/// `*_array`, `*_set` and `*_map` methods for the field operations.
pub struct Serializer<'a> {
    mode: Mode<'a>,
    registry: &'a TypeRegistry,
    versions: Vec<u16>,
    path: FieldPath,
}

impl<'a> Serializer<'a> {
    fn new(registry: &'a TypeRegistry, mode: Mode<'a>) -> Self {
        Self {
            mode,
            registry,
            versions: Vec::new(),
            path: FieldPath::new(),
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        match self.mode {
            Mode::Reading(_) => Direction::Reading,
            Mode::Writing(_) => Direction::Writing,
        }
    }

    /// Returns `true` if data flows from the format into the objects.
    #[inline]
    pub fn is_reading(&self) -> bool {
        matches!(self.mode, Mode::Reading(_))
    }

    /// Returns `true` if data flows from the objects into the format.
    #[inline]
    pub fn is_writing(&self) -> bool {
        matches!(self.mode, Mode::Writing(_))
    }

    #[inline]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// Version of the innermost object being visited.
    ///
    /// While reading this is the persisted version, which may be older than
    /// the one the type currently declares.
    #[inline]
    pub fn version(&self) -> u16 {
        self.versions.last().copied().unwrap_or(DEFAULT_VERSION)
    }

    // -------------------------------------------------------------------------
    // Primitives
    //
    // Each one takes the same arguments in both directions.

    fn begin_object(&mut self, key: Option<&str>) -> Result<(), SerialError> {
        match &mut self.mode {
            Mode::Reading(reader) => reader.begin_object(key),
            Mode::Writing(writer) => writer.begin_object(key),
        }
    }

    fn end_object(&mut self) -> Result<(), SerialError> {
        match &mut self.mode {
            Mode::Reading(reader) => reader.end_object(),
            Mode::Writing(writer) => writer.end_object(),
        }
    }

    /// Returns the number of elements to visit.
    fn begin_array(&mut self, key: Option<&str>, len: usize) -> Result<usize, SerialError> {
        match &mut self.mode {
            Mode::Reading(reader) => reader.begin_array(key),
            Mode::Writing(writer) => writer.begin_array(key, len).map(|()| len),
        }
    }

    fn end_array(&mut self) -> Result<(), SerialError> {
        match &mut self.mode {
            Mode::Reading(reader) => reader.end_array(),
            Mode::Writing(writer) => writer.end_array(),
        }
    }

    /// Returns whether the field body follows.
    fn presence(&mut self, key: Option<&str>, present: bool) -> Result<bool, SerialError> {
        match &mut self.mode {
            Mode::Reading(reader) => reader.field_present(key),
            Mode::Writing(writer) => writer.field_presence(key, present).map(|()| present),
        }
    }

    /// Returns whether the value is the "no object" marker.
    fn null_marker(&mut self, key: Option<&str>, is_null: bool) -> Result<bool, SerialError> {
        match &mut self.mode {
            Mode::Reading(reader) => reader.read_null(key),
            Mode::Writing(writer) if is_null => writer.write_null(key).map(|()| true),
            Mode::Writing(_) => Ok(false),
        }
    }

    fn scalar<T: Scalar>(&mut self, key: Option<&str>, value: &mut T) -> Result<(), SerialError> {
        match &mut self.mode {
            Mode::Reading(reader) => {
                *value = T::read_from(&mut **reader, key)?;
                Ok(())
            }
            Mode::Writing(writer) => value.write_to(&mut **writer, key),
        }
    }

    // -------------------------------------------------------------------------
    // Scopes

    /// Runs `body` inside an object, always closing it.
    ///
    /// Closing after a failed body lets the reader skip the remainder.
    fn object_scope<R>(
        &mut self,
        key: Option<&str>,
        body: impl FnOnce(&mut Self) -> Result<R, SerialError>,
    ) -> Result<R, SerialError> {
        self.begin_object(key)?;
        self.path.push(key);
        let result = body(self);
        self.path.pop();
        let end = self.end_object();
        match (result, end) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(err), _) | (Ok(_), Err(err)) => Err(err),
        }
    }

    /// Persists `version` under `$version` and exposes the persisted value
    /// through [`Serializer::version`] while `body` runs.
    fn version_scope<R>(
        &mut self,
        version: u16,
        body: impl FnOnce(&mut Self) -> Result<R, SerialError>,
    ) -> Result<R, SerialError> {
        let mut version = version;
        self.scalar_or(Some(VERSION_KEY), &mut version, DEFAULT_VERSION, FieldOptions::NONE)?;
        self.versions.push(version);
        let result = body(self);
        self.versions.pop();
        result
    }

    /// Visits the fields of an object, including its version.
    fn object_fields(&mut self, object: &mut dyn SerializedObject) -> Result<(), SerialError> {
        self.version_scope(object.current_version(), |s| object.serialize(s))
    }

    /// Visits a polymorphic object body: `$type`, then the object fields.
    fn write_dyn_fields(&mut self, object: &mut dyn SerializedObject) -> Result<(), SerialError> {
        let mut name = match self.registry.resolve_name_for_type(object.concrete_type_id()) {
            Some(name) => String::from(name),
            None => {
                log::warn!(
                    "{}: type `{}` is not registered and can not be read back",
                    self.path,
                    object.type_path(),
                );
                String::from(object.type_path())
            }
        };
        self.scalar(Some(TYPE_KEY), &mut name)?;
        self.object_fields(object)
    }

    /// Reads a polymorphic object body, reusing `existing` if it has the
    /// persisted type.
    fn read_dyn_fields(
        &mut self,
        existing: Option<Box<dyn SerializedObject>>,
    ) -> Result<Box<dyn SerializedObject>, SerialError> {
        let registry = self.registry;

        let mut name = String::new();
        self.scalar(Some(TYPE_KEY), &mut name)?;
        let Some(meta) = registry.resolve_type_by_name(&name) else {
            return Err(SerialError::UnresolvedType(name));
        };

        let mut object = match existing {
            Some(object) if object.concrete_type_id() == meta.type_id() => object,
            _ => registry.instantiate(meta)?,
        };
        self.object_fields(&mut *object)?;
        Ok(object)
    }
}

// -----------------------------------------------------------------------------
// Entry points

/// Runs `body` in a writing session whose root is an object.
pub fn write_with<R>(
    registry: &TypeRegistry,
    writer: &mut dyn FormatWriter,
    body: impl FnOnce(&mut Serializer<'_>) -> Result<R, SerialError>,
) -> Result<R, SerialError> {
    Serializer::new(registry, Mode::Writing(writer)).object_scope(None, body)
}

/// Runs `body` in a reading session whose root is an object.
pub fn read_with<R>(
    registry: &TypeRegistry,
    reader: &mut dyn FormatReader,
    body: impl FnOnce(&mut Serializer<'_>) -> Result<R, SerialError>,
) -> Result<R, SerialError> {
    Serializer::new(registry, Mode::Reading(reader)).object_scope(None, body)
}

/// Writes `value` as the root object.
pub fn to_writer<T: SerializedObject>(
    registry: &TypeRegistry,
    writer: &mut dyn FormatWriter,
    value: &mut T,
) -> Result<(), SerialError> {
    write_with(registry, writer, |s| s.object_fields(value))
}

/// Reads a root object of type `T`, starting from `T::default()`.
pub fn from_reader<T: SerializedObject + Default>(
    registry: &TypeRegistry,
    reader: &mut dyn FormatReader,
) -> Result<T, SerialError> {
    let mut value = T::default();
    read_with(registry, reader, |s| s.object_fields(&mut value))?;
    Ok(value)
}

/// Writes a polymorphic root object, tagged with its persisted type name.
pub fn to_writer_dyn(
    registry: &TypeRegistry,
    writer: &mut dyn FormatWriter,
    value: &mut dyn SerializedObject,
) -> Result<(), SerialError> {
    write_with(registry, writer, |s| s.write_dyn_fields(value))
}

/// Reads a polymorphic root object.
///
/// Unlike nested polymorphic fields, a root whose type can not be
/// resolved is an error.
pub fn from_reader_dyn(
    registry: &TypeRegistry,
    reader: &mut dyn FormatReader,
) -> Result<Box<dyn SerializedObject>, SerialError> {
    read_with(registry, reader, |s| s.read_dyn_fields(None))
}

// -----------------------------------------------------------------------------
// Tests
