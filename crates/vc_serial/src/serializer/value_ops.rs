use alloc::boxed::Box;

use super::{Scalar, Serializer};
use crate::error::key_name;
use crate::registry::TypeSerializerFn;
use crate::{FieldOptions, SerialError, SerializedObject};

impl Serializer<'_> {
    // -------------------------------------------------------------------------
    // Field policy

    /// Handles the presence marker of a field, returning whether its body
    /// follows.
    ///
    /// Fields without a known default and without flags carry no marker.
    pub(super) fn enter_field(
        &mut self,
        key: Option<&str>,
        options: FieldOptions,
        has_default: bool,
        is_default: impl FnOnce() -> bool,
    ) -> Result<bool, SerialError> {
        if !has_default && !options.is_defaultable() {
            return Ok(true);
        }
        let omit = self.is_writing() && options.is_compact() && is_default();
        self.presence(key, !omit)
    }

    /// Outcome of a field without a default whose body is absent.
    pub(super) fn absent(&self, key: Option<&str>, options: FieldOptions) -> Result<(), SerialError> {
        if self.is_writing() || options.contains(FieldOptions::OPTIONAL) {
            Ok(())
        } else {
            Err(SerialError::missing(key))
        }
    }

    /// Replaces a recoverable read failure by `default`.
    fn recover<T>(
        &self,
        key: Option<&str>,
        result: Result<(), SerialError>,
        value: &mut T,
        default: T,
    ) -> Result<(), SerialError> {
        match result {
            Err(err) if self.is_reading() && err.is_recoverable() => {
                log::warn!(
                    "{}.{}: {err}, falling back to the default value",
                    self.path,
                    key_name(key),
                );
                *value = default;
                Ok(())
            }
            result => result,
        }
    }

    pub(super) fn scalar_or<T: Scalar + PartialEq>(
        &mut self,
        key: Option<&str>,
        value: &mut T,
        default: T,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        if !self.enter_field(key, options, true, || *value == default)? {
            if self.is_reading() {
                *value = default;
            }
            return Ok(());
        }
        let result = self.scalar(key, value);
        self.recover(key, result, value, default)
    }

    fn struct_field<T>(
        &mut self,
        key: Option<&str>,
        value: &mut T,
        options: FieldOptions,
        func: TypeSerializerFn<T>,
        version: Option<u16>,
    ) -> Result<(), SerialError> {
        if !self.enter_field(key, options, false, || false)? {
            return self.absent(key, options);
        }
        self.struct_value(key, value, func, version)
    }

    fn struct_field_or<T: PartialEq>(
        &mut self,
        key: Option<&str>,
        value: &mut T,
        default: T,
        options: FieldOptions,
        func: TypeSerializerFn<T>,
        version: Option<u16>,
    ) -> Result<(), SerialError> {
        if !self.enter_field(key, options, true, || *value == default)? {
            if self.is_reading() {
                *value = default;
            }
            return Ok(());
        }
        let result = self.struct_value(key, value, func, version);
        self.recover(key, result, value, default)
    }

    /// A struct decomposed by `func`, with a `$version` only if `version`
    /// is given.
    pub(super) fn struct_value<T>(
        &mut self,
        key: Option<&str>,
        value: &mut T,
        func: TypeSerializerFn<T>,
        version: Option<u16>,
    ) -> Result<(), SerialError> {
        self.object_scope(key, |s| match version {
            Some(version) => s.version_scope(version, |s| func(value, s)),
            None => func(value, s),
        })
    }

    /// Looks up the registered serializer of `T`.
    pub(super) fn custom_fn<T: 'static>(&self) -> Result<(TypeSerializerFn<T>, Option<u16>), SerialError> {
        self.registry
            .get_serializer::<T>()
            .and_then(|registration| Some((registration.get::<T>()?, registration.version())))
            .ok_or(SerialError::NoSerializer(core::any::type_name::<T>()))
    }

    /// A concrete object, with its `$version`.
    pub(super) fn object_value<T: SerializedObject>(
        &mut self,
        key: Option<&str>,
        value: &mut T,
    ) -> Result<(), SerialError> {
        self.object_scope(key, |s| s.object_fields(value))
    }

    /// A polymorphic object or the "no object" marker.
    ///
    /// With `recover`, an unresolvable or broken object is skipped and the
    /// slot left empty.
    pub(super) fn dyn_value(
        &mut self,
        key: Option<&str>,
        value: &mut Option<Box<dyn SerializedObject>>,
        recover: bool,
    ) -> Result<(), SerialError> {
        if self.null_marker(key, value.is_none())? {
            *value = None;
            return Ok(());
        }
        if self.is_writing() {
            return match value.as_deref_mut() {
                Some(object) => self.object_scope(key, |s| s.write_dyn_fields(object)),
                None => Ok(()),
            };
        }
        match self.object_scope(key, |s| s.read_dyn_fields(value.take())) {
            Ok(object) => {
                *value = Some(object);
                Ok(())
            }
            Err(err) if recover && err.is_recoverable() => {
                log::warn!(
                    "{}.{}: {err}, the object is skipped",
                    self.path,
                    key_name(key),
                );
                *value = None;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    // -------------------------------------------------------------------------
    // Scalars

    /// Visits a scalar field.
    ///
    /// The field is required on read unless `options` holds
    /// [`FieldOptions::OPTIONAL`], in which case a missing field keeps the
    /// current value.
    pub fn serialize<T: Scalar>(
        &mut self,
        key: &str,
        value: &mut T,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        let key = Some(key);
        if !self.enter_field(key, options, false, || false)? {
            return self.absent(key, options);
        }
        self.scalar(key, value)
    }

    /// Visits a scalar field with a declared default.
    ///
    /// With [`FieldOptions::PREFER_COMPACT`] the field is omitted when it
    /// equals `default`. On read an absent or malformed field becomes
    /// `default`.
    pub fn serialize_or<T: Scalar + PartialEq>(
        &mut self,
        key: &str,
        value: &mut T,
        default: T,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        self.scalar_or(Some(key), value, default, options)
    }

    // -------------------------------------------------------------------------
    // Structs

    /// Visits a nested struct through an explicit decomposition callback.
    pub fn serialize_struct<T>(
        &mut self,
        key: &str,
        value: &mut T,
        options: FieldOptions,
        func: TypeSerializerFn<T>,
    ) -> Result<(), SerialError> {
        self.struct_field(Some(key), value, options, func, None)
    }

    /// [`serialize_struct`](Self::serialize_struct) with a declared default.
    pub fn serialize_struct_or<T: PartialEq>(
        &mut self,
        key: &str,
        value: &mut T,
        default: T,
        options: FieldOptions,
        func: TypeSerializerFn<T>,
    ) -> Result<(), SerialError> {
        self.struct_field_or(Some(key), value, default, options, func, None)
    }

    /// Visits a nested struct through the serializer registered for `T`.
    ///
    /// Fails with [`SerialError::NoSerializer`] if none is registered.
    pub fn serialize_custom<T: 'static>(
        &mut self,
        key: &str,
        value: &mut T,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        let (func, version) = self.custom_fn::<T>()?;
        self.struct_field(Some(key), value, options, func, version)
    }

    /// [`serialize_custom`](Self::serialize_custom) with a declared default.
    pub fn serialize_custom_or<T: PartialEq + 'static>(
        &mut self,
        key: &str,
        value: &mut T,
        default: T,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        let (func, version) = self.custom_fn::<T>()?;
        self.struct_field_or(Some(key), value, default, options, func, version)
    }

    // -------------------------------------------------------------------------
    // Objects

    /// Visits an owned object of a statically known type.
    ///
    /// No type name is persisted. The object keeps its identity: on read it
    /// is filled in place.
    pub fn serialize_object<T: SerializedObject>(
        &mut self,
        key: &str,
        value: &mut T,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        let key = Some(key);
        if !self.enter_field(key, options, false, || false)? {
            return self.absent(key, options);
        }
        self.object_value(key, value)
    }

    /// Visits a polymorphic object slot.
    ///
    /// `None` is persisted as the "no object" marker. On write the concrete
    /// type is persisted by its alias or type path. On read the persisted
    /// name is resolved through the registry. An existing instance of the
    /// same type is reused, otherwise a new one is constructed. A name that
    /// can not be resolved leaves the slot `None` and the traversal goes on.
    pub fn serialize_dyn(
        &mut self,
        key: &str,
        value: &mut Option<Box<dyn SerializedObject>>,
        options: FieldOptions,
    ) -> Result<(), SerialError> {
        let key = Some(key);
        if !self.enter_field(key, options, false, || value.is_none())? {
            if self.is_reading() && !options.contains(FieldOptions::OPTIONAL) {
                *value = None;
            }
            return Ok(());
        }
        self.dyn_value(key, value, true)
    }
}
