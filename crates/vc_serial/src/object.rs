use alloc::boxed::Box;
use core::any::{Any, TypeId};

use crate::{SerialError, SerializedVersion, Serializer};

// -----------------------------------------------------------------------------
// SerializedObject

/// Decomposition contract of an object type.
///
/// [`serialize`](Self::serialize) is shared between reading and writing:
/// it must visit the same keys in the same order regardless of
/// [`Serializer::is_reading`], only the data moves in a different direction.
///
/// Objects can be stored polymorphically as `Box<dyn SerializedObject>`,
/// in which case the concrete type is persisted next to the data. Such types
/// must be registered with a constructor, see [`TypeRegistry::register`].
///
/// # Examples
///
/// ```
/// use vc_serial::{FieldOptions, SerialError, SerializedObject, Serializer};
///
/// #[derive(Default)]
/// struct Circle {
///     radius: f32,
/// }
///
/// impl SerializedObject for Circle {
///     fn serialize(&mut self, s: &mut Serializer<'_>) -> Result<(), SerialError> {
///         s.serialize_or("radius", &mut self.radius, 1.0, FieldOptions::PREFER_COMPACT)
///     }
/// }
/// ```
///
/// [`TypeRegistry::register`]: crate::registry::TypeRegistry::register
pub trait SerializedObject: Any {
    /// Visits every persisted field of `self`.
    fn serialize(&mut self, serializer: &mut Serializer<'_>) -> Result<(), SerialError>;

    /// Returns the version capability, if this type declares one.
    fn versioned(&self) -> Option<&dyn SerializedVersion> {
        None
    }

    /// The native fully-qualified name of the concrete type.
    fn type_path(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

impl dyn SerializedObject {
    /// The version `self` persists, defaults to [`DEFAULT_VERSION`].
    ///
    /// [`DEFAULT_VERSION`]: crate::DEFAULT_VERSION
    #[inline]
    pub fn current_version(&self) -> u16 {
        match self.versioned() {
            Some(versioned) => versioned.version(),
            None => crate::DEFAULT_VERSION,
        }
    }

    /// The [`TypeId`] of the concrete type behind the trait object.
    #[inline]
    pub fn concrete_type_id(&self) -> TypeId {
        (self as &dyn Any).type_id()
    }

    /// Returns `true` if the concrete type is `T`.
    #[inline]
    pub fn is<T: SerializedObject>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Returns a reference to the concrete value if it is of type `T`.
    #[inline]
    pub fn downcast_ref<T: SerializedObject>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    /// Returns a mutable reference to the concrete value if it is of type `T`.
    #[inline]
    pub fn downcast_mut<T: SerializedObject>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }

    /// Converts the box into the concrete type, or gives it back on mismatch.
    pub fn downcast<T: SerializedObject>(
        self: Box<Self>,
    ) -> Result<Box<T>, Box<dyn SerializedObject>> {
        if self.is::<T>() {
            match (self as Box<dyn Any>).downcast::<T>() {
                Ok(value) => Ok(value),
                Err(_) => unreachable!("type was checked before the downcast"),
            }
        } else {
            Err(self)
        }
    }
}

impl core::fmt::Debug for dyn SerializedObject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerializedObject")
            .field("type_path", &self.type_path())
            .field("version", &self.current_version())
            .finish()
    }
}
