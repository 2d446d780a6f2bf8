use alloc::boxed::Box;
use core::any::Any;

use crate::{SerialError, SerializedObject, Serializer};

// -----------------------------------------------------------------------------
// TypeSerializerFn

/// A decomposition callback: visits the fields of `T` through the session.
///
/// The same callback serves both directions. It must visit the same keys in
/// the same order whether the session is reading or writing.
pub type TypeSerializerFn<T> = fn(&mut T, &mut Serializer<'_>) -> Result<(), SerialError>;

// -----------------------------------------------------------------------------
// TypeTraitConstruct

/// A container providing parameterless construction for polymorphic objects.
///
/// Registered explicitly at startup through
/// [`TypeRegistry::register`](crate::registry::TypeRegistry::register) or
/// [`TypeRegistry::register_constructor`](crate::registry::TypeRegistry::register_constructor).
pub struct TypeTraitConstruct {
    func: Box<dyn Fn() -> Box<dyn SerializedObject> + Send + Sync>,
}

impl TypeTraitConstruct {
    /// Uses `T`'s [`Default`] implementation.
    pub fn of_default<T: SerializedObject + Default>() -> Self {
        Self {
            func: Box::new(|| -> Box<dyn SerializedObject> { Box::new(T::default()) }),
        }
    }

    /// Uses an explicit factory function.
    pub fn of_fn<T: SerializedObject>(factory: fn() -> T) -> Self {
        Self {
            func: Box::new(move || -> Box<dyn SerializedObject> { Box::new(factory()) }),
        }
    }

    /// Creates a new instance.
    #[inline(always)]
    pub fn construct(&self) -> Box<dyn SerializedObject> {
        (self.func)()
    }
}

// -----------------------------------------------------------------------------
// TypeTraitSerializer

/// A container holding the custom decomposition callback of one type.
///
/// The callback is stored type-erased; [`get`](Self::get) recovers it for
/// the exact type it was registered with.
pub struct TypeTraitSerializer {
    func: Box<dyn Any + Send + Sync>,
    version: Option<u16>,
}

impl TypeTraitSerializer {
    pub fn new<T: 'static>(func: TypeSerializerFn<T>, version: Option<u16>) -> Self {
        Self {
            func: Box::new(func),
            version,
        }
    }

    /// Returns the callback if it was registered for `T`.
    #[inline]
    pub fn get<T: 'static>(&self) -> Option<TypeSerializerFn<T>> {
        self.func.downcast_ref::<TypeSerializerFn<T>>().copied()
    }

    /// The version registered together with the callback.
    ///
    /// Types without a version do not persist a version tag.
    #[inline]
    pub fn version(&self) -> Option<u16> {
        self.version
    }
}
