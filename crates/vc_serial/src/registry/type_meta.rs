use alloc::string::String;
use core::any::TypeId;

use crate::registry::{TypeTraitConstruct, TypeTraitSerializer};

// -----------------------------------------------------------------------------
// TypeMeta

/// Runtime storage for everything the registry knows about one type.
///
/// Created on the first registration call mentioning the type, and filled
/// by the following ones.
pub struct TypeMeta {
    type_id: TypeId,
    type_path: &'static str,
    pub(super) alias: Option<String>,
    pub(super) construct: Option<TypeTraitConstruct>,
    pub(super) serializer: Option<TypeTraitSerializer>,
}

impl TypeMeta {
    /// Create an empty [`TypeMeta`] from a type.
    #[inline]
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_path: core::any::type_name::<T>(),
            alias: None,
            construct: None,
            serializer: None,
        }
    }

    #[inline(always)]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The native fully-qualified name, as given by [`core::any::type_name`].
    #[inline(always)]
    pub const fn type_path(&self) -> &'static str {
        self.type_path
    }

    #[inline]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name persisted for this type: the alias if any, else the type path.
    #[inline]
    pub fn persisted_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.type_path,
        }
    }

    #[inline]
    pub fn constructor(&self) -> Option<&TypeTraitConstruct> {
        self.construct.as_ref()
    }

    #[inline]
    pub fn serializer(&self) -> Option<&TypeTraitSerializer> {
        self.serializer.as_ref()
    }

    /// Whether [`TypeRegistry::instantiate`] can create this type.
    ///
    /// [`TypeRegistry::instantiate`]: crate::registry::TypeRegistry::instantiate
    #[inline]
    pub fn is_constructible(&self) -> bool {
        self.construct.is_some()
    }
}

impl core::fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeMeta")
            .field("type_path", &self.type_path)
            .field("alias", &self.alias)
            .field("constructible", &self.construct.is_some())
            .field("custom_serializer", &self.serializer.is_some())
            .finish()
    }
}
