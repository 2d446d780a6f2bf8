use alloc::boxed::Box;
use alloc::string::String;
use core::any::TypeId;

use crate::hash::HashMap;
use crate::registry::{TypeMeta, TypeSerializerFn, TypeTraitConstruct, TypeTraitSerializer};
use crate::{SerialError, SerializedObject};

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of serializable types.
///
/// This struct is the central store for type identity: it maps types to
/// stable aliases, resolves renamed types on read, and holds the explicit
/// constructors and custom decomposition callbacks used during traversal.
///
/// Registration is expected to happen once during startup, before any
/// session begins. Sessions only borrow the registry immutably; use
/// [`TypeRegistryArc`] to share one registry between threads.
///
/// # Example
///
/// ```
/// use vc_serial::registry::TypeRegistry;
/// use vc_serial::{SerialError, SerializedObject, Serializer};
///
/// #[derive(Default)]
/// struct Door;
///
/// impl SerializedObject for Door {
///     fn serialize(&mut self, _: &mut Serializer<'_>) -> Result<(), SerialError> {
///         Ok(())
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Door>();
/// registry.register_alias::<Door>("door");
/// registry.register_rename::<Door>("Gate");
///
/// let meta = registry.resolve_type_by_name("Gate").unwrap();
/// assert_eq!(meta.persisted_name(), "door");
/// ```
pub struct TypeRegistry {
    type_meta_table: HashMap<TypeId, TypeMeta>,
    type_path_to_id: HashMap<&'static str, TypeId>,
    alias_to_id: HashMap<String, TypeId>,
    rename_to_id: HashMap<String, TypeId>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create an empty [`TypeRegistry`].
    pub fn new() -> Self {
        Self {
            type_meta_table: HashMap::default(),
            type_path_to_id: HashMap::default(),
            alias_to_id: HashMap::default(),
            rename_to_id: HashMap::default(),
        }
    }

    // Returns the meta of `T`, creating it and its type path index if absent.
    fn meta_mut<T: 'static>(&mut self) -> &mut TypeMeta {
        let type_path_to_id = &mut self.type_path_to_id;
        self.type_meta_table
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                let meta = TypeMeta::of::<T>();
                type_path_to_id.insert(meta.type_path(), meta.type_id());
                meta
            })
    }

    /// Registers `T` as a polymorphic object, constructed through [`Default`].
    ///
    /// Registering again replaces the constructor.
    pub fn register<T: SerializedObject + Default>(&mut self) {
        let meta = self.meta_mut::<T>();
        meta.construct = Some(TypeTraitConstruct::of_default::<T>());
        log::debug!("registered constructor of `{}`", meta.type_path());
    }

    /// Registers `T` as a polymorphic object, constructed by `factory`.
    pub fn register_constructor<T: SerializedObject>(&mut self, factory: fn() -> T) {
        let meta = self.meta_mut::<T>();
        meta.construct = Some(TypeTraitConstruct::of_fn(factory));
        log::debug!("registered constructor of `{}`", meta.type_path());
    }

    /// Registers a type alias, persisted instead of the type path.
    ///
    /// The mapping is two-way: one alias per type and one type per alias.
    /// Registering the same pair again does nothing. A conflicting
    /// registration overwrites the previous mapping (last writer wins) and
    /// removes the stale half of it, logging a warning.
    pub fn register_alias<T: 'static>(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        let type_id = TypeId::of::<T>();

        if let Some(&owner) = self.alias_to_id.get(&alias)
            && owner != type_id
            && let Some(owner_meta) = self.type_meta_table.get_mut(&owner)
        {
            log::warn!(
                "alias `{alias}` moved from `{}` to `{}`",
                owner_meta.type_path(),
                core::any::type_name::<T>(),
            );
            owner_meta.alias = None;
        }

        let meta = self.meta_mut::<T>();
        let previous = meta.alias.replace(alias.clone());
        if let Some(previous) = previous
            && previous != alias
        {
            log::warn!(
                "alias of `{}` changed from `{previous}` to `{alias}`",
                meta.type_path(),
            );
            self.alias_to_id.remove(&previous);
        }

        self.alias_to_id.insert(alias, type_id);
    }

    /// Registers a legacy name of `T`, only consulted when reading.
    ///
    /// Independent of alias registration.
    pub fn register_rename<T: 'static>(&mut self, rename: impl Into<String>) {
        self.meta_mut::<T>();
        let rename = rename.into();
        log::debug!(
            "registered rename `{rename}` of `{}`",
            core::any::type_name::<T>(),
        );
        self.rename_to_id.insert(rename, TypeId::of::<T>());
    }

    /// Registers the custom decomposition callback of `T`.
    ///
    /// At most one callback exists per type, registering again replaces it.
    pub fn register_serializer<T: 'static>(&mut self, func: TypeSerializerFn<T>) {
        self.meta_mut::<T>().serializer = Some(TypeTraitSerializer::new(func, None));
    }

    /// Registers the custom decomposition callback of `T` with a version.
    ///
    /// The version is persisted next to every value of `T` and is available
    /// through [`Serializer::version`] while the callback runs.
    ///
    /// [`Serializer::version`]: crate::Serializer::version
    pub fn register_serializer_versioned<T: 'static>(
        &mut self,
        version: u16,
        func: TypeSerializerFn<T>,
    ) {
        self.meta_mut::<T>().serializer = Some(TypeTraitSerializer::new(func, Some(version)));
    }

    /// Whether the type with given [`TypeId`] has been registered.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.type_meta_table.contains_key(&type_id)
    }

    /// Returns the [`TypeMeta`] of the type with the given [`TypeId`].
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeMeta> {
        self.type_meta_table.get(&type_id)
    }

    /// Returns the [`TypeMeta`] of the type with the given native type path.
    pub fn get_with_type_path(&self, type_path: &str) -> Option<&TypeMeta> {
        match self.type_path_to_id.get(type_path) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Resolves a persisted type name.
    ///
    /// Attempts, in order, the rename table, the alias table, then the native
    /// type paths of registered types. `None` means the name is unresolvable,
    /// which callers treat as a recoverable error for that subtree.
    pub fn resolve_type_by_name(&self, name: &str) -> Option<&TypeMeta> {
        let id = self
            .rename_to_id
            .get(name)
            .or_else(|| self.alias_to_id.get(name))
            .or_else(|| self.type_path_to_id.get(name))?;
        self.get(*id)
    }

    /// Returns the name persisted for a type: its alias if any, else its
    /// type path. `None` if the type was never registered.
    pub fn resolve_name_for_type(&self, type_id: TypeId) -> Option<&str> {
        self.get(type_id).map(TypeMeta::persisted_name)
    }

    /// Returns the custom decomposition callback of `T`.
    pub fn custom_serializer<T: 'static>(&self) -> Option<TypeSerializerFn<T>> {
        self.get_serializer::<T>().and_then(TypeTraitSerializer::get::<T>)
    }

    /// Returns the custom serializer registration of `T`, with its version.
    #[inline]
    pub fn get_serializer<T: 'static>(&self) -> Option<&TypeTraitSerializer> {
        match self.get(TypeId::of::<T>()) {
            Some(meta) => meta.serializer(),
            None => None,
        }
    }

    /// Creates a new instance of a polymorphic type.
    ///
    /// A type without a registered constructor is a configuration defect:
    /// it is reported through the log and returned as
    /// [`SerialError::NotConstructible`].
    pub fn instantiate(&self, meta: &TypeMeta) -> Result<Box<dyn SerializedObject>, SerialError> {
        match meta.constructor() {
            Some(construct) => Ok(construct.construct()),
            None => {
                log::error!(
                    "could not find a parameterless constructor for type `{}`",
                    meta.type_path(),
                );
                Err(SerialError::NotConstructible(meta.type_path()))
            }
        }
    }

    /// Checks that every aliased or renamed type can be read back.
    ///
    /// Such a type needs either a constructor (polymorphic objects) or a
    /// custom serializer (value types). Intended to run once after startup
    /// registration, so that configuration defects surface early.
    pub fn validate(&self) -> Result<(), SerialError> {
        let named = self.alias_to_id.values().chain(self.rename_to_id.values());
        for id in named {
            if let Some(meta) = self.get(*id)
                && meta.construct.is_none()
                && meta.serializer.is_none()
            {
                log::error!(
                    "type `{}` is named in persisted data but cannot be constructed",
                    meta.type_path(),
                );
                return Err(SerialError::NotConstructible(meta.type_path()));
            }
        }
        Ok(())
    }

    /// Returns an iterator over the [`TypeMeta`]s of the registered types.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &TypeMeta> {
        self.type_meta_table.values()
    }
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.type_meta_table.values()).finish()
    }
}

// -----------------------------------------------------------------------------
// TypeRegistryArc

#[cfg(feature = "std")]
pub use arc::TypeRegistryArc;

#[cfg(feature = "std")]
mod arc {
    use std::sync::{Arc, PoisonError};
    use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

    use super::TypeRegistry;

    /// A shared [`TypeRegistry`] guarded by a reader/writer lock.
    ///
    /// Sessions take a read lock for their whole traversal; registration
    /// takes the write lock.
    #[derive(Clone, Default)]
    pub struct TypeRegistryArc {
        /// The wrapped [`TypeRegistry`].
        pub internal: Arc<RwLock<TypeRegistry>>,
    }

    impl TypeRegistryArc {
        pub fn new(registry: TypeRegistry) -> Self {
            Self {
                internal: Arc::new(RwLock::new(registry)),
            }
        }

        /// Takes a read lock on the underlying [`TypeRegistry`].
        pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
            self.internal.read().unwrap_or_else(PoisonError::into_inner)
        }

        /// Takes a write lock on the underlying [`TypeRegistry`].
        pub fn write(&self) -> RwLockWriteGuard<'_, TypeRegistry> {
            self.internal
                .write()
                .unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl core::fmt::Debug for TypeRegistryArc {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            core::fmt::Debug::fmt(&*self.read(), f)
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::any::TypeId;

    use super::TypeRegistry;
    use crate::SerialError;
    use crate::fixtures::{Circle, NoDefault, Square, Vec3I, serialize_vec3i};

    #[test]
    fn alias_is_two_way() {
        let mut registry = TypeRegistry::new();
        registry.register::<Circle>();
        registry.register_alias::<Circle>("circle");

        let meta = registry.resolve_type_by_name("circle").unwrap();
        assert_eq!(meta.type_id(), TypeId::of::<Circle>());
        assert_eq!(
            registry.resolve_name_for_type(TypeId::of::<Circle>()),
            Some("circle")
        );
    }

    #[test]
    fn unaliased_type_persists_its_type_path() {
        let mut registry = TypeRegistry::new();
        registry.register::<Square>();

        let name = registry.resolve_name_for_type(TypeId::of::<Square>()).unwrap();
        assert_eq!(name, core::any::type_name::<Square>());

        let meta = registry.resolve_type_by_name(name).unwrap();
        assert_eq!(meta.type_id(), TypeId::of::<Square>());
        assert!(registry.resolve_name_for_type(TypeId::of::<u8>()).is_none());
    }

    #[test]
    fn conflicting_alias_overwrites_both_sides() {
        let mut registry = TypeRegistry::new();
        registry.register_alias::<Circle>("shape");
        registry.register_alias::<Square>("shape");

        let meta = registry.resolve_type_by_name("shape").unwrap();
        assert_eq!(meta.type_id(), TypeId::of::<Square>());
        assert!(registry.get(TypeId::of::<Circle>()).unwrap().alias().is_none());

        registry.register_alias::<Square>("square");
        assert!(registry.resolve_type_by_name("shape").is_none());
        assert_eq!(
            registry.resolve_name_for_type(TypeId::of::<Square>()),
            Some("square")
        );

        // Identical re-registration is a no-op.
        registry.register_alias::<Square>("square");
        assert_eq!(
            registry.resolve_type_by_name("square").unwrap().type_id(),
            TypeId::of::<Square>()
        );
    }

    #[test]
    fn rename_is_consulted_before_alias() {
        let mut registry = TypeRegistry::new();
        registry.register_alias::<Circle>("Round");
        registry.register_rename::<Square>("Round");

        let meta = registry.resolve_type_by_name("Round").unwrap();
        assert_eq!(meta.type_id(), TypeId::of::<Square>());
        // Renames never change the persisted name.
        assert_eq!(
            registry.resolve_name_for_type(TypeId::of::<Square>()),
            Some(core::any::type_name::<Square>())
        );
    }

    #[test]
    fn unknown_name_is_not_found() {
        let registry = TypeRegistry::new();
        assert!(registry.resolve_type_by_name("Missing").is_none());
    }

    #[test]
    fn custom_serializer_lookup() {
        let mut registry = TypeRegistry::new();
        assert!(registry.custom_serializer::<Vec3I>().is_none());

        registry.register_serializer_versioned::<Vec3I>(3, serialize_vec3i);
        assert!(registry.custom_serializer::<Vec3I>().is_some());
        assert!(registry.custom_serializer::<Circle>().is_none());
        assert_eq!(registry.get_serializer::<Vec3I>().unwrap().version(), Some(3));
    }

    #[test]
    fn instantiate_uses_registered_constructor() {
        let mut registry = TypeRegistry::new();
        registry.register::<Circle>();
        registry.register_constructor::<NoDefault>(|| NoDefault::new(7));

        let meta = registry.get(TypeId::of::<Circle>()).unwrap();
        let circle = registry.instantiate(meta).unwrap();
        assert!(circle.is::<Circle>());

        let meta = registry.get(TypeId::of::<NoDefault>()).unwrap();
        let value = registry.instantiate(meta).unwrap();
        assert_eq!(value.downcast_ref::<NoDefault>().unwrap().seed, 7);
    }

    #[test]
    fn missing_constructor_is_reported() {
        let mut registry = TypeRegistry::new();
        registry.register_alias::<NoDefault>("nd");

        let meta = registry.resolve_type_by_name("nd").unwrap();
        assert!(!meta.is_constructible());
        assert!(matches!(
            registry.instantiate(meta),
            Err(SerialError::NotConstructible(_))
        ));
        assert!(matches!(
            registry.validate(),
            Err(SerialError::NotConstructible(_))
        ));

        registry.register_constructor::<NoDefault>(|| NoDefault::new(1));
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn value_types_with_serializer_validate() {
        let mut registry = TypeRegistry::new();
        registry.register_alias::<Vec3I>("V3I");
        registry.register_serializer::<Vec3I>(serialize_vec3i);
        assert!(registry.validate().is_ok());
        assert_eq!(registry.iter().len(), 1);
    }

    #[cfg(feature = "std")]
    #[test]
    fn shared_registry() {
        use super::TypeRegistryArc;

        let shared = TypeRegistryArc::default();
        shared.write().register::<Circle>();

        let reader = shared.clone();
        let handle = std::thread::spawn(move || reader.read().contains(TypeId::of::<Circle>()));
        assert!(handle.join().unwrap());
    }
}
