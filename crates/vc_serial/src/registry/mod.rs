//! Provide the type-identity registry.
//!
//! ## Menu
//!
//! - [`TypeRegistry`]: Maps types to aliases, renames and type paths, and
//!   stores the per-type capabilities used during traversal.
//! - [`TypeRegistryArc`]: A `TypeRegistry` shared between threads.
//! - [`TypeMeta`]: Everything known about one type.
//! - Type traits:
//!     - [`TypeTraitConstruct`]: explicit parameterless constructor of a polymorphic object.
//!     - [`TypeTraitSerializer`]: custom decomposition callback of a type.
//!
//! ## Name resolution
//!
//! On write, a type is persisted under its alias if one is registered,
//! otherwise under its type path ([`core::any::type_name`]).
//!
//! On read, a persisted name is resolved through renames first, then aliases,
//! then type paths. Only registered types can be resolved, type paths of
//! generic types are not guaranteed to be stable between compiler versions,
//! so persisted polymorphic types should carry an alias.

// -----------------------------------------------------------------------------
// Modules

mod traits;
mod type_meta;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use traits::{TypeSerializerFn, TypeTraitConstruct, TypeTraitSerializer};
pub use type_meta::TypeMeta;
pub use type_registry::TypeRegistry;

#[cfg(feature = "std")]
pub use type_registry::TypeRegistryArc;
