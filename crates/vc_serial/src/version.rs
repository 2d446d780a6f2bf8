/// Version reported for any type that does not implement [`SerializedVersion`].
pub const DEFAULT_VERSION: u16 = 1;

/// Implement this on a [`SerializedObject`] to provide versioning info.
///
/// The version is persisted alongside the object on write. On read, the
/// persisted version is available through [`Serializer::version`] while the
/// object decomposes itself, so it can branch on legacy layouts.
///
/// Types that do not implement it are pinned at [`DEFAULT_VERSION`].
///
/// # Examples
///
/// ```
/// use vc_serial::{SerialError, SerializedObject, SerializedVersion, Serializer, FieldOptions};
///
/// #[derive(Default)]
/// struct Player {
///     name: String,
///     level: u32,
/// }
///
/// impl SerializedVersion for Player {
///     fn version(&self) -> u16 {
///         2
///     }
/// }
///
/// impl SerializedObject for Player {
///     fn serialize(&mut self, s: &mut Serializer<'_>) -> Result<(), SerialError> {
///         s.serialize("name", &mut self.name, FieldOptions::NONE)?;
///         if s.version() >= 2 {
///             s.serialize("level", &mut self.level, FieldOptions::NONE)?;
///         }
///         Ok(())
///     }
///
///     fn versioned(&self) -> Option<&dyn SerializedVersion> {
///         Some(self)
///     }
/// }
/// ```
///
/// [`SerializedObject`]: crate::SerializedObject
/// [`Serializer::version`]: crate::Serializer::version
pub trait SerializedVersion {
    /// Current schema version of this value.
    fn version(&self) -> u16;
}
