use bitflags::bitflags;

bitflags! {
    /// Per-call flags affecting traversal policy.
    ///
    /// Options never change the shape of a traversal: reading and writing
    /// with the same options visits the same fields in the same order.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FieldOptions: u8 {
        /// Omit a field whose value equals its declared default.
        ///
        /// Only effective where a default is known: the `*_or` operations,
        /// and collections, whose default is the empty collection.
        const PREFER_COMPACT = 1 << 0;
        /// A missing field on read keeps the current value instead of failing.
        const OPTIONAL       = 1 << 1;
    }
}

impl FieldOptions {
    /// No flags set.
    pub const NONE: Self = Self::empty();

    #[inline]
    pub(crate) const fn is_compact(self) -> bool {
        self.contains(Self::PREFER_COMPACT)
    }

    /// Whether the field carries a presence marker in the data.
    #[inline]
    pub(crate) const fn is_defaultable(self) -> bool {
        self.intersects(Self::PREFER_COMPACT.union(Self::OPTIONAL))
    }
}
