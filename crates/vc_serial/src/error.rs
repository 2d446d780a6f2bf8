use alloc::string::String;

use thiserror::Error;

// -----------------------------------------------------------------------------
// SerialError

/// Errors produced while traversing an object graph.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerialError {
    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("malformed field `{key}`: expected {expected}")]
    Malformed { key: String, expected: &'static str },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("type `{0}` could not be resolved by rename, alias or type path")]
    UnresolvedType(String),

    #[error("type `{0}` has no registered constructor")]
    NotConstructible(&'static str),

    #[error("type `{0}` has no registered serializer")]
    NoSerializer(&'static str),

    #[error("value cannot be represented: {0}")]
    UnsupportedValue(&'static str),

    #[error("unknown value tag {0:#04x}")]
    UnknownTag(u8),

    #[error("begin/end calls of the format adapter are unbalanced")]
    Unbalanced,

    #[cfg(feature = "json")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SerialError {
    /// Whether the failure only affects the field it occurred in.
    ///
    /// Recoverable failures degrade to a default value wherever the call
    /// site supplied one.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::Malformed { .. } | Self::UnresolvedType(_)
        )
    }

    #[cold]
    #[inline(never)]
    pub(crate) fn missing(key: Option<&str>) -> Self {
        Self::MissingField(key_name(key))
    }

    #[cold]
    #[inline(never)]
    pub(crate) fn malformed(key: Option<&str>, expected: &'static str) -> Self {
        Self::Malformed {
            key: key_name(key),
            expected,
        }
    }
}

/// Display name of an adapter key, positional elements have none.
pub(crate) fn key_name(key: Option<&str>) -> String {
    match key {
        Some(key) => String::from(key),
        None => String::from("[element]"),
    }
}
