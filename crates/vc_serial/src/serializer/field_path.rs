#[cfg(all(debug_assertions, feature = "debug"))]
use alloc::string::String;
#[cfg(all(debug_assertions, feature = "debug"))]
use alloc::vec::Vec;
use core::fmt::{Display, Formatter};

#[cfg(all(debug_assertions, feature = "debug"))]
enum Segment {
    Key(String),
    Index(usize),
    Element,
}

/// Helper struct tracking the field being visited, for diagnostics.
///
/// Only records anything with the `debug` feature in debug builds,
/// otherwise every operation is a no-op and the path displays as `?`.
#[derive(Default)]
pub(super) struct FieldPath {
    #[cfg(all(debug_assertions, feature = "debug"))]
    stack: Vec<Segment>,
}

impl FieldPath {
    pub const fn new() -> Self {
        Self {
            #[cfg(all(debug_assertions, feature = "debug"))]
            stack: Vec::new(),
        }
    }

    /// Push a keyed field, or a positional element if `key` is `None`.
    #[inline]
    pub fn push(&mut self, _key: Option<&str>) {
        #[cfg(all(debug_assertions, feature = "debug"))]
        self.stack.push(match _key {
            Some(key) => Segment::Key(String::from(key)),
            None => Segment::Element,
        });
    }

    #[inline]
    pub fn push_index(&mut self, _index: usize) {
        #[cfg(all(debug_assertions, feature = "debug"))]
        self.stack.push(Segment::Index(_index));
    }

    #[inline]
    pub fn pop(&mut self) {
        #[cfg(all(debug_assertions, feature = "debug"))]
        self.stack.pop();
    }
}

impl Display for FieldPath {
    #[cfg(all(debug_assertions, feature = "debug"))]
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("$")?;
        for segment in &self.stack {
            match segment {
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Element => {}
            }
        }
        Ok(())
    }

    #[cfg(not(all(debug_assertions, feature = "debug")))]
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("?")
    }
}

#[cfg(all(test, debug_assertions, feature = "debug"))]
mod tests {
    use alloc::string::ToString;

    use super::FieldPath;

    #[test]
    fn display_nested_path() {
        let mut path = FieldPath::new();
        assert_eq!(path.to_string(), "$");

        path.push(Some("shapes"));
        path.push_index(2);
        path.push(None);
        path.push(Some("radius"));
        assert_eq!(path.to_string(), "$.shapes[2].radius");

        path.pop();
        path.pop();
        path.pop();
        assert_eq!(path.to_string(), "$.shapes");
    }
}
