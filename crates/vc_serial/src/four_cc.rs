use core::fmt::{Debug, Display, Formatter, Write};

use crate::format::{FormatReader, FormatWriter};
use crate::{MapKey, Scalar, SerialError};

/// A four-character code, such as `RIFF` or `mp4a`.
///
/// Stored as the big-endian packing of its four bytes, persisted as a
/// four-character ASCII string. Shorter codes are right-padded with spaces.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FourCC(u32);

impl FourCC {
    #[inline]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }

    #[inline]
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    #[inline]
    pub const fn to_u32(self) -> u32 {
        self.0
    }

    /// Parses one to four ASCII characters.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() || text.len() > 4 || !text.is_ascii() {
            return None;
        }
        let mut bytes = [b' '; 4];
        bytes[..text.len()].copy_from_slice(text.as_bytes());
        Some(Self::from_bytes(bytes))
    }
}

impl Display for FourCC {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let bytes = self.to_bytes();
        let len = bytes.iter().rposition(|b| *b != b' ').map_or(0, |i| i + 1);
        for byte in &bytes[..len] {
            f.write_char(char::from(*byte))?;
        }
        Ok(())
    }
}

impl Debug for FourCC {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "FourCC({:?})", self.to_bytes().map(char::from))
    }
}

impl Scalar for FourCC {
    fn write_to(&self, writer: &mut dyn FormatWriter, key: Option<&str>) -> Result<(), SerialError> {
        let bytes = self.to_bytes();
        match core::str::from_utf8(&bytes) {
            Ok(text) if text.is_ascii() => writer.write_str(key, text),
            _ => Err(SerialError::UnsupportedValue("four-character code is not ASCII")),
        }
    }

    fn read_from(reader: &mut dyn FormatReader, key: Option<&str>) -> Result<Self, SerialError> {
        Self::parse(&reader.read_string(key)?)
            .ok_or_else(|| SerialError::malformed(key, "one to four ASCII characters"))
    }
}

impl MapKey for FourCC {}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::ToString;

    use super::FourCC;

    #[test]
    fn parse_pads_with_spaces() {
        let code = FourCC::parse("mp4").unwrap();
        assert_eq!(code.to_bytes(), *b"mp4 ");
        assert_eq!(code.to_string(), "mp4");
        assert_eq!(FourCC::parse("RIFF").unwrap().to_u32(), 0x5249_4646);
    }

    #[test]
    fn parse_rejects_invalid_codes() {
        assert_eq!(FourCC::parse(""), None);
        assert_eq!(FourCC::parse("toolong"), None);
        assert_eq!(FourCC::parse("é"), None);
    }

    #[test]
    fn debug_shows_all_bytes() {
        let code = FourCC::from_bytes(*b"ab  ");
        assert_eq!(format!("{code:?}"), "FourCC(['a', 'b', ' ', ' '])");
    }

    #[cfg(feature = "json")]
    #[test]
    fn persisted_as_string() {
        use crate::format::json::{JsonReader, JsonWriter};
        use crate::registry::TypeRegistry;
        use crate::{FieldOptions, SerialError, read_with, write_with};

        let registry = TypeRegistry::new();
        let mut writer = JsonWriter::new();
        let mut code = FourCC::parse("wav").unwrap();
        write_with(&registry, &mut writer, |s| s.serialize("codec", &mut code, FieldOptions::NONE)).unwrap();
        let value = writer.into_value().unwrap();
        assert_eq!(value, serde_json::json!({ "codec": "wav " }));

        let back = read_with(&registry, &mut JsonReader::new(&value), |s| {
            let mut back = FourCC::default();
            s.serialize("codec", &mut back, FieldOptions::NONE)?;
            Ok(back)
        })
        .unwrap();
        assert_eq!(back, code);

        let mut binary = FourCC::from_u32(0xFF00_0000);
        let err = write_with(&registry, &mut JsonWriter::new(), |s| {
            s.serialize("codec", &mut binary, FieldOptions::NONE)
        })
        .unwrap_err();
        assert!(matches!(err, SerialError::UnsupportedValue(_)));
    }
}
