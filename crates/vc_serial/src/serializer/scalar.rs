use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use crate::SerialError;
use crate::format::{FormatReader, FormatWriter};

// -----------------------------------------------------------------------------
// Scalar

/// A value the format adapters encode natively.
///
/// Every scalar maps onto one adapter primitive. Integers are widened to
/// 64 bits on write and range-checked on read.
pub trait Scalar: Sized {
    fn write_to(&self, writer: &mut dyn FormatWriter, key: Option<&str>) -> Result<(), SerialError>;

    fn read_from(reader: &mut dyn FormatReader, key: Option<&str>) -> Result<Self, SerialError>;
}

/// A scalar usable as a map key.
pub trait MapKey: Scalar + Eq + Hash + Clone + Default + Debug {}

macro_rules! impl_integer {
    ($write:ident, $read:ident, $wide:ty: $($ty:ty),+) => {$(
        impl Scalar for $ty {
            #[inline]
            fn write_to(&self, writer: &mut dyn FormatWriter, key: Option<&str>) -> Result<(), SerialError> {
                let wide = <$wide>::try_from(*self)
                    .map_err(|_| SerialError::UnsupportedValue(concat!(stringify!($ty), " out of 64-bit range")))?;
                writer.$write(key, wide)
            }

            #[inline]
            fn read_from(reader: &mut dyn FormatReader, key: Option<&str>) -> Result<Self, SerialError> {
                <$ty>::try_from(reader.$read(key)?)
                    .map_err(|_| SerialError::malformed(key, concat!("a value in range of ", stringify!($ty))))
            }
        }
    )+};
}

impl_integer!(write_i64, read_i64, i64: i8, i16, i32, i64, isize);
impl_integer!(write_u64, read_u64, u64: u8, u16, u32, u64, usize);

macro_rules! impl_map_key {
    ($($ty:ty),+) => {$(
        impl MapKey for $ty {}
    )+};
}

impl_map_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, String);

impl Scalar for bool {
    #[inline]
    fn write_to(&self, writer: &mut dyn FormatWriter, key: Option<&str>) -> Result<(), SerialError> {
        writer.write_bool(key, *self)
    }

    #[inline]
    fn read_from(reader: &mut dyn FormatReader, key: Option<&str>) -> Result<Self, SerialError> {
        reader.read_bool(key)
    }
}

impl Scalar for f64 {
    #[inline]
    fn write_to(&self, writer: &mut dyn FormatWriter, key: Option<&str>) -> Result<(), SerialError> {
        writer.write_f64(key, *self)
    }

    #[inline]
    fn read_from(reader: &mut dyn FormatReader, key: Option<&str>) -> Result<Self, SerialError> {
        reader.read_f64(key)
    }
}

impl Scalar for f32 {
    #[inline]
    fn write_to(&self, writer: &mut dyn FormatWriter, key: Option<&str>) -> Result<(), SerialError> {
        writer.write_f64(key, f64::from(*self))
    }

    #[inline]
    fn read_from(reader: &mut dyn FormatReader, key: Option<&str>) -> Result<Self, SerialError> {
        let wide = reader.read_f64(key)?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(SerialError::malformed(key, "a value in range of f32"));
        }
        Ok(narrow)
    }
}

impl Scalar for char {
    fn write_to(&self, writer: &mut dyn FormatWriter, key: Option<&str>) -> Result<(), SerialError> {
        writer.write_str(key, self.encode_utf8(&mut [0; 4]))
    }

    fn read_from(reader: &mut dyn FormatReader, key: Option<&str>) -> Result<Self, SerialError> {
        let text = reader.read_string(key)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(SerialError::malformed(key, "a single character")),
        }
    }
}

impl Scalar for String {
    #[inline]
    fn write_to(&self, writer: &mut dyn FormatWriter, key: Option<&str>) -> Result<(), SerialError> {
        writer.write_str(key, self)
    }

    #[inline]
    fn read_from(reader: &mut dyn FormatReader, key: Option<&str>) -> Result<Self, SerialError> {
        reader.read_string(key)
    }
}

impl Scalar for Vec<u8> {
    #[inline]
    fn write_to(&self, writer: &mut dyn FormatWriter, key: Option<&str>) -> Result<(), SerialError> {
        writer.write_bytes(key, self)
    }

    #[inline]
    fn read_from(reader: &mut dyn FormatReader, key: Option<&str>) -> Result<Self, SerialError> {
        reader.read_bytes(key)
    }
}
