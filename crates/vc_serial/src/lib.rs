#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod four_cc;
mod object;
mod options;
mod version;

pub mod format;
pub mod hash;
pub mod registry;
pub mod serializer;

#[cfg(test)]
mod fixtures;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use error::SerialError;
pub use four_cc::FourCC;
pub use object::SerializedObject;
pub use options::FieldOptions;
pub use serializer::{Direction, MapKey, Scalar, Serializer};
pub use serializer::{from_reader, from_reader_dyn, read_with, to_writer, to_writer_dyn, write_with};
pub use version::{DEFAULT_VERSION, SerializedVersion};
