//! The closed tag vocabulary of the wire format.

use crate::error::Error;

/// Type tag opening every frame.
///
/// Discriminants are wire-stable: both peers compile the same vocabulary, and
/// a byte outside it is a protocol error rather than a skippable extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Registered structure value (self-describing composite).
    Struct = 0,
    /// Homogeneous ordered collection.
    Sequence = 1,
    /// Homogeneous unordered collection.
    Set = 2,
    /// String-keyed map with homogeneous values.
    Map = 3,
    I32 = 4,
    I64 = 5,
    F64 = 6,
    /// Arbitrary-precision integer, carried as decimal text.
    BigInt = 7,
    /// Arbitrary-precision decimal, carried as decimal text.
    Decimal = 8,
    I8 = 9,
    F32 = 10,
    I16 = 11,
    /// UTF-8 string.
    Str = 12,
    Bool = 13,
    /// Raw byte blob.
    Blob = 14,
    /// Reserved for raw arrays. Never encoded, rejected on decode.
    Array = 15,
    /// Flattened error value (class name and message only).
    Fault = 16,
}

impl Tag {
    /// Decodes a tag byte. Bytes outside the vocabulary fail loudly.
    pub fn from_u8(byte: u8) -> Result<Self, Error> {
        match byte {
            0 => Ok(Self::Struct),
            1 => Ok(Self::Sequence),
            2 => Ok(Self::Set),
            3 => Ok(Self::Map),
            4 => Ok(Self::I32),
            5 => Ok(Self::I64),
            6 => Ok(Self::F64),
            7 => Ok(Self::BigInt),
            8 => Ok(Self::Decimal),
            9 => Ok(Self::I8),
            10 => Ok(Self::F32),
            11 => Ok(Self::I16),
            12 => Ok(Self::Str),
            13 => Ok(Self::Bool),
            14 => Ok(Self::Blob),
            15 => Ok(Self::Array),
            16 => Ok(Self::Fault),
            other => Err(Error::UnknownTag(other)),
        }
    }

    /// Whether this tag opens a name-carrying composite frame (the fault
    /// frame shares the layout but not the empty sentinel).
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Struct | Self::Sequence | Self::Set | Self::Map)
    }
}
