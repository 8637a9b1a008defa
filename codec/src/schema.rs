//! Field-level codecs for values that appear inside composite payloads.
//!
//! A [`Schema`] implementation handles the payload form of a type: no tag, no
//! frame header, just the bytes of its fields. The encoder and decoder wrap
//! these payloads in frames; [`Named`] supplies the wire name carried in the
//! frame header so the receiving side can resolve the element type without
//! per-element tags.

use crate::{
    buffer::{ReadBuffer, WriteBuffer},
    error::Error,
};
use bigdecimal::BigDecimal;
use bytes::Bytes;
use num_bigint::BigInt;
use std::str::FromStr;

/// Field-level collections cap their element count here; frame-level reads
/// apply the decoder limits instead.
const MAX_FIELD_COUNT: usize = 1 << 20;

/// Field-level codec for one type.
///
/// `fields_len` must return the exact number of bytes `write_fields` appends:
/// composite frame headers are computed from it before any payload byte is
/// written.
pub trait Schema: Sized {
    /// Exact encoded length of the field form.
    fn fields_len(&self) -> usize;

    /// Appends the field form to `buf`.
    fn write_fields(&self, buf: &mut WriteBuffer);

    /// Reads the field form from `buf`, consuming the necessary bytes.
    fn read_fields(buf: &mut ReadBuffer) -> Result<Self, Error>;

    /// Encodes the bare payload, with no frame around it.
    ///
    /// Panics if `write_fields` appends a different number of bytes than
    /// `fields_len` promised.
    ///
    /// (Provided method).
    fn to_payload(&self) -> Bytes {
        let len = self.fields_len();
        let mut buf = WriteBuffer::with_capacity(len);
        self.write_fields(&mut buf);
        assert_eq!(buf.len(), len, "write_fields() did not write expected bytes");
        buf.freeze()
    }

    /// Decodes a bare payload, requiring full consumption.
    ///
    /// (Provided method).
    fn from_payload(payload: Bytes) -> Result<Self, Error> {
        let mut buf = ReadBuffer::new(payload);
        let value = Self::read_fields(&mut buf)?;
        let remaining = buf.remaining();
        if remaining > 0 {
            return Err(Error::ExtraData(remaining));
        }
        Ok(value)
    }
}

/// Wire identity for types that may travel as collection elements or
/// structure frames.
///
/// The name is the self-description carried in composite headers; it must be
/// stable across peers and releases. Builtin scalar names are reserved.
pub trait Named: Schema {
    /// Stable wire name.
    const NAME: &'static str;
}

// Fixed-width scalar implementations.
macro_rules! impl_scalar {
    ($type:ty, $name:literal, $get_method:ident, $put_method:ident) => {
        impl Schema for $type {
            #[inline]
            fn fields_len(&self) -> usize {
                std::mem::size_of::<$type>()
            }

            #[inline]
            fn write_fields(&self, buf: &mut WriteBuffer) {
                buf.$put_method(*self);
            }

            #[inline]
            fn read_fields(buf: &mut ReadBuffer) -> Result<Self, Error> {
                buf.$get_method()
            }
        }

        impl Named for $type {
            const NAME: &'static str = $name;
        }
    };
}

impl_scalar!(bool, "bool", get_bool, put_bool);
impl_scalar!(i8, "i8", get_i8, put_i8);
impl_scalar!(i16, "i16", get_i16, put_i16);
impl_scalar!(i32, "i32", get_i32, put_i32);
impl_scalar!(i64, "i64", get_i64, put_i64);
impl_scalar!(f32, "f32", get_f32, put_f32);
impl_scalar!(f64, "f64", get_f64, put_f64);

// String implementation: length-prefixed UTF-8. A zero-length block is an
// empty string, never an absent value.
impl Schema for String {
    fn fields_len(&self) -> usize {
        4 + self.len()
    }

    fn write_fields(&self, buf: &mut WriteBuffer) {
        buf.put_block(self.as_bytes());
    }

    fn read_fields(buf: &mut ReadBuffer) -> Result<Self, Error> {
        let raw = buf.get_block()?;
        String::from_utf8(raw.to_vec()).map_err(|_| Error::InvalidUtf8("string"))
    }
}

impl Named for String {
    const NAME: &'static str = "string";
}

// Bytes implementation: length-prefixed raw block.
impl Schema for Bytes {
    fn fields_len(&self) -> usize {
        4 + self.len()
    }

    fn write_fields(&self, buf: &mut WriteBuffer) {
        buf.put_block(self);
    }

    fn read_fields(buf: &mut ReadBuffer) -> Result<Self, Error> {
        buf.get_block()
    }
}

impl Named for Bytes {
    const NAME: &'static str = "bytes";
}

// Arbitrary-precision values travel as canonical decimal text so peers agree
// on the representation without sharing a limb layout.
impl Schema for BigInt {
    fn fields_len(&self) -> usize {
        4 + self.to_string().len()
    }

    fn write_fields(&self, buf: &mut WriteBuffer) {
        buf.put_block(self.to_string().as_bytes());
    }

    fn read_fields(buf: &mut ReadBuffer) -> Result<Self, Error> {
        let raw = buf.get_block()?;
        let text = std::str::from_utf8(&raw).map_err(|_| Error::InvalidUtf8("bigint"))?;
        BigInt::from_str(text).map_err(|_| Error::InvalidNumber(text.to_string()))
    }
}

impl Named for BigInt {
    const NAME: &'static str = "bigint";
}

impl Schema for BigDecimal {
    fn fields_len(&self) -> usize {
        4 + self.to_string().len()
    }

    fn write_fields(&self, buf: &mut WriteBuffer) {
        buf.put_block(self.to_string().as_bytes());
    }

    fn read_fields(buf: &mut ReadBuffer) -> Result<Self, Error> {
        let raw = buf.get_block()?;
        let text = std::str::from_utf8(&raw).map_err(|_| Error::InvalidUtf8("decimal"))?;
        BigDecimal::from_str(text).map_err(|_| Error::InvalidNumber(text.to_string()))
    }
}

impl Named for BigDecimal {
    const NAME: &'static str = "decimal";
}

// Option implementation: presence byte then the inner fields. Usable as a
// structure field; deliberately unnamed, so it cannot be a collection element.
impl<T: Schema> Schema for Option<T> {
    fn fields_len(&self) -> usize {
        match self {
            Some(inner) => 1 + inner.fields_len(),
            None => 1,
        }
    }

    fn write_fields(&self, buf: &mut WriteBuffer) {
        match self {
            Some(inner) => {
                buf.put_bool(true);
                inner.write_fields(buf);
            }
            None => buf.put_bool(false),
        }
    }

    fn read_fields(buf: &mut ReadBuffer) -> Result<Self, Error> {
        if buf.get_bool()? {
            Ok(Some(T::read_fields(buf)?))
        } else {
            Ok(None)
        }
    }
}

// Vec implementation: count then the elements back to back. Like `Option`,
// unnamed on purpose; nested collections never reach the wire.
impl<T: Schema> Schema for Vec<T> {
    fn fields_len(&self) -> usize {
        4 + self.iter().map(|item| item.fields_len()).sum::<usize>()
    }

    fn write_fields(&self, buf: &mut WriteBuffer) {
        let count = u32::try_from(self.len()).expect("write_fields: vec length exceeds u32");
        buf.put_u32(count);
        for item in self {
            item.write_fields(buf);
        }
    }

    fn read_fields(buf: &mut ReadBuffer) -> Result<Self, Error> {
        let count = buf.get_u32()? as usize;
        if count > MAX_FIELD_COUNT {
            return Err(Error::LengthExceeded(count, MAX_FIELD_COUNT));
        }
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(T::read_fields(buf)?);
        }
        Ok(items)
    }
}

/// Derives [`Schema`] and [`Named`] for a plain struct from its field list.
///
/// Field types must implement [`Schema`]; field order is the wire order. At
/// least one field is required.
///
/// ```
/// use tagwire_codec::{impl_schema, Schema};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Order {
///     id: i64,
///     note: Option<String>,
///     quantities: Vec<i32>,
/// }
///
/// impl_schema!(Order, "shop.Order", { id, note, quantities });
///
/// let order = Order {
///     id: 7,
///     note: None,
///     quantities: vec![2, 3],
/// };
/// let payload = order.to_payload();
/// assert_eq!(Order::from_payload(payload).unwrap(), order);
/// ```
#[macro_export]
macro_rules! impl_schema {
    ($type:ty, $name:literal, { $($field:ident),+ $(,)? }) => {
        impl $crate::Schema for $type {
            fn fields_len(&self) -> usize {
                0 $(+ $crate::Schema::fields_len(&self.$field))+
            }

            fn write_fields(&self, buf: &mut $crate::WriteBuffer) {
                $($crate::Schema::write_fields(&self.$field, buf);)+
            }

            fn read_fields(buf: &mut $crate::ReadBuffer) -> Result<Self, $crate::Error> {
                Ok(Self {
                    $($field: $crate::Schema::read_fields(buf)?,)+
                })
            }
        }

        impl $crate::Named for $type {
            const NAME: &'static str = $name;
        }
    };
}
