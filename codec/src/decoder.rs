//! Message decoding: tagged frames in, runtime values out.

use crate::{
    buffer::ReadBuffer,
    encoder::HEADER_LEN,
    error::Error,
    fault::Fault,
    registry::{ElementFn, Registry},
    schema::Schema,
    tag::Tag,
    value::Value,
};
use bigdecimal::BigDecimal;
use bytes::Bytes;
use num_bigint::BigInt;
use std::{
    collections::{BTreeMap, BTreeSet},
    str::FromStr,
};
use tracing::trace;

/// Bounds applied to untrusted length and count fields before any allocation
/// or long loop.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    /// Maximum bytes for any single length-prefixed block.
    pub max_length: usize,
    /// Maximum element count for any collection or map.
    pub max_count: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_length: 64 << 20,
            max_count: 1 << 20,
        }
    }
}

impl Limits {
    fn check_length(&self, len: u32) -> Result<usize, Error> {
        let len = len as usize;
        if len > self.max_length {
            return Err(Error::LengthExceeded(len, self.max_length));
        }
        Ok(len)
    }

    fn check_count(&self, count: u32) -> Result<usize, Error> {
        let count = count as usize;
        if count > self.max_count {
            return Err(Error::LengthExceeded(count, self.max_count));
        }
        Ok(count)
    }
}

/// Computes the payload length of a composite frame from its self-inclusive
/// total length. Underflow means the peer framed the message wrong, which is
/// fatal for the whole message.
fn composite_payload_len(total: u32, name_len: u32) -> Result<usize, Error> {
    total
        .checked_sub(name_len)
        .and_then(|len| len.checked_sub(HEADER_LEN as u32))
        .map(|len| len as usize)
        .ok_or(Error::InvalidComposite(total, name_len))
}

/// Reads the frames of one inbound message.
///
/// One decoder per message, single forward pass, no backtracking. The
/// registry resolves the wire names of self-describing frames; the typed
/// read methods never consult it.
pub struct Decoder<'a> {
    buf: ReadBuffer,
    registry: &'a Registry,
    limits: Limits,
}

macro_rules! read_scalar {
    ($fn_name:ident, $type:ty, $tag:expr) => {
        /// Reads one fixed-width frame, requiring its exact tag.
        pub fn $fn_name(&mut self) -> Result<$type, Error> {
            self.expect_tag($tag)?;
            <$type>::read_fields(&mut self.buf)
        }
    };
}

impl<'a> Decoder<'a> {
    /// Wraps one message with default limits.
    pub fn new(input: Bytes, registry: &'a Registry) -> Self {
        Self::with_limits(input, registry, Limits::default())
    }

    /// Wraps one message with explicit limits.
    pub fn with_limits(input: Bytes, registry: &'a Registry, limits: Limits) -> Self {
        Self {
            buf: ReadBuffer::new(input),
            registry,
            limits,
        }
    }

    read_scalar!(read_bool, bool, Tag::Bool);
    read_scalar!(read_i8, i8, Tag::I8);
    read_scalar!(read_i16, i16, Tag::I16);
    read_scalar!(read_i32, i32, Tag::I32);
    read_scalar!(read_i64, i64, Tag::I64);
    read_scalar!(read_f32, f32, Tag::F32);
    read_scalar!(read_f64, f64, Tag::F64);

    /// Reads a string frame. A zero-length block decodes to an empty,
    /// present string.
    pub fn read_string(&mut self) -> Result<String, Error> {
        self.expect_tag(Tag::Str)?;
        self.read_text_block("string")
    }

    /// Reads a byte-blob frame.
    pub fn read_bytes(&mut self) -> Result<Bytes, Error> {
        self.expect_tag(Tag::Blob)?;
        let len = self.limits.check_length(self.buf.get_u32()?)?;
        self.buf.get_slice(len)
    }

    /// Reads a flattened error frame.
    pub fn read_fault(&mut self) -> Result<Fault, Error> {
        self.expect_tag(Tag::Fault)?;
        self.read_fault_frame()
    }

    /// Reads one self-describing frame.
    ///
    /// An entirely empty message decodes to [`Value::Absent`] (heartbeat);
    /// running out of bytes mid-message stays an error. Composite frames
    /// resolve their wire name through the registry, and a name bound to a
    /// builtin decodes to its scalar kind rather than `Struct`.
    pub fn read_object(&mut self) -> Result<Value, Error> {
        if self.buf.position() == 0 && self.buf.remaining() == 0 {
            return Ok(Value::Absent);
        }
        let tag = Tag::from_u8(self.buf.get_u8()?)?;
        match tag {
            Tag::Bool => Ok(Value::Bool(bool::read_fields(&mut self.buf)?)),
            Tag::I8 => Ok(Value::I8(i8::read_fields(&mut self.buf)?)),
            Tag::I16 => Ok(Value::I16(i16::read_fields(&mut self.buf)?)),
            Tag::I32 => Ok(Value::I32(i32::read_fields(&mut self.buf)?)),
            Tag::I64 => Ok(Value::I64(i64::read_fields(&mut self.buf)?)),
            Tag::F32 => Ok(Value::F32(f32::read_fields(&mut self.buf)?)),
            Tag::F64 => Ok(Value::F64(f64::read_fields(&mut self.buf)?)),
            Tag::Str => Ok(Value::Str(self.read_text_block("string")?)),
            Tag::Blob => {
                let len = self.limits.check_length(self.buf.get_u32()?)?;
                Ok(Value::Bytes(self.buf.get_slice(len)?))
            }
            Tag::BigInt => {
                let text = self.read_text_block("bigint")?;
                let value = BigInt::from_str(&text).map_err(|_| Error::InvalidNumber(text))?;
                Ok(Value::BigInt(value))
            }
            Tag::Decimal => {
                let text = self.read_text_block("decimal")?;
                let value = BigDecimal::from_str(&text).map_err(|_| Error::InvalidNumber(text))?;
                Ok(Value::Decimal(value))
            }
            Tag::Array => Err(Error::Unsupported("raw arrays have no decode path, use a sequence")),
            Tag::Fault => Ok(Value::Fault(self.read_fault_frame()?)),
            Tag::Struct | Tag::Sequence | Tag::Set | Tag::Map => self.read_composite(tag),
        }
    }

    /// Reads a structure frame into a known type, consuming the wire name
    /// without resolving it. The empty sentinel decodes to `None`.
    pub fn read_struct<T: Schema>(&mut self) -> Result<Option<T>, Error> {
        self.expect_tag(Tag::Struct)?;
        let Some(mut payload) = self.composite_payload()? else {
            return Ok(None);
        };
        let value = T::read_fields(&mut payload)?;
        let remaining = payload.remaining();
        if remaining > 0 {
            return Err(Error::ExtraData(remaining));
        }
        Ok(Some(value))
    }

    /// Reads a sequence frame with a known element type. The wire name is
    /// consumed unexamined; the empty sentinel decodes to an empty vector.
    pub fn read_sequence<T: Schema>(&mut self) -> Result<Vec<T>, Error> {
        self.expect_tag(Tag::Sequence)?;
        let Some(mut payload) = self.composite_payload()? else {
            return Ok(Vec::new());
        };
        let count = self.limits.check_count(payload.get_u32()?)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(T::read_fields(&mut payload)?);
        }
        let remaining = payload.remaining();
        if remaining > 0 {
            return Err(Error::ExtraData(remaining));
        }
        Ok(items)
    }

    /// Reads a set frame with a known element type. Duplicate elements
    /// collapse silently, as on the encoding side.
    pub fn read_set<T: Schema + Ord>(&mut self) -> Result<BTreeSet<T>, Error> {
        self.expect_tag(Tag::Set)?;
        let Some(mut payload) = self.composite_payload()? else {
            return Ok(BTreeSet::new());
        };
        let count = self.limits.check_count(payload.get_u32()?)?;
        let mut items = BTreeSet::new();
        for _ in 0..count {
            items.insert(T::read_fields(&mut payload)?);
        }
        let remaining = payload.remaining();
        if remaining > 0 {
            return Err(Error::ExtraData(remaining));
        }
        Ok(items)
    }

    /// Reads a map frame with a known value type. On duplicate keys the last
    /// entry wins.
    pub fn read_map<T: Schema>(&mut self) -> Result<BTreeMap<String, T>, Error> {
        self.expect_tag(Tag::Map)?;
        let Some(mut payload) = self.composite_payload()? else {
            return Ok(BTreeMap::new());
        };
        let count = self.limits.check_count(payload.get_u32()?)?;
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let key = self.block_text(&mut payload, "map key")?;
            entries.insert(key, T::read_fields(&mut payload)?);
        }
        let remaining = payload.remaining();
        if remaining > 0 {
            return Err(Error::ExtraData(remaining));
        }
        Ok(entries)
    }

    /// Unread bytes left in the message.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Completes the message, failing if unread frames remain.
    pub fn finish(self) -> Result<(), Error> {
        match self.buf.remaining() {
            0 => Ok(()),
            extra => Err(Error::ExtraData(extra)),
        }
    }

    fn expect_tag(&mut self, expected: Tag) -> Result<(), Error> {
        let found = Tag::from_u8(self.buf.get_u8()?)?;
        if found != expected {
            return Err(Error::UnexpectedTag { expected, found });
        }
        Ok(())
    }

    /// Reads a limit-checked, length-prefixed UTF-8 block.
    fn read_text_block(&mut self, context: &'static str) -> Result<String, Error> {
        let len = self.limits.check_length(self.buf.get_u32()?)?;
        let raw = self.buf.get_slice(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| Error::InvalidUtf8(context))
    }

    /// Like [`Decoder::read_text_block`] but against a split-off payload.
    fn block_text(&self, payload: &mut ReadBuffer, context: &'static str) -> Result<String, Error> {
        let len = self.limits.check_length(payload.get_u32()?)?;
        let raw = payload.get_slice(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| Error::InvalidUtf8(context))
    }

    /// Splits off the payload of the current composite frame, consuming the
    /// name bytes unexamined. `None` for the empty sentinel.
    fn composite_payload(&mut self) -> Result<Option<ReadBuffer>, Error> {
        let total = self.buf.get_u32()?;
        if total == 0 {
            return Ok(None);
        }
        let name_len = self.buf.get_u32()?;
        let payload_len = composite_payload_len(total, name_len)?;
        let name_len = self.limits.check_length(name_len)?;
        self.buf.skip(name_len)?;
        let payload = self.buf.get_slice(payload_len)?;
        Ok(Some(ReadBuffer::new(payload)))
    }

    /// Decodes a self-describing composite frame, tag already consumed.
    fn read_composite(&mut self, tag: Tag) -> Result<Value, Error> {
        let total = self.buf.get_u32()?;
        if total == 0 {
            // Empty sentinel: canonical empty value, nothing else on the wire.
            return Ok(match tag {
                Tag::Struct => Value::Absent,
                Tag::Sequence => Value::Sequence(Vec::new()),
                Tag::Set => Value::Set(Vec::new()),
                Tag::Map => Value::Map(BTreeMap::new()),
                _ => unreachable!("not a composite tag"),
            });
        }
        let name_len = self.buf.get_u32()?;
        let payload_len = composite_payload_len(total, name_len)?;
        let name_len = self.limits.check_length(name_len)?;
        let raw_name = self.buf.get_slice(name_len)?;
        let name = std::str::from_utf8(&raw_name).map_err(|_| Error::InvalidUtf8("wire name"))?;
        let decode = self.registry.resolve(name)?;
        trace!(?tag, name, payload_len, "read composite frame");

        let mut payload = ReadBuffer::new(self.buf.get_slice(payload_len)?);
        let value = match tag {
            Tag::Struct => decode(&mut payload)?,
            Tag::Sequence => Value::Sequence(self.read_elements(&mut payload, decode)?),
            Tag::Set => Value::Set(self.read_elements(&mut payload, decode)?),
            Tag::Map => Value::Map(self.read_entries(&mut payload, decode)?),
            _ => unreachable!("not a composite tag"),
        };
        let remaining = payload.remaining();
        if remaining > 0 {
            return Err(Error::ExtraData(remaining));
        }
        Ok(value)
    }

    fn read_elements(
        &self,
        payload: &mut ReadBuffer,
        decode: ElementFn,
    ) -> Result<Vec<Value>, Error> {
        let count = self.limits.check_count(payload.get_u32()?)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(decode(payload)?);
        }
        Ok(items)
    }

    fn read_entries(
        &self,
        payload: &mut ReadBuffer,
        decode: ElementFn,
    ) -> Result<BTreeMap<String, Value>, Error> {
        let count = self.limits.check_count(payload.get_u32()?)?;
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let key = self.block_text(payload, "map key")?;
            // Last key wins, matching the encoding side's map semantics.
            entries.insert(key, decode(payload)?);
        }
        Ok(entries)
    }

    /// Decodes a fault frame, tag already consumed. The layout matches other
    /// composites: the class name sits in the name slot and the message is
    /// the payload, absent when the total covers only the header and name.
    fn read_fault_frame(&mut self) -> Result<Fault, Error> {
        let total = self.buf.get_u32()?;
        let name_len = self.buf.get_u32()?;
        let message_len = composite_payload_len(total, name_len)?;
        if message_len > self.limits.max_length {
            return Err(Error::LengthExceeded(message_len, self.limits.max_length));
        }
        let name_len = self.limits.check_length(name_len)?;
        let raw_name = self.buf.get_slice(name_len)?;
        let class_name =
            String::from_utf8(raw_name.to_vec()).map_err(|_| Error::InvalidUtf8("fault class"))?;
        let raw_message = self.buf.get_slice(message_len)?;
        let message = String::from_utf8(raw_message.to_vec())
            .map_err(|_| Error::InvalidUtf8("fault message"))?;
        Ok(Fault::new(class_name, message))
    }
}
