//! Message encoding: runtime values in, tagged frames out.

use crate::{
    buffer::WriteBuffer,
    error::Error,
    fault::Fault,
    schema::{Named, Schema},
    tag::Tag,
    value::Value,
};
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Composite frame header length: one tag byte plus the two u32 length
/// fields. Total lengths are self-inclusive and count these bytes.
pub(crate) const HEADER_LEN: usize = 9;

/// Accumulates the frames of one outbound message.
///
/// One encoder per message: [`Encoder::flush`] consumes it and yields the
/// bytes for the transport. Frames of different kinds may be interleaved
/// freely; each write call appends one self-contained frame.
pub struct Encoder {
    buf: WriteBuffer,
}

macro_rules! write_scalar {
    ($fn_name:ident, $type:ty, $tag:expr) => {
        /// Appends one fixed-width frame.
        pub fn $fn_name(&mut self, value: $type) {
            self.buf.put_u8($tag as u8);
            value.write_fields(&mut self.buf);
        }
    };
}

impl Encoder {
    /// Creates an encoder with an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: WriteBuffer::new(),
        }
    }

    /// Creates an encoder with `capacity` bytes preallocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: WriteBuffer::with_capacity(capacity),
        }
    }

    write_scalar!(write_bool, bool, Tag::Bool);
    write_scalar!(write_i8, i8, Tag::I8);
    write_scalar!(write_i16, i16, Tag::I16);
    write_scalar!(write_i32, i32, Tag::I32);
    write_scalar!(write_i64, i64, Tag::I64);
    write_scalar!(write_f32, f32, Tag::F32);
    write_scalar!(write_f64, f64, Tag::F64);

    /// Appends a string frame: tag, u32 length, UTF-8 bytes. An empty string
    /// keeps its frame and decodes as present.
    pub fn write_string(&mut self, value: &str) {
        self.buf.put_u8(Tag::Str as u8);
        self.buf.put_block(value.as_bytes());
    }

    /// Appends a byte-blob frame: tag, u32 length, raw bytes.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.buf.put_u8(Tag::Blob as u8);
        self.buf.put_block(value);
    }

    /// Appends a flattened error frame: class name in the name slot, the
    /// message as the payload.
    pub fn write_fault(&mut self, fault: &Fault) {
        self.write_composite(Tag::Fault, &fault.class_name, fault.message.len(), |buf| {
            buf.put_slice(fault.message.as_bytes());
        });
    }

    /// Appends one self-describing frame for any runtime value.
    ///
    /// Collection and map values must be homogeneous: the wire name of the
    /// first element (first value for maps) describes the rest, and a
    /// mismatch fails before anything is written. Nested collections are not
    /// encodable.
    pub fn write_object(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            // An absent value travels as boolean true, the heartbeat frame.
            Value::Absent => self.write_bool(true),
            Value::Bool(v) => self.write_bool(*v),
            Value::I8(v) => self.write_i8(*v),
            Value::I16(v) => self.write_i16(*v),
            Value::I32(v) => self.write_i32(*v),
            Value::I64(v) => self.write_i64(*v),
            Value::F32(v) => self.write_f32(*v),
            Value::F64(v) => self.write_f64(*v),
            Value::BigInt(v) => {
                self.buf.put_u8(Tag::BigInt as u8);
                self.buf.put_block(v.to_string().as_bytes());
            }
            Value::Decimal(v) => {
                self.buf.put_u8(Tag::Decimal as u8);
                self.buf.put_block(v.to_string().as_bytes());
            }
            Value::Str(v) => self.write_string(v),
            Value::Bytes(v) => self.write_bytes(v),
            Value::Sequence(items) => self.write_elements(Tag::Sequence, items)?,
            Value::Set(items) => self.write_elements(Tag::Set, items)?,
            Value::Map(entries) => self.write_entries(entries)?,
            Value::Struct(inner) => self.write_composite(
                Tag::Struct,
                inner.wire_name(),
                inner.dyn_fields_len(),
                |buf| inner.dyn_write_fields(buf),
            ),
            Value::Fault(fault) => self.write_fault(fault),
        }
        Ok(())
    }

    /// Appends a structure frame for a registered type.
    pub fn write_struct<T: Named>(&mut self, value: &T) {
        self.write_composite(Tag::Struct, T::NAME, value.fields_len(), |buf| {
            value.write_fields(buf)
        });
    }

    /// Appends a sequence frame from typed elements. Empty slices produce
    /// the empty sentinel.
    pub fn write_sequence<T: Named>(&mut self, items: &[T]) {
        if items.is_empty() {
            self.write_sentinel(Tag::Sequence);
            return;
        }
        let count = u32::try_from(items.len()).expect("write_sequence: count exceeds u32");
        let payload_len = 4 + items.iter().map(|item| item.fields_len()).sum::<usize>();
        self.write_composite(Tag::Sequence, T::NAME, payload_len, |buf| {
            buf.put_u32(count);
            for item in items {
                item.write_fields(buf);
            }
        });
    }

    /// Appends a set frame from typed elements. Empty sets produce the empty
    /// sentinel.
    pub fn write_set<T: Named + Ord>(&mut self, items: &BTreeSet<T>) {
        if items.is_empty() {
            self.write_sentinel(Tag::Set);
            return;
        }
        let count = u32::try_from(items.len()).expect("write_set: count exceeds u32");
        let payload_len = 4 + items.iter().map(|item| item.fields_len()).sum::<usize>();
        self.write_composite(Tag::Set, T::NAME, payload_len, |buf| {
            buf.put_u32(count);
            for item in items {
                item.write_fields(buf);
            }
        });
    }

    /// Appends a string-keyed map frame with typed values. Empty maps
    /// produce the empty sentinel.
    pub fn write_map<T: Named>(&mut self, entries: &BTreeMap<String, T>) {
        if entries.is_empty() {
            self.write_sentinel(Tag::Map);
            return;
        }
        let count = u32::try_from(entries.len()).expect("write_map: count exceeds u32");
        let payload_len = 4
            + entries
                .iter()
                .map(|(key, item)| 4 + key.len() + item.fields_len())
                .sum::<usize>();
        self.write_composite(Tag::Map, T::NAME, payload_len, |buf| {
            buf.put_u32(count);
            for (key, item) in entries {
                buf.put_block(key.as_bytes());
                item.write_fields(buf);
            }
        });
    }

    /// Validates homogeneity and appends one collection frame.
    fn write_elements(&mut self, tag: Tag, items: &[Value]) -> Result<(), Error> {
        let Some(first) = items.first() else {
            self.write_sentinel(tag);
            return Ok(());
        };
        let name = first
            .element_name()
            .ok_or(Error::Unsupported("collection elements must be scalars or structures"))?;
        let mut payload_len = 4;
        for item in items {
            let found = item
                .element_name()
                .ok_or(Error::Unsupported("collection elements must be scalars or structures"))?;
            if found != name {
                return Err(Error::MixedCollection {
                    expected: name.to_string(),
                    found: found.to_string(),
                });
            }
            payload_len += item.element_len();
        }
        let count = u32::try_from(items.len()).expect("write_elements: count exceeds u32");
        self.write_composite(tag, name, payload_len, |buf| {
            buf.put_u32(count);
            for item in items {
                item.write_element(buf);
            }
        });
        Ok(())
    }

    /// Validates homogeneity of map values and appends one map frame. Keys
    /// are untagged length-prefixed strings.
    fn write_entries(&mut self, entries: &BTreeMap<String, Value>) -> Result<(), Error> {
        let Some(first) = entries.values().next() else {
            self.write_sentinel(Tag::Map);
            return Ok(());
        };
        let name = first
            .element_name()
            .ok_or(Error::Unsupported("map values must be scalars or structures"))?;
        let mut payload_len = 4;
        for (key, item) in entries {
            let found = item
                .element_name()
                .ok_or(Error::Unsupported("map values must be scalars or structures"))?;
            if found != name {
                return Err(Error::MixedCollection {
                    expected: name.to_string(),
                    found: found.to_string(),
                });
            }
            payload_len += 4 + key.len() + item.element_len();
        }
        let count = u32::try_from(entries.len()).expect("write_entries: count exceeds u32");
        self.write_composite(Tag::Map, name, payload_len, |buf| {
            buf.put_u32(count);
            for (key, item) in entries {
                buf.put_block(key.as_bytes());
                item.write_element(buf);
            }
        });
        Ok(())
    }

    /// Writes one composite frame: tag, self-inclusive total length, name
    /// length, name bytes, then the payload.
    ///
    /// Panics if `payload` appends a different number of bytes than
    /// `payload_len`, or if the frame does not fit a u32 total.
    fn write_composite(
        &mut self,
        tag: Tag,
        name: &str,
        payload_len: usize,
        payload: impl FnOnce(&mut WriteBuffer),
    ) {
        let name_len = name.len();
        let total = HEADER_LEN + name_len + payload_len;
        let total = u32::try_from(total).expect("write_composite: frame exceeds u32");
        self.buf.ensure(total as usize);
        self.buf.put_u8(tag as u8);
        self.buf.put_u32(total);
        self.buf.put_u32(name_len as u32);
        self.buf.put_slice(name.as_bytes());
        let before = self.buf.len();
        payload(&mut self.buf);
        assert_eq!(
            self.buf.len() - before,
            payload_len,
            "payload did not write expected bytes"
        );
        trace!(?tag, name, total, "wrote composite frame");
    }

    /// Writes the empty-composite sentinel: tag then zero total length,
    /// nothing else.
    fn write_sentinel(&mut self, tag: Tag) {
        self.buf.put_u8(tag as u8);
        self.buf.put_u32(0);
        trace!(?tag, "wrote empty composite");
    }

    /// Bytes appended so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Completes the message and yields its bytes. Consuming the encoder
    /// enforces one buffer per message.
    pub fn flush(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
