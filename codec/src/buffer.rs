//! Owned buffers for assembling and consuming one message.

use crate::error::Error;
use bytes::{Buf, BufMut, Bytes};

/// Slack bytes added on top of a forced growth.
const GROWTH_SLACK: usize = 256;

/// Growable write cursor owning the bytes of one outbound message.
///
/// All multi-byte values are appended big-endian. Growth is amortized: a
/// write that does not fit reserves the current capacity plus the shortfall
/// plus [`GROWTH_SLACK`] in a single step.
pub struct WriteBuffer {
    inner: Vec<u8>,
}

impl WriteBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    /// Creates a buffer with `capacity` bytes preallocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Guarantees room for `needed` more bytes, growing per the policy above.
    pub fn ensure(&mut self, needed: usize) {
        let writable = self.inner.capacity() - self.inner.len();
        if writable < needed {
            let target = self.inner.capacity() + needed + GROWTH_SLACK;
            self.inner.reserve_exact(target - self.inner.len());
        }
    }

    /// Appends one raw byte.
    pub fn put_u8(&mut self, value: u8) {
        self.ensure(1);
        self.inner.put_u8(value);
    }

    /// Appends a bool as a single byte (1 or 0).
    pub fn put_bool(&mut self, value: bool) {
        self.put_u8(if value { 1 } else { 0 });
    }

    /// Appends a big-endian u16.
    pub fn put_u16(&mut self, value: u16) {
        self.ensure(2);
        self.inner.put_u16(value);
    }

    /// Appends a big-endian u32.
    pub fn put_u32(&mut self, value: u32) {
        self.ensure(4);
        self.inner.put_u32(value);
    }

    /// Appends a big-endian u64.
    pub fn put_u64(&mut self, value: u64) {
        self.ensure(8);
        self.inner.put_u64(value);
    }

    /// Appends an i8.
    pub fn put_i8(&mut self, value: i8) {
        self.ensure(1);
        self.inner.put_i8(value);
    }

    /// Appends a big-endian i16.
    pub fn put_i16(&mut self, value: i16) {
        self.ensure(2);
        self.inner.put_i16(value);
    }

    /// Appends a big-endian i32.
    pub fn put_i32(&mut self, value: i32) {
        self.ensure(4);
        self.inner.put_i32(value);
    }

    /// Appends a big-endian i64.
    pub fn put_i64(&mut self, value: i64) {
        self.ensure(8);
        self.inner.put_i64(value);
    }

    /// Appends a big-endian IEEE 754 f32.
    pub fn put_f32(&mut self, value: f32) {
        self.ensure(4);
        self.inner.put_f32(value);
    }

    /// Appends a big-endian IEEE 754 f64.
    pub fn put_f64(&mut self, value: f64) {
        self.ensure(8);
        self.inner.put_f64(value);
    }

    /// Appends raw bytes.
    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.ensure(bytes.len());
        self.inner.put_slice(bytes);
    }

    /// Appends a u32 length prefix followed by the bytes.
    ///
    /// Panics if the length does not fit a u32.
    pub fn put_block(&mut self, bytes: &[u8]) {
        let len = u32::try_from(bytes.len()).expect("put_block: length exceeds u32");
        self.put_u32(len);
        self.put_slice(bytes);
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Current capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Discards all written bytes, keeping the allocation.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Consumes the buffer and yields the written bytes without copying.
    pub fn freeze(self) -> Bytes {
        Bytes::from(self.inner)
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward-only read cursor over one inbound message.
///
/// Every accessor checks the remaining length first and fails with
/// [`Error::EndOfBuffer`] instead of panicking on truncated input.
pub struct ReadBuffer {
    inner: Bytes,
    initial: usize,
}

impl ReadBuffer {
    /// Wraps the bytes of one message.
    pub fn new(inner: Bytes) -> Self {
        let initial = inner.len();
        Self { inner, initial }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.initial - self.inner.remaining()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.inner.remaining()
    }

    /// Whether all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.inner.remaining() == 0
    }

    fn at_least(&self, needed: usize) -> Result<(), Error> {
        if self.inner.remaining() < needed {
            return Err(Error::EndOfBuffer);
        }
        Ok(())
    }

    /// Reads one raw byte.
    pub fn get_u8(&mut self) -> Result<u8, Error> {
        self.at_least(1)?;
        Ok(self.inner.get_u8())
    }

    /// Reads a bool, rejecting bytes other than 1 and 0.
    pub fn get_bool(&mut self) -> Result<bool, Error> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(Error::InvalidBool),
        }
    }

    /// Reads a big-endian u16.
    pub fn get_u16(&mut self) -> Result<u16, Error> {
        self.at_least(2)?;
        Ok(self.inner.get_u16())
    }

    /// Reads a big-endian u32.
    pub fn get_u32(&mut self) -> Result<u32, Error> {
        self.at_least(4)?;
        Ok(self.inner.get_u32())
    }

    /// Reads a big-endian u64.
    pub fn get_u64(&mut self) -> Result<u64, Error> {
        self.at_least(8)?;
        Ok(self.inner.get_u64())
    }

    /// Reads an i8.
    pub fn get_i8(&mut self) -> Result<i8, Error> {
        self.at_least(1)?;
        Ok(self.inner.get_i8())
    }

    /// Reads a big-endian i16.
    pub fn get_i16(&mut self) -> Result<i16, Error> {
        self.at_least(2)?;
        Ok(self.inner.get_i16())
    }

    /// Reads a big-endian i32.
    pub fn get_i32(&mut self) -> Result<i32, Error> {
        self.at_least(4)?;
        Ok(self.inner.get_i32())
    }

    /// Reads a big-endian i64.
    pub fn get_i64(&mut self) -> Result<i64, Error> {
        self.at_least(8)?;
        Ok(self.inner.get_i64())
    }

    /// Reads a big-endian IEEE 754 f32.
    pub fn get_f32(&mut self) -> Result<f32, Error> {
        self.at_least(4)?;
        Ok(self.inner.get_f32())
    }

    /// Reads a big-endian IEEE 754 f64.
    pub fn get_f64(&mut self) -> Result<f64, Error> {
        self.at_least(8)?;
        Ok(self.inner.get_f64())
    }

    /// Reads `len` raw bytes as a zero-copy slice of the input.
    pub fn get_slice(&mut self, len: usize) -> Result<Bytes, Error> {
        self.at_least(len)?;
        Ok(self.inner.copy_to_bytes(len))
    }

    /// Reads a u32 length prefix followed by that many bytes.
    pub fn get_block(&mut self) -> Result<Bytes, Error> {
        let len = self.get_u32()? as usize;
        self.get_slice(len)
    }

    /// Discards `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.at_least(len)?;
        self.inner.advance(len);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_policy() {
        let mut buf = WriteBuffer::with_capacity(4);
        assert_eq!(buf.capacity(), 4);

        // Fits in the preallocation: no growth.
        buf.put_u32(7);
        assert_eq!(buf.capacity(), 4);

        // Shortfall of 8 against capacity 4: reserve 4 + 8 + 256.
        buf.put_u64(7);
        assert!(buf.capacity() >= 4 + 8 + GROWTH_SLACK);
        assert_eq!(buf.len(), 12);
    }

    #[test]
    fn test_ensure_noop_when_writable() {
        let mut buf = WriteBuffer::with_capacity(64);
        buf.put_u8(1);
        buf.ensure(32);
        assert_eq!(buf.capacity(), 64);
    }

    #[test]
    fn test_put_get_roundtrip() {
        let mut buf = WriteBuffer::new();
        buf.put_bool(true);
        buf.put_u8(0xAB);
        buf.put_u16(0x0102);
        buf.put_u32(0xDEADBEEF);
        buf.put_u64(0x0102030405060708);
        buf.put_i8(-1);
        buf.put_i16(-2);
        buf.put_i32(-3);
        buf.put_i64(-4);
        buf.put_f32(1.5);
        buf.put_f64(-2.25);
        buf.put_block(b"abc");

        let mut reader = ReadBuffer::new(buf.freeze());
        assert!(reader.get_bool().unwrap());
        assert_eq!(reader.get_u8().unwrap(), 0xAB);
        assert_eq!(reader.get_u16().unwrap(), 0x0102);
        assert_eq!(reader.get_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.get_u64().unwrap(), 0x0102030405060708);
        assert_eq!(reader.get_i8().unwrap(), -1);
        assert_eq!(reader.get_i16().unwrap(), -2);
        assert_eq!(reader.get_i32().unwrap(), -3);
        assert_eq!(reader.get_i64().unwrap(), -4);
        assert_eq!(reader.get_f32().unwrap(), 1.5);
        assert_eq!(reader.get_f64().unwrap(), -2.25);
        assert_eq!(reader.get_block().unwrap(), Bytes::from_static(b"abc"));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_big_endian_layout() {
        let mut buf = WriteBuffer::new();
        buf.put_u32(0x01020304);
        assert_eq!(buf.freeze(), Bytes::from_static(&[0x01, 0x02, 0x03, 0x04]));

        let mut buf = WriteBuffer::new();
        buf.put_f32(1.0);
        assert_eq!(buf.freeze(), Bytes::from_static(&[0x3F, 0x80, 0x00, 0x00]));
    }

    #[test]
    fn test_end_of_buffer() {
        let mut reader = ReadBuffer::new(Bytes::from_static(&[0x01, 0x02]));
        assert!(matches!(reader.get_u32(), Err(Error::EndOfBuffer)));
        // A failed read consumes nothing.
        assert_eq!(reader.remaining(), 2);
        assert_eq!(reader.get_u16().unwrap(), 0x0102);
        assert!(matches!(reader.get_u8(), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_invalid_bool() {
        let mut reader = ReadBuffer::new(Bytes::from_static(&[0x02]));
        assert!(matches!(reader.get_bool(), Err(Error::InvalidBool)));
    }

    #[test]
    fn test_block_truncated() {
        // Prefix claims 5 bytes, only 2 follow.
        let mut reader = ReadBuffer::new(Bytes::from_static(&[0x00, 0x00, 0x00, 0x05, 0x61, 0x62]));
        assert!(matches!(reader.get_block(), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_position_tracking() {
        let mut reader = ReadBuffer::new(Bytes::from_static(&[1, 2, 3, 4, 5]));
        assert_eq!(reader.position(), 0);
        reader.get_u8().unwrap();
        assert_eq!(reader.position(), 1);
        reader.skip(3).unwrap();
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn test_clear_keeps_allocation() {
        let mut buf = WriteBuffer::with_capacity(16);
        buf.put_u64(1);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), 16);
    }

    #[test]
    fn test_empty_block() {
        let mut buf = WriteBuffer::new();
        buf.put_block(b"");
        let mut reader = ReadBuffer::new(buf.freeze());
        let block = reader.get_block().unwrap();
        assert!(block.is_empty());
        assert!(reader.is_empty());
    }
}
