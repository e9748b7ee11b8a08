//! Big-endian byte cursors.
//!
//! [`ByteReader`] walks a borrowed input slice and reports the offset of any
//! read that runs off the end. [`ByteWriter`] appends to an owned buffer and
//! can seek back to patch earlier bytes.

use alloc::vec::Vec;

use crate::error::DecodeError;

/// Seekable big-endian reader over a byte slice.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the slice.
    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the cursor and the end of the slice.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn seek(&mut self, pos: usize) -> Result<(), DecodeError> {
        if pos > self.data.len() {
            return Err(DecodeError::TruncatedStream { offset: pos });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        let new_pos = self
            .pos
            .checked_add(n)
            .ok_or(DecodeError::TruncatedStream { offset: self.pos })?;
        if new_pos > self.data.len() {
            return Err(DecodeError::TruncatedStream {
                offset: self.data.len(),
            });
        }
        self.pos = new_pos;
        Ok(())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let data = self.data;
        let bytes = self
            .pos
            .checked_add(n)
            .and_then(|end| data.get(self.pos..end))
            .ok_or(DecodeError::TruncatedStream {
                offset: data.len(),
            })?;
        self.pos += n;
        Ok(bytes)
    }

    /// Borrow up to `n` bytes, fewer if the slice ends first.
    pub(crate) fn read_at_most(&mut self, n: usize) -> &'a [u8] {
        let data = self.data;
        let take = n.min(self.remaining());
        let start = self.pos.min(data.len());
        self.pos = start + take;
        &data[start..start + take]
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_exact(N)?);
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        self.read_array().map(i16::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_be_bytes)
    }
}

/// Seekable big-endian writer into an owned buffer.
///
/// Writes at the cursor overwrite existing bytes and extend the buffer when
/// they run past its end.
#[derive(Clone, Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Move the cursor. Seeking past the end zero-fills the gap.
    pub fn seek(&mut self, pos: usize) {
        if pos > self.buf.len() {
            self.buf.resize(pos, 0);
        }
        self.pos = pos;
    }

    /// Drop everything from `len` onward and clamp the cursor.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
        self.pos = self.pos.min(len);
    }

    pub fn reserve(&mut self, additional: usize) {
        self.buf.reserve(additional);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if self.pos == self.buf.len() {
            self.buf.extend_from_slice(bytes);
        } else {
            if end > self.buf.len() {
                self.buf.resize(end, 0);
            }
            self.buf[self.pos..end].copy_from_slice(bytes);
        }
        self.pos = end;
    }

    pub fn write_zeros(&mut self, n: usize) {
        let mut left = n;
        while left > 0 {
            let chunk = left.min(16);
            self.write_bytes(&[0u8; 16][..chunk]);
            left -= chunk;
        }
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_be_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_be_bytes());
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
