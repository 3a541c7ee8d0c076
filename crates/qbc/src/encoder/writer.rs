//! Growable little-endian byte sink with absolute-position patching.

use crate::error::EncodeError;

/// Append-only byte buffer. Fields can be overwritten later by absolute
/// position, which is how forward label references and header
/// placeholders are backpatched.
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current write position, i.e. the number of bytes written so far.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a `u32` length or count prefix.
    pub fn write_len(&mut self, what: &'static str, len: usize) -> Result<(), EncodeError> {
        let len = u32::try_from(len).map_err(|_| EncodeError::OperandOutOfRange {
            what,
            value: len as i64,
            bits: 32,
        })?;
        self.write_u32(len);
        Ok(())
    }

    /// Writes `s` as a `u32` byte length followed by its UTF-8 bytes.
    ///
    /// Rust strings are UTF-8 by construction, so the payload is identical
    /// on every platform.
    pub fn write_str(&mut self, s: &str) -> Result<(), EncodeError> {
        self.write_len("string length", s.len())?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Overwrites four bytes at `pos` with `value`.
    pub fn patch_u32(&mut self, pos: usize, value: u32) {
        self.buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Overwrites four bytes at `pos` with `value`.
    pub fn patch_i32(&mut self, pos: usize, value: i32) {
        self.buf[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
