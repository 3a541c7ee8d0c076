//! Fixed-size bytecode header.
//!
//! The header is written first with zeroed placeholders and patched by
//! absolute position once every section has been emitted.

use super::writer::ByteWriter;
use anyhow::{bail, ensure, Result};

/// `"QBCF"` read as a little-endian `u32`.
pub const MAGIC: u32 = 0x4643_4251;
pub const VERSION_MAJOR: u16 = 1;
pub const VERSION_MINOR: u16 = 0;

/// Size of the header in bytes; the instruction stream starts here.
pub const HEADER_SIZE: usize = 40;

const CONSTANT_COUNT: usize = 8;
const QUBIT_COUNT: usize = 12;
const GATE_COUNT: usize = 16;
const CODE_LENGTH: usize = 20;
const CONSTANT_POOL_OFFSET: usize = 24;
const DOMAIN_POOLS_OFFSET: usize = 28;
const METADATA_OFFSET: usize = 32;
const DEBUG_OFFSET: usize = 36;

/// The patched header fields. Counts are entries; offsets are absolute
/// byte positions in the buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Header {
    pub version_major: u16,
    pub version_minor: u16,
    pub constant_count: u32,
    pub qubit_count: u32,
    pub gate_count: u32,
    pub code_length: u32,
    pub constant_pool_offset: u32,
    pub domain_pools_offset: u32,
    pub metadata_offset: u32,
    pub debug_offset: u32,
}

impl Header {
    /// Writes magic, version and zeroed placeholders. Must be called on an
    /// empty writer.
    pub fn write_placeholder(out: &mut ByteWriter) {
        debug_assert_eq!(out.position(), 0);
        out.write_u32(MAGIC);
        out.write_u16(VERSION_MAJOR);
        out.write_u16(VERSION_MINOR);
        out.write_bytes(&[0; HEADER_SIZE - 8]);
    }

    /// Overwrites the eight placeholder fields with this header's values.
    pub fn patch(&self, out: &mut ByteWriter) {
        out.patch_u32(CONSTANT_COUNT, self.constant_count);
        out.patch_u32(QUBIT_COUNT, self.qubit_count);
        out.patch_u32(GATE_COUNT, self.gate_count);
        out.patch_u32(CODE_LENGTH, self.code_length);
        out.patch_u32(CONSTANT_POOL_OFFSET, self.constant_pool_offset);
        out.patch_u32(DOMAIN_POOLS_OFFSET, self.domain_pools_offset);
        out.patch_u32(METADATA_OFFSET, self.metadata_offset);
        out.patch_u32(DEBUG_OFFSET, self.debug_offset);
    }

    /// Reads a header back from an encoded buffer, validating the magic
    /// number and major version first.
    pub fn parse(bytes: &[u8]) -> Result<Header> {
        ensure!(
            bytes.len() >= HEADER_SIZE,
            "buffer too short for header: {} bytes",
            bytes.len()
        );
        let u16_at = |pos: usize| u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
        let u32_at = |pos: usize| {
            u32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
        };

        let magic = u32_at(0);
        if magic != MAGIC {
            bail!("bad magic number {:#010x}", magic);
        }
        let version_major = u16_at(4);
        if version_major != VERSION_MAJOR {
            bail!(
                "unsupported bytecode version {}.{} (expected {}.x)",
                version_major,
                u16_at(6),
                VERSION_MAJOR
            );
        }

        let header = Header {
            version_major,
            version_minor: u16_at(6),
            constant_count: u32_at(CONSTANT_COUNT),
            qubit_count: u32_at(QUBIT_COUNT),
            gate_count: u32_at(GATE_COUNT),
            code_length: u32_at(CODE_LENGTH),
            constant_pool_offset: u32_at(CONSTANT_POOL_OFFSET),
            domain_pools_offset: u32_at(DOMAIN_POOLS_OFFSET),
            metadata_offset: u32_at(METADATA_OFFSET),
            debug_offset: u32_at(DEBUG_OFFSET),
        };
        let len = bytes.len() as u64;
        ensure!(
            HEADER_SIZE as u64 + header.code_length as u64 <= len
                && (header.debug_offset as u64) <= len,
            "header fields point past the end of a {}-byte buffer",
            len
        );
        Ok(header)
    }
}
