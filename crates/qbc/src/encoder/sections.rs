//! Sections emitted after the instruction stream: the qubit-state pool,
//! the metadata section and the debug-info section.

use super::writer::ByteWriter;
use crate::error::EncodeError;
use crate::ir::{BasisState, DebugInstr, ModuleMetadata};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

fn basis_code(state: BasisState) -> u8 {
    match state {
        BasisState::Zero => 0,
        BasisState::One => 1,
        BasisState::Plus => 2,
        BasisState::Minus => 3,
    }
}

fn narrow_u16(what: &'static str, value: u32) -> Result<u16, EncodeError> {
    u16::try_from(value).map_err(|_| EncodeError::OperandOutOfRange {
        what,
        value: value as i64,
        bits: 16,
    })
}

// ── Qubit-state pool ─────────────────────────────────────────────────────────

/// Declared qubits as `(name id, initial state)` pairs, in declaration order.
#[derive(Debug, Default)]
pub struct QubitPool {
    entries: Vec<(u16, BasisState)>,
}

impl QubitPool {
    pub fn push(&mut self, name_id: u16, initial: BasisState) {
        self.entries.push((name_id, initial));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn write(&self, out: &mut ByteWriter) {
        for &(name_id, state) in &self.entries {
            out.write_u16(name_id);
            out.write_u8(basis_code(state));
        }
    }
}

// ── Metadata ─────────────────────────────────────────────────────────────────

/// Where one function's code landed in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionEntry {
    pub name_id: u16,
    /// Absolute byte offset of the function's first instruction.
    pub offset: u32,
    pub length: u32,
    pub is_entry_point: bool,
}

/// A fresh module identifier: creation time in milliseconds plus a random
/// seed. Only used for traceability.
pub fn generate_module_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u128(millis);
    format!("{:x}-{:016x}", millis, hasher.finish())
}

/// Writes the metadata section:
///
/// ```text
/// str  module id
/// str  module name
/// u32  function count, then per function: u16 name id, u32 offset,
///      u32 length, u8 flags (bit 0 = entry point)
/// u32  entanglement entry count, then per entry: str key, str JSON value
/// u32  custom blob count, then per blob: str key, u32 length, bytes
/// ```
pub fn write_metadata(
    out: &mut ByteWriter,
    module_id: &str,
    module_name: &str,
    functions: &[FunctionEntry],
    metadata: &ModuleMetadata,
) -> Result<(), EncodeError> {
    out.write_str(module_id)?;
    out.write_str(module_name)?;

    out.write_len("function count", functions.len())?;
    for f in functions {
        out.write_u16(f.name_id);
        out.write_u32(f.offset);
        out.write_u32(f.length);
        out.write_u8(f.is_entry_point as u8);
    }

    out.write_len("entanglement entry count", metadata.entanglement.len())?;
    for (key, value) in &metadata.entanglement {
        out.write_str(key)?;
        // Compact JSON text.
        out.write_str(&value.to_string())?;
    }

    out.write_len("custom blob count", metadata.custom.len())?;
    for (key, blob) in &metadata.custom {
        out.write_str(key)?;
        out.write_len("custom blob length", blob.len())?;
        out.write_bytes(blob);
    }
    Ok(())
}

// ── Debug info ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct DebugRecord {
    line: u16,
    column: u16,
    source_info: String,
}

/// Debug records in the order their markers were emitted. The instruction
/// stream refers to records by index.
#[derive(Debug, Default)]
pub struct DebugSection {
    records: Vec<DebugRecord>,
}

impl DebugSection {
    /// Appends a record for `marker` and returns its index.
    pub fn record(&mut self, marker: &DebugInstr) -> Result<u16, EncodeError> {
        let index = u16::try_from(self.records.len()).map_err(|_| EncodeError::OperandOutOfRange {
            what: "debug record index",
            value: self.records.len() as i64,
            bits: 16,
        })?;
        self.records.push(DebugRecord {
            line: narrow_u16("debug line", marker.line)?,
            column: narrow_u16("debug column", marker.column)?,
            source_info: marker.source_info.clone(),
        });
        Ok(index)
    }

    /// `u32` record count, then per record `u16` line, `u16` column and the
    /// source text.
    pub fn write(&self, out: &mut ByteWriter) -> Result<(), EncodeError> {
        out.write_len("debug record count", self.records.len())?;
        for r in &self.records {
            out.write_u16(r.line);
            out.write_u16(r.column);
            out.write_str(&r.source_info)?;
        }
        Ok(())
    }
}
