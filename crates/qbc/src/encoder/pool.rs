//! Constant and gate pools.
//!
//! Both pools deduplicate on first sight: the first occurrence of a value
//! fixes its id, later occurrences reuse it.

use super::writer::ByteWriter;
use crate::error::EncodeError;
use crate::ir::{Gate, Literal};
use std::collections::HashMap;

pub const TAG_NULL: u8 = 0;
pub const TAG_BOOL: u8 = 1;
pub const TAG_NUMBER: u8 = 2;
pub const TAG_STRING: u8 = 3;

/// Deduplicated constant pool addressed by 16-bit ids.
///
/// Every entry is stored as a type tag plus its textual payload, so numbers
/// and strings with the same text never collide.
#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<(u8, String)>,
    ids: HashMap<(u8, String), u16>,
}

impl ConstantPool {
    pub fn intern(&mut self, lit: &Literal) -> Result<u16, EncodeError> {
        let key = match lit {
            Literal::Null => (TAG_NULL, String::new()),
            Literal::Bool(b) => (TAG_BOOL, b.to_string()),
            Literal::Number(n) => (TAG_NUMBER, n.to_string()),
            Literal::Str(s) => (TAG_STRING, s.clone()),
        };
        self.intern_entry(key)
    }

    pub fn intern_str(&mut self, s: &str) -> Result<u16, EncodeError> {
        self.intern_entry((TAG_STRING, s.to_string()))
    }

    fn intern_entry(&mut self, key: (u8, String)) -> Result<u16, EncodeError> {
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }
        let id = u16::try_from(self.entries.len()).map_err(|_| EncodeError::ConstantPoolOverflow)?;
        self.entries.push(key.clone());
        self.ids.insert(key, id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Emits every entry in id order: tag, `u32` payload length, UTF-8.
    pub fn write(&self, out: &mut ByteWriter) -> Result<(), EncodeError> {
        for (tag, payload) in &self.entries {
            out.write_u8(*tag);
            out.write_str(payload)?;
        }
        Ok(())
    }
}

/// Distinct gates used by the module, keyed by mnemonic.
#[derive(Debug, Default)]
pub struct GatePool {
    entries: Vec<GateEntry>,
    ids: HashMap<&'static str, u16>,
}

#[derive(Debug, Clone, Copy)]
struct GateEntry {
    name_id: u16,
    arity: u8,
    parametric: bool,
}

impl GatePool {
    /// Returns the pool id of `gate`, registering its name in `constants`
    /// the first time it is seen.
    pub fn intern(&mut self, gate: Gate, constants: &mut ConstantPool) -> Result<u16, EncodeError> {
        let name = gate.mnemonic();
        if let Some(&id) = self.ids.get(name) {
            return Ok(id);
        }
        let id = u16::try_from(self.entries.len()).map_err(|_| EncodeError::OperandOutOfRange {
            what: "gate pool id",
            value: self.entries.len() as i64,
            bits: 16,
        })?;
        self.entries.push(GateEntry {
            name_id: constants.intern_str(name)?,
            arity: gate.arity(),
            parametric: gate.angle().is_some(),
        });
        self.ids.insert(name, id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn write(&self, out: &mut ByteWriter) {
        for entry in &self.entries {
            out.write_u16(entry.name_id);
            out.write_u8(entry.arity);
            out.write_u8(entry.parametric as u8);
        }
    }
}
