//! Label resolution with forward-reference backpatching.
//!
//! A label reference is a 4-byte signed displacement measured from the end
//! of the field: `target - field_position - 4`. References to labels that
//! are already defined are written immediately; forward references write a
//! zero placeholder and are patched the moment the label is defined.

use super::writer::ByteWriter;
use crate::error::EncodeError;
use std::collections::HashMap;

/// Label addresses and pending patch positions for one encoding run.
#[derive(Debug, Default)]
pub struct LabelTable {
    defined: HashMap<String, usize>,
    pending: HashMap<String, Vec<usize>>,
}

/// Displacement from the end of a 4-byte field at `field` to `target`.
fn displacement(target: usize, field: usize) -> Result<i32, EncodeError> {
    let offset = target as i64 - field as i64 - 4;
    i32::try_from(offset).map_err(|_| EncodeError::OperandOutOfRange {
        what: "jump displacement",
        value: offset,
        bits: 32,
    })
}

impl LabelTable {
    /// Records the current position as `name`'s address and backpatches
    /// every pending reference to it.
    pub fn define(&mut self, name: &str, out: &mut ByteWriter) -> Result<(), EncodeError> {
        let target = out.position();
        if self.defined.insert(name.to_string(), target).is_some() {
            return Err(EncodeError::DuplicateLabel(name.to_string()));
        }
        for field in self.pending.remove(name).unwrap_or_default() {
            out.patch_i32(field, displacement(target, field)?);
        }
        Ok(())
    }

    /// Emits a 4-byte reference to `name`, deferring it if the label is not
    /// defined yet.
    pub fn reference(&mut self, name: &str, out: &mut ByteWriter) -> Result<(), EncodeError> {
        let field = out.position();
        match self.defined.get(name) {
            Some(&target) => out.write_i32(displacement(target, field)?),
            None => {
                out.write_i32(0);
                self.pending.entry(name.to_string()).or_default().push(field);
            }
        }
        Ok(())
    }

    /// Names still waiting for a definition, sorted.
    pub fn unresolved(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pending.keys().cloned().collect();
        names.sort();
        names
    }
}
