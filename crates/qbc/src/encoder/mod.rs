//! Bytecode encoder.
//!
//! Serializes an optimized [`Module`] into one contiguous buffer:
//!
//! ```text
//! header (40 bytes, patched last)
//! instruction stream
//! constant pool
//! qubit-state pool, gate pool
//! metadata section
//! debug-info section
//! ```
//!
//! Jump and call targets are label references resolved through
//! `LabelTable`; forward references are backpatched when the label is
//! defined. Block labels and in-block label markers are scoped to their
//! function as `function::label`. Each function's entry is also defined
//! under the bare function name, which is what `CALL` references.
//!
//! Encoding either returns the complete buffer or an [`EncodeError`];
//! partial output is never returned.

pub mod header;
mod labels;
pub mod opcode;
mod pool;
mod sections;
pub mod writer;

pub use header::{Header, HEADER_SIZE, MAGIC};
pub use opcode::Opcode;

use self::labels::LabelTable;
use self::opcode::{OPERAND_CONST, OPERAND_REGISTER};
use self::pool::{ConstantPool, GatePool};
use self::sections::{DebugSection, FunctionEntry, QubitPool};
use self::writer::ByteWriter;
use crate::error::EncodeError;
use crate::ir::{ArithInstr, ControlInstr, Function, Instr, Module, Operand};
use tracing::{debug, info};

/// Label name of a block or label marker inside `function`.
pub fn scoped_label(function: &str, label: &str) -> String {
    format!("{}::{}", function, label)
}

fn to_u16(what: &'static str, value: u32) -> Result<u16, EncodeError> {
    u16::try_from(value).map_err(|_| EncodeError::OperandOutOfRange {
        what,
        value: value as i64,
        bits: 16,
    })
}

fn to_u8(what: &'static str, value: usize) -> Result<u8, EncodeError> {
    u8::try_from(value).map_err(|_| EncodeError::OperandOutOfRange {
        what,
        value: value as i64,
        bits: 8,
    })
}

fn to_u32(what: &'static str, value: usize) -> Result<u32, EncodeError> {
    u32::try_from(value).map_err(|_| EncodeError::OperandOutOfRange {
        what,
        value: value as i64,
        bits: 32,
    })
}

/// Encodes one module. All state (pending labels, pools) belongs to this
/// instance and is consumed by [`encode`](Self::encode).
#[derive(Debug, Default)]
pub struct BytecodeEncoder {
    module_id: Option<String>,
    out: ByteWriter,
    labels: LabelTable,
    constants: ConstantPool,
    gates: GatePool,
    qubits: QubitPool,
    debug: DebugSection,
    functions: Vec<FunctionEntry>,
}

impl BytecodeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `id` instead of a generated module identifier, making the
    /// output reproducible.
    pub fn with_module_id(mut self, id: impl Into<String>) -> Self {
        self.module_id = Some(id.into());
        self
    }

    pub fn encode(mut self, module: &Module) -> Result<Vec<u8>, EncodeError> {
        Header::write_placeholder(&mut self.out);

        for decl in &module.qubits {
            let name_id = self.constants.intern_str(&decl.name)?;
            self.qubits.push(name_id, decl.initial);
        }

        for func in &module.functions {
            self.emit_function(func)?;
        }
        let code_end = self.out.position();

        let unresolved = self.labels.unresolved();
        if !unresolved.is_empty() {
            return Err(EncodeError::UnresolvedLabels(unresolved));
        }

        let constant_pool_offset = self.out.position();
        self.constants.write(&mut self.out)?;

        let domain_pools_offset = self.out.position();
        self.qubits.write(&mut self.out);
        self.gates.write(&mut self.out);

        let metadata_offset = self.out.position();
        let module_id = self
            .module_id
            .take()
            .unwrap_or_else(sections::generate_module_id);
        sections::write_metadata(
            &mut self.out,
            &module_id,
            &module.name,
            &self.functions,
            &module.metadata,
        )?;

        let debug_offset = self.out.position();
        self.debug.write(&mut self.out)?;

        let header = Header {
            version_major: header::VERSION_MAJOR,
            version_minor: header::VERSION_MINOR,
            constant_count: to_u32("constant count", self.constants.len())?,
            qubit_count: to_u32("qubit count", self.qubits.len())?,
            gate_count: to_u32("gate count", self.gates.len())?,
            code_length: to_u32("code length", code_end - HEADER_SIZE)?,
            constant_pool_offset: to_u32("section offset", constant_pool_offset)?,
            domain_pools_offset: to_u32("section offset", domain_pools_offset)?,
            metadata_offset: to_u32("section offset", metadata_offset)?,
            debug_offset: to_u32("section offset", debug_offset)?,
        };
        header.patch(&mut self.out);

        info!(
            target: "qbc::encoder",
            module = %module.name,
            module_id = %module_id,
            bytes = self.out.position(),
            code_length = header.code_length,
            constants = header.constant_count,
            "module encoded"
        );
        Ok(self.out.into_bytes())
    }

    fn emit_function(&mut self, func: &Function) -> Result<(), EncodeError> {
        let start = self.out.position();
        self.labels.define(&func.name, &mut self.out)?;
        let name_id = self.constants.intern_str(&func.name)?;

        for block in &func.blocks {
            self.labels
                .define(&scoped_label(&func.name, &block.label), &mut self.out)?;
            for instr in &block.instructions {
                self.emit_instr(&func.name, instr)?;
            }
        }

        let length = self.out.position() - start;
        debug!(target: "qbc::encoder", function = %func.name, offset = start, length, "function emitted");
        self.functions.push(FunctionEntry {
            name_id,
            offset: to_u32("function offset", start)?,
            length: to_u32("function length", length)?,
            is_entry_point: func.is_entry_point,
        });
        Ok(())
    }

    fn opcode(&mut self, op: Opcode) {
        self.out.write_u8(op as u8);
    }

    fn emit_operand(&mut self, operand: &Operand) -> Result<(), EncodeError> {
        match operand {
            Operand::Lit(lit) => {
                let id = self.constants.intern(lit)?;
                self.out.write_u8(OPERAND_CONST);
                self.out.write_u16(id);
            }
            Operand::Reg(reg) => {
                self.out.write_u8(OPERAND_REGISTER);
                self.out.write_u16(to_u16("register", reg.0)?);
            }
        }
        Ok(())
    }

    fn emit_instr(&mut self, scope: &str, instr: &Instr) -> Result<(), EncodeError> {
        match instr {
            Instr::Nop => self.opcode(Opcode::Nop),
            Instr::LoadConst(lit) => {
                let id = self.constants.intern(lit)?;
                self.opcode(Opcode::LoadConst);
                self.out.write_u16(id);
            }
            Instr::Arith(ArithInstr::Binary { op, lhs, rhs }) => {
                self.opcode(Opcode::from(*op));
                self.emit_operand(lhs)?;
                self.emit_operand(rhs)?;
            }
            Instr::Arith(ArithInstr::Unary { op, operand }) => {
                self.opcode(Opcode::from(*op));
                self.emit_operand(operand)?;
            }
            Instr::Control(ctrl) => match ctrl {
                ControlInstr::Jump { target } => {
                    self.opcode(Opcode::Jump);
                    self.labels
                        .reference(&scoped_label(scope, target), &mut self.out)?;
                }
                ControlInstr::JumpIf { target } => {
                    self.opcode(Opcode::JumpIf);
                    self.labels
                        .reference(&scoped_label(scope, target), &mut self.out)?;
                }
                ControlInstr::Return => self.opcode(Opcode::Return),
                ControlInstr::Call { function } => {
                    self.opcode(Opcode::Call);
                    self.labels.reference(function, &mut self.out)?;
                }
                // Label markers emit no bytes.
                ControlInstr::Label(name) => {
                    self.labels
                        .define(&scoped_label(scope, name), &mut self.out)?;
                }
            },
            Instr::Gate(g) => {
                let gate_id = self.gates.intern(g.gate, &mut self.constants)?;
                self.opcode(Opcode::Gate);
                self.out.write_u16(gate_id);
                self.out.write_u8(to_u8("gate qubit count", g.qubits.len())?);
                for q in &g.qubits {
                    self.out.write_u16(to_u16("qubit", q.0)?);
                }
                if let Some(theta) = g.gate.angle() {
                    self.out.write_f64(theta);
                }
            }
            Instr::Measure(m) => {
                self.opcode(Opcode::Measure);
                self.out.write_u16(to_u16("qubit", m.qubit.0)?);
                self.out.write_u16(to_u16("register", m.result.0)?);
            }
            Instr::Entangle(e) => {
                self.opcode(Opcode::Entangle);
                self.out.write_u16(to_u16("qubit", e.a.0)?);
                self.out.write_u16(to_u16("qubit", e.b.0)?);
            }
            Instr::Debug(marker) => {
                let index = self.debug.record(marker)?;
                self.opcode(Opcode::Debug);
                self.out.write_u16(index);
            }
        }
        Ok(())
    }
}
