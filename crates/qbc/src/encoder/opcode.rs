//! Opcode byte values of the instruction stream.
//!
//! Must match the execution engine's loader.

use crate::ir::{BinOp, UnOp};

/// One-byte opcodes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Nop = 0x00,
    LoadConst = 0x01,

    Add = 0x10,
    Sub = 0x11,
    Mul = 0x12,
    Div = 0x13,
    Mod = 0x14,
    Eq = 0x15,
    Ne = 0x16,
    Lt = 0x17,
    Le = 0x18,
    Gt = 0x19,
    Ge = 0x1A,
    And = 0x1B,
    Or = 0x1C,
    Neg = 0x1D,
    Not = 0x1E,

    Jump = 0x30,
    JumpIf = 0x31,
    Return = 0x32,
    Call = 0x33,

    Gate = 0x40,
    Measure = 0x41,
    Entangle = 0x42,

    Debug = 0x50,
}

impl From<BinOp> for Opcode {
    fn from(op: BinOp) -> Self {
        match op {
            BinOp::Add => Opcode::Add,
            BinOp::Sub => Opcode::Sub,
            BinOp::Mul => Opcode::Mul,
            BinOp::Div => Opcode::Div,
            BinOp::Mod => Opcode::Mod,
            BinOp::Eq => Opcode::Eq,
            BinOp::Ne => Opcode::Ne,
            BinOp::Lt => Opcode::Lt,
            BinOp::Le => Opcode::Le,
            BinOp::Gt => Opcode::Gt,
            BinOp::Ge => Opcode::Ge,
            BinOp::And => Opcode::And,
            BinOp::Or => Opcode::Or,
        }
    }
}

impl From<UnOp> for Opcode {
    fn from(op: UnOp) -> Self {
        match op {
            UnOp::Neg => Opcode::Neg,
            UnOp::Not => Opcode::Not,
        }
    }
}

/// Tag preceding an arithmetic operand.
pub const OPERAND_CONST: u8 = 0;
/// Tag preceding an arithmetic operand.
pub const OPERAND_REGISTER: u8 = 1;
