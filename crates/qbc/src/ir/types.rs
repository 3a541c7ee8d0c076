//! IR type definitions.
//!
//! A compilation unit is a [`Module`] owning [`Function`]s, each an ordered
//! list of labelled [`Block`]s. Instructions are a closed set of variants
//! grouped by category (control flow, arithmetic, constant load, gate,
//! measurement, entanglement, debug marker, no-op), so every consumer
//! matches them exhaustively.
//!
//! The IR is stack-oriented for classical values: `LoadConst` pushes a
//! literal and `JumpIf` pops its condition. Arithmetic operands are carried
//! inline and are either literals or classical registers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Index of a qubit in the module's qubit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Qubit(pub u32);

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Classical register holding a measurement result or computed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Register(pub u32);

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

// ── Literals and operands ────────────────────────────────────────────────────

/// A compile-time literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl Literal {
    /// Truthiness used when a literal decides a conditional jump.
    ///
    /// Booleans are taken as-is, numbers are truthy when nonzero, strings
    /// when nonempty, and `Null` is always falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Literal::Bool(b) => *b,
            Literal::Number(n) => *n != 0.0 && !n.is_nan(),
            Literal::Str(s) => !s.is_empty(),
            Literal::Null => false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// Operand of an arithmetic or logical instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Lit(Literal),
    Reg(Register),
}

impl Operand {
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Operand::Lit(lit) => Some(lit),
            Operand::Reg(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Lit(lit) => write!(f, "{}", lit),
            Operand::Reg(reg) => write!(f, "{}", reg),
        }
    }
}

// ── Operators ────────────────────────────────────────────────────────────────

/// Binary arithmetic, comparison and logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "ADD",
            BinOp::Sub => "SUB",
            BinOp::Mul => "MUL",
            BinOp::Div => "DIV",
            BinOp::Mod => "MOD",
            BinOp::Eq => "EQ",
            BinOp::Ne => "NE",
            BinOp::Lt => "LT",
            BinOp::Le => "LE",
            BinOp::Gt => "GT",
            BinOp::Ge => "GE",
            BinOp::And => "AND",
            BinOp::Or => "OR",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            UnOp::Neg => "NEG",
            UnOp::Not => "NOT",
        }
    }
}

// ── Gates ────────────────────────────────────────────────────────────────────

/// Symbolic quantum gates. Rotation angles are carried as opaque operands;
/// the backend never evaluates them numerically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    H,
    X,
    Y,
    Z,
    S,
    T,
    Rx(f64),
    Ry(f64),
    Rz(f64),
    Cnot,
    Cz,
    Swap,
}

impl Gate {
    /// Mnemonic name, also used as the gate's entry in the gate pool.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Gate::H => "H",
            Gate::X => "X",
            Gate::Y => "Y",
            Gate::Z => "Z",
            Gate::S => "S",
            Gate::T => "T",
            Gate::Rx(_) => "RX",
            Gate::Ry(_) => "RY",
            Gate::Rz(_) => "RZ",
            Gate::Cnot => "CNOT",
            Gate::Cz => "CZ",
            Gate::Swap => "SWAP",
        }
    }

    /// Number of qubits the gate acts on.
    pub fn arity(self) -> u8 {
        match self {
            Gate::Cnot | Gate::Cz | Gate::Swap => 2,
            _ => 1,
        }
    }

    /// Rotation angle for parametric gates.
    pub fn angle(self) -> Option<f64> {
        match self {
            Gate::Rx(theta) | Gate::Ry(theta) | Gate::Rz(theta) => Some(theta),
            _ => None,
        }
    }

    /// True for gates equal to their own inverse (X·X = Y·Y = Z·Z = H·H = I).
    pub fn is_self_inverse(self) -> bool {
        matches!(self, Gate::H | Gate::X | Gate::Y | Gate::Z)
    }
}

/// Initial basis state of a declared qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasisState {
    #[default]
    Zero,
    One,
    Plus,
    Minus,
}

// ── Instructions ─────────────────────────────────────────────────────────────

/// Control-flow instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlInstr {
    /// Unconditional jump to a label in the same function.
    Jump { target: String },
    /// Pops a value and jumps to `target` when it is truthy.
    JumpIf { target: String },
    /// Returns from the current function.
    Return,
    /// Calls another function of the module by name.
    Call { function: String },
    /// Label pseudo-instruction: marks a jump target inside a block.
    Label(String),
}

/// Arithmetic and logical instructions; the result is pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithInstr {
    Binary { op: BinOp, lhs: Operand, rhs: Operand },
    Unary { op: UnOp, operand: Operand },
}

/// A gate application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateInstr {
    pub gate: Gate,
    pub qubits: Vec<Qubit>,
}

/// Measures `qubit` into the classical register `result`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasureInstr {
    pub qubit: Qubit,
    pub result: Register,
}

/// Entangles two qubits. The pair is unordered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntangleInstr {
    pub a: Qubit,
    pub b: Qubit,
}

impl EntangleInstr {
    /// True if both instructions entangle the same unordered pair.
    pub fn same_pair(&self, other: &EntangleInstr) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

/// Debug marker carrying a source position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInstr {
    /// Label the marker is attached to, if any. Markers attached to a
    /// label that nothing references are dropped as dead code.
    #[serde(default)]
    pub label: Option<String>,
    pub line: u32,
    pub column: u32,
    #[serde(default)]
    pub source_info: String,
}

/// A single IR instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instr {
    Control(ControlInstr),
    Arith(ArithInstr),
    LoadConst(Literal),
    Gate(GateInstr),
    Measure(MeasureInstr),
    Entangle(EntangleInstr),
    Debug(DebugInstr),
    Nop,
}

impl Instr {
    pub fn jump(target: impl Into<String>) -> Self {
        Instr::Control(ControlInstr::Jump {
            target: target.into(),
        })
    }

    pub fn jump_if(target: impl Into<String>) -> Self {
        Instr::Control(ControlInstr::JumpIf {
            target: target.into(),
        })
    }

    pub fn ret() -> Self {
        Instr::Control(ControlInstr::Return)
    }

    pub fn call(function: impl Into<String>) -> Self {
        Instr::Control(ControlInstr::Call {
            function: function.into(),
        })
    }

    pub fn label(name: impl Into<String>) -> Self {
        Instr::Control(ControlInstr::Label(name.into()))
    }

    pub fn binary(op: BinOp, lhs: Operand, rhs: Operand) -> Self {
        Instr::Arith(ArithInstr::Binary { op, lhs, rhs })
    }

    pub fn unary(op: UnOp, operand: Operand) -> Self {
        Instr::Arith(ArithInstr::Unary { op, operand })
    }

    pub fn gate(gate: Gate, qubits: &[u32]) -> Self {
        Instr::Gate(GateInstr {
            gate,
            qubits: qubits.iter().copied().map(Qubit).collect(),
        })
    }

    pub fn measure(qubit: u32, result: u32) -> Self {
        Instr::Measure(MeasureInstr {
            qubit: Qubit(qubit),
            result: Register(result),
        })
    }

    pub fn entangle(a: u32, b: u32) -> Self {
        Instr::Entangle(EntangleInstr {
            a: Qubit(a),
            b: Qubit(b),
        })
    }

    pub fn debug(label: Option<&str>, line: u32, column: u32, source_info: &str) -> Self {
        Instr::Debug(DebugInstr {
            label: label.map(str::to_string),
            line,
            column,
            source_info: source_info.to_string(),
        })
    }

    /// True for gate applications (the "domain" operations).
    pub fn is_gate(&self) -> bool {
        matches!(self, Instr::Gate(_))
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Control(ControlInstr::Jump { target }) => write!(f, "JUMP {}", target),
            Instr::Control(ControlInstr::JumpIf { target }) => write!(f, "JUMP_IF {}", target),
            Instr::Control(ControlInstr::Return) => write!(f, "RETURN"),
            Instr::Control(ControlInstr::Call { function }) => write!(f, "CALL {}", function),
            Instr::Control(ControlInstr::Label(name)) => write!(f, "{}:", name),
            Instr::Arith(ArithInstr::Binary { op, lhs, rhs }) => {
                write!(f, "{} {}, {}", op.mnemonic(), lhs, rhs)
            }
            Instr::Arith(ArithInstr::Unary { op, operand }) => {
                write!(f, "{} {}", op.mnemonic(), operand)
            }
            Instr::LoadConst(lit) => write!(f, "LOAD_CONST {}", lit),
            Instr::Gate(g) => {
                write!(f, "{}", g.gate.mnemonic())?;
                if let Some(theta) = g.gate.angle() {
                    write!(f, "({})", theta)?;
                }
                for (i, q) in g.qubits.iter().enumerate() {
                    write!(f, "{}{}", if i == 0 { " " } else { ", " }, q)?;
                }
                Ok(())
            }
            Instr::Measure(m) => write!(f, "MEASURE {} -> {}", m.qubit, m.result),
            Instr::Entangle(e) => write!(f, "ENTANGLE {}, {}", e.a, e.b),
            Instr::Debug(d) => write!(f, "DEBUG {}:{}", d.line, d.column),
            Instr::Nop => write!(f, "NOP"),
        }
    }
}

// ── Blocks, functions, modules ───────────────────────────────────────────────

/// A labelled basic block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Unique within the owning function.
    pub label: String,
    pub instructions: Vec<Instr>,
}

impl Block {
    pub fn new(label: impl Into<String>, instructions: Vec<Instr>) -> Self {
        Self {
            label: label.into(),
            instructions,
        }
    }
}

/// IR representation of a complete function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,

    /// All basic blocks in layout order.
    ///
    /// INVARIANT: `blocks[0]` is the entry block and is never pruned.
    pub blocks: Vec<Block>,

    /// Entry-point functions are exempt from dead code elimination.
    #[serde(default)]
    pub is_entry_point: bool,
}

impl Function {
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }
}

/// A declared qubit and the basis state it is prepared in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QubitDecl {
    pub name: String,
    #[serde(default)]
    pub initial: BasisState,
}

/// Module-level metadata carried through to the bytecode's metadata section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// Entanglement information, serialized as JSON text per key.
    #[serde(default)]
    pub entanglement: BTreeMap<String, serde_json::Value>,

    /// Arbitrary named blobs, copied verbatim.
    #[serde(default)]
    pub custom: BTreeMap<String, Vec<u8>>,
}

/// A complete compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub name: String,
    pub functions: Vec<Function>,
    #[serde(default)]
    pub qubits: Vec<QubitDecl>,
    #[serde(default)]
    pub metadata: ModuleMetadata,
}

impl Module {
    pub fn instruction_count(&self) -> usize {
        self.functions.iter().map(Function::instruction_count).sum()
    }
}
