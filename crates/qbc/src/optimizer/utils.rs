//! Shared queries over IR instructions used by several passes.

use crate::ir::{ArithInstr, ControlInstr, Function, Gate, Instr, Operand, Qubit, Register};
use anyhow::{bail, Result};
use std::collections::HashMap;

// ── Control flow ─────────────────────────────────────────────────────────────

/// Returns the label a jump or conditional jump transfers control to.
pub fn jump_target(instr: &Instr) -> Option<&str> {
    match instr {
        Instr::Control(ControlInstr::Jump { target })
        | Instr::Control(ControlInstr::JumpIf { target }) => Some(target),
        _ => None,
    }
}

/// True for instructions that end straight-line execution or make later
/// instructions reachable from elsewhere: jumps, returns, calls and labels.
pub fn is_control_flow(instr: &Instr) -> bool {
    matches!(instr, Instr::Control(_))
}

/// Maps every label defined in `func` (block labels and label
/// pseudo-instructions) to the index of the block that defines it.
///
/// Fails if a label is defined twice, which violates the IR invariant that
/// labels are unique per function.
pub fn label_blocks(func: &Function) -> Result<HashMap<&str, usize>> {
    let mut map = HashMap::new();
    for (idx, block) in func.blocks.iter().enumerate() {
        let inner = block.instructions.iter().filter_map(|instr| match instr {
            Instr::Control(ControlInstr::Label(name)) => Some(name.as_str()),
            _ => None,
        });
        for label in std::iter::once(block.label.as_str()).chain(inner) {
            if map.insert(label, idx).is_some() {
                bail!(
                    "IR invariant violated: label `{}` defined more than once in function `{}`",
                    label,
                    func.name
                );
            }
        }
    }
    Ok(map)
}

// ── Qubit and register usage ─────────────────────────────────────────────────

/// True if `instr` acts on `qubit`.
pub fn targets_qubit(instr: &Instr, qubit: Qubit) -> bool {
    match instr {
        Instr::Gate(g) => g.qubits.contains(&qubit),
        Instr::Measure(m) => m.qubit == qubit,
        Instr::Entangle(e) => e.a == qubit || e.b == qubit,
        _ => false,
    }
}

/// True if `instr` reads the classical register `reg`.
pub fn reads_register(instr: &Instr, reg: Register) -> bool {
    let is_reg = |op: &Operand| matches!(op, Operand::Reg(r) if *r == reg);
    match instr {
        Instr::Arith(ArithInstr::Binary { lhs, rhs, .. }) => is_reg(lhs) || is_reg(rhs),
        Instr::Arith(ArithInstr::Unary { operand, .. }) => is_reg(operand),
        _ => false,
    }
}

/// If `instr` is a single-qubit application of `X`, `Y`, `Z` or `H`, returns
/// the gate and its qubit.
pub fn self_inverse_target(instr: &Instr) -> Option<(Gate, Qubit)> {
    match instr {
        Instr::Gate(g) if g.gate.is_self_inverse() && g.qubits.len() == 1 => {
            Some((g.gate, g.qubits[0]))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, FunctionBuilder, Literal};

    #[test]
    fn label_blocks_includes_pseudo_labels() {
        let func = FunctionBuilder::new("f")
            .block("entry", vec![Instr::label("inner"), Instr::ret()])
            .block("next", vec![])
            .build();
        let map = label_blocks(&func).unwrap();
        assert_eq!(map["entry"], 0);
        assert_eq!(map["inner"], 0);
        assert_eq!(map["next"], 1);
    }

    #[test]
    fn duplicate_label_is_an_invariant_violation() {
        let func = FunctionBuilder::new("f")
            .block("a", vec![])
            .block("a", vec![])
            .build();
        let err = label_blocks(&func).unwrap_err();
        assert!(err.to_string().contains("`a`"));
    }

    #[test]
    fn register_reads_cover_both_operands() {
        let instr = Instr::binary(
            BinOp::Add,
            Operand::Lit(Literal::Number(1.0)),
            Operand::Reg(Register(4)),
        );
        assert!(reads_register(&instr, Register(4)));
        assert!(!reads_register(&instr, Register(1)));
    }

    #[test]
    fn self_inverse_target_ignores_other_gates() {
        assert_eq!(
            self_inverse_target(&Instr::gate(Gate::H, &[3])),
            Some((Gate::H, Qubit(3)))
        );
        assert_eq!(self_inverse_target(&Instr::gate(Gate::S, &[3])), None);
        assert_eq!(self_inverse_target(&Instr::gate(Gate::Cnot, &[0, 1])), None);
    }

    #[test]
    fn entangle_targets_both_qubits() {
        let instr = Instr::entangle(1, 2);
        assert!(targets_qubit(&instr, Qubit(1)));
        assert!(targets_qubit(&instr, Qubit(2)));
        assert!(!targets_qubit(&instr, Qubit(0)));
    }
}
