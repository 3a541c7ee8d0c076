//! Constant folding and constant-branch simplification.
//!
//! ## What it does
//!
//! A single left-to-right scan over each block:
//!
//! - `Binary { op, Lit, Lit }` and `Unary { op, Lit }` are evaluated and
//!   replaced by `LoadConst(result)` when the result is statically
//!   computable for the literal types involved.
//! - `LoadConst(lit); JumpIf(target)` becomes `Nop; Jump(target)` when `lit`
//!   is truthy and `Nop; Nop` when it is falsy, so control simply falls
//!   through.
//!
//! The pass keeps no state between calls; cascades with dead code
//! elimination are picked up by the pipeline's fixed-point loop.
//!
//! ## Safety
//!
//! `Div`/`Mod` by a literal zero are **not** folded, so the runtime
//! instruction keeps its own divide-by-zero behavior. Operand type
//! combinations without a defined result are left unchanged.

use super::metrics::OptimizationMetrics;
use crate::ir::{ArithInstr, BinOp, ControlInstr, Function, Instr, Literal, UnOp};
use std::cmp::Ordering;

/// Run constant folding over every block of `func`.
///
/// Returns whether any instruction was rewritten.
pub fn eliminate(func: &mut Function, metrics: &mut OptimizationMetrics) -> bool {
    let mut changed = false;
    for block in &mut func.blocks {
        let instrs = &mut block.instructions;
        for i in 0..instrs.len() {
            if let Instr::Arith(arith) = &instrs[i] {
                if let Some(result) = fold(arith) {
                    instrs[i] = Instr::LoadConst(result);
                    metrics.replaced_instructions += 1;
                    changed = true;
                }
            }

            if i == 0 {
                continue;
            }
            let Instr::Control(ControlInstr::JumpIf { target }) = &instrs[i] else {
                continue;
            };
            let Instr::LoadConst(cond) = &instrs[i - 1] else {
                continue;
            };
            let simplified = if cond.is_truthy() {
                Instr::jump(target.clone())
            } else {
                Instr::Nop
            };
            instrs[i] = simplified;
            instrs[i - 1] = Instr::Nop;
            metrics.replaced_instructions += 2;
            changed = true;
        }
    }
    changed
}

/// Evaluates an arithmetic instruction whose operands are all literals.
fn fold(arith: &ArithInstr) -> Option<Literal> {
    match arith {
        ArithInstr::Binary { op, lhs, rhs } => {
            try_eval_binop(*op, lhs.as_literal()?, rhs.as_literal()?)
        }
        ArithInstr::Unary { op, operand } => try_eval_unop(*op, operand.as_literal()?),
    }
}

// ── Binary operation folding ──────────────────────────────────────────────────

/// Attempt to evaluate a binary operation on two literals.
///
/// Returns `None` when the literal types are not valid for the operator or
/// when the operation is a division/remainder by zero.
fn try_eval_binop(op: BinOp, lhs: &Literal, rhs: &Literal) -> Option<Literal> {
    use Literal::{Bool, Number, Str};

    match (op, lhs, rhs) {
        (BinOp::Add, Number(a), Number(b)) => Some(Number(a + b)),
        (BinOp::Add, Str(a), Str(b)) => Some(Str(format!("{}{}", a, b))),
        (BinOp::Sub, Number(a), Number(b)) => Some(Number(a - b)),
        (BinOp::Mul, Number(a), Number(b)) => Some(Number(a * b)),

        // Division/remainder: do NOT fold a zero divisor.
        (BinOp::Div, Number(_), Number(b)) if *b == 0.0 => None,
        (BinOp::Div, Number(a), Number(b)) => Some(Number(a / b)),
        (BinOp::Mod, Number(_), Number(b)) if *b == 0.0 => None,
        (BinOp::Mod, Number(a), Number(b)) => Some(Number(a % b)),

        (BinOp::Eq, a, b) => Some(Bool(a == b)),
        (BinOp::Ne, a, b) => Some(Bool(a != b)),

        (BinOp::Lt, a, b) => compare(a, b).map(|o| Bool(o == Ordering::Less)),
        (BinOp::Le, a, b) => compare(a, b).map(|o| Bool(o != Ordering::Greater)),
        (BinOp::Gt, a, b) => compare(a, b).map(|o| Bool(o == Ordering::Greater)),
        (BinOp::Ge, a, b) => compare(a, b).map(|o| Bool(o != Ordering::Less)),

        (BinOp::And, a, b) => Some(Bool(a.is_truthy() && b.is_truthy())),
        (BinOp::Or, a, b) => Some(Bool(a.is_truthy() || b.is_truthy())),

        _ => None,
    }
}

/// Orders two numbers or two strings. NaN and mixed types are unordered.
fn compare(lhs: &Literal, rhs: &Literal) -> Option<Ordering> {
    match (lhs, rhs) {
        (Literal::Number(a), Literal::Number(b)) => a.partial_cmp(b),
        (Literal::Str(a), Literal::Str(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

// ── Unary operation folding ───────────────────────────────────────────────────

fn try_eval_unop(op: UnOp, operand: &Literal) -> Option<Literal> {
    match (op, operand) {
        (UnOp::Neg, Literal::Number(n)) => Some(Literal::Number(-n)),
        (UnOp::Neg, _) => None,
        (UnOp::Not, lit) => Some(Literal::Bool(!lit.is_truthy())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FunctionBuilder, Operand, Register};

    fn num(n: f64) -> Operand {
        Operand::Lit(Literal::Number(n))
    }

    fn string(s: &str) -> Operand {
        Operand::Lit(Literal::Str(s.to_string()))
    }

    fn fold_one(instr: Instr) -> (Instr, OptimizationMetrics) {
        let mut func = FunctionBuilder::new("f").block("b", vec![instr]).build();
        let mut metrics = OptimizationMetrics::default();
        eliminate(&mut func, &mut metrics);
        (func.blocks[0].instructions[0].clone(), metrics)
    }

    fn folded(op: BinOp, lhs: Operand, rhs: Operand) -> Instr {
        fold_one(Instr::binary(op, lhs, rhs)).0
    }

    // ── Arithmetic ───────────────────────────────────────────────────────

    #[test]
    fn arithmetic_on_numbers() {
        let cases = [
            (BinOp::Add, 7.0, 3.0, 10.0),
            (BinOp::Sub, 7.0, 3.0, 4.0),
            (BinOp::Mul, 7.0, 3.0, 21.0),
            (BinOp::Div, 7.0, 2.0, 3.5),
            (BinOp::Mod, 7.0, 3.0, 1.0),
            (BinOp::Mod, -7.0, 3.0, -1.0),
        ];
        for (op, a, b, expected) in cases {
            assert_eq!(
                folded(op, num(a), num(b)),
                Instr::LoadConst(Literal::Number(expected)),
                "{:?} {} {}",
                op,
                a,
                b
            );
        }
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            folded(BinOp::Add, string("ab"), string("cd")),
            Instr::LoadConst(Literal::Str("abcd".into()))
        );
    }

    #[test]
    fn division_by_zero_not_folded() {
        for op in [BinOp::Div, BinOp::Mod] {
            let original = Instr::binary(op, num(1.0), num(0.0));
            let (after, metrics) = fold_one(original.clone());
            assert_eq!(after, original);
            assert_eq!(metrics.replaced_instructions, 0);
        }
    }

    #[test]
    fn register_operands_not_folded() {
        let original = Instr::binary(BinOp::Add, num(1.0), Operand::Reg(Register(0)));
        assert_eq!(fold_one(original.clone()).0, original);
    }

    #[test]
    fn mixed_types_not_folded() {
        let original = Instr::binary(BinOp::Sub, num(1.0), string("x"));
        assert_eq!(fold_one(original.clone()).0, original);
        let original = Instr::binary(BinOp::Lt, num(1.0), Operand::Lit(Literal::Null));
        assert_eq!(fold_one(original.clone()).0, original);
    }

    // ── Comparisons and logic ────────────────────────────────────────────

    #[test]
    fn comparisons() {
        let t = Instr::LoadConst(Literal::Bool(true));
        let f = Instr::LoadConst(Literal::Bool(false));
        assert_eq!(folded(BinOp::Eq, num(2.0), num(2.0)), t);
        assert_eq!(folded(BinOp::Ne, num(2.0), num(2.0)), f);
        assert_eq!(folded(BinOp::Lt, num(1.0), num(2.0)), t);
        assert_eq!(folded(BinOp::Le, num(2.0), num(2.0)), t);
        assert_eq!(folded(BinOp::Gt, num(1.0), num(2.0)), f);
        assert_eq!(folded(BinOp::Ge, num(2.0), num(3.0)), f);
        assert_eq!(folded(BinOp::Lt, string("a"), string("b")), t);
        assert_eq!(folded(BinOp::Eq, string("a"), num(1.0)), f);
        assert_eq!(
            folded(BinOp::Eq, Operand::Lit(Literal::Null), Operand::Lit(Literal::Null)),
            t
        );
    }

    #[test]
    fn logical_operators_use_truthiness() {
        let t = Instr::LoadConst(Literal::Bool(true));
        let f = Instr::LoadConst(Literal::Bool(false));
        assert_eq!(folded(BinOp::And, num(1.0), string("x")), t);
        assert_eq!(folded(BinOp::And, num(1.0), num(0.0)), f);
        assert_eq!(folded(BinOp::Or, num(0.0), Operand::Lit(Literal::Null)), f);
        assert_eq!(folded(BinOp::Or, num(0.0), Operand::Lit(Literal::Bool(true))), t);
    }

    #[test]
    fn unary_operators() {
        assert_eq!(
            fold_one(Instr::unary(UnOp::Neg, num(4.0))).0,
            Instr::LoadConst(Literal::Number(-4.0))
        );
        assert_eq!(
            fold_one(Instr::unary(UnOp::Not, string(""))).0,
            Instr::LoadConst(Literal::Bool(true))
        );
        let original = Instr::unary(UnOp::Neg, string("x"));
        assert_eq!(fold_one(original.clone()).0, original);
    }

    // ── Conditional jumps ────────────────────────────────────────────────

    #[test]
    fn truthy_constant_branch_becomes_jump() {
        let mut func = FunctionBuilder::new("f")
            .block(
                "b",
                vec![Instr::LoadConst(Literal::Number(3.0)), Instr::jump_if("L")],
            )
            .build();
        let mut metrics = OptimizationMetrics::default();
        assert!(eliminate(&mut func, &mut metrics));
        assert_eq!(func.blocks[0].instructions, vec![Instr::Nop, Instr::jump("L")]);
    }

    #[test]
    fn falsy_constant_branch_becomes_nop() {
        let mut func = FunctionBuilder::new("f")
            .block(
                "b",
                vec![Instr::LoadConst(Literal::Str(String::new())), Instr::jump_if("L")],
            )
            .build();
        let mut metrics = OptimizationMetrics::default();
        assert!(eliminate(&mut func, &mut metrics));
        assert_eq!(func.blocks[0].instructions, vec![Instr::Nop, Instr::Nop]);
    }

    #[test]
    fn folded_comparison_feeds_branch_in_same_scan() {
        let mut func = FunctionBuilder::new("f")
            .block(
                "b",
                vec![Instr::binary(BinOp::Lt, num(1.0), num(2.0)), Instr::jump_if("L")],
            )
            .build();
        let mut metrics = OptimizationMetrics::default();
        eliminate(&mut func, &mut metrics);
        assert_eq!(func.blocks[0].instructions, vec![Instr::Nop, Instr::jump("L")]);
        assert_eq!(metrics.replaced_instructions, 3);
    }

    #[test]
    fn branch_on_register_left_alone() {
        let body = vec![
            Instr::binary(BinOp::Lt, Operand::Reg(Register(0)), num(2.0)),
            Instr::jump_if("L"),
        ];
        let mut func = FunctionBuilder::new("f").block("b", body.clone()).build();
        let mut metrics = OptimizationMetrics::default();
        assert!(!eliminate(&mut func, &mut metrics));
        assert_eq!(func.blocks[0].instructions, body);
    }
}
