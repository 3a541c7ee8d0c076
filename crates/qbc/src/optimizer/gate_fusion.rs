//! Gate fusion and peephole rewriting.
//!
//! Runs four sub-passes over each block, in this order:
//!
//! 1. **Self-inverse cancellation**: a maximal run of identical `X`, `Y`, `Z`
//!    or `H` gates on one qubit, with nothing in between, collapses to a
//!    single `Nop` (even length) or one gate (odd length).
//! 2. **Pattern rewriting**: exact gate sequences on one qubit are replaced
//!    using [`REWRITE_RULES`], scanning right to left.
//! 3. **Redundant entanglement**: an `Entangle` on a pair already entangled
//!    earlier in the block is dropped unless a barrier (measurement, `CNOT`,
//!    `SWAP`, call or label) lies between them.
//! 4. **Measurement elision**: a measurement whose result register is never
//!    read before its qubit is used again, or before the block ends, is
//!    dropped. Reaching any control flow first keeps it.
//!
//! Every sub-pass builds a fresh output list from its input rather than
//! splicing in place.
//!
//! | Pattern | Replacement |
//! |---------|-------------|
//! | `H X H` | `Z` |
//! | `H Z H` | `X` |
//! | `S S`   | `Z` |
//! | `T T`   | `S` |
//! | `X Z`   | `Z X` |

use super::metrics::OptimizationMetrics;
use super::utils::{is_control_flow, reads_register, self_inverse_target, targets_qubit};
use crate::ir::{ControlInstr, EntangleInstr, Function, Gate, GateInstr, Instr, MeasureInstr};

/// An exact single-qubit gate sequence and its replacement.
#[derive(Debug, Clone, Copy)]
pub struct RewriteRule {
    pub pattern: &'static [Gate],
    pub replacement: &'static [Gate],
}

/// Rewrite table, longest patterns first so they win over their prefixes.
pub const REWRITE_RULES: &[RewriteRule] = &[
    RewriteRule {
        pattern: &[Gate::H, Gate::X, Gate::H],
        replacement: &[Gate::Z],
    },
    RewriteRule {
        pattern: &[Gate::H, Gate::Z, Gate::H],
        replacement: &[Gate::X],
    },
    RewriteRule {
        pattern: &[Gate::S, Gate::S],
        replacement: &[Gate::Z],
    },
    RewriteRule {
        pattern: &[Gate::T, Gate::T],
        replacement: &[Gate::S],
    },
    RewriteRule {
        pattern: &[Gate::X, Gate::Z],
        replacement: &[Gate::Z, Gate::X],
    },
];

/// Run all fusion sub-passes over every block of `func`.
///
/// Returns whether any block changed.
pub fn eliminate(func: &mut Function, metrics: &mut OptimizationMetrics) -> bool {
    let mut changed = false;
    for block in &mut func.blocks {
        let instrs = std::mem::take(&mut block.instructions);
        let (instrs, c1) = cancel_self_inverse_runs(instrs, metrics);
        let (instrs, c2) = rewrite_patterns(instrs, metrics);
        let (instrs, c3) = drop_redundant_entanglement(instrs, metrics);
        let (instrs, c4) = elide_dead_measurements(instrs, metrics);
        block.instructions = instrs;
        changed |= c1 || c2 || c3 || c4;
    }
    changed
}

// ── 1. Self-inverse cancellation ─────────────────────────────────────────────

fn cancel_self_inverse_runs(
    instrs: Vec<Instr>,
    metrics: &mut OptimizationMetrics,
) -> (Vec<Instr>, bool) {
    let mut out = Vec::with_capacity(instrs.len());
    let mut changed = false;
    let mut i = 0;

    while i < instrs.len() {
        let Some(head) = self_inverse_target(&instrs[i]) else {
            out.push(instrs[i].clone());
            i += 1;
            continue;
        };

        // Extend the run while the exact same gate hits the same qubit.
        let mut end = i + 1;
        while end < instrs.len() && self_inverse_target(&instrs[end]) == Some(head) {
            end += 1;
        }
        let run = end - i;

        if run == 1 {
            out.push(instrs[i].clone());
        } else if run % 2 == 0 {
            out.push(Instr::Nop);
            metrics.removed_instructions += run - 1;
            metrics.replaced_instructions += 1;
            metrics.domain_ops_optimized += run;
            changed = true;
        } else {
            out.push(instrs[i].clone());
            metrics.removed_instructions += run - 1;
            metrics.domain_ops_optimized += run - 1;
            changed = true;
        }
        i = end;
    }
    (out, changed)
}

// ── 2. Pattern rewriting ─────────────────────────────────────────────────────

/// Returns the rule matched at `instrs[start..limit]` and its first gate.
///
/// Every instruction of the span must be a gate from the pattern acting on
/// exactly the qubits of the first matched instruction.
fn match_rule(
    instrs: &[Instr],
    start: usize,
    limit: usize,
) -> Option<(&'static RewriteRule, &GateInstr)> {
    let Instr::Gate(first) = &instrs[start] else {
        return None;
    };
    let rule = REWRITE_RULES.iter().find(|rule| {
        let len = rule.pattern.len();
        start + len <= limit
            && instrs[start..start + len]
                .iter()
                .zip(rule.pattern)
                .all(|(instr, gate)| match instr {
                    Instr::Gate(g) => g.gate == *gate && g.qubits == first.qubits,
                    _ => false,
                })
    })?;
    Some((rule, first))
}

fn rewrite_patterns(instrs: Vec<Instr>, metrics: &mut OptimizationMetrics) -> (Vec<Instr>, bool) {
    // Segments are collected back to front and reversed at the end; `limit`
    // is the start of the most recent match, so a span never overlaps
    // instructions that were already rewritten.
    let mut reversed: Vec<Instr> = Vec::with_capacity(instrs.len());
    let mut limit = instrs.len();
    let mut changed = false;

    for start in (0..instrs.len()).rev() {
        let Some((rule, first)) = match_rule(&instrs, start, limit) else {
            continue;
        };
        let len = rule.pattern.len();
        let qubits = first.qubits.clone();
        reversed.extend(instrs[start + len..limit].iter().rev().cloned());
        reversed.extend(rule.replacement.iter().rev().map(|gate| {
            Instr::Gate(GateInstr {
                gate: *gate,
                qubits: qubits.clone(),
            })
        }));

        metrics.replaced_instructions += rule.replacement.len().min(len);
        metrics.removed_instructions += len.saturating_sub(rule.replacement.len());
        metrics.domain_ops_optimized += len;
        limit = start;
        changed = true;
    }

    if !changed {
        return (instrs, false);
    }
    reversed.extend(instrs[..limit].iter().rev().cloned());
    reversed.reverse();
    (reversed, true)
}

// ── 3. Redundant entanglement ────────────────────────────────────────────────

/// True if `instr` may perturb entanglement state, ending the backward walk.
fn is_entanglement_barrier(instr: &Instr) -> bool {
    match instr {
        Instr::Measure(_) => true,
        Instr::Gate(g) => matches!(g.gate, Gate::Cnot | Gate::Swap),
        Instr::Control(ControlInstr::Call { .. }) | Instr::Control(ControlInstr::Label(_)) => true,
        _ => false,
    }
}

fn already_entangled(kept: &[Instr], entangle: &EntangleInstr) -> bool {
    for prev in kept.iter().rev() {
        if is_entanglement_barrier(prev) {
            return false;
        }
        if let Instr::Entangle(e) = prev {
            if e.same_pair(entangle) {
                return true;
            }
        }
    }
    false
}

fn drop_redundant_entanglement(
    instrs: Vec<Instr>,
    metrics: &mut OptimizationMetrics,
) -> (Vec<Instr>, bool) {
    let mut out: Vec<Instr> = Vec::with_capacity(instrs.len());
    let mut changed = false;
    for instr in instrs {
        if let Instr::Entangle(e) = &instr {
            if already_entangled(&out, e) {
                metrics.removed_instructions += 1;
                metrics.entanglement_ops_optimized += 1;
                changed = true;
                continue;
            }
        }
        out.push(instr);
    }
    (out, changed)
}

// ── 4. Measurement elision ───────────────────────────────────────────────────

/// True if the result of `measure` is provably unused in `rest`.
fn measurement_is_dead(rest: &[Instr], measure: &MeasureInstr) -> bool {
    for next in rest {
        if is_control_flow(next) || reads_register(next, measure.result) {
            return false;
        }
        if targets_qubit(next, measure.qubit) {
            return true;
        }
    }
    true
}

fn elide_dead_measurements(
    instrs: Vec<Instr>,
    metrics: &mut OptimizationMetrics,
) -> (Vec<Instr>, bool) {
    let mut out = Vec::with_capacity(instrs.len());
    let mut changed = false;
    for (i, instr) in instrs.iter().enumerate() {
        if let Instr::Measure(m) = instr {
            if measurement_is_dead(&instrs[i + 1..], m) {
                metrics.removed_instructions += 1;
                metrics.domain_ops_optimized += 1;
                changed = true;
                continue;
            }
        }
        out.push(instr.clone());
    }
    (out, changed)
}
