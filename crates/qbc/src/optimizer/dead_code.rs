//! Dead code elimination.
//!
//! Two kinds of dead code are removed from every function that is not a
//! module entry point:
//!
//! - **Dead instructions**: `Nop`s, debug markers attached to a label that is
//!   not active, and label pseudo-instructions nothing jumps to. A label is
//!   active when it names a block or is the target of a jump. Anything
//!   after a `Jump` or `Return` is dead up to the next label marker, so a
//!   jump that can never run cannot keep naming a block that was pruned.
//! - **Unreachable blocks**: blocks not reachable from block 0 by following
//!   jumps, conditional jumps and fallthrough. A block falls through to the
//!   next one in layout order unless it ends in an unconditional transfer
//!   (`Jump` or `Return`).
//!
//! Jumps to labels that are never defined are ignored here; the encoder
//! reports them as unresolved.

use super::metrics::OptimizationMetrics;
use super::utils::{jump_target, label_blocks};
use crate::ir::{ControlInstr, Function, Instr};
use anyhow::Result;
use std::collections::{HashSet, VecDeque};

/// Computes the set of active labels: every block label plus every label
/// referenced by a jump or conditional jump.
fn active_labels(func: &Function) -> HashSet<String> {
    let mut active: HashSet<String> = func.blocks.iter().map(|b| b.label.clone()).collect();
    for block in &func.blocks {
        active.extend(
            block
                .instructions
                .iter()
                .filter_map(jump_target)
                .map(str::to_string),
        );
    }
    active
}

/// Drops dead instructions in place, returning how many were removed.
fn remove_dead_instructions(func: &mut Function, active: &HashSet<String>) -> usize {
    let mut removed = 0;
    for block in &mut func.blocks {
        let before = block.instructions.len();
        block.instructions.retain(|instr| match instr {
            Instr::Nop => false,
            Instr::Debug(d) => d.label.as_ref().map_or(true, |l| active.contains(l)),
            Instr::Control(ControlInstr::Label(name)) => active.contains(name),
            _ => true,
        });
        removed += before - block.instructions.len();
    }
    removed
}

/// Drops instructions that follow a `Jump` or `Return` up to the next label
/// marker, returning how many were removed.
fn remove_unreachable_tails(func: &mut Function) -> usize {
    let mut removed = 0;
    for block in &mut func.blocks {
        let before = block.instructions.len();
        let mut live = true;
        block.instructions.retain(|instr| {
            if matches!(instr, Instr::Control(ControlInstr::Label(_))) {
                live = true;
            }
            let keep = live;
            if matches!(
                instr,
                Instr::Control(ControlInstr::Jump { .. } | ControlInstr::Return)
            ) {
                live = false;
            }
            keep
        });
        removed += before - block.instructions.len();
    }
    removed
}

/// Computes the indices of blocks reachable from block 0 via BFS.
fn reachable_blocks(func: &Function) -> Result<HashSet<usize>> {
    let labels = label_blocks(func)?;
    let mut reachable = HashSet::new();
    if func.blocks.is_empty() {
        return Ok(reachable);
    }

    let mut worklist = VecDeque::from([0usize]);
    while let Some(idx) = worklist.pop_front() {
        // Cycles and blocks with several predecessors are visited once.
        if !reachable.insert(idx) {
            continue;
        }
        // A label marker after a terminator starts a new live segment.
        let mut falls_through = true;
        for instr in &func.blocks[idx].instructions {
            match instr {
                Instr::Control(ControlInstr::Label(_)) => falls_through = true,
                _ if !falls_through => {}
                Instr::Control(ControlInstr::Jump { target }) => {
                    worklist.extend(labels.get(target.as_str()).copied());
                    falls_through = false;
                }
                Instr::Control(ControlInstr::JumpIf { target }) => {
                    worklist.extend(labels.get(target.as_str()).copied());
                }
                Instr::Control(ControlInstr::Return) => falls_through = false,
                _ => {}
            }
        }
        if falls_through && idx + 1 < func.blocks.len() {
            worklist.push_back(idx + 1);
        }
    }
    Ok(reachable)
}

/// Removes dead instructions and unreachable blocks from `func` in place.
///
/// Returns whether anything was removed. Entry-point functions are left
/// untouched.
pub fn eliminate(func: &mut Function, metrics: &mut OptimizationMetrics) -> Result<bool> {
    if func.is_entry_point || func.blocks.is_empty() {
        return Ok(false);
    }

    let active = active_labels(func);
    let removed = remove_dead_instructions(func, &active) + remove_unreachable_tails(func);
    metrics.removed_instructions += removed;

    let reachable = reachable_blocks(func)?;
    let before = func.blocks.len();
    let mut idx = 0;
    func.blocks.retain(|block| {
        let keep = reachable.contains(&idx);
        idx += 1;
        if !keep {
            metrics.removed_instructions += block.instructions.len();
            metrics.blocks_merged += 1;
        }
        keep
    });

    Ok(removed > 0 || func.blocks.len() != before)
}
