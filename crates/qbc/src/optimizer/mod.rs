//! IR optimization pipeline.
//!
//! The [`Optimizer`] selects an ordered set of passes from its [`OptLevel`]
//! and applies the whole set repeatedly until a round changes nothing or
//! [`MAX_FIXED_POINT_ITERATIONS`] rounds have run. Passes are stateless
//! between runs; each works on one function at a time.
//!
//! If any pass fails, the optimizer logs the failing pass and returns the
//! module exactly as it was handed in. Optimization never leaves a module
//! partially transformed.

use crate::ir::Module;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

// ── Passes ───────────────────────────────────────────────────────────────────
mod const_fold;
mod dead_code;
mod gate_fusion;
mod metrics;
mod utils;

pub use gate_fusion::{RewriteRule, REWRITE_RULES};
pub use metrics::OptimizationMetrics;

/// Upper bound on pipeline rounds per [`Optimizer::optimize`] call.
///
/// Every pass is a bounded linear scan, so the cap makes the cost of one
/// call at most `instructions × passes × 10`. Real inputs converge in two
/// or three rounds (one round to transform, one to observe no change); a
/// module still changing after ten rounds is returned in its current,
/// valid state, merely not fully optimized.
pub const MAX_FIXED_POINT_ITERATIONS: usize = 10;

/// How aggressively to optimize.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OptLevel {
    /// No passes.
    None,
    /// Dead code elimination.
    Basic,
    /// Dead code elimination and constant folding.
    #[default]
    Normal,
    /// All passes, including gate fusion.
    Aggressive,
}

impl OptLevel {
    /// The passes run at this level, in the order they run each round.
    ///
    /// Dead code elimination runs first so later passes see fewer
    /// instructions; gate fusion runs last so it sees folded constants.
    pub fn passes(self) -> &'static [Pass] {
        match self {
            OptLevel::None => &[],
            OptLevel::Basic => &[Pass::DeadCodeElimination],
            OptLevel::Normal => &[Pass::DeadCodeElimination, Pass::ConstantFolding],
            OptLevel::Aggressive => &[
                Pass::DeadCodeElimination,
                Pass::ConstantFolding,
                Pass::GateFusion,
            ],
        }
    }
}

/// An optimization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    DeadCodeElimination,
    ConstantFolding,
    GateFusion,
}

impl Pass {
    pub fn name(self) -> &'static str {
        match self {
            Pass::DeadCodeElimination => "dead-code-elimination",
            Pass::ConstantFolding => "constant-folding",
            Pass::GateFusion => "gate-fusion",
        }
    }

    /// Runs the pass once over every function of `module`.
    ///
    /// Returns whether anything changed.
    fn run(self, module: &mut Module, metrics: &mut OptimizationMetrics) -> Result<bool> {
        let mut changed = false;
        for func in &mut module.functions {
            let func_changed = match self {
                Pass::DeadCodeElimination => dead_code::eliminate(func, metrics)
                    .with_context(|| format!("in function `{}`", func.name))?,
                Pass::ConstantFolding => const_fold::eliminate(func, metrics),
                Pass::GateFusion => gate_fusion::eliminate(func, metrics),
            };
            if func_changed {
                trace!(target: "qbc::optimizer", pass = self.name(), function = %func.name, "pass changed function");
            }
            changed |= func_changed;
        }
        Ok(changed)
    }
}

/// Fixed-point pipeline driver.
///
/// One optimizer may be reused across modules; each [`optimize`](Self::optimize)
/// call resets the metrics. Nothing is shared between optimizer instances.
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    level: OptLevel,
    metrics: OptimizationMetrics,
}

impl Optimizer {
    pub fn new(level: OptLevel) -> Self {
        Self {
            level,
            metrics: OptimizationMetrics::default(),
        }
    }

    pub fn set_level(&mut self, level: OptLevel) {
        self.level = level;
    }

    pub fn level(&self) -> OptLevel {
        self.level
    }

    /// Metrics of the most recent [`optimize`](Self::optimize) call.
    pub fn metrics(&self) -> &OptimizationMetrics {
        &self.metrics
    }

    /// Optimizes `module`, returning the optimized module.
    ///
    /// On pass failure the original module is returned unchanged and
    /// [`OptimizationMetrics::failed_pass`] names the pass.
    pub fn optimize(&mut self, module: Module) -> Module {
        self.metrics = OptimizationMetrics::new(module.instruction_count());
        let passes = self.level.passes();
        if passes.is_empty() {
            return module;
        }

        let original = module.clone();
        let mut module = module;
        match self.run_to_fixed_point(&mut module, passes) {
            Ok(()) => {
                info!(
                    target: "qbc::optimizer",
                    module = %module.name,
                    level = ?self.level,
                    iterations = self.metrics.iterations,
                    removed = self.metrics.removed_instructions,
                    replaced = self.metrics.replaced_instructions,
                    rate = self.metrics.optimization_rate(),
                    "optimization complete"
                );
                module
            }
            Err((pass, err)) => {
                warn!(
                    target: "qbc::optimizer",
                    pass = pass.name(),
                    error = %format!("{:#}", err),
                    "optimization pass failed; returning unoptimized module"
                );
                self.metrics = OptimizationMetrics {
                    failed_pass: Some(pass.name()),
                    ..OptimizationMetrics::new(original.instruction_count())
                };
                original
            }
        }
    }

    fn run_to_fixed_point(
        &mut self,
        module: &mut Module,
        passes: &[Pass],
    ) -> std::result::Result<(), (Pass, anyhow::Error)> {
        for round in 1..=MAX_FIXED_POINT_ITERATIONS {
            self.metrics.iterations = round;
            let mut changed = false;
            for &pass in passes {
                changed |= pass
                    .run(module, &mut self.metrics)
                    .map_err(|err| (pass, err))?;
            }
            debug!(target: "qbc::optimizer", round, changed, "pipeline round finished");
            if !changed {
                return Ok(());
            }
        }
        debug!(
            target: "qbc::optimizer",
            cap = MAX_FIXED_POINT_ITERATIONS,
            "iteration cap reached before fixed point"
        );
        Ok(())
    }
}

// ── Pipeline tests ────────────────────────────────────────────────────────────
