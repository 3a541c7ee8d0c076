//! Counters reported by one [`Optimizer::optimize`](super::Optimizer::optimize) call.

use std::fmt;

/// Statistics accumulated across every pass and round of one optimize call.
///
/// Reset at the start of each call and left untouched until the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizationMetrics {
    /// Instructions in the module before optimization.
    pub total_instructions: usize,
    /// Instructions deleted outright.
    pub removed_instructions: usize,
    /// Instructions rewritten into a different instruction.
    pub replaced_instructions: usize,
    /// Unreachable blocks removed.
    pub blocks_merged: usize,
    /// Gate and measurement operations cancelled, rewritten or elided.
    pub domain_ops_optimized: usize,
    /// Redundant entangling operations removed.
    pub entanglement_ops_optimized: usize,
    /// Fixed-point rounds executed.
    pub iterations: usize,
    /// Name of the pass that failed, if the call fell back to the original module.
    pub failed_pass: Option<&'static str>,
}

impl OptimizationMetrics {
    pub fn new(total_instructions: usize) -> Self {
        Self {
            total_instructions,
            ..Default::default()
        }
    }

    /// `(removed + replaced) / total`, or 0 for an empty module.
    pub fn optimization_rate(&self) -> f64 {
        if self.total_instructions == 0 {
            return 0.0;
        }
        (self.removed_instructions + self.replaced_instructions) as f64
            / self.total_instructions as f64
    }
}

impl fmt::Display for OptimizationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "instructions:        {}", self.total_instructions)?;
        writeln!(f, "removed:             {}", self.removed_instructions)?;
        writeln!(f, "replaced:            {}", self.replaced_instructions)?;
        writeln!(f, "blocks merged:       {}", self.blocks_merged)?;
        writeln!(f, "domain ops:          {}", self.domain_ops_optimized)?;
        writeln!(f, "entanglement ops:    {}", self.entanglement_ops_optimized)?;
        writeln!(f, "iterations:          {}", self.iterations)?;
        write!(
            f,
            "optimization rate:   {:.1}%",
            self.optimization_rate() * 100.0
        )?;
        if let Some(pass) = self.failed_pass {
            write!(f, "\nfailed pass:         {}", pass)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_of_empty_module_is_zero() {
        assert_eq!(OptimizationMetrics::new(0).optimization_rate(), 0.0);
    }

    #[test]
    fn rate_counts_removed_and_replaced() {
        let metrics = OptimizationMetrics {
            total_instructions: 10,
            removed_instructions: 3,
            replaced_instructions: 2,
            ..Default::default()
        };
        assert!((metrics.optimization_rate() - 0.5).abs() < f64::EPSILON);
    }
}
