//! qbc: quantum bytecode compiler backend.
//!
//! Takes an IR module handed over by a front end, optimizes it to a fixed
//! point and encodes it into the binary bytecode format loaded by the
//! execution engine.

pub mod encoder;
pub mod error;
pub mod ir;
pub mod optimizer;

// Re-export key types for convenience
pub use anyhow::{Context, Result};
pub use encoder::BytecodeEncoder;
pub use error::EncodeError;
use ir::Module;
pub use optimizer::{OptLevel, OptimizationMetrics, Optimizer};

/// Configuration options for compilation
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Optimization level
    pub level: OptLevel,
    /// Fixed module identifier; generated when `None`
    pub module_id: Option<String>,
}

/// Result of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub bytecode: Vec<u8>,
    pub metrics: OptimizationMetrics,
}

/// Optimize and encode an IR module.
///
/// Optimizer failures are recovered internally (the module is encoded
/// unoptimized and `metrics.failed_pass` is set); encoder failures are
/// returned and no bytecode is produced.
///
/// # Example
/// ```no_run
/// use qbc::{compile, CompileOptions};
///
/// let json = std::fs::read_to_string("module.json").unwrap();
/// let module = serde_json::from_str(&json).unwrap();
/// let output = compile(module, &CompileOptions::default()).unwrap();
/// std::fs::write("module.qbc", output.bytecode).unwrap();
/// ```
pub fn compile(module: Module, options: &CompileOptions) -> Result<CompileOutput> {
    let mut optimizer = Optimizer::new(options.level);
    let optimized = optimizer.optimize(module);

    let mut encoder = BytecodeEncoder::new();
    if let Some(id) = &options.module_id {
        encoder = encoder.with_module_id(id.clone());
    }
    let bytecode = encoder
        .encode(&optimized)
        .with_context(|| format!("failed to encode module `{}`", optimized.name))?;

    Ok(CompileOutput {
        bytecode,
        metrics: optimizer.metrics().clone(),
    })
}
