//! Intermediate Representation (IR) consumed by the optimizer and encoder.
//!
//! The IR is built by an external front end, mutated in place by the
//! optimization pipeline and then read once by the bytecode encoder.

mod types;
pub use types::*;

mod builder;
pub use builder::{FunctionBuilder, ModuleBuilder};
