//! Encoder error types.
//!
//! Optimizer failures never surface here: the pipeline recovers from them
//! locally. Every encoder error is fatal for the module being encoded and no
//! bytecode is produced.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Labels still pending when the instruction stream ended, sorted.
    #[error("unresolved labels: {}", .0.join(", "))]
    UnresolvedLabels(Vec<String>),

    #[error("label `{0}` defined more than once")]
    DuplicateLabel(String),

    #[error("{what} {value} does not fit in a {bits}-bit operand")]
    OperandOutOfRange {
        what: &'static str,
        value: i64,
        bits: u8,
    },

    #[error("constant pool overflow: more than 65536 distinct constants")]
    ConstantPoolOverflow,
}

impl EncodeError {
    /// Label names reported by an [`EncodeError::UnresolvedLabels`] error.
    pub fn unresolved_labels(&self) -> &[String] {
        match self {
            EncodeError::UnresolvedLabels(labels) => labels,
            _ => &[],
        }
    }
}
