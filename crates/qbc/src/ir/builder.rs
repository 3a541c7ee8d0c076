//! Fluent construction of IR functions and modules.
//!
//! Front ends and tests use these builders instead of spelling out nested
//! struct literals.

use super::types::{BasisState, Block, Function, Instr, Module, ModuleMetadata, QubitDecl};

/// Builds a [`Function`] block by block, in layout order.
#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    name: String,
    blocks: Vec<Block>,
    is_entry_point: bool,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            is_entry_point: false,
        }
    }

    /// Marks the function as a module entry point.
    pub fn entry_point(mut self) -> Self {
        self.is_entry_point = true;
        self
    }

    /// Appends a block. The first block appended is the entry block.
    pub fn block(mut self, label: impl Into<String>, instructions: Vec<Instr>) -> Self {
        self.blocks.push(Block::new(label, instructions));
        self
    }

    pub fn build(self) -> Function {
        Function {
            name: self.name,
            blocks: self.blocks,
            is_entry_point: self.is_entry_point,
        }
    }
}

/// Builds a [`Module`].
#[derive(Debug, Clone, Default)]
pub struct ModuleBuilder {
    module: Module,
}

impl ModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            module: Module {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    pub fn function(mut self, function: Function) -> Self {
        self.module.functions.push(function);
        self
    }

    pub fn qubit(mut self, name: impl Into<String>, initial: BasisState) -> Self {
        self.module.qubits.push(QubitDecl {
            name: name.into(),
            initial,
        });
        self
    }

    pub fn entanglement_info(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.module.metadata.entanglement.insert(key.into(), value);
        self
    }

    pub fn custom_metadata(mut self, key: impl Into<String>, blob: Vec<u8>) -> Self {
        self.module.metadata.custom.insert(key.into(), blob);
        self
    }

    pub fn metadata(mut self, metadata: ModuleMetadata) -> Self {
        self.module.metadata = metadata;
        self
    }

    pub fn build(self) -> Module {
        self.module
    }
}
