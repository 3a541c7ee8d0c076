//! End-to-end integration tests for qbc.
//!
//! These tests verify the complete pipeline: IR → optimizer → bytecode.

use anyhow::{Context, Result};
use qbc::encoder::{Header, Opcode, HEADER_SIZE};
use qbc::ir::{BasisState, FunctionBuilder, Gate, Instr, Literal, Module, ModuleBuilder};
use qbc::{compile, CompileOptions, EncodeError, OptLevel, Optimizer};

fn options(level: OptLevel) -> CompileOptions {
    CompileOptions {
        level,
        module_id: Some("e2e".to_string()),
    }
}

/// Returns the instruction stream of an encoded module.
fn code_of(bytes: &[u8]) -> Result<&[u8]> {
    let header = Header::parse(bytes).context("invalid header")?;
    Ok(&bytes[HEADER_SIZE..HEADER_SIZE + header.code_length as usize])
}

fn read_i32(bytes: &[u8], pos: usize) -> i32 {
    i32::from_le_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]])
}

fn module_of(func: qbc::ir::Function) -> Module {
    ModuleBuilder::new("test").function(func).build()
}

#[test]
fn test_cancelling_pairs_across_blocks() -> Result<()> {
    let func = FunctionBuilder::new("kernel")
        .block(
            "entry",
            vec![Instr::gate(Gate::X, &[0]), Instr::gate(Gate::X, &[0]), Instr::jump("L1")],
        )
        .block(
            "L1",
            vec![Instr::gate(Gate::H, &[0]), Instr::gate(Gate::H, &[0]), Instr::ret()],
        )
        .build();
    let module = module_of(func);

    let mut optimizer = Optimizer::new(OptLevel::Aggressive);
    let optimized = optimizer.optimize(module.clone());
    let blocks = &optimized.functions[0].blocks;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].instructions, vec![Instr::jump("L1")]);
    assert_eq!(blocks[1].label, "L1");
    assert_eq!(blocks[1].instructions, vec![Instr::ret()]);

    let output = compile(module, &options(OptLevel::Aggressive))?;
    // JUMP with a zero displacement (the target directly follows), RETURN.
    assert_eq!(code_of(&output.bytecode)?, &[Opcode::Jump as u8, 0, 0, 0, 0, Opcode::Return as u8]);
    assert_eq!(output.metrics.domain_ops_optimized, 4);
    Ok(())
}

#[test]
fn test_forward_label_round_trip() -> Result<()> {
    let func = FunctionBuilder::new("main")
        .block(
            "entry",
            vec![
                Instr::jump("skip"),
                Instr::gate(Gate::H, &[0]),
                Instr::gate(Gate::Rx(1.25), &[1]),
                Instr::measure(0, 0),
            ],
        )
        .block("skip", vec![Instr::ret()])
        .build();

    let output = compile(module_of(func), &options(OptLevel::None))?;
    let code = code_of(&output.bytecode)?;

    // The referencing field sits right after the JUMP opcode; the label is
    // the RETURN at the end of the stream.
    let field = 1;
    let target = code.len() - 1;
    assert_eq!(code[target], Opcode::Return as u8);
    let distance = (target - field) as i32;
    assert_eq!(read_i32(code, field), distance - 4);
    Ok(())
}

#[test]
fn test_unresolved_labels_are_all_reported() -> Result<()> {
    let func = FunctionBuilder::new("main")
        .entry_point()
        .block(
            "entry",
            vec![
                Instr::LoadConst(Literal::Bool(true)),
                Instr::jump_if("b"),
                Instr::call("nowhere"),
                Instr::jump("a"),
            ],
        )
        .build();

    let err = compile(module_of(func), &options(OptLevel::None)).unwrap_err();
    let encode_err = err
        .downcast_ref::<EncodeError>()
        .context("expected an encoder error")?;
    assert_eq!(
        encode_err.unresolved_labels(),
        &["main::a".to_string(), "main::b".to_string(), "nowhere".to_string()]
    );
    assert!(format!("{:#}", err).contains("failed to encode module `test`"));
    Ok(())
}

#[test]
fn test_entry_function_is_never_pruned() -> Result<()> {
    let func = FunctionBuilder::new("main")
        .entry_point()
        .block("entry", vec![Instr::ret()])
        .block("orphan", vec![Instr::gate(Gate::X, &[0]), Instr::ret()])
        .build();

    let output = compile(module_of(func), &options(OptLevel::Aggressive))?;
    assert_eq!(output.metrics.removed_instructions, 0);
    assert_eq!(output.metrics.blocks_merged, 0);
    // RETURN; X q0; RETURN
    assert_eq!(code_of(&output.bytecode)?.len(), 1 + 6 + 1);
    Ok(())
}

#[test]
fn test_optimized_branches_still_encode() -> Result<()> {
    let if_true_else = || {
        FunctionBuilder::new("f")
            .block(
                "b0",
                vec![
                    Instr::LoadConst(Literal::Bool(true)),
                    Instr::jump_if("then"),
                    Instr::jump("else"),
                ],
            )
            .block("then", vec![Instr::ret()])
            .block("else", vec![Instr::ret()])
            .build()
    };
    let jump_after_jump = || {
        FunctionBuilder::new("f")
            .block("b0", vec![Instr::jump("b1"), Instr::jump("b2")])
            .block("b1", vec![Instr::ret()])
            .block("b2", vec![Instr::ret()])
            .build()
    };

    for level in [OptLevel::None, OptLevel::Basic, OptLevel::Normal, OptLevel::Aggressive] {
        for func in [if_true_else(), jump_after_jump()] {
            let output = compile(module_of(func), &options(level))
                .with_context(|| format!("at {:?}", level))?;
            assert_eq!(*code_of(&output.bytecode)?.last().unwrap(), Opcode::Return as u8);
        }
    }

    // Once folded, only the taken branch survives: JUMP then; RETURN.
    let output = compile(module_of(if_true_else()), &options(OptLevel::Normal))?;
    assert_eq!(
        code_of(&output.bytecode)?,
        &[Opcode::Jump as u8, 0, 0, 0, 0, Opcode::Return as u8]
    );
    Ok(())
}

#[test]
fn test_self_inverse_runs_reduce_by_parity() -> Result<()> {
    for gate in [Gate::X, Gate::Y, Gate::Z, Gate::H] {
        for n in 1..=8 {
            let mut body = vec![Instr::gate(gate, &[2]); n];
            body.push(Instr::ret());
            let module = module_of(FunctionBuilder::new("f").block("entry", body).build());

            let optimized = Optimizer::new(OptLevel::Aggressive).optimize(module);
            let remaining = optimized.functions[0].blocks[0]
                .instructions
                .iter()
                .filter(|i| i.is_gate())
                .count();
            assert_eq!(remaining, n % 2, "{:?} x{}", gate, n);
        }
    }
    Ok(())
}

#[test]
fn test_rerun_is_idempotent() -> Result<()> {
    let func = FunctionBuilder::new("f")
        .block(
            "entry",
            vec![
                Instr::LoadConst(Literal::Number(0.0)),
                Instr::jump_if("dead"),
                Instr::gate(Gate::H, &[0]),
                Instr::gate(Gate::X, &[0]),
                Instr::gate(Gate::H, &[0]),
                Instr::entangle(0, 1),
                Instr::entangle(1, 0),
                Instr::ret(),
            ],
        )
        .block("dead", vec![Instr::gate(Gate::T, &[0]), Instr::ret()])
        .build();

    let mut optimizer = Optimizer::new(OptLevel::Aggressive);
    let once = optimizer.optimize(module_of(func));
    assert!(optimizer.metrics().removed_instructions > 0);

    let twice = optimizer.optimize(once.clone());
    assert_eq!(twice, once);
    assert_eq!(optimizer.metrics().iterations, 1);
    assert_eq!(optimizer.metrics().removed_instructions, 0);
    assert_eq!(optimizer.metrics().replaced_instructions, 0);
    Ok(())
}

#[test]
fn test_json_module_compiles() -> Result<()> {
    let json = r#"{
        "name": "bell",
        "qubits": [{"name": "a"}, {"name": "b", "initial": "one"}],
        "metadata": {"entanglement": {"pairs": [[0, 1]]}},
        "functions": [{
            "name": "main",
            "is_entry_point": true,
            "blocks": [{
                "label": "entry",
                "instructions": [
                    {"gate": {"gate": "h", "qubits": [0]}},
                    {"gate": {"gate": "cnot", "qubits": [0, 1]}},
                    {"measure": {"qubit": 0, "result": 0}},
                    {"measure": {"qubit": 1, "result": 1}},
                    {"control": "return"}
                ]
            }]
        }]
    }"#;
    let module: Module = serde_json::from_str(json).context("failed to parse module")?;
    assert_eq!(module.qubits[1].initial, BasisState::One);

    let output = compile(module, &options(OptLevel::Aggressive))?;
    let header = Header::parse(&output.bytecode)?;
    assert_eq!(header.qubit_count, 2);
    assert_eq!(header.gate_count, 2);
    assert_eq!(header.debug_offset as usize + 4, output.bytecode.len());

    let metadata = &output.bytecode[header.metadata_offset as usize..header.debug_offset as usize];
    let needle = br#"[[0,1]]"#;
    assert!(metadata.windows(needle.len()).any(|w| w == needle));
    Ok(())
}

#[test]
fn test_fixed_module_id_is_reproducible() -> Result<()> {
    let build = || {
        module_of(
            FunctionBuilder::new("f")
                .block("entry", vec![Instr::gate(Gate::S, &[0]), Instr::gate(Gate::S, &[0]), Instr::ret()])
                .build(),
        )
    };
    let a = compile(build(), &options(OptLevel::Aggressive))?;
    let b = compile(build(), &options(OptLevel::Aggressive))?;
    assert_eq!(a.bytecode, b.bytecode);
    Ok(())
}
