//! Optimize + encode throughput on synthetic modules.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qbc::encoder::BytecodeEncoder;
use qbc::ir::{BinOp, FunctionBuilder, Gate, Instr, Literal, Module, ModuleBuilder, Operand};
use qbc::{OptLevel, Optimizer};

/// `blocks` blocks chained by jumps, each mixing cancelling gate pairs,
/// foldable arithmetic, a constant branch and duplicate entanglement.
fn build_module(blocks: usize) -> Module {
    let mut func = FunctionBuilder::new("kernel");
    for b in 0..blocks {
        let q = (b % 16) as u32;
        let next = format!("b{}", b + 1);
        let body = vec![
            Instr::gate(Gate::H, &[q]),
            Instr::gate(Gate::X, &[q]),
            Instr::gate(Gate::H, &[q]),
            Instr::gate(Gate::Y, &[q]),
            Instr::gate(Gate::Y, &[q]),
            Instr::binary(
                BinOp::Lt,
                Operand::Lit(Literal::Number(b as f64)),
                Operand::Lit(Literal::Number(1.0e9)),
            ),
            Instr::jump_if(next.clone()),
            Instr::entangle(q, q + 1),
            Instr::entangle(q + 1, q),
            Instr::measure(q, 0),
            Instr::jump(next),
        ];
        func = func.block(format!("b{}", b), body);
    }
    func = func.block(format!("b{}", blocks), vec![Instr::ret()]);
    ModuleBuilder::new("bench").function(func.build()).build()
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    for blocks in [16usize, 256, 2048] {
        let module = build_module(blocks);
        group.throughput(Throughput::Elements(module.instruction_count() as u64));

        group.bench_with_input(BenchmarkId::new("optimize", blocks), &module, |b, m| {
            b.iter(|| Optimizer::new(OptLevel::Aggressive).optimize(black_box(m.clone())))
        });

        group.bench_with_input(BenchmarkId::new("encode", blocks), &module, |b, m| {
            b.iter(|| {
                BytecodeEncoder::new()
                    .with_module_id("bench")
                    .encode(black_box(m))
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
