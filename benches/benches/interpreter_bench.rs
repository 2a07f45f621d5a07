//! # Interpreter Benchmarks
//!
//! Measures the execution loop on the bundled demo programs, label
//! registration in both modes, and the static check.
//!
//! Run: `cargo bench --bench interpreter_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use regvm_core::{
    Interpreter, InterpreterConfig, LabelMode, LabelTable, Operand, Program, RecordingTrace,
    check_program,
};

const TRIANGLE: &str = include_str!("../../programs/triangle_numbers.txt");
const POPCOUNT: &str = include_str!("../../programs/popcount.txt");
const COUNTDOWN: &str = include_str!("../../programs/countdown.txt");

/// Benchmark complete runs
fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run");

    for (name, source) in [("triangle", TRIANGLE), ("popcount", POPCOUNT), ("countdown", COUNTDOWN)] {
        let program = Program::from_source(name, source);

        group.bench_with_input(BenchmarkId::new("untraced", name), &program, |b, program| {
            b.iter(|| {
                let mut vm = Interpreter::new(program.clone());
                black_box(vm.run_untraced())
            })
        });

        group.bench_with_input(BenchmarkId::new("recorded", name), &program, |b, program| {
            b.iter(|| {
                let mut vm = Interpreter::new(program.clone());
                let mut sink = RecordingTrace::new();
                let _ = vm.run(&mut sink);
                black_box(sink.snapshots().len())
            })
        });
    }

    group.finish();
}

/// Benchmark label registration modes on a long loop
fn bench_label_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("label_modes");

    let program = Program::from_source(
        "spin",
        "MOV R0 #0\nLOOP:\nADD R0 R0 #1\nCMP R0 #1000\nBLT LOOP\nHALT",
    );

    for mode in [LabelMode::Prescan, LabelMode::Legacy] {
        let config = InterpreterConfig::default().with_label_mode(mode);
        group.bench_with_input(BenchmarkId::from_parameter(mode), &config, |b, &config| {
            b.iter(|| {
                let mut vm = Interpreter::with_config(program.clone(), config);
                black_box(vm.run_untraced())
            })
        });
    }

    group.bench_function("prescan_table", |b| {
        b.iter(|| black_box(LabelTable::prescan(&program)))
    });

    group.finish();
}

/// Benchmark operand parsing
fn bench_operands(c: &mut Criterion) {
    let mut group = c.benchmark_group("operands");

    for token in ["#42", "#-9223372036854775808", "R0", "R12"] {
        group.bench_with_input(BenchmarkId::new("parse", token), token, |b, token| {
            b.iter(|| black_box(Operand::parse(black_box(token))))
        });
    }

    group.finish();
}

/// Benchmark static check
fn bench_check(c: &mut Criterion) {
    let program = Program::from_source("triangle", TRIANGLE);

    c.bench_function("check_program", |b| {
        b.iter(|| black_box(check_program(&program, LabelMode::Legacy)))
    });
}

criterion_group!(benches, bench_run, bench_label_modes, bench_operands, bench_check);
criterion_main!(benches);
