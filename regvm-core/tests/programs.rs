//! Integration tests running the bundled demo programs

use regvm_core::{
    Interpreter, InterpreterConfig, LabelMode, Program, RecordingTrace, VmErrorKind,
    check_program,
};

const TRIANGLE: &str = include_str!("../../programs/triangle_numbers.txt");
const COUNTDOWN: &str = include_str!("../../programs/countdown.txt");
const POPCOUNT: &str = include_str!("../../programs/popcount.txt");

fn run(name: &str, source: &str, config: InterpreterConfig) -> Interpreter {
    let mut vm = Interpreter::with_config(Program::from_source(name, source), config);
    vm.run_untraced().unwrap();
    vm
}

#[test]
fn test_triangle_numbers() {
    let vm = run("triangle", TRIANGLE, InterpreterConfig::legacy());

    assert_eq!(&vm.memory()[..10], &[1, 3, 6, 10, 15, 21, 28, 36, 45, 55]);
    assert!(vm.memory()[10..].iter().all(|&m| m == 0));
    assert_eq!(vm.registers()[0], 55);
    assert_eq!(vm.registers()[2], 10);
}

#[test]
fn test_countdown_needs_prescan() {
    let vm = run("countdown", COUNTDOWN, InterpreterConfig::default());
    assert_eq!(&vm.memory()[..6], &[5, 4, 3, 2, 1, 0]);
    assert_eq!(vm.registers()[1], 5);
    assert!(vm.summary().halted);

    let mut legacy = Interpreter::with_config(
        Program::from_source("countdown", COUNTDOWN),
        InterpreterConfig::legacy(),
    );
    let err = legacy.run_untraced().unwrap_err();
    assert_eq!(err.kind, VmErrorKind::UndefinedLabel("DONE".into()));
    // every value was stored before the failing branch
    assert_eq!(&err.memory[..5], &[5, 4, 3, 2, 1]);
    assert_eq!(err.registers[0], 0);
}

#[test]
fn test_popcount() {
    let vm = run("popcount", POPCOUNT, InterpreterConfig::legacy());
    let r = vm.registers();

    assert_eq!(r[0], 0);
    assert_eq!(r[1], 5);
    assert_eq!(r[3], 8);
    assert_eq!(r[4], -6);
    assert_eq!(r[5], 250);
    assert_eq!(r[6], 80);
    assert_eq!(r[7], 85);
    assert_eq!(vm.memory()[0], 5);
}

#[test]
fn test_demo_programs_pass_check() {
    for (name, source) in [("triangle", TRIANGLE), ("countdown", COUNTDOWN), ("popcount", POPCOUNT)] {
        let diags = check_program(&Program::from_source(name, source), LabelMode::Prescan);
        assert!(diags.is_empty(), "{name}: {diags:?}");
    }

    let diags = check_program(&Program::from_source("countdown", COUNTDOWN), LabelMode::Legacy);
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("DONE"));
}

#[test]
fn test_trace_line_numbers_point_at_source() {
    let program = Program::from_source("triangle", TRIANGLE);
    let mut vm = Interpreter::new(program.clone());
    let mut sink = RecordingTrace::new();
    vm.run(&mut sink).unwrap();

    for snap in sink.snapshots() {
        let text = program.line(snap.line).unwrap();
        assert!(text.trim_start().starts_with(&snap.mnemonic), "{text}");
    }
}
