//! Execution loop and instruction handlers
//!
//! ```text
//!   ┌──────────── fetch line[pc], pc += 1 ─────────────┐
//!   │                                                  │
//!   ▼                                                  │
//! blank / comment ── skip ─────────────────────────────┤
//! label ──────────── labels[name] = pc ────────────────┤
//! instruction ────── decode → execute → trace ─────────┘
//!                         │
//!                         └── HALT: pc = HALT_SENTINEL (loop ends)
//! ```

use crate::config::InterpreterConfig;
use crate::error::{LoadError, VmError, VmErrorKind, VmResult};
use crate::instruction::Instruction;
use crate::labels::LabelTable;
use crate::opcode::Opcode;
use crate::operand::{resolve_memory_address, resolve_register_index, resolve_value};
use crate::program::{LineKind, Program, ProgramLoader};
use crate::store::{Latch, MEMORY_SIZE, REGISTER_COUNT, Store, Word};
use crate::trace::{NullTrace, TraceSink, TraceSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// Program counter value written by `HALT`; outside every program's bounds
pub const HALT_SENTINEL: usize = usize::MAX;

/// All mutable run state, passed explicitly to every handler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Machine {
    pub store: Store,
    pub latch: Latch,
    pub labels: LabelTable,
    pub pc: usize,
}

impl Machine {
    pub fn new(labels: LabelTable) -> Self {
        Self {
            labels,
            ..Self::default()
        }
    }

    /// Attach the current state to a fault raised on `line`
    pub fn fault(&self, kind: VmErrorKind, line: usize) -> VmError {
        VmError {
            kind,
            line,
            pc: self.pc,
            registers: *self.store.registers(),
            memory: *self.store.memory(),
        }
    }
}

/// What a single loop iteration did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Blank,
    Comment,
    Label { name: String, target: usize },
    Executed(Opcode),
    /// Program counter was already outside the program
    Finished,
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Loop iterations, including blank/comment/label lines
    pub steps: u64,
    /// Executed instructions
    pub instructions: u64,
    /// Ended by `HALT` rather than by running off the end
    pub halted: bool,
}

/// Line-oriented interpreter owning one program and its machine state
#[derive(Debug, Clone)]
pub struct Interpreter {
    program: Program,
    machine: Machine,
    config: InterpreterConfig,
    steps: u64,
    instructions: u64,
}

impl Interpreter {
    pub fn new(program: Program) -> Self {
        Self::with_config(program, InterpreterConfig::default())
    }

    pub fn with_config(program: Program, config: InterpreterConfig) -> Self {
        let labels = LabelTable::for_mode(&program, config.label_mode);
        debug!(
            program = program.name(),
            lines = program.len(),
            mode = %config.label_mode,
            labels = labels.len(),
            "interpreter ready"
        );
        Self {
            program,
            machine: Machine::new(labels),
            config,
            steps: 0,
            instructions: 0,
        }
    }

    /// Fetch `id` from `loader`; a load failure happens before anything runs
    pub fn load(
        loader: &dyn ProgramLoader,
        id: &str,
        config: InterpreterConfig,
    ) -> Result<Self, LoadError> {
        let program = loader.load(id)?;
        Ok(Self::with_config(program, config))
    }

    /// Run until `HALT`, end of program, or the first fault
    pub fn run<S: TraceSink + ?Sized>(&mut self, sink: &mut S) -> VmResult<RunSummary> {
        while self.is_running() {
            if let Err(err) = self.step(sink) {
                warn!(program = self.program.name(), error = %err, "run aborted");
                return Err(err);
            }
        }

        let summary = self.summary();
        info!(
            program = self.program.name(),
            steps = summary.steps,
            instructions = summary.instructions,
            halted = summary.halted,
            "run finished"
        );
        Ok(summary)
    }

    pub fn run_untraced(&mut self) -> VmResult<RunSummary> {
        self.run(&mut NullTrace)
    }

    /// Execute one loop iteration
    pub fn step<S: TraceSink + ?Sized>(&mut self, sink: &mut S) -> VmResult<Step> {
        let index = self.machine.pc;
        let Some(line) = self.program.line(index) else {
            return Ok(Step::Finished);
        };

        if let Some(max) = self.config.max_steps {
            if self.steps >= max {
                return Err(self.machine.fault(VmErrorKind::StepLimitExceeded(max), index));
            }
        }
        self.steps += 1;
        self.machine.pc = index + 1;

        let (mnemonic, operands) = match crate::program::classify(line) {
            LineKind::Blank => return Ok(Step::Blank),
            LineKind::Comment => return Ok(Step::Comment),
            LineKind::Label(name) => {
                let target = self.machine.pc;
                self.machine.labels.define(name, target);
                debug!(label = name, to = target, "label recorded");
                return Ok(Step::Label {
                    name: name.to_string(),
                    target,
                });
            }
            LineKind::Instruction { mnemonic, operands } => (mnemonic, operands),
        };

        let instr = Instruction::decode(mnemonic, operands)
            .map_err(|kind| self.machine.fault(kind, index))?;

        trace!(line = index + 1, instr = %instr, "execute");
        execute(&mut self.machine, &instr).map_err(|kind| self.machine.fault(kind, index))?;
        self.instructions += 1;

        sink.record(&TraceSnapshot {
            line: index,
            mnemonic: instr.mnemonic.to_string(),
            operands: instr.operands.iter().map(|s| s.to_string()).collect(),
            registers: *self.machine.store.registers(),
            memory: *self.machine.store.memory(),
        });

        Ok(Step::Executed(instr.opcode))
    }

    /// Back to the initial state, same program and config
    pub fn reset(&mut self) {
        let labels = LabelTable::for_mode(&self.program, self.config.label_mode);
        self.machine = Machine::new(labels);
        self.steps = 0;
        self.instructions = 0;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.machine.pc < self.program.len()
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.machine.pc == HALT_SENTINEL
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            steps: self.steps,
            instructions: self.instructions,
            halted: self.is_halted(),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn registers(&self) -> &[Word; REGISTER_COUNT] {
        self.machine.store.registers()
    }

    pub fn memory(&self) -> &[Word; MEMORY_SIZE] {
        self.machine.store.memory()
    }

    pub fn latch(&self) -> Latch {
        self.machine.latch
    }

    pub fn labels(&self) -> &LabelTable {
        &self.machine.labels
    }

    pub fn pc(&self) -> usize {
        self.machine.pc
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HANDLERS
// ═══════════════════════════════════════════════════════════════════════════

/// Apply one decoded instruction to `m`.
///
/// Every operand is resolved before the first write, so a failing instruction
/// leaves the machine untouched.
pub fn execute(m: &mut Machine, instr: &Instruction<'_>) -> Result<(), VmErrorKind> {
    match instr.opcode {
        Opcode::Ldr => {
            let rd = resolve_register_index(instr.operand(0))?;
            let addr = resolve_memory_address(instr.operand(1), &m.store)?;
            let value = m.store.get_memory(addr);
            m.store.set_register(rd, value);
        }
        Opcode::Str => {
            let rd = resolve_register_index(instr.operand(0))?;
            let addr = resolve_memory_address(instr.operand(1), &m.store)?;
            let value = m.store.get_register(rd);
            m.store.set_memory(addr, value);
        }
        Opcode::Add => alu(m, instr, |a, b| Ok(a.wrapping_add(b)))?,
        Opcode::Sub => alu(m, instr, |a, b| Ok(a.wrapping_sub(b)))?,
        Opcode::And => alu(m, instr, |a, b| Ok(a & b))?,
        Opcode::Orr => alu(m, instr, |a, b| Ok(a | b))?,
        Opcode::Eor => alu(m, instr, |a, b| Ok(a ^ b))?,
        Opcode::Lsl => alu(m, instr, |a, b| {
            shift_amount(instr.operand(2), b).map(|n| shift_left(a, n))
        })?,
        Opcode::Lsr => alu(m, instr, |a, b| {
            shift_amount(instr.operand(2), b).map(|n| shift_right(a, n))
        })?,
        Opcode::Mov => {
            let rd = resolve_register_index(instr.operand(0))?;
            let value = resolve_value(instr.operand(1), &m.store)?;
            m.store.set_register(rd, value);
        }
        Opcode::Mvn => {
            let rd = resolve_register_index(instr.operand(0))?;
            let value = resolve_value(instr.operand(1), &m.store)?;
            m.store.set_register(rd, !value);
        }
        Opcode::Cmp => {
            let left = resolve_value(instr.operand(0), &m.store)?;
            let right = resolve_value(instr.operand(1), &m.store)?;
            m.latch = Latch::new(left, right);
        }
        Opcode::Branch(cond) => {
            if cond.holds(&m.latch) {
                let label = instr.operand(0);
                let target = m.labels.lookup(label)?;
                debug!(label, to = target, "branch taken");
                m.pc = target;
            }
        }
        Opcode::Halt => {
            m.pc = HALT_SENTINEL;
        }
    }
    Ok(())
}

/// `Rd ← f(Rn, op2)`
fn alu<F>(m: &mut Machine, instr: &Instruction<'_>, f: F) -> Result<(), VmErrorKind>
where
    F: FnOnce(Word, Word) -> Result<Word, VmErrorKind>,
{
    let rd = resolve_register_index(instr.operand(0))?;
    let lhs = resolve_value(instr.operand(1), &m.store)?;
    let rhs = resolve_value(instr.operand(2), &m.store)?;
    let result = f(lhs, rhs)?;
    m.store.set_register(rd, result);
    Ok(())
}

fn shift_amount(token: &str, amount: Word) -> Result<u32, VmErrorKind> {
    if amount < 0 {
        return Err(VmErrorKind::invalid_operand(token, "negative shift amount"));
    }
    Ok(amount.min(Word::BITS as Word) as u32)
}

fn shift_left(value: Word, n: u32) -> Word {
    if n >= Word::BITS { 0 } else { value << n }
}

/// Arithmetic (sign-preserving) shift
fn shift_right(value: Word, n: u32) -> Word {
    if n >= Word::BITS {
        if value < 0 { -1 } else { 0 }
    } else {
        value >> n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelMode;
    use crate::trace::RecordingTrace;

    fn run(source: &str) -> Interpreter {
        let mut vm = Interpreter::new(Program::from_source("test", source));
        vm.run_untraced().unwrap();
        vm
    }

    fn run_err(source: &str) -> VmError {
        let mut vm = Interpreter::new(Program::from_source("test", source));
        vm.run_untraced().unwrap_err()
    }

    #[test]
    fn test_mov_overwrites() {
        let vm = run("MOV R0 #9\nMOV R0 #5");
        assert_eq!(vm.registers()[0], 5);
    }

    #[test]
    fn test_arithmetic_and_bitwise() {
        let vm = run(
            "MOV R1 #12\n\
             ADD R2 R1 #30\n\
             SUB R3 R1 #20\n\
             AND R4 R1 #10\n\
             ORR R5 R1 #3\n\
             EOR R6 R1 #5\n\
             MVN R7 R1\n\
             LSL R8 R1 #2\n\
             LSR R9 R1 #2",
        );
        let r = vm.registers();
        assert_eq!(r[2], 42);
        assert_eq!(r[3], -8);
        assert_eq!(r[4], 12 & 10);
        assert_eq!(r[5], 15);
        assert_eq!(r[6], 9);
        assert_eq!(r[7], -13);
        assert_eq!(r[8], 48);
        assert_eq!(r[9], 3);
    }

    #[test]
    fn test_alias_reads_before_write() {
        let vm = run("MOV R0 #3\nADD R0 R0 R0\nLSL R1 R0 #1\nSUB R1 R1 R1");
        assert_eq!(vm.registers()[0], 6);
        assert_eq!(vm.registers()[1], 0);

        // every ALU handler with Rd == Rn (== op2 where it makes sense)
        let vm = run(
            "MOV R2 #12\nAND R2 R2 R2\n\
             MOV R3 #12\nORR R3 R3 #3\n\
             MOV R4 #12\nEOR R4 R4 R4\n\
             MOV R5 #-12\nLSR R5 R5 #1\n\
             MOV R6 #12\nLSR R6 R6 #2",
        );
        let r = vm.registers();
        assert_eq!(r[2], 12);
        assert_eq!(r[3], 15);
        assert_eq!(r[4], 0);
        assert_eq!(r[5], -6);
        assert_eq!(r[6], 3);
    }

    #[test]
    fn test_immediate_as_first_source() {
        let vm = run("ADD R0 #2 #3\nCMP #4 #4\nBEQ SAME\nMOV R1 #1\nSAME:\nHALT");
        assert_eq!(vm.registers()[0], 5);
        assert_eq!(vm.registers()[1], 0);
    }

    #[test]
    fn test_wrapping_overflow() {
        let vm = run(&format!("MOV R0 #{}\nADD R0 R0 #1\nMOV R1 #{}\nSUB R1 R1 #1", i64::MAX, i64::MIN));
        assert_eq!(vm.registers()[0], i64::MIN);
        assert_eq!(vm.registers()[1], i64::MAX);
    }

    #[test]
    fn test_shift_edges() {
        let vm = run("MOV R0 #-16\nLSR R1 R0 #2\nLSR R2 R0 #64\nLSL R3 R0 #64\nMOV R4 #1\nLSL R5 R4 #63\nLSR R6 R4 #100");
        let r = vm.registers();
        assert_eq!(r[1], -4);
        assert_eq!(r[2], -1);
        assert_eq!(r[3], 0);
        assert_eq!(r[5], i64::MIN);
        assert_eq!(r[6], 0);

        let err = run_err("MOV R0 #1\nLSL R1 R0 #-1");
        assert!(matches!(err.kind, VmErrorKind::InvalidOperand { ref token, .. } if token == "#-1"));
        assert_eq!(err.registers[1], 0);
    }

    #[test]
    fn test_store_load_roundtrip() {
        let vm = run("MOV R0 #77\nSTR R0 [#3]\nMOV R0 #0\nLDR R1 #3");
        assert_eq!(vm.memory()[3], 77);
        assert_eq!(vm.registers()[1], 77);
    }

    #[test]
    fn test_memory_fault_leaves_memory_unchanged() {
        for source in ["MOV R0 #5\nSTR R0 #20", "MOV R0 #5\nSTR R0 #-1", "MOV R2 #25\nLDR R1 R2"] {
            let err = run_err(source);
            assert!(matches!(err.kind, VmErrorKind::MemoryFault { .. }), "{source}");
            assert!(err.memory.iter().all(|&m| m == 0));
            assert_eq!(err.line, 1);
            assert_eq!(err.pc, 2);
        }
    }

    #[test]
    fn test_register_out_of_range() {
        let err = run_err("MOV R13 #1");
        assert!(matches!(err.kind, VmErrorKind::InvalidOperand { .. }));
        let err = run_err("ADD R0 R20 #1");
        assert!(matches!(err.kind, VmErrorKind::InvalidOperand { .. }));
    }

    #[test]
    fn test_unknown_opcode() {
        let err = run_err("MOV R0 #1\n\nNOP");
        assert_eq!(err.kind, VmErrorKind::UnknownOpcode("NOP".into()));
        assert_eq!(err.line, 2);
        assert_eq!(err.registers[0], 1);
    }

    #[test]
    fn test_comma_separated_operands_rejected() {
        let err = run_err("MOV R0, #1");
        assert!(matches!(err.kind, VmErrorKind::InvalidOperand { ref token, .. } if token == "R0,"));
    }

    #[test]
    fn test_halt_stops_immediately() {
        let mut vm = Interpreter::new(Program::from_source("t", "MOV R0 #1\nHALT\nMOV R0 #2\nNOP"));
        let mut sink = RecordingTrace::new();
        let summary = vm.run(&mut sink).unwrap();
        assert!(summary.halted);
        assert!(vm.is_halted());
        assert_eq!(vm.registers()[0], 1);
        assert_eq!(sink.mnemonics(), vec!["MOV", "HALT"]);
    }

    #[test]
    fn test_running_off_the_end() {
        let mut vm = Interpreter::new(Program::from_source("t", "MOV R0 #1\n// done"));
        let summary = vm.run_untraced().unwrap();
        assert!(!summary.halted);
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.instructions, 1);
        assert_eq!(vm.step(&mut NullTrace).unwrap(), Step::Finished);
    }

    #[test]
    fn test_cmp_latch_is_a_snapshot() {
        let vm = run(
            "MOV R0 #4\nMOV R1 #4\nCMP R0 R1\nMOV R0 #9\nBEQ TAKEN\nMOV R2 #1\nHALT\nTAKEN:\nMOV R2 #2\nHALT",
        );
        assert_eq!(vm.registers()[2], 2);
        assert_eq!(vm.latch(), Latch::new(4, 4));
    }

    #[test]
    fn test_untaken_branch_skips_lookup() {
        let vm = run("CMP #1 #2\nBGT NOWHERE\nMOV R0 #1");
        assert_eq!(vm.registers()[0], 1);
    }

    #[test]
    fn test_step_reports_line_kinds() {
        let mut vm = Interpreter::new(Program::from_source("t", "\n// c\nL:\nHALT"));
        let mut sink = NullTrace;
        assert_eq!(vm.step(&mut sink).unwrap(), Step::Blank);
        assert_eq!(vm.step(&mut sink).unwrap(), Step::Comment);
        assert_eq!(
            vm.step(&mut sink).unwrap(),
            Step::Label { name: "L".into(), target: 3 }
        );
        assert_eq!(vm.step(&mut sink).unwrap(), Step::Executed(Opcode::Halt));
        assert!(!vm.is_running());
    }

    #[test]
    fn test_step_limit() {
        let config = InterpreterConfig::default().with_max_steps(10);
        let mut vm = Interpreter::with_config(Program::from_source("t", "L:\nB L"), config);
        let err = vm.run_untraced().unwrap_err();
        assert_eq!(err.kind, VmErrorKind::StepLimitExceeded(10));
        assert_eq!(vm.summary().steps, 10);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut vm = Interpreter::with_config(
            Program::from_source("t", "MOV R0 #3\nSTR R0 #0\nL:\nHALT"),
            InterpreterConfig::legacy(),
        );
        vm.run_untraced().unwrap();
        assert_eq!(vm.labels().len(), 1);

        vm.reset();
        assert_eq!(vm.pc(), 0);
        assert_eq!(vm.registers()[0], 0);
        assert_eq!(vm.memory()[0], 0);
        assert!(vm.labels().is_empty());
        assert_eq!(vm.config().label_mode, LabelMode::Legacy);
    }

    #[test]
    fn test_trace_snapshot_contents() {
        let mut vm = Interpreter::new(Program::from_source("t", "// x\nMOV R3 #8\nSTR R3 #19"));
        let mut sink = RecordingTrace::new();
        vm.run(&mut sink).unwrap();

        let snaps = sink.snapshots();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].line, 1);
        assert_eq!(snaps[0].operands, vec!["R3", "#8"]);
        assert_eq!(snaps[0].registers[3], 8);
        assert_eq!(snaps[0].memory[19], 0);
        assert_eq!(snaps[1].memory[19], 8);
    }
}
