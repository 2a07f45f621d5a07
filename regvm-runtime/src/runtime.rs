//! Main runtime implementation

use crate::config::{RuntimeConfig, TraceFormat};
use crate::error::{RuntimeError, RuntimeResult};
use crate::loader::FileLoader;
use crate::sinks::{ClassicTrace, JsonTrace};
use regvm_core::{
    Interpreter, LogTrace, MEMORY_SIZE, Program, ProgramLoader, REGISTER_COUNT, RunSummary,
    TraceSink, Word,
};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub program: String,
    pub steps: u64,
    pub instructions: u64,
    /// False when the run fell off the end of the program
    pub halted: bool,
    pub registers: [Word; REGISTER_COUNT],
    pub memory: [Word; MEMORY_SIZE],
}

impl RunReport {
    fn new(vm: &Interpreter, summary: RunSummary) -> Self {
        Self {
            program: vm.program().name().to_string(),
            steps: summary.steps,
            instructions: summary.instructions,
            halted: summary.halted,
            registers: *vm.registers(),
            memory: *vm.memory(),
        }
    }

    /// Registers holding a non-zero value, as (index, value)
    pub fn used_registers(&self) -> impl Iterator<Item = (usize, Word)> + '_ {
        self.registers.iter().copied().enumerate().filter(|&(_, v)| v != 0)
    }

    /// Memory cells holding a non-zero value, as (address, value)
    pub fn used_memory(&self) -> impl Iterator<Item = (usize, Word)> + '_ {
        self.memory.iter().copied().enumerate().filter(|&(_, v)| v != 0)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ending = if self.halted { "halted" } else { "reached end of program" };
        writeln!(f, "{}: {ending} after {} instructions", self.program, self.instructions)?;

        write!(f, "registers:")?;
        for (i, r) in self.registers.iter().enumerate() {
            write!(f, " R{i}={r}")?;
        }
        writeln!(f)?;

        write!(f, "memory:   ")?;
        for (i, m) in self.memory.iter().enumerate() {
            write!(f, " [{i}]={m}")?;
        }
        Ok(())
    }
}

/// Runtime principal: loads one program and runs it under a [`RuntimeConfig`]
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    config: RuntimeConfig,
    program: Option<Program>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config, program: None }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Carrega programa de arquivo
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> RuntimeResult<()> {
        if self.config.debug {
            println!("📂 Loading program: {}", path.as_ref().display());
        }

        let program = FileLoader::load_path(path)?;
        self.set_program(program);
        Ok(())
    }

    /// Carrega código fonte diretamente
    pub fn load_source(&mut self, name: &str, source: &str) -> RuntimeResult<()> {
        self.set_program(Program::from_source(name, source));
        Ok(())
    }

    /// Carrega `id` através de qualquer [`ProgramLoader`]
    pub fn load_with(&mut self, loader: &dyn ProgramLoader, id: &str) -> RuntimeResult<()> {
        let program = loader.load(id)?;
        self.set_program(program);
        Ok(())
    }

    fn set_program(&mut self, program: Program) {
        debug!(program = program.name(), lines = program.len(), "program loaded");
        if self.config.debug {
            println!("✓ Loaded {} ({} lines)", program.name(), program.len());
        }
        self.program = Some(program);
    }

    /// Executa o programa carregado, com o trace escolhido na configuração (stdout)
    pub fn run(&mut self) -> RuntimeResult<RunReport> {
        self.run_to(io::stdout().lock())
    }

    /// Like [`Runtime::run`], writing the trace to `writer`
    pub fn run_to<W: Write>(&mut self, writer: W) -> RuntimeResult<RunReport> {
        match self.config.trace {
            TraceFormat::None => self.run_with_sink(&mut LogTrace),
            TraceFormat::Classic => {
                let mut sink = ClassicTrace::new(writer);
                let report = self.run_with_sink(&mut sink);
                Self::settle(report, sink.finish())
            }
            TraceFormat::Json => {
                let mut sink = JsonTrace::new(writer);
                let report = self.run_with_sink(&mut sink);
                Self::settle(report, sink.finish())
            }
        }
    }

    /// A run error wins over a trace write error
    fn settle<W>(report: RuntimeResult<RunReport>, trace: io::Result<W>) -> RuntimeResult<RunReport> {
        match (report, trace) {
            (Ok(report), Ok(_)) => Ok(report),
            (Ok(_), Err(err)) => Err(err.into()),
            (Err(fault), Err(err)) => {
                warn!(error = %err, "trace output failed");
                Err(fault)
            }
            (Err(fault), Ok(_)) => Err(fault),
        }
    }

    /// Executa o programa carregado enviando snapshots para `sink`
    pub fn run_with_sink(&mut self, sink: &mut dyn TraceSink) -> RuntimeResult<RunReport> {
        let program = self.program.clone().ok_or(RuntimeError::NoProgram)?;

        if self.config.debug {
            println!("🚀 Executing {} ({} label mode)...\n", program.name(), self.config.interpreter.label_mode);
        }

        let mut vm = Interpreter::with_config(program, self.config.interpreter);
        let summary = vm.run(sink)?;
        let report = RunReport::new(&vm, summary);

        info!(program = %report.program, steps = report.steps, halted = report.halted, "run complete");
        if self.config.debug {
            println!("\n✅ Execution complete");
            Self::print_state(&report);
        }

        Ok(report)
    }

    /// Load + run
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> RuntimeResult<RunReport> {
        self.load_file(path)?;
        self.run()
    }

    pub fn run_source(&mut self, name: &str, source: &str) -> RuntimeResult<RunReport> {
        self.load_source(name, source)?;
        self.run()
    }

    fn print_state(report: &RunReport) {
        println!("\n🔧 Registers:");
        for (i, value) in report.used_registers() {
            println!("   R{i}: {value}");
        }
        println!("\n📊 Memory:");
        for (addr, value) in report.used_memory() {
            println!("   [{addr}]: {value}");
        }
    }
}
