//! # 🧮 regvm-core — Teaching Register Machine
//!
//! Interpreter for a small register-machine assembly language: 13 registers,
//! 20 bounds-checked memory cells, a comparison latch, and a line-oriented
//! program of labels, comments and instructions.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Interpreter                  │
//! │  ┌──────────┐   ┌─────────────────────────┐  │
//! │  │ Program  │──▶│  Execution loop (pc)    │  │
//! │  │ (lines)  │   └───────────┬─────────────┘  │
//! │  └──────────┘               ▼                │
//! │               ┌─────────────────────────┐    │
//! │               │ Dispatcher (Opcode)     │    │
//! │               └───────────┬─────────────┘    │
//! │                           ▼                  │
//! │  ┌────────┐ ┌────────┐ ┌───────┐ ┌────────┐  │
//! │  │ R0-R12 │ │ M0-M19 │ │ Latch │ │ Labels │  │
//! │  └────────┘ └────────┘ └───────┘ └────────┘  │
//! └──────────────────────────────────────────────┘
//!                     │
//!                     ▼ TraceSnapshot
//!                TraceSink (observer)
//! ```
//!
//! ## Exemplo
//!
//! ```
//! use regvm_core::{Interpreter, Program};
//!
//! let source = "MOV R0 #1\nLOOP:\nADD R0 R0 #1\nCMP R0 #5\nBLT LOOP\nHALT";
//! let mut vm = Interpreter::new(Program::from_source("loop", source));
//! let summary = vm.run_untraced().unwrap();
//!
//! assert!(summary.halted);
//! assert_eq!(vm.registers()[0], 5);
//! ```
//!
//! ## Labels
//!
//! By default every label is collected before execution starts, so forward
//! branches work. [`LabelMode::Legacy`] keeps the single-pass behaviour where a
//! label only exists once execution has walked past it.

pub mod check;
pub mod config;
pub mod error;
pub mod instruction;
pub mod interpreter;
pub mod labels;
pub mod opcode;
pub mod operand;
pub mod program;
pub mod store;
pub mod trace;

pub use check::{Diagnostic, Severity, check_program, is_clean};
pub use config::InterpreterConfig;
pub use error::{LoadError, VmError, VmErrorKind, VmResult};
pub use instruction::Instruction;
pub use interpreter::{HALT_SENTINEL, Interpreter, Machine, RunSummary, Step};
pub use labels::{LabelMode, LabelTable};
pub use opcode::{Condition, Opcode, OpcodeCategory, OperandRole};
pub use operand::{Operand, resolve_memory_address, resolve_register_index, resolve_value};
pub use program::{InlineLoader, LineKind, Program, ProgramLoader};
pub use store::{Address, Latch, MEMORY_SIZE, REGISTER_COUNT, RegisterIndex, Store, Word};
pub use trace::{LogTrace, NullTrace, RecordingTrace, TraceSink, TraceSnapshot};
