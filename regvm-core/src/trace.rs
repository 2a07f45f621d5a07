//! Per-instruction trace snapshots and sinks
//!
//! Sinks are purely observational: nothing a sink does can change control flow.

use crate::store::{MEMORY_SIZE, REGISTER_COUNT, Word};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine state right after one instruction executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSnapshot {
    /// Index of the instruction line
    pub line: usize,
    pub mnemonic: String,
    pub operands: Vec<String>,
    pub registers: [Word; REGISTER_COUNT],
    pub memory: [Word; MEMORY_SIZE],
}

/// Three-line classic listing:
///
/// ```text
/// line: 3 	op: ADD 	operands: ['R0', 'R0', '#1']
/// registers: 	[R0]2	[R1]0	...
/// memory:		[0]0	[1]0	...
/// ```
///
/// The line number is 1-based.
impl fmt::Display for TraceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands = self
            .operands
            .iter()
            .map(|op| format!("'{op}'"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            f,
            "line: {} \top: {} \toperands: [{}]",
            self.line + 1,
            self.mnemonic,
            operands
        )?;

        write!(f, "registers: \t")?;
        for (i, r) in self.registers.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "[R{i}]{r}")?;
        }
        writeln!(f)?;

        write!(f, "memory:\t\t")?;
        for (i, m) in self.memory.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "[{i}]{m}")?;
        }
        writeln!(f)
    }
}

/// Receiver of trace snapshots
pub trait TraceSink {
    fn record(&mut self, snapshot: &TraceSnapshot);
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn record(&mut self, snapshot: &TraceSnapshot) {
        (**self).record(snapshot);
    }
}

impl<T: TraceSink + ?Sized> TraceSink for Box<T> {
    fn record(&mut self, snapshot: &TraceSnapshot) {
        (**self).record(snapshot);
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn record(&mut self, _snapshot: &TraceSnapshot) {}
}

/// Keeps every snapshot in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingTrace {
    snapshots: Vec<TraceSnapshot>,
}

impl RecordingTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> &[TraceSnapshot] {
        &self.snapshots
    }

    pub fn into_snapshots(self) -> Vec<TraceSnapshot> {
        self.snapshots
    }

    /// Mnemonics in execution order
    pub fn mnemonics(&self) -> Vec<&str> {
        self.snapshots.iter().map(|s| s.mnemonic.as_str()).collect()
    }
}

impl TraceSink for RecordingTrace {
    fn record(&mut self, snapshot: &TraceSnapshot) {
        self.snapshots.push(snapshot.clone());
    }
}

/// Forwards snapshots to `tracing` at DEBUG level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn record(&mut self, snapshot: &TraceSnapshot) {
        tracing::debug!(
            target: "regvm::trace",
            line = snapshot.line + 1,
            op = %snapshot.mnemonic,
            operands = ?snapshot.operands,
            registers = ?snapshot.registers,
            memory = ?snapshot.memory,
            "executed"
        );
    }
}
