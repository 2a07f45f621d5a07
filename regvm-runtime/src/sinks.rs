//! Writer-backed trace sinks
//!
//! A sink never interrupts a run. The first write failure is kept and can be
//! taken afterwards with `finish`.

use regvm_core::{TraceSink, TraceSnapshot};
use std::io::{self, Write};

/// Classic three-line block per instruction, separated by blank lines
#[derive(Debug)]
pub struct ClassicTrace<W: Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write> ClassicTrace<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, error: None }
    }

    /// Flush and return the writer, or the first error seen
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> TraceSink for ClassicTrace<W> {
    fn record(&mut self, snapshot: &TraceSnapshot) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.writer, "{snapshot}") {
            self.error = Some(err);
        }
    }
}

/// One JSON object per line
#[derive(Debug)]
pub struct JsonTrace<W: Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write> JsonTrace<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, error: None }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_line(&mut self, snapshot: &TraceSnapshot) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> TraceSink for JsonTrace<W> {
    fn record(&mut self, snapshot: &TraceSnapshot) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.write_line(snapshot) {
            self.error = Some(err);
        }
    }
}
