//! Interpreter configuration

use crate::labels::LabelMode;
use serde::{Deserialize, Serialize};

/// Per-run interpreter settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// When labels become visible to branches
    pub label_mode: LabelMode,
    /// Maximum loop iterations before the run is aborted (None = unlimited)
    pub max_steps: Option<u64>,
}

impl InterpreterConfig {
    /// Strict single-pass label registration
    pub fn legacy() -> Self {
        Self::default().with_label_mode(LabelMode::Legacy)
    }

    pub fn with_label_mode(mut self, mode: LabelMode) -> Self {
        self.label_mode = mode;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}
