//! Label table and label registration modes

use crate::error::VmErrorKind;
use crate::program::{LineKind, Program};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// When labels become visible to branches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    /// Every label is collected before the first instruction runs
    #[default]
    Prescan,
    /// Single pass: a label is visible only once execution has passed its line
    Legacy,
}

impl FromStr for LabelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prescan" => Ok(Self::Prescan),
            "legacy" | "single-pass" => Ok(Self::Legacy),
            other => Err(format!("unknown label mode `{other}` (expected prescan or legacy)")),
        }
    }
}

impl std::fmt::Display for LabelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prescan => write!(f, "prescan"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// Label name → index of the line after the label definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    entries: HashMap<String, usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the whole program once and record every label definition.
    /// A repeated name keeps its last definition.
    pub fn prescan(program: &Program) -> Self {
        let mut table = Self::new();
        for (index, kind) in program.classified() {
            if let LineKind::Label(name) = kind {
                table.define(name, index + 1);
            }
        }
        table
    }

    /// Table a run starts with under `mode`
    pub fn for_mode(program: &Program, mode: LabelMode) -> Self {
        match mode {
            LabelMode::Prescan => Self::prescan(program),
            LabelMode::Legacy => Self::new(),
        }
    }

    pub fn define(&mut self, name: &str, target: usize) {
        self.entries.insert(name.to_string(), target);
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.entries.get(name).copied()
    }

    /// Branch-time lookup
    pub fn lookup(&self, name: &str) -> Result<usize, VmErrorKind> {
        self.get(name)
            .ok_or_else(|| VmErrorKind::UndefinedLabel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, &v)| (k.as_str(), v))
    }
}
