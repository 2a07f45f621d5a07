//! Program text and line classification

use crate::error::LoadError;
use std::collections::HashMap;

/// Two-character comment marker at the start of a line
pub const COMMENT_MARKER: &str = "//";

/// Classification of one source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Blank,
    Comment,
    /// `name:` definition; holds the text before the first colon
    Label(&'a str),
    Instruction {
        mnemonic: &'a str,
        operands: Vec<&'a str>,
    },
}

/// Classify a raw source line.
///
/// The comment check comes before the label check, so `// note: x` is a comment.
pub fn classify(line: &str) -> LineKind<'_> {
    let line = line.trim();

    if line.is_empty() {
        return LineKind::Blank;
    }
    if line.starts_with(COMMENT_MARKER) {
        return LineKind::Comment;
    }
    if let Some(colon) = line.find(':') {
        return LineKind::Label(&line[..colon]);
    }

    let mut tokens = line.split_whitespace();
    // non-empty after trim, so there is at least one token
    let mnemonic = tokens.next().unwrap_or_default();
    LineKind::Instruction {
        mnemonic,
        operands: tokens.collect(),
    }
}

/// Immutable program: the ordered source lines, fixed at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    name: String,
    lines: Vec<String>,
}

impl Program {
    pub fn from_source(name: impl Into<String>, source: &str) -> Self {
        Self {
            name: name.into(),
            lines: source.lines().map(str::to_string).collect(),
        }
    }

    pub fn from_lines<I, S>(name: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn classify(&self, index: usize) -> Option<LineKind<'_>> {
        self.line(index).map(classify)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// `(index, kind)` for every line
    pub fn classified(&self) -> impl Iterator<Item = (usize, LineKind<'_>)> {
        self.lines().map(classify).enumerate()
    }
}

/// Source of program text, consumed once before a run
pub trait ProgramLoader {
    fn load(&self, id: &str) -> Result<Program, LoadError>;
}

/// In-memory loader keyed by program id
#[derive(Debug, Clone, Default)]
pub struct InlineLoader {
    sources: HashMap<String, String>,
}

impl InlineLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(id, source);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(id.into(), source.into());
    }
}

impl ProgramLoader for InlineLoader {
    fn load(&self, id: &str) -> Result<Program, LoadError> {
        self.sources
            .get(id)
            .map(|src| Program::from_source(id, src))
            .ok_or_else(|| LoadError::NotFound(id.to_string()))
    }
}
