//! Runtime configuration (regvm.toml + environment)
//!
//! Layers, lowest priority first: built-in defaults, a TOML file, then
//! `REGVM_*` environment variables (a `.env` file in the working directory is
//! loaded first). Command-line flags are applied on top by the binaries.
//!
//! ```toml
//! debug = false
//! trace = "classic"
//!
//! [interpreter]
//! label_mode = "legacy"
//! max_steps = 10000
//! ```

use crate::error::{RuntimeError, RuntimeResult};
use regvm_core::{InterpreterConfig, LabelMode};
use serde::{Deserialize, Serialize};
use std::env::{self, VarError};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default config file name looked up by the CLI
pub const CONFIG_FILE: &str = "regvm.toml";

pub const ENV_LABEL_MODE: &str = "REGVM_LABEL_MODE";
pub const ENV_MAX_STEPS: &str = "REGVM_MAX_STEPS";
pub const ENV_TRACE: &str = "REGVM_TRACE";

/// Where per-instruction snapshots go during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    #[default]
    None,
    /// Three-line text block per instruction
    Classic,
    /// JSON Lines
    Json,
}

impl FromStr for TraceFormat {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "classic" | "text" => Ok(Self::Classic),
            "json" | "jsonl" => Ok(Self::Json),
            other => Err(RuntimeError::Config(format!("unknown trace format `{other}`"))),
        }
    }
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Classic => write!(f, "classic"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Configuração do runtime
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub interpreter: InterpreterConfig,

    pub trace: TraceFormat,

    /// Print load/run progress and the final state
    pub debug: bool,
}

impl RuntimeConfig {
    pub fn from_toml_str(content: &str) -> RuntimeResult<Self> {
        toml::from_str(content)
            .map_err(|e| RuntimeError::Config(format!("failed to parse {CONFIG_FILE}: {e}")))
    }

    pub fn from_file(path: impl AsRef<Path>) -> RuntimeResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults, then `path` (or `./regvm.toml` when present), then the environment
    pub fn load(path: Option<&Path>) -> RuntimeResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).is_file() => Self::from_file(CONFIG_FILE)?,
            None => Self::default(),
        };
        config.with_env()
    }

    /// Overlay `REGVM_*` variables from the process environment and `.env`
    ///
    /// Only the `REGVM_*` keys are read; other variables may hold anything.
    pub fn with_env(self) -> RuntimeResult<Self> {
        let _ = dotenv::dotenv();

        let mut vars = Vec::new();
        for key in [ENV_LABEL_MODE, ENV_MAX_STEPS, ENV_TRACE] {
            match env::var(key) {
                Ok(value) => vars.push((key, value)),
                Err(VarError::NotPresent) => {}
                Err(VarError::NotUnicode(_)) => {
                    return Err(RuntimeError::Config(format!("{key} is not valid UTF-8")));
                }
            }
        }
        self.with_vars(vars)
    }

    /// Overlay `REGVM_*` entries from `vars`; other keys are ignored
    pub fn with_vars<I, K, V>(mut self, vars: I) -> RuntimeResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                ENV_LABEL_MODE => {
                    self.interpreter.label_mode = value.parse::<LabelMode>().map_err(|e| {
                        RuntimeError::Config(format!("{ENV_LABEL_MODE}: {e}"))
                    })?;
                }
                ENV_MAX_STEPS => {
                    let steps: u64 = value.trim().parse().map_err(|_| {
                        RuntimeError::Config(format!("{ENV_MAX_STEPS}: `{value}` is not a step count"))
                    })?;
                    self.interpreter.max_steps = (steps > 0).then_some(steps);
                }
                ENV_TRACE => self.trace = value.parse()?,
                _ => {}
            }
        }
        Ok(self)
    }

    pub fn with_trace(mut self, trace: TraceFormat) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
