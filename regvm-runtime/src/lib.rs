//! # 🏃 regvm-runtime — Runtime for regvm Programs
//!
//! Carrega programas de arquivo, aplica a configuração em camadas e executa
//! no interpretador de `regvm-core`.
//!
//! ## Fluxo de Execução
//!
//! ```text
//! program.txt          regvm.toml / REGVM_* / .env
//!      ↓                         ↓
//! FileLoader             RuntimeConfig
//!      ↓                         ↓
//! Program ──────────▶ Runtime (THIS!) ──▶ TraceSink (none | classic | json)
//!                                ↓
//!                           RunReport
//! ```
//!
//! ## Exemplo
//!
//! ```no_run
//! use regvm_runtime::{Runtime, RuntimeConfig};
//!
//! let mut runtime = Runtime::new(RuntimeConfig::load(None)?);
//! runtime.load_file("programs/triangle_numbers.txt")?;
//!
//! let report = runtime.run()?;
//! println!("{report}");
//! # Ok::<(), regvm_runtime::RuntimeError>(())
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod runtime;
pub mod sinks;

pub use config::{CONFIG_FILE, RuntimeConfig, TraceFormat};
pub use error::{RuntimeError, RuntimeResult};
pub use loader::FileLoader;
pub use runtime::{RunReport, Runtime};
pub use sinks::{ClassicTrace, JsonTrace};

// Re-export core types
pub use regvm_core::{InterpreterConfig, LabelMode, Program, TraceSink, TraceSnapshot};
