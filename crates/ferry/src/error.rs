//! Error types for the Ferry runtime facade.
//!
//! A [`crate::TerminationSignal`] is a run *outcome* and is reported through
//! the run report; `FerryError` covers host-level failures that prevent a
//! run from producing an outcome at all.

use thiserror::Error;

use ferry_core::{EngineError, ModuleError};
use ferry_host::HostError;

/// Errors from the Ferry runtime.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Engine error.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Module error.
    #[error("Module error: {0}")]
    Module(#[from] ModuleError),

    /// Host capability error.
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// A module does not export a required entry point, or exports it with
    /// the wrong signature.
    #[error("module '{module}' has no usable export '{name}'")]
    MissingExport {
        /// Which side of the bridge.
        module: &'static str,
        /// The export name.
        name: &'static str,
    },

    /// A genuine wasm trap, distinct from any termination signal.
    #[error("WASM trap: {0}")]
    Trap(TrapInfo),

    /// Underlying Wasmtime error.
    #[error("Wasmtime error: {0}")]
    Wasmtime(wasmtime::Error),
}

/// Information about a WASM trap.
#[derive(Debug, Clone)]
pub struct TrapInfo {
    /// The trap code name, if available.
    pub code: Option<String>,
    /// Human-readable trap message.
    pub message: String,
}

impl std::fmt::Display for TrapInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "[{}] {}", code, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl From<wasmtime::Trap> for TrapInfo {
    fn from(trap: wasmtime::Trap) -> Self {
        Self {
            code: Some(format!("{trap:?}")),
            message: trap.to_string(),
        }
    }
}

/// Result type alias for runtime operations.
pub type FerryResult<T> = std::result::Result<T, FerryError>;
