//! Core error types for Ferry.
//!
//! This module defines the error hierarchy for engine construction and
//! module loading. Run-time failures live with the host layer and the
//! orchestrator.

use thiserror::Error;

/// Top-level error type for Ferry core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Error during engine creation or configuration.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Error during module loading or validation.
    #[error("Module error: {0}")]
    Module(#[from] ModuleError),
}

/// Errors during engine creation and configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid engine configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying Wasmtime error.
    #[error("Wasmtime error: {0}")]
    Wasmtime(#[from] wasmtime::Error),
}

/// Errors during module loading and validation.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The WASM module is invalid or malformed.
    #[error("Invalid WASM module: {0}")]
    Invalid(String),

    /// IO error reading the module.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying Wasmtime error.
    #[error("Wasmtime error: {0}")]
    Wasmtime(#[from] wasmtime::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Result type alias for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Result type alias for module operations.
pub type ModuleResult<T> = std::result::Result<T, ModuleError>;
