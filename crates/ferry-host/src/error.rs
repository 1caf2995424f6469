//! Error types for the host syscall layer.
//!
//! These are host-level failures: problems building the capability table or
//! resolving a module's imports. Run outcomes are a separate type,
//! [`crate::TerminationSignal`].

use thiserror::Error;

/// Errors from the capability table and import guard.
#[derive(Debug, Error)]
pub enum HostError {
    /// Capability registration failed.
    #[error("Failed to register capability '{namespace}.{name}': {reason}")]
    RegistrationFailed {
        /// The import namespace.
        namespace: String,
        /// The capability name.
        name: String,
        /// The reason for failure.
        reason: String,
    },

    /// A capability was registered twice under the same name.
    #[error("Capability already registered: {namespace}.{name}")]
    AlreadyRegistered {
        /// The import namespace.
        namespace: String,
        /// The capability name.
        name: String,
    },

    /// A declared import is not a function, so the guard cannot stub it.
    #[error("Unresolvable non-function import: {namespace}.{name}")]
    UnresolvableImport {
        /// The import namespace.
        namespace: String,
        /// The import name.
        name: String,
    },

    /// Underlying Wasmtime error.
    #[error("Wasmtime error: {0}")]
    Wasmtime(#[from] wasmtime::Error),
}

/// Result type for host operations.
pub type HostResult<T> = std::result::Result<T, HostError>;
