//! Ferry Host - the syscall layer of the bridge.
//!
//! This crate implements the host side of the system-call surface a bridged
//! guest expects:
//!
//! - [`CapabilityTable`]: the merged set of named host functions a module can
//!   import, built from the fixed syscall set plus filesystem-exported
//!   overrides
//! - [`ImportGuard`]: per-capability stand-ins for imports the host never
//!   defined, failing at call time instead of load time
//! - [`OutputBuffer`] and [`ConsoleSink`]: line-buffered program output
//! - [`BridgeState`]: the per-run state stored in the wasmtime `Store`
//! - [`TerminationSignal`]: the terminal outcome of one run
//!
//! # Raising signals
//!
//! Syscall implementations never unwind the host. A failure is returned as
//! the error payload of the wasm call that entered the host, propagates out
//! through the guest's call chain, and is recovered by downcast at the
//! orchestrator.

pub mod error;
pub mod guard;
pub mod signal;
pub mod state;
pub mod syscalls;
pub mod table;
pub mod writer;

// Re-export main types
pub use error::{HostError, HostResult};
pub use guard::ImportGuard;
pub use signal::TerminationSignal;
pub use state::BridgeState;
pub use syscalls::ESUCCESS;
pub use table::{
    CapabilityOrigin, CapabilityTable, ENV_NAMESPACE, SYSCALL_NAMESPACE, TableEntry,
    fixed_syscalls,
};
pub use writer::{CaptureSink, ConsoleSink, OutputBuffer, StdoutSink};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{HostError, HostResult};
    pub use crate::guard::ImportGuard;
    pub use crate::signal::TerminationSignal;
    pub use crate::state::BridgeState;
    pub use crate::table::{CapabilityTable, ENV_NAMESPACE, SYSCALL_NAMESPACE};
    pub use crate::writer::{CaptureSink, ConsoleSink, OutputBuffer, StdoutSink};
}
