//! # Ferry - a host syscall bridge for twin-module WebAssembly programs
//!
//! Ferry runs a sandboxed guest program against a POSIX-like system-call
//! surface, with the filesystem state kept in a second, memory-isolated
//! WebAssembly module. The two modules never share a linear memory: every
//! byte that moves between them is marshaled by the host.
//!
//! ## Features
//!
//! - **Isolation**: the guest and the filesystem module each own their
//!   linear memory; the host is the only data path between them
//! - **Capability table**: a fixed syscall set merged with whatever the
//!   filesystem module exports, filesystem definitions winning
//! - **Graceful degradation**: imports nobody provides load fine and fail
//!   only when called
//! - **Embeddable**: library-first design with a small builder facade
//!
//! ## Quick Start
//!
//! ```ignore
//! use ferry::prelude::*;
//!
//! let runtime = Ferry::builder().build()?;
//!
//! let filesystem = runtime.load_file("memfs.wasm")?;
//! let guest = runtime.load_file("guest.wasm")?;
//!
//! let config = RunConfig::new("clang").with_arg("-O2").with_env("USER", "alice");
//! let report = runtime.run(&filesystem, &guest, config)?;
//! assert!(report.outcome.is_clean_exit());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                   Your Application                    │
//! ├───────────────────────────────────────────────────────┤
//! │                    ferry (facade)                     │
//! │                 ┌─────────────────┐                   │
//! │                 │     Bridge      │                   │
//! │                 └────────┬────────┘                   │
//! │                          │                            │
//! │  ┌──────────────┬────────┴───────┬─────────────────┐  │
//! │  │ ferry-core   │  ferry-host    │  ferry-memory   │  │
//! │  │ (engine,     │  (syscalls,    │  (views,        │  │
//! │  │  modules)    │   table)       │   copy)         │  │
//! │  └──────────────┴────────────────┴─────────────────┘  │
//! ├───────────────────────────────────────────────────────┤
//! │                      Wasmtime                         │
//! └───────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use ferry_core::{EngineConfig, FerryEngine, LoadedModule, ModuleLoader, RunConfig, SharedEngine};
use ferry_host::{ConsoleSink, StdoutSink};

// Re-export from sub-crates
pub use ferry_core;
pub use ferry_host;
pub use ferry_memory;

pub mod bridge;
pub mod error;
pub mod report;

pub use bridge::Bridge;
pub use error::{FerryError, FerryResult, TrapInfo};
pub use ferry_host::TerminationSignal;
pub use report::{ModuleSummary, RunId, RunOutcome, RunReport};

/// Main entry point for Ferry.
pub struct Ferry;

impl Ferry {
    /// Create a new Ferry runtime builder.
    pub fn builder() -> FerryBuilder {
        FerryBuilder::new()
    }

    /// Create a runtime with default configuration.
    pub fn with_defaults() -> FerryResult<FerryRuntime> {
        FerryBuilder::new().build()
    }
}

/// Builder for configuring the Ferry runtime.
pub struct FerryBuilder {
    engine_config: EngineConfig,
    sink: Arc<dyn ConsoleSink>,
}

impl FerryBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            engine_config: EngineConfig::default(),
            sink: Arc::new(StdoutSink),
        }
    }

    /// Set the maximum WASM stack size.
    pub fn with_max_wasm_stack(mut self, bytes: usize) -> Self {
        self.engine_config.max_wasm_stack = bytes;
        self
    }

    /// Enable or disable debug info.
    pub fn with_debug_info(mut self, enabled: bool) -> Self {
        self.engine_config.debug_info = enabled;
        self
    }

    /// Set where program output lines are delivered.
    ///
    /// Defaults to standard output.
    pub fn with_sink(mut self, sink: Arc<dyn ConsoleSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Build the runtime.
    pub fn build(self) -> FerryResult<FerryRuntime> {
        let engine = FerryEngine::new(self.engine_config)?;
        Ok(FerryRuntime {
            engine: Arc::new(engine),
            sink: self.sink,
        })
    }
}

impl Default for FerryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured Ferry runtime.
///
/// The runtime owns the shared engine and the output sink. Modules are
/// compiled once through the runtime's loader and can be run any number of
/// times; each run gets fresh instances and fresh host state.
pub struct FerryRuntime {
    engine: SharedEngine,
    sink: Arc<dyn ConsoleSink>,
}

impl FerryRuntime {
    /// Get a reference to the engine.
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Create a module loader.
    pub fn loader(&self) -> ModuleLoader {
        ModuleLoader::new(Arc::clone(&self.engine))
    }

    /// Load a module from bytes.
    pub fn load_bytes(&self, bytes: &[u8]) -> FerryResult<LoadedModule> {
        self.loader().load_bytes(bytes).map_err(FerryError::Module)
    }

    /// Load a module from a file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> FerryResult<LoadedModule> {
        self.loader()
            .load_file(path.as_ref())
            .map_err(FerryError::Module)
    }

    /// Load a module from WAT text format.
    pub fn load_wat(&self, wat: &str) -> FerryResult<LoadedModule> {
        self.loader().load_wat(wat).map_err(FerryError::Module)
    }

    /// Run a guest against a filesystem module.
    ///
    /// Boots the filesystem module, merges its exports into the syscall
    /// table, then runs the guest's `_start` to a terminal outcome.
    pub fn run(
        &self,
        filesystem: &LoadedModule,
        guest: &LoadedModule,
        config: RunConfig,
    ) -> FerryResult<RunReport> {
        Bridge::new(
            &self.engine,
            filesystem,
            guest,
            config,
            Arc::clone(&self.sink),
        )
        .run()
    }
}

impl std::fmt::Debug for FerryRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FerryRuntime").finish()
    }
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Main types
    pub use crate::{Ferry, FerryBuilder, FerryError, FerryRuntime};

    // Core types
    pub use ferry_core::{EngineConfig, FerryEngine, LoadedModule, ModuleLoader, RunConfig};

    // Host types
    pub use ferry_host::{CaptureSink, ConsoleSink, StdoutSink, TerminationSignal};

    // Report types
    pub use crate::report::{RunOutcome, RunReport};

    // Common std types
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_host::CaptureSink;

    const MEMFS_WAT: &str = r#"
        (module
            (memory (export "memory") 1)
            (func (export "init"))
        )
    "#;

    #[test]
    fn test_ferry_builder() {
        let runtime = Ferry::builder()
            .with_max_wasm_stack(2 * 1024 * 1024)
            .build()
            .unwrap();

        assert_eq!(runtime.engine().config().max_wasm_stack, 2 * 1024 * 1024);
    }

    #[test]
    fn test_run_to_exit() {
        let sink = Arc::new(CaptureSink::new());
        let runtime = Ferry::builder()
            .with_sink(Arc::clone(&sink) as _)
            .build()
            .unwrap();

        let filesystem = runtime.load_wat(MEMFS_WAT).unwrap();
        let guest = runtime
            .load_wat(
                r#"
            (module
                (import "wasi_unstable" "proc_exit" (func $exit (param i32)))
                (memory (export "memory") 1)
                (func (export "_start")
                    i32.const 42
                    call $exit
                )
            )
        "#,
            )
            .unwrap();

        let report = runtime
            .run(&filesystem, &guest, RunConfig::default())
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Exited { code: 42 });
    }

    #[test]
    fn test_modules_are_reusable_across_runs() {
        let runtime = Ferry::builder()
            .with_sink(Arc::new(CaptureSink::new()) as _)
            .build()
            .unwrap();

        let filesystem = runtime.load_wat(MEMFS_WAT).unwrap();
        let guest = runtime
            .load_wat(
                r#"
            (module
                (memory (export "memory") 1)
                (func (export "_start"))
            )
        "#,
            )
            .unwrap();

        let first = runtime
            .run(&filesystem, &guest, RunConfig::default())
            .unwrap();
        let second = runtime
            .run(&filesystem, &guest, RunConfig::default())
            .unwrap();
        assert_eq!(first.outcome, RunOutcome::Exited { code: 0 });
        assert_eq!(first.outcome, second.outcome);
        assert_ne!(first.run_id, second.run_id);
    }

    #[test]
    fn test_prelude_imports() {
        use crate::prelude::*;

        let _runtime = Ferry::builder().build().unwrap();
    }
}
