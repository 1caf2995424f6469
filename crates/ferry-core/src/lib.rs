//! Ferry Core - engine and module layer for the syscall bridge.
//!
//! This crate provides the compilation side of the Ferry runtime:
//!
//! - [`FerryEngine`]: the Wasmtime engine wrapper shared across runs
//! - [`ModuleLoader`]: loading the filesystem and guest modules with
//!   metadata extraction
//! - [`EngineConfig`] and [`RunConfig`]: engine settings and the per-run
//!   program name, arguments, and environment
//!
//! # Quick Start
//!
//! ```ignore
//! use ferry_core::prelude::*;
//!
//! // Create an engine
//! let engine = FerryEngine::default_engine()?.into_shared();
//!
//! // Load both sides of the bridge
//! let loader = ModuleLoader::new(engine.clone());
//! let memfs = loader.load_file(Path::new("memfs.wasm"))?;
//! let guest = loader.load_file(Path::new("guest.wasm"))?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod module;

// Re-export main types at crate root
pub use config::{EngineConfig, RunConfig};
pub use engine::{FerryEngine, IntoShared, SharedEngine};
pub use error::{CoreError, EngineError, ModuleError, Result};
pub use module::{
    ExportInfo, ExternKind, ImportInfo, LoadedModule, MemoryInfo, ModuleLoader, ModuleMetadata,
};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```ignore
/// use ferry_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{EngineConfig, RunConfig};
    pub use crate::engine::{FerryEngine, IntoShared, SharedEngine};
    pub use crate::error::{CoreError, EngineError, ModuleError, Result};
    pub use crate::module::{LoadedModule, ModuleLoader};
}
