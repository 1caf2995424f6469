//! Wasmtime engine wrapper for Ferry.
//!
//! This module provides the `FerryEngine` type, which wraps the Wasmtime
//! engine with Ferry-specific configuration. The engine is immutable and
//! shareable; every run builds its own store on top of it.

use std::sync::Arc;

use tracing::info;
use wasmtime::{Config, Engine};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// The core Ferry engine that wraps Wasmtime.
///
/// `FerryEngine` is responsible for configuring the underlying Wasmtime
/// engine and providing a shared instance for module compilation.
///
/// # Example
///
/// ```
/// use ferry_core::{EngineConfig, FerryEngine};
///
/// let config = EngineConfig::default();
/// let engine = FerryEngine::new(config).unwrap();
/// ```
pub struct FerryEngine {
    /// The underlying Wasmtime engine.
    inner: Engine,
    /// Configuration used to create this engine.
    config: EngineConfig,
}

impl FerryEngine {
    /// Create a new Ferry engine with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Wasmtime engine cannot be created with
    /// the given configuration.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let mut wasmtime_config = Config::new();

        wasmtime_config.max_wasm_stack(config.max_wasm_stack);
        wasmtime_config.debug_info(config.debug_info);

        // Enable WASM features
        wasmtime_config.wasm_bulk_memory(true);
        wasmtime_config.wasm_multi_value(true);
        wasmtime_config.wasm_reference_types(true);
        wasmtime_config.wasm_simd(true);

        let inner = Engine::new(&wasmtime_config)?;

        info!(
            max_wasm_stack = config.max_wasm_stack,
            debug_info = config.debug_info,
            "Created Ferry engine"
        );

        Ok(Self { inner, config })
    }

    /// Create a new engine with default configuration.
    pub fn default_engine() -> EngineResult<Self> {
        Self::new(EngineConfig::default())
    }

    /// Get a reference to the underlying Wasmtime engine.
    pub fn inner(&self) -> &Engine {
        &self.inner
    }

    /// Get the configuration used to create this engine.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl std::fmt::Debug for FerryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FerryEngine")
            .field("config", &self.config)
            .finish()
    }
}

/// A shared reference to a Ferry engine.
///
/// This is the recommended way to share an engine across runs.
pub type SharedEngine = Arc<FerryEngine>;

/// Extension trait for creating shared engines.
pub trait IntoShared {
    /// Convert into a shared engine reference.
    fn into_shared(self) -> SharedEngine;
}

impl IntoShared for FerryEngine {
    fn into_shared(self) -> SharedEngine {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_creation() {
        let engine = FerryEngine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.config().max_wasm_stack, 1024 * 1024);
    }

    #[test]
    fn test_engine_custom_config() {
        let config = EngineConfig::new().with_max_wasm_stack(512 * 1024);
        let engine = FerryEngine::new(config).unwrap();
        assert_eq!(engine.config().max_wasm_stack, 512 * 1024);
    }

    #[test]
    fn test_shared_engine() {
        let engine = FerryEngine::default_engine().unwrap().into_shared();
        let engine2 = Arc::clone(&engine);

        assert_eq!(
            engine.config().max_wasm_stack,
            engine2.config().max_wasm_stack
        );
    }
}
