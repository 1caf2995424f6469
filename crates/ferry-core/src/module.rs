//! WASM module loading and metadata extraction.
//!
//! Both sides of the bridge - the filesystem module and the guest program -
//! are compiled here before a run. Compilation happens once per module; the
//! orchestrator instantiates the compiled module fresh for every run. The
//! extracted metadata drives the import guard and the `inspect` command.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};
use wasmtime::{ExternType, Module};

use crate::engine::FerryEngine;
use crate::error::{ModuleError, ModuleResult};

/// A compiled WebAssembly module ready for instantiation.
///
/// `LoadedModule` wraps a Wasmtime module with metadata extracted at load
/// time, so a module is compiled once and can be instantiated for any number
/// of runs.
#[derive(Clone)]
pub struct LoadedModule {
    /// The underlying Wasmtime module.
    inner: Module,
    /// Metadata extracted from the module.
    metadata: ModuleMetadata,
}

impl LoadedModule {
    /// Get a reference to the underlying Wasmtime module.
    pub fn inner(&self) -> &Module {
        &self.inner
    }

    /// Get the module metadata.
    pub fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    /// Get the module name, if set.
    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    /// Get the list of exports.
    pub fn exports(&self) -> &[ExportInfo] {
        &self.metadata.exports
    }

    /// Get the list of imports.
    pub fn imports(&self) -> &[ImportInfo] {
        &self.metadata.imports
    }

    /// Check if the module has a specific export.
    pub fn has_export(&self, name: &str) -> bool {
        self.metadata.exports.iter().any(|e| e.name == name)
    }

    /// Check if the module declares a specific import.
    pub fn requires_import(&self, namespace: &str, name: &str) -> bool {
        self.metadata
            .imports
            .iter()
            .any(|i| i.namespace == namespace && i.name == name)
    }
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("name", &self.metadata.name)
            .field("exports", &self.metadata.exports.len())
            .field("imports", &self.metadata.imports.len())
            .finish()
    }
}

/// Metadata extracted from a WASM module.
#[derive(Debug, Clone, Default)]
pub struct ModuleMetadata {
    /// Module name, if specified.
    pub name: Option<String>,
    /// List of exported items.
    pub exports: Vec<ExportInfo>,
    /// List of declared imports.
    pub imports: Vec<ImportInfo>,
    /// Exported memory descriptions.
    pub memories: Vec<MemoryInfo>,
}

/// Information about an exported item.
#[derive(Debug, Clone)]
pub struct ExportInfo {
    /// Export name.
    pub name: String,
    /// Type of the export.
    pub kind: ExternKind,
}

/// Information about a declared import.
#[derive(Debug, Clone)]
pub struct ImportInfo {
    /// Import namespace, e.g. `wasi_unstable` or `env`.
    pub namespace: String,
    /// Import name.
    pub name: String,
    /// Type of the import.
    pub kind: ExternKind,
}

/// The kind of an imported or exported item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternKind {
    /// A function.
    Function {
        /// Number of parameters.
        params: usize,
        /// Number of results.
        results: usize,
    },
    /// A memory.
    Memory,
    /// A global.
    Global,
    /// A table.
    Table,
}

/// Information about an exported memory definition.
#[derive(Debug, Clone)]
pub struct MemoryInfo {
    /// Minimum memory size in pages (64KB each).
    pub min_pages: u64,
    /// Maximum memory size in pages, if specified.
    pub max_pages: Option<u64>,
    /// Whether this is a 64-bit memory.
    pub memory64: bool,
}

/// Loader for WASM modules.
///
/// `ModuleLoader` provides methods for loading and validating WASM modules
/// from various sources.
pub struct ModuleLoader {
    /// Reference to the engine used for compilation.
    engine: Arc<FerryEngine>,
}

impl ModuleLoader {
    /// Create a new module loader with the given engine.
    pub fn new(engine: Arc<FerryEngine>) -> Self {
        Self { engine }
    }

    /// Load a module from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid WASM module.
    pub fn load_bytes(&self, bytes: &[u8]) -> ModuleResult<LoadedModule> {
        debug!(size = bytes.len(), "Loading WASM module from bytes");

        let module = Module::new(self.engine.inner(), bytes)?;
        let metadata = extract_metadata(&module);

        info!(
            name = ?metadata.name,
            exports = metadata.exports.len(),
            imports = metadata.imports.len(),
            "Loaded WASM module"
        );

        Ok(LoadedModule {
            inner: module,
            metadata,
        })
    }

    /// Load a module from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid WASM module.
    pub fn load_file(&self, path: &Path) -> ModuleResult<LoadedModule> {
        debug!(path = %path.display(), "Loading WASM module from file");

        let module = Module::from_file(self.engine.inner(), path)?;
        let metadata = extract_metadata(&module);

        info!(
            path = %path.display(),
            name = ?metadata.name,
            exports = metadata.exports.len(),
            imports = metadata.imports.len(),
            "Loaded WASM module from file"
        );

        Ok(LoadedModule {
            inner: module,
            metadata,
        })
    }

    /// Load a module from WAT (WebAssembly Text) format.
    ///
    /// This is primarily useful for testing and development.
    ///
    /// # Errors
    ///
    /// Returns an error if the WAT is invalid.
    pub fn load_wat(&self, wat: &str) -> ModuleResult<LoadedModule> {
        debug!(size = wat.len(), "Loading WASM module from WAT");

        let wasm = wat::parse_str(wat).map_err(|e| ModuleError::Invalid(e.to_string()))?;
        self.load_bytes(&wasm)
    }
}

/// Extract metadata from a compiled module.
fn extract_metadata(module: &Module) -> ModuleMetadata {
    let name = module.name().map(String::from);

    let exports = module
        .exports()
        .map(|export| ExportInfo {
            name: export.name().to_string(),
            kind: extern_kind(&export.ty()),
        })
        .collect();

    let imports = module
        .imports()
        .map(|import| ImportInfo {
            namespace: import.module().to_string(),
            name: import.name().to_string(),
            kind: extern_kind(&import.ty()),
        })
        .collect();

    let memories = module
        .exports()
        .filter_map(|export| match export.ty() {
            ExternType::Memory(mem) => Some(MemoryInfo {
                min_pages: mem.minimum(),
                max_pages: mem.maximum(),
                memory64: mem.is_64(),
            }),
            _ => None,
        })
        .collect();

    ModuleMetadata {
        name,
        exports,
        imports,
        memories,
    }
}

fn extern_kind(ty: &ExternType) -> ExternKind {
    match ty {
        ExternType::Func(func) => ExternKind::Function {
            params: func.params().len(),
            results: func.results().len(),
        },
        ExternType::Memory(_) => ExternKind::Memory,
        ExternType::Global(_) => ExternKind::Global,
        ExternType::Table(_) => ExternKind::Table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn create_loader() -> ModuleLoader {
        let engine = Arc::new(FerryEngine::new(EngineConfig::default()).unwrap());
        ModuleLoader::new(engine)
    }

    #[test]
    fn test_load_guest_shaped_module() {
        let loader = create_loader();

        let module = loader
            .load_wat(
                r#"
            (module
                (import "wasi_unstable" "proc_exit" (func $exit (param i32)))
                (memory (export "memory") 1)
                (func (export "_start")
                    i32.const 0
                    call $exit
                )
            )
        "#,
            )
            .unwrap();

        assert!(module.has_export("_start"));
        assert!(module.has_export("memory"));
        assert!(module.requires_import("wasi_unstable", "proc_exit"));
        assert_eq!(module.imports().len(), 1);

        if let ExternKind::Function { params, results } = &module.imports()[0].kind {
            assert_eq!(*params, 1);
            assert_eq!(*results, 0);
        } else {
            panic!("Expected function import");
        }
    }

    #[test]
    fn test_load_filesystem_shaped_module() {
        let loader = create_loader();

        let module = loader
            .load_wat(
                r#"
            (module
                (memory (export "memory") 1 10)
                (func (export "init"))
            )
        "#,
            )
            .unwrap();

        assert!(module.has_export("init"));
        assert_eq!(module.metadata().memories.len(), 1);
        assert_eq!(module.metadata().memories[0].min_pages, 1);
        assert_eq!(module.metadata().memories[0].max_pages, Some(10));
    }

    #[test]
    fn test_load_invalid_module() {
        let loader = create_loader();

        let result = loader.load_bytes(&[0, 1, 2, 3]);
        assert!(result.is_err());
    }
}
