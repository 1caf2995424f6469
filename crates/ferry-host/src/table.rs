//! The capability table: named host functions importable by a module.
//!
//! The table wraps a wasmtime `Linker` with a registry of what has been
//! defined and where it came from. It starts from the fixed syscall set and
//! is later merged with whatever the filesystem module instance exports;
//! same-named filesystem exports shadow fixed entries.

use tracing::{debug, info};
use wasmtime::{Engine, Extern, Instance, Linker, Store};

use crate::error::{HostError, HostResult};
use crate::state::BridgeState;
use crate::syscalls;

/// Namespace the guest's system-call imports live under.
pub const SYSCALL_NAMESPACE: &str = "wasi_unstable";

/// Namespace of the host environment imports shared by both modules.
pub const ENV_NAMESPACE: &str = "env";

/// Where a table entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityOrigin {
    /// Defined by the fixed syscall set.
    Fixed,
    /// Exported by the filesystem module instance.
    Filesystem,
}

/// One registered capability.
#[derive(Debug, Clone)]
pub struct TableEntry {
    /// The import namespace.
    pub namespace: String,
    /// The capability name.
    pub name: String,
    /// Where the definition came from.
    pub origin: CapabilityOrigin,
}

/// The merged set of capabilities offered to a module at instantiation.
pub struct CapabilityTable {
    /// The underlying Wasmtime linker.
    linker: Linker<BridgeState>,
    /// Registry of defined capabilities.
    entries: Vec<TableEntry>,
}

impl CapabilityTable {
    /// Create an empty table for the given engine.
    pub fn new(engine: &Engine) -> Self {
        let mut linker = Linker::new(engine);
        // Filesystem exports may replace same-named fixed syscalls.
        linker.allow_shadowing(true);
        Self {
            linker,
            entries: Vec::new(),
        }
    }

    /// Create a table pre-populated with the fixed syscall set.
    pub fn with_fixed_syscalls(engine: &Engine) -> HostResult<Self> {
        let mut table = Self::new(engine);
        syscalls::register(&mut table)?;
        info!(capabilities = table.entries.len(), "Built capability table");
        Ok(table)
    }

    /// Get a reference to the underlying Wasmtime linker.
    pub fn linker(&self) -> &Linker<BridgeState> {
        &self.linker
    }

    /// Get a mutable reference to the underlying Wasmtime linker.
    pub fn linker_mut(&mut self) -> &mut Linker<BridgeState> {
        &mut self.linker
    }

    /// The registry of defined capabilities.
    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    /// Check if a capability is recorded under `(namespace, name)`.
    pub fn is_defined(&self, namespace: &str, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.namespace == namespace && e.name == name)
    }

    /// Register a fixed host function.
    pub fn func_wrap<Params, Results>(
        &mut self,
        namespace: &str,
        name: &str,
        func: impl wasmtime::IntoFunc<BridgeState, Params, Results>,
    ) -> HostResult<&mut Self> {
        if self.is_defined(namespace, name) {
            return Err(HostError::AlreadyRegistered {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }

        self.linker
            .func_wrap(namespace, name, func)
            .map_err(|e| HostError::RegistrationFailed {
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        self.entries.push(TableEntry {
            namespace: namespace.to_string(),
            name: name.to_string(),
            origin: CapabilityOrigin::Fixed,
        });

        debug!(namespace, name, "Registered fixed capability");
        Ok(self)
    }

    /// Define an already-instantiated item, without recording it.
    ///
    /// Used by the import guard for its stand-ins.
    pub(crate) fn define_raw(
        &mut self,
        store: &mut Store<BridgeState>,
        namespace: &str,
        name: &str,
        item: impl Into<Extern>,
    ) -> HostResult<()> {
        self.linker
            .define(&mut *store, namespace, name, item)
            .map_err(|e| HostError::RegistrationFailed {
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Merge the filesystem instance's exports into the syscall namespace.
    ///
    /// Every export is defined under [`SYSCALL_NAMESPACE`]; a same-named
    /// fixed entry is shadowed by the filesystem definition. Returns the
    /// names that were merged.
    pub fn merge_filesystem_exports(
        &mut self,
        store: &mut Store<BridgeState>,
        instance: &Instance,
    ) -> HostResult<Vec<String>> {
        let exports: Vec<(String, Extern)> = instance
            .exports(&mut *store)
            .map(|export| (export.name().to_string(), export.into_extern()))
            .collect();

        let mut merged = Vec::with_capacity(exports.len());
        for (name, item) in exports {
            if self.is_defined(SYSCALL_NAMESPACE, &name) {
                info!(
                    namespace = SYSCALL_NAMESPACE,
                    name, "filesystem export overrides fixed syscall"
                );
            } else {
                debug!(
                    namespace = SYSCALL_NAMESPACE,
                    name, "merged filesystem export"
                );
            }

            self.linker
                .define(&mut *store, SYSCALL_NAMESPACE, &name, item)
                .map_err(|e| HostError::RegistrationFailed {
                    namespace: SYSCALL_NAMESPACE.to_string(),
                    name: name.clone(),
                    reason: e.to_string(),
                })?;

            self.entries.push(TableEntry {
                namespace: SYSCALL_NAMESPACE.to_string(),
                name: name.clone(),
                origin: CapabilityOrigin::Filesystem,
            });
            merged.push(name);
        }

        Ok(merged)
    }
}

impl std::fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// The fixed syscall set, as `(namespace, name)` pairs.
///
/// Used by tooling to annotate which of a module's declared imports the
/// fixed table provides.
pub fn fixed_syscalls() -> &'static [(&'static str, &'static str)] {
    &[
        (SYSCALL_NAMESPACE, "proc_exit"),
        (SYSCALL_NAMESPACE, "environ_sizes_get"),
        (SYSCALL_NAMESPACE, "environ_get"),
        (SYSCALL_NAMESPACE, "args_sizes_get"),
        (SYSCALL_NAMESPACE, "args_get"),
        (SYSCALL_NAMESPACE, "random_get"),
        (SYSCALL_NAMESPACE, "clock_time_get"),
        (SYSCALL_NAMESPACE, "poll_oneoff"),
        (ENV_NAMESPACE, "abort"),
        (ENV_NAMESPACE, "host_write"),
        (ENV_NAMESPACE, "memfs_log"),
        (ENV_NAMESPACE, "copy_out"),
        (ENV_NAMESPACE, "copy_in"),
    ]
}
