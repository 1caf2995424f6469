//! The per-run bridge orchestration.
//!
//! One [`Bridge`] executes one run: instantiate the filesystem module
//! against the fixed syscall table, run its `init`, merge its exports into
//! the table, instantiate the guest against the merged table, and invoke
//! `_start`. The run ends at the first [`TerminationSignal`]; whatever the
//! outcome, buffered output is flushed before it is surfaced.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};
use wasmtime::Store;

use ferry_core::{FerryEngine, LoadedModule, RunConfig};
use ferry_host::{BridgeState, CapabilityTable, ConsoleSink, ImportGuard, TerminationSignal};
use ferry_memory::MemoryView;

use crate::error::{FerryError, FerryResult, TrapInfo};
use crate::report::{ModuleSummary, RunId, RunReport};

/// Orchestrates one run of a guest against a filesystem module.
///
/// A bridge is single-use: it owns nothing beyond the borrowed engine and
/// compiled modules, and every mutable component of the run (store, views,
/// writer, table) is created inside [`Bridge::run`] and dropped with it.
/// Concurrent embedders give each run its own bridge.
pub struct Bridge<'a> {
    engine: &'a FerryEngine,
    filesystem: &'a LoadedModule,
    guest: &'a LoadedModule,
    config: RunConfig,
    sink: Arc<dyn ConsoleSink>,
}

impl<'a> Bridge<'a> {
    /// Create a bridge for one run.
    pub fn new(
        engine: &'a FerryEngine,
        filesystem: &'a LoadedModule,
        guest: &'a LoadedModule,
        config: RunConfig,
        sink: Arc<dyn ConsoleSink>,
    ) -> Self {
        Self {
            engine,
            filesystem,
            guest,
            config,
            sink,
        }
    }

    /// Execute the run to its terminal outcome.
    ///
    /// All four signal outcomes produce `Ok(report)`; only host-level
    /// failures (bad modules, missing entry points, genuine wasm traps)
    /// return `Err`. Buffered output is flushed on every path.
    pub fn run(self) -> FerryResult<RunReport> {
        let run_id = RunId::new();
        let started = Instant::now();
        info!(%run_id, program = %self.config.program, "starting bridged run");

        let mut store = Store::new(
            self.engine.inner(),
            BridgeState::new(self.config.clone(), Arc::clone(&self.sink)),
        );

        let outcome = self.execute(&mut store);

        // Partial output is never lost, even on failure.
        store.data_mut().flush();

        let signal = outcome?;
        let duration = started.elapsed();
        info!(%run_id, outcome = %signal, ?duration, "run finished");

        Ok(RunReport {
            run_id,
            filesystem: ModuleSummary::from(self.filesystem),
            guest: ModuleSummary::from(self.guest),
            duration,
            outcome: (&signal).into(),
        })
    }

    /// Drive the boot sequence and the guest to a termination signal.
    fn execute(&self, store: &mut Store<BridgeState>) -> FerryResult<TerminationSignal> {
        debug!(phase = "fs-load");
        let mut table = CapabilityTable::with_fixed_syscalls(self.engine.inner())?;
        ImportGuard::bind(&mut table, store, self.filesystem.inner())?;
        let fs_instance = table
            .linker()
            .instantiate(&mut *store, self.filesystem.inner())
            .map_err(FerryError::Wasmtime)?;

        if let Some(memory) = fs_instance.get_memory(&mut *store, "memory") {
            let view = MemoryView::new(&mut *store, memory, "memfs");
            store.data_mut().bind_memfs(view);
        }

        debug!(phase = "fs-init");
        let init = fs_instance
            .get_typed_func::<(), ()>(&mut *store, "init")
            .map_err(|_| FerryError::MissingExport {
                module: "filesystem",
                name: "init",
            })?;
        if let Err(err) = init.call(&mut *store, ()) {
            return classify(err);
        }

        debug!(phase = "table-merge");
        let merged = table.merge_filesystem_exports(store, &fs_instance)?;
        debug!(merged = merged.len(), "filesystem exports merged");

        debug!(phase = "guest-load");
        ImportGuard::bind(&mut table, store, self.guest.inner())?;
        let guest_instance = table
            .linker()
            .instantiate(&mut *store, self.guest.inner())
            .map_err(FerryError::Wasmtime)?;

        if let Some(memory) = guest_instance.get_memory(&mut *store, "memory") {
            let view = MemoryView::new(&mut *store, memory, "guest");
            store.data_mut().bind_guest(view);
        }

        let start = guest_instance
            .get_typed_func::<(), ()>(&mut *store, "_start")
            .map_err(|_| FerryError::MissingExport {
                module: "guest",
                name: "_start",
            })?;

        debug!(phase = "running");
        match start.call(&mut *store, ()) {
            // A plain return from _start is a normal completion.
            Ok(()) => Ok(TerminationSignal::Exited(0)),
            Err(err) => classify(err),
        }
    }
}

/// Separate termination signals from genuine host failures.
fn classify(err: wasmtime::Error) -> FerryResult<TerminationSignal> {
    match err.downcast::<TerminationSignal>() {
        Ok(signal) => Ok(signal),
        Err(err) => {
            if let Some(trap) = err.downcast_ref::<wasmtime::Trap>() {
                Err(FerryError::Trap(TrapInfo::from(*trap)))
            } else {
                Err(FerryError::Wasmtime(err))
            }
        }
    }
}
