//! Per-run host state stored in the wasmtime `Store`.
//!
//! One `BridgeState` exists per run. It carries the run configuration, the
//! line-buffered writer and its sink, and the memory views of the two
//! modules once they are bound. Nothing here is shared between runs.

use std::sync::Arc;

use ferry_core::RunConfig;
use ferry_memory::MemoryView;

use crate::signal::TerminationSignal;
use crate::writer::{ConsoleSink, OutputBuffer};

/// Host-side state for one bridged run.
pub struct BridgeState {
    /// Program name, arguments, and environment the guest observes.
    config: RunConfig,
    /// Line-buffered program output.
    writer: OutputBuffer,
    /// The raw sink, for the unbuffered diagnostic channel.
    sink: Arc<dyn ConsoleSink>,
    /// View over the filesystem module's memory, once bound.
    memfs: Option<MemoryView>,
    /// View over the guest module's memory, once bound.
    guest: Option<MemoryView>,
}

impl BridgeState {
    /// Create fresh state for one run.
    pub fn new(config: RunConfig, sink: Arc<dyn ConsoleSink>) -> Self {
        Self {
            config,
            writer: OutputBuffer::new(Arc::clone(&sink)),
            sink,
            memfs: None,
            guest: None,
        }
    }

    /// The run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The line-buffered program output writer.
    pub fn writer_mut(&mut self) -> &mut OutputBuffer {
        &mut self.writer
    }

    /// The raw console sink, bypassing the line buffer.
    pub fn sink(&self) -> &Arc<dyn ConsoleSink> {
        &self.sink
    }

    /// Bind (or re-bind) the filesystem module's memory view.
    ///
    /// Syscalls that touched the view store it back here so the refreshed
    /// window survives across calls.
    pub fn bind_memfs(&mut self, view: MemoryView) {
        self.memfs = Some(view);
    }

    /// Bind (or re-bind) the guest module's memory view.
    pub fn bind_guest(&mut self, view: MemoryView) {
        self.guest = Some(view);
    }

    /// The filesystem module's memory view.
    ///
    /// Fails with `AssertionFailed` if the module exported no memory or has
    /// not been instantiated yet.
    pub fn memfs_view(&self) -> Result<MemoryView, TerminationSignal> {
        self.memfs.ok_or_else(|| {
            TerminationSignal::AssertionFailed("memfs memory is not bound".to_string())
        })
    }

    /// The guest module's memory view.
    pub fn guest_view(&self) -> Result<MemoryView, TerminationSignal> {
        self.guest.ok_or_else(|| {
            TerminationSignal::AssertionFailed("guest memory is not bound".to_string())
        })
    }

    /// Flush any pending program output to the sink.
    pub fn flush(&mut self) {
        self.writer.flush();
    }
}

impl std::fmt::Debug for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeState")
            .field("config", &self.config)
            .field("memfs_bound", &self.memfs.is_some())
            .field("guest_bound", &self.guest.is_some())
            .finish()
    }
}
