//! The fixed syscall set.
//!
//! Every function here takes raw offset/length arguments supplied by the
//! guest itself, so each one re-checks its view before touching memory and
//! raises a [`TerminationSignal`] out of the wasm call on any contract
//! violation. Views that were refreshed are stored back into the run state
//! so growth observations survive across calls.

use ferry_core::RunConfig;
use ferry_memory::{AccessError, copy};
use wasmtime::Caller;

use crate::error::HostResult;
use crate::signal::TerminationSignal;
use crate::state::BridgeState;
use crate::table::{CapabilityTable, ENV_NAMESPACE, SYSCALL_NAMESPACE};

/// Success code returned by syscalls that complete normally.
pub const ESUCCESS: i32 = 0;

/// Highest file descriptor `host_write` accepts (stdin/stdout/stderr).
const MAX_CONSOLE_FD: i32 = 2;

/// Raise a signal as the error payload of the current wasm call.
fn raise(signal: TerminationSignal) -> wasmtime::Error {
    signal.into()
}

/// Convert a memory access failure into an assertion signal.
fn assertion(err: AccessError) -> wasmtime::Error {
    raise(TerminationSignal::AssertionFailed(err.to_string()))
}

/// The configured environment as `name=value` entries, in insertion order.
fn environ_entries(config: &RunConfig) -> Vec<String> {
    config
        .env
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect()
}

/// Register the fixed syscall set into `table`.
pub(crate) fn register(table: &mut CapabilityTable) -> HostResult<()> {
    register_wasi(table)?;
    register_env(table)
}

/// The `wasi_unstable` namespace: the system-call surface the guest expects.
fn register_wasi(table: &mut CapabilityTable) -> HostResult<()> {
    table.func_wrap(
        SYSCALL_NAMESPACE,
        "proc_exit",
        |_caller: Caller<'_, BridgeState>, code: i32| -> wasmtime::Result<()> {
            Err(raise(TerminationSignal::Exited(code)))
        },
    )?;

    table.func_wrap(
        SYSCALL_NAMESPACE,
        "environ_sizes_get",
        |mut caller: Caller<'_, BridgeState>,
         count_out: u32,
         buf_size_out: u32|
         -> wasmtime::Result<i32> {
            let mut view = caller.data().guest_view().map_err(raise)?;
            view.check(&mut caller);

            // One byte per char, not per UTF-8 byte: the size reported here
            // must be exactly what environ_get marshals.
            let entries = environ_entries(caller.data().config());
            let buf_size: u32 = entries.iter().map(|e| e.chars().count() as u32 + 1).sum();

            view.write64(&mut caller, count_out, entries.len() as u32, 0)
                .map_err(assertion)?;
            view.write64(&mut caller, buf_size_out, buf_size, 0)
                .map_err(assertion)?;
            caller.data_mut().bind_guest(view);
            Ok(ESUCCESS)
        },
    )?;

    table.func_wrap(
        SYSCALL_NAMESPACE,
        "environ_get",
        |mut caller: Caller<'_, BridgeState>,
         mut ptrs: u32,
         mut buf: u32|
         -> wasmtime::Result<i32> {
            let mut view = caller.data().guest_view().map_err(raise)?;
            view.check(&mut caller);

            let entries = environ_entries(caller.data().config());
            for entry in &entries {
                view.write32(&mut caller, ptrs, buf).map_err(assertion)?;
                ptrs += 4;
                buf += view
                    .write_string(&mut caller, buf, entry)
                    .map_err(assertion)?;
            }
            // Zero-word sentinel closes the pointer table.
            view.write32(&mut caller, ptrs, 0).map_err(assertion)?;
            caller.data_mut().bind_guest(view);
            Ok(ESUCCESS)
        },
    )?;

    table.func_wrap(
        SYSCALL_NAMESPACE,
        "args_sizes_get",
        |mut caller: Caller<'_, BridgeState>,
         argc_out: u32,
         buf_size_out: u32|
         -> wasmtime::Result<i32> {
            let mut view = caller.data().guest_view().map_err(raise)?;
            view.check(&mut caller);

            let config = caller.data().config();
            let argc = config.argv().count() as u32;
            let buf_size: u32 = config.argv().map(|arg| arg.chars().count() as u32 + 1).sum();

            view.write64(&mut caller, argc_out, argc, 0)
                .map_err(assertion)?;
            view.write64(&mut caller, buf_size_out, buf_size, 0)
                .map_err(assertion)?;
            caller.data_mut().bind_guest(view);
            Ok(ESUCCESS)
        },
    )?;

    table.func_wrap(
        SYSCALL_NAMESPACE,
        "args_get",
        |mut caller: Caller<'_, BridgeState>,
         mut ptrs: u32,
         mut buf: u32|
         -> wasmtime::Result<i32> {
            let mut view = caller.data().guest_view().map_err(raise)?;
            view.check(&mut caller);

            let argv: Vec<String> = caller.data().config().argv().map(String::from).collect();
            for arg in &argv {
                view.write32(&mut caller, ptrs, buf).map_err(assertion)?;
                ptrs += 4;
                buf += view
                    .write_string(&mut caller, buf, arg)
                    .map_err(assertion)?;
            }
            view.write32(&mut caller, ptrs, 0).map_err(assertion)?;
            caller.data_mut().bind_guest(view);
            Ok(ESUCCESS)
        },
    )?;

    table.func_wrap(
        SYSCALL_NAMESPACE,
        "random_get",
        |mut caller: Caller<'_, BridgeState>, buf: u32, len: u32| -> wasmtime::Result<i32> {
            let mut view = caller.data().guest_view().map_err(raise)?;
            view.check(&mut caller);

            let mut bytes = vec![0u8; len as usize];
            getrandom::fill(&mut bytes).map_err(|e| {
                raise(TerminationSignal::AssertionFailed(format!(
                    "random_get: entropy source failed: {e}"
                )))
            })?;
            view.write_bytes(&mut caller, buf, &bytes)
                .map_err(assertion)?;
            caller.data_mut().bind_guest(view);
            Ok(ESUCCESS)
        },
    )?;

    // Registered stubs: the host offers no clock and no polling. Every call
    // raises, not just the first.
    table.func_wrap(
        SYSCALL_NAMESPACE,
        "clock_time_get",
        |_caller: Caller<'_, BridgeState>,
         _clock_id: i32,
         _precision: i64,
         _time_out: u32|
         -> wasmtime::Result<i32> {
            Err(raise(TerminationSignal::unimplemented(
                SYSCALL_NAMESPACE,
                "clock_time_get",
            )))
        },
    )?;

    table.func_wrap(
        SYSCALL_NAMESPACE,
        "poll_oneoff",
        |_caller: Caller<'_, BridgeState>,
         _in_ptr: u32,
         _out_ptr: u32,
         _nsubscriptions: u32,
         _nevents_out: u32|
         -> wasmtime::Result<i32> {
            Err(raise(TerminationSignal::unimplemented(
                SYSCALL_NAMESPACE,
                "poll_oneoff",
            )))
        },
    )?;

    Ok(())
}

/// The `env` namespace: host plumbing shared by both modules.
fn register_env(table: &mut CapabilityTable) -> HostResult<()> {
    table.func_wrap(
        ENV_NAMESPACE,
        "abort",
        |_caller: Caller<'_, BridgeState>| -> wasmtime::Result<()> {
            Err(raise(TerminationSignal::Aborted("abort".to_string())))
        },
    )?;

    table.func_wrap(
        ENV_NAMESPACE,
        "host_write",
        |mut caller: Caller<'_, BridgeState>,
         fd: i32,
         mut iovs: u32,
         iovs_len: u32,
         nwritten_out: u32|
         -> wasmtime::Result<i32> {
            // fd contract comes first; memory is untouched on violation.
            if fd > MAX_CONSOLE_FD {
                return Err(raise(TerminationSignal::AssertionFailed(format!(
                    "host_write: fd {fd} is not a console descriptor"
                ))));
            }

            let mut view = caller.data().guest_view().map_err(raise)?;
            view.check(&mut caller);

            let mut written = 0u32;
            let mut text = String::new();
            for _ in 0..iovs_len {
                let buf = view.read32(&mut caller, iovs).map_err(assertion)?;
                iovs += 4;
                let len = view.read32(&mut caller, iovs).map_err(assertion)?;
                iovs += 4;
                text.push_str(
                    &view
                        .read_string(&mut caller, buf, Some(len))
                        .map_err(assertion)?,
                );
                // The counter mirrors the raw lengths and wraps like a
                // 32-bit register; lengths are guest-controlled.
                written = written.wrapping_add(len);
            }
            view.write32(&mut caller, nwritten_out, written)
                .map_err(assertion)?;
            caller.data_mut().bind_guest(view);
            caller.data_mut().writer_mut().write(&text);
            Ok(ESUCCESS)
        },
    )?;

    table.func_wrap(
        ENV_NAMESPACE,
        "memfs_log",
        |mut caller: Caller<'_, BridgeState>, buf: u32, len: u32| -> wasmtime::Result<()> {
            let mut view = caller.data().memfs_view().map_err(raise)?;
            view.check(&mut caller);

            let text = view
                .read_string(&mut caller, buf, Some(len))
                .map_err(assertion)?;
            caller.data_mut().bind_memfs(view);
            // Diagnostic channel: bypasses the line buffer.
            caller.data().sink().print(&text);
            Ok(())
        },
    )?;

    table.func_wrap(
        ENV_NAMESPACE,
        "copy_out",
        |mut caller: Caller<'_, BridgeState>,
         guest_dst: u32,
         memfs_src: u32,
         size: u32|
         -> wasmtime::Result<()> {
            let mut dst = caller.data().guest_view().map_err(raise)?;
            let mut src = caller.data().memfs_view().map_err(raise)?;
            copy(&mut caller, &mut dst, guest_dst, &mut src, memfs_src, size)
                .map_err(assertion)?;
            let state = caller.data_mut();
            state.bind_guest(dst);
            state.bind_memfs(src);
            Ok(())
        },
    )?;

    table.func_wrap(
        ENV_NAMESPACE,
        "copy_in",
        |mut caller: Caller<'_, BridgeState>,
         memfs_dst: u32,
         guest_src: u32,
         size: u32|
         -> wasmtime::Result<()> {
            let mut dst = caller.data().memfs_view().map_err(raise)?;
            let mut src = caller.data().guest_view().map_err(raise)?;
            copy(&mut caller, &mut dst, memfs_dst, &mut src, guest_src, size)
                .map_err(assertion)?;
            let state = caller.data_mut();
            state.bind_memfs(dst);
            state.bind_guest(src);
            Ok(())
        },
    )?;

    Ok(())
}
