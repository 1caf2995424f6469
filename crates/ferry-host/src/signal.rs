//! The terminal outcome of one bridged run.

use thiserror::Error;

/// The tagged, terminal outcome of one execution run.
///
/// Exactly one signal is produced per run and it always ends the run; there
/// is no resumption. Syscall implementations raise a signal by returning it
/// as the error payload of the wasm call, and the orchestrator recovers it
/// by downcasting. `Exited` is a graceful, guest-requested termination, not
/// an error; the remaining variants are failures of the run but never of the
/// hosting process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminationSignal {
    /// The guest requested termination with the given exit code.
    #[error("process exited with code {0}")]
    Exited(i32),

    /// The guest triggered a trap-style abort.
    #[error("aborted: {0}")]
    Aborted(String),

    /// The guest called a capability the host never defined.
    #[error("{namespace}.{name} not implemented")]
    UnimplementedCall {
        /// The import namespace of the missing capability.
        namespace: String,
        /// The capability name.
        name: String,
    },

    /// A host-side contract was violated: bad file descriptor, oversized
    /// character in string marshaling, out-of-range memory access or copy.
    #[error("assertion failed: {0}")]
    AssertionFailed(String),
}

impl TerminationSignal {
    /// Shorthand for an [`TerminationSignal::UnimplementedCall`] signal.
    pub fn unimplemented(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnimplementedCall {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Whether this signal is a graceful, guest-requested exit.
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exited(_))
    }

    /// The exit code, for `Exited` signals.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_display() {
        assert_eq!(
            TerminationSignal::Exited(42).to_string(),
            "process exited with code 42"
        );
        assert_eq!(
            TerminationSignal::unimplemented("wasi_unstable", "clock_time_get").to_string(),
            "wasi_unstable.clock_time_get not implemented"
        );
    }

    #[test]
    fn test_signal_recovered_by_downcast() {
        let err = wasmtime::Error::from(TerminationSignal::Exited(7));
        let signal = err.downcast::<TerminationSignal>().unwrap();
        assert_eq!(signal.exit_code(), Some(7));
    }

    #[test]
    fn test_only_exited_is_exit() {
        assert!(TerminationSignal::Exited(0).is_exit());
        assert!(!TerminationSignal::Aborted("abort".into()).is_exit());
        assert!(!TerminationSignal::AssertionFailed("x".into()).is_exit());
    }
}
