//! Run reports.
//!
//! Every bridged run that reaches an outcome produces a [`RunReport`]: the
//! run identity, summaries of both modules, the wall-clock duration, and the
//! terminal outcome. Reports serialize to JSON for tooling and render to
//! text for the console.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ferry_core::LoadedModule;
use ferry_host::TerminationSignal;

/// Unique identifier for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary of one module in the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSummary {
    /// Module name, if set.
    pub name: Option<String>,
    /// Number of exports.
    pub exports: usize,
    /// Number of declared imports.
    pub imports: usize,
}

impl From<&LoadedModule> for ModuleSummary {
    fn from(module: &LoadedModule) -> Self {
        Self {
            name: module.name().map(String::from),
            exports: module.exports().len(),
            imports: module.imports().len(),
        }
    }
}

/// Serializable mirror of the termination signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Guest-requested termination.
    Exited {
        /// The exit code.
        code: i32,
    },
    /// Guest-triggered trap.
    Aborted {
        /// The abort reason.
        reason: String,
    },
    /// The guest called a capability the host never defined.
    UnimplementedCall {
        /// The import namespace.
        namespace: String,
        /// The capability name.
        name: String,
    },
    /// A host-side contract violation.
    AssertionFailed {
        /// The failure message.
        message: String,
    },
}

impl From<&TerminationSignal> for RunOutcome {
    fn from(signal: &TerminationSignal) -> Self {
        match signal {
            TerminationSignal::Exited(code) => Self::Exited { code: *code },
            TerminationSignal::Aborted(reason) => Self::Aborted {
                reason: reason.clone(),
            },
            TerminationSignal::UnimplementedCall { namespace, name } => Self::UnimplementedCall {
                namespace: namespace.clone(),
                name: name.clone(),
            },
            TerminationSignal::AssertionFailed(message) => Self::AssertionFailed {
                message: message.clone(),
            },
        }
    }
}

impl RunOutcome {
    /// Whether the guest exited with code zero.
    pub fn is_clean_exit(&self) -> bool {
        matches!(self, Self::Exited { code: 0 })
    }

    /// The exit code, for `Exited` outcomes.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exited { code } => Some(*code),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exited { code } => write!(f, "exited with code {code}"),
            Self::Aborted { reason } => write!(f, "aborted: {reason}"),
            Self::UnimplementedCall { namespace, name } => {
                write!(f, "{namespace}.{name} not implemented")
            }
            Self::AssertionFailed { message } => write!(f, "assertion failed: {message}"),
        }
    }
}

/// Complete report of one bridged run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run ID.
    pub run_id: RunId,
    /// Summary of the filesystem module.
    pub filesystem: ModuleSummary,
    /// Summary of the guest module.
    pub guest: ModuleSummary,
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// The terminal outcome.
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Run Report: {}\n", self.run_id));
        output.push_str(&format!(
            "Filesystem module: {} ({} exports)\n",
            self.filesystem.name.as_deref().unwrap_or("<unnamed>"),
            self.filesystem.exports
        ));
        output.push_str(&format!(
            "Guest module: {} ({} imports)\n",
            self.guest.name.as_deref().unwrap_or("<unnamed>"),
            self.guest.imports
        ));
        output.push_str(&format!("Duration: {:?}\n", self.duration));
        output.push_str(&format!("Outcome: {}\n", self.outcome));

        output
    }

    /// Format as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Format as pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ModuleSummary {
        ModuleSummary {
            name: Some("memfs".to_string()),
            exports: 4,
            imports: 2,
        }
    }

    #[test]
    fn test_run_id_uniqueness() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn test_outcome_mirrors_signal() {
        let signal = TerminationSignal::unimplemented("wasi_unstable", "poll_oneoff");
        let outcome = RunOutcome::from(&signal);
        assert_eq!(
            outcome,
            RunOutcome::UnimplementedCall {
                namespace: "wasi_unstable".to_string(),
                name: "poll_oneoff".to_string(),
            }
        );
        assert!(!outcome.is_clean_exit());

        assert!(RunOutcome::from(&TerminationSignal::Exited(0)).is_clean_exit());
        assert_eq!(
            RunOutcome::from(&TerminationSignal::Exited(42)).exit_code(),
            Some(42)
        );
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = RunReport {
            run_id: RunId::new(),
            filesystem: summary(),
            guest: summary(),
            duration: Duration::from_millis(12),
            outcome: RunOutcome::Exited { code: 42 },
        };

        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_id, report.run_id);
        assert_eq!(back.outcome, report.outcome);
    }

    #[test]
    fn test_report_to_text() {
        let report = RunReport {
            run_id: RunId::new(),
            filesystem: summary(),
            guest: summary(),
            duration: Duration::from_millis(3),
            outcome: RunOutcome::Aborted {
                reason: "abort".to_string(),
            },
        };

        let text = report.to_text();
        assert!(text.contains("memfs"));
        assert!(text.contains("aborted: abort"));
    }
}
