//! Termination classification (spec §4.6): turns a reaped wait status into
//! the four-way exit-reason tag plus the optional signal/syscall labels the
//! telemetry summary carries.

use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use serde::{Serialize, Serializer};

/// The exit-reason tag from spec §3's summary record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Normal exit, carrying the exit code.
    Exited(i32),
    /// Killed by the installed syscall filter (`SIGSYS`).
    SecurityViolation,
    /// Killed by `SIGKILL` — typically OOM or an external cgroup kill.
    KilledByOs,
    /// Any other fatal signal.
    Signaled,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Exited(code) => write!(f, "EXITED({code})"),
            ExitReason::SecurityViolation => write!(f, "SECURITY_VIOLATION"),
            ExitReason::KilledByOs => write!(f, "KILLED_BY_OS"),
            ExitReason::Signaled => write!(f, "SIGNALED"),
        }
    }
}

// The schema in spec §6 represents `exit_reason` as a single string
// (`"EXITED(0)"`, `"SECURITY_VIOLATION"`, ...), not as a serde-tagged enum,
// so serialization goes through `Display` rather than `#[derive(Serialize)]`.
impl Serialize for ExitReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The classification plus the two informational labels spec §3 attaches to
/// a summary: a termination-signal label (`"SIG<n>"` or empty) and a
/// blocked-syscall label (currently only ever `"Unknown(SIGSYS)"` or empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub reason: ExitReason,
    pub termination_signal: String,
    pub blocked_syscall: String,
}

/// Classify a reaped `WaitStatus` per the spec §4.6 table.
pub fn classify(status: WaitStatus) -> Classification {
    match status {
        WaitStatus::Exited(_, code) => Classification {
            reason: ExitReason::Exited(code),
            termination_signal: String::new(),
            blocked_syscall: String::new(),
        },
        WaitStatus::Signaled(_, Signal::SIGSYS, _) => Classification {
            reason: ExitReason::SecurityViolation,
            termination_signal: format!("SIG{}", Signal::SIGSYS as i32),
            blocked_syscall: "Unknown(SIGSYS)".to_string(),
        },
        WaitStatus::Signaled(_, Signal::SIGKILL, _) => Classification {
            reason: ExitReason::KilledByOs,
            termination_signal: format!("SIG{}", Signal::SIGKILL as i32),
            blocked_syscall: String::new(),
        },
        WaitStatus::Signaled(_, signal, _) => Classification {
            reason: ExitReason::Signaled,
            termination_signal: format!("SIG{}", signal as i32),
            blocked_syscall: String::new(),
        },
        // Any other WaitStatus variant (Stopped, Continued, ...) cannot
        // occur from a blocking-to-terminal `waitpid` on a child that does
        // not use WUNTRACED/WCONTINUED; treat defensively as a plain signal
        // rather than panicking the supervisor.
        other => Classification {
            reason: ExitReason::Signaled,
            termination_signal: format!("{other:?}"),
            blocked_syscall: String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_exit_is_exited() {
        let status = WaitStatus::Exited(nix::unistd::Pid::from_raw(1), 7);
        let c = classify(status);
        assert_eq!(c.reason, ExitReason::Exited(7));
        assert_eq!(c.termination_signal, "");
        assert_eq!(c.blocked_syscall, "");
        assert_eq!(c.reason.to_string(), "EXITED(7)");
    }

    #[test]
    fn sigsys_is_security_violation() {
        let status = WaitStatus::Signaled(nix::unistd::Pid::from_raw(1), Signal::SIGSYS, false);
        let c = classify(status);
        assert_eq!(c.reason, ExitReason::SecurityViolation);
        assert_eq!(c.blocked_syscall, "Unknown(SIGSYS)");
        assert_eq!(c.reason.to_string(), "SECURITY_VIOLATION");
    }

    #[test]
    fn sigkill_is_killed_by_os() {
        let status = WaitStatus::Signaled(nix::unistd::Pid::from_raw(1), Signal::SIGKILL, false);
        let c = classify(status);
        assert_eq!(c.reason, ExitReason::KilledByOs);
        assert_eq!(c.reason.to_string(), "KILLED_BY_OS");
    }

    #[test]
    fn other_signal_is_signaled() {
        let status = WaitStatus::Signaled(nix::unistd::Pid::from_raw(1), Signal::SIGTERM, false);
        let c = classify(status);
        assert_eq!(c.reason, ExitReason::Signaled);
        assert_eq!(c.termination_signal, format!("SIG{}", Signal::SIGTERM as i32));
        assert_eq!(c.reason.to_string(), "SIGNALED");
    }
}
