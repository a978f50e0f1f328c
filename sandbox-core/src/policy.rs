//! Per-profile policy tables: syscall allow-list, rlimit vector, namespace
//! flag mask.
//!
//! Policy is compile-time data, not something discovered or negotiated at
//! run time — a misconfigured policy is meant to fail at build time, not
//! inside an untrusted process. See `seccomp` for how the allow-list becomes
//! a loaded BPF program and `isolation` for how the rlimit vector is
//! applied.

use std::time::Duration;

/// One ceiling per `setrlimit(2)` resource this launcher bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlimitVector {
    /// `RLIMIT_STACK`, in bytes.
    pub stack_bytes: u64,
    /// `RLIMIT_NOFILE`, in file descriptors.
    pub nofile: u64,
    /// `RLIMIT_AS`, in bytes.
    pub address_space_bytes: u64,
    /// `RLIMIT_NPROC`, in processes.
    pub nproc: u64,
}

const MIB: u64 = 1024 * 1024;

/// Minimum ceilings required by the strict profile (spec §3): stack 8 MiB,
/// nofile 64, address space 128 MiB, nproc 20.
pub const STRICT_RLIMITS: RlimitVector = RlimitVector {
    stack_bytes: 8 * MIB,
    nofile: 64,
    address_space_bytes: 128 * MIB,
    nproc: 20,
};

/// Resource-aware keeps the strict nproc ceiling (Open Question (b) in
/// spec.md §9 is resolved in DESIGN.md as "do not relax"), but gives the
/// child more headroom for files and address space, since this profile is
/// meant for workloads that are expected to do real work rather than be
/// maximally distrusted.
pub const RESOURCE_AWARE_RLIMITS: RlimitVector = RlimitVector {
    stack_bytes: 8 * MIB,
    nofile: 256,
    address_space_bytes: 512 * MIB,
    nproc: 20,
};

/// Learning shares the strict ceilings; it differs from strict only in how
/// a disallowed syscall is handled (see `Profile::violation_action`).
pub const LEARNING_RLIMITS: RlimitVector = STRICT_RLIMITS;

/// Syscall allow-list: the minimum set from spec §3. Every profile in this
/// implementation uses this same list — the profiles are differentiated by
/// rlimits and violation handling, not by a wider or narrower syscall set,
/// since spec §3 only ever defines "the" allow-list and never gives
/// resource-aware or learning a distinct one.
///
/// Names are resolved to syscall numbers by `seccomp::syscall_number`.
/// `arch_prctl` is x86_64-specific; aarch64 has no equivalent process
/// control primitive in this minimal set and is simply not added there.
#[cfg(target_arch = "x86_64")]
pub const ALLOWED_SYSCALLS: &[&str] = &[
    // Process image replacement.
    "execve",
    // Memory mapping and protection.
    "brk",
    "mmap",
    "munmap",
    "mprotect",
    // Normal termination (single-thread and group).
    "exit",
    "exit_group",
    // Per-architecture process control.
    "arch_prctl",
    // Byte-stream I/O.
    "read",
    "write",
    "writev",
    "lseek",
    "close",
    "fstat",
    "newfstatat",
    // Path-relative open.
    "openat",
    // Symbolic-link read.
    "readlink",
    "readlinkat",
    // Secure random bytes.
    "getrandom",
];

/// aarch64 has no direct equivalent of `arch_prctl`; the rest of the
/// minimum set from spec §3 is architecture-independent.
#[cfg(not(target_arch = "x86_64"))]
pub const ALLOWED_SYSCALLS: &[&str] = &[
    "execve",
    "brk",
    "mmap",
    "munmap",
    "mprotect",
    "exit",
    "exit_group",
    "read",
    "write",
    "writev",
    "lseek",
    "close",
    "fstat",
    "newfstatat",
    "openat",
    "readlink",
    "readlinkat",
    "getrandom",
];

/// How the syscall filter installed by a profile should react to a
/// disallowed syscall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationAction {
    /// Kill the offending process immediately (spec §4.1: the default
    /// action is immediate kill, never errno or trap).
    Kill,
    /// Record the violation and still kill. Spec.md's Open Question (a)
    /// leaves learning's behavior undefined between log-and-allow and
    /// log-and-kill; DESIGN.md resolves it as log-and-kill, since
    /// log-and-allow would mean an untrusted child executes a syscall
    /// outside its declared policy, which this spec's invariant (i) rules
    /// out for every profile.
    LogAndKill,
}

/// A named bundle of policy: syscall allow-list, rlimit vector, namespace
/// flag mask, and violation handling. Represented as a tagged variant
/// carrying immutable policy data rather than as runtime-constructed
/// configuration (spec §9: "Profile selection is the only polymorphism").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Strict,
    ResourceAware,
    Learning,
}

impl Profile {
    /// Parse a `--profile` token. Spec §6: unknown tokens are not an error
    /// here — the caller (CLI) is responsible for warning and defaulting to
    /// `Strict`.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "STRICT" => Some(Profile::Strict),
            "RESOURCE-AWARE" => Some(Profile::ResourceAware),
            "LEARNING" => Some(Profile::Learning),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Strict => "strict",
            Profile::ResourceAware => "resource-aware",
            Profile::Learning => "learning",
        }
    }

    /// The syscall allow-list for this profile.
    pub fn allowed_syscalls(&self) -> &'static [&'static str] {
        ALLOWED_SYSCALLS
    }

    /// The rlimit vector for this profile.
    pub fn rlimits(&self) -> RlimitVector {
        match self {
            Profile::Strict => STRICT_RLIMITS,
            Profile::ResourceAware => RESOURCE_AWARE_RLIMITS,
            Profile::Learning => LEARNING_RLIMITS,
        }
    }

    /// How a disallowed syscall should be handled under this profile.
    pub fn violation_action(&self) -> ViolationAction {
        match self {
            Profile::Strict | Profile::ResourceAware => ViolationAction::Kill,
            Profile::Learning => ViolationAction::LogAndKill,
        }
    }

    /// The sample cadence for the supervisor's monitoring loop (spec §4.5,
    /// §5): fixed at 100 ms for every profile.
    pub const fn sample_interval() -> Duration {
        Duration::from_millis(100)
    }

    /// The maximum number of telemetry samples retained before silent drop
    /// (spec §3, §4.7): fixed at 1,000 for every profile.
    pub const fn max_samples() -> usize {
        1000
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Namespace flags every profile requests when creating the child (spec
/// §4.4): mount, PID, IPC, UTS, and user. This mask never varies by
/// profile.
pub fn namespace_flags() -> nix::sched::CloneFlags {
    use nix::sched::CloneFlags;
    CloneFlags::CLONE_NEWNS
        | CloneFlags::CLONE_NEWPID
        | CloneFlags::CLONE_NEWIPC
        | CloneFlags::CLONE_NEWUTS
        | CloneFlags::CLONE_NEWUSER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Profile::parse("strict"), Some(Profile::Strict));
        assert_eq!(Profile::parse("STRICT"), Some(Profile::Strict));
        assert_eq!(Profile::parse("resource-aware"), Some(Profile::ResourceAware));
        assert_eq!(Profile::parse("LEARNING"), Some(Profile::Learning));
    }

    #[test]
    fn parse_rejects_unknown_tokens() {
        assert_eq!(Profile::parse("paranoid"), None);
        assert_eq!(Profile::parse(""), None);
    }

    #[test]
    fn strict_allow_list_has_minimum_required_syscalls() {
        let required = [
            "execve", "brk", "mmap", "munmap", "mprotect", "exit", "exit_group", "read", "write",
            "writev", "lseek", "close", "fstat", "openat", "readlink", "getrandom",
        ];
        let allowed = Profile::Strict.allowed_syscalls();
        for syscall in required {
            assert!(
                allowed.contains(&syscall),
                "strict profile missing required syscall: {syscall}"
            );
        }
    }

    #[test]
    fn rlimits_meet_minimum_ceilings() {
        let strict = Profile::Strict.rlimits();
        assert_eq!(strict.stack_bytes, 8 * MIB);
        assert_eq!(strict.nofile, 64);
        assert_eq!(strict.address_space_bytes, 128 * MIB);
        assert_eq!(strict.nproc, 20);
    }

    #[test]
    fn resource_aware_does_not_relax_nproc() {
        assert_eq!(Profile::ResourceAware.rlimits().nproc, 20);
    }

    #[test]
    fn strict_and_resource_aware_kill_on_violation() {
        assert_eq!(Profile::Strict.violation_action(), ViolationAction::Kill);
        assert_eq!(Profile::ResourceAware.violation_action(), ViolationAction::Kill);
    }

    #[test]
    fn learning_still_kills_but_is_distinguished() {
        assert_eq!(Profile::Learning.violation_action(), ViolationAction::LogAndKill);
    }
}
