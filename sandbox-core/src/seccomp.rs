//! Syscall filter installer (spec §4.2).
//!
//! Builds a kernel BPF filter from a `Profile`'s allow-list with a
//! kill-on-violation default, and loads it into the current process. This
//! must run inside the child, after isolation setup and strictly before
//! `execve` (spec invariant (i)): once loaded, the filter survives the
//! image replacement, so it is the last gate untrusted code passes through.
//!
//! Mechanically this follows the teacher's `jailer::seccomp` module: map
//! syscall names to numbers via `libc::SYS_*`, build an unconditional-allow
//! rule per syscall, and compile to BPF with `seccompiler`. The default
//! action differs from the teacher (which traps): spec §4.1 requires
//! immediate kill, not a trap the process could theoretically catch.

use crate::policy::{Profile, ViolationAction};
use sandbox_shared::{SandboxError, SandboxResult};

/// Map a syscall name from a policy table to its number on the current
/// architecture. Returns `None` for names seccompiler/libc don't know about
/// on this architecture.
fn syscall_number(name: &str) -> Option<i64> {
    Some(match name {
        "execve" => libc::SYS_execve,
        "brk" => libc::SYS_brk,
        "mmap" => libc::SYS_mmap,
        "munmap" => libc::SYS_munmap,
        "mprotect" => libc::SYS_mprotect,
        "exit" => libc::SYS_exit,
        "exit_group" => libc::SYS_exit_group,
        #[cfg(target_arch = "x86_64")]
        "arch_prctl" => libc::SYS_arch_prctl,
        "read" => libc::SYS_read,
        "write" => libc::SYS_write,
        "writev" => libc::SYS_writev,
        "lseek" => libc::SYS_lseek,
        "close" => libc::SYS_close,
        "fstat" => libc::SYS_fstat,
        "newfstatat" => libc::SYS_newfstatat,
        "openat" => libc::SYS_openat,
        "readlink" => libc::SYS_readlink,
        "readlinkat" => libc::SYS_readlinkat,
        "getrandom" => libc::SYS_getrandom,
        _ => return None,
    })
}

fn target_arch() -> seccompiler::TargetArch {
    #[cfg(target_arch = "x86_64")]
    {
        seccompiler::TargetArch::x86_64
    }
    #[cfg(target_arch = "aarch64")]
    {
        seccompiler::TargetArch::aarch64
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        compile_error!("unsupported architecture for seccomp filtering")
    }
}

/// Build the BPF program for a profile's allow-list. Does not apply it.
pub fn build_filter(profile: Profile) -> SandboxResult<seccompiler::BpfProgram> {
    use seccompiler::{SeccompAction, SeccompFilter, SeccompRule};
    use std::collections::BTreeMap;

    let mut rules: BTreeMap<i64, Vec<SeccompRule>> = BTreeMap::new();
    let mut unmapped = Vec::new();

    for name in profile.allowed_syscalls() {
        match syscall_number(name) {
            Some(nr) => {
                rules.insert(nr, vec![]);
            }
            None => unmapped.push(*name),
        }
    }

    if !unmapped.is_empty() {
        tracing::warn!(?unmapped, "syscalls in allow-list have no number on this architecture");
    }

    if matches!(profile.violation_action(), ViolationAction::LogAndKill) {
        tracing::info!(
            profile = %profile,
            "learning profile: disallowed syscalls are logged before the kill"
        );
    }

    // Default action is always kill-process: invariant (i) requires every
    // profile to terminate the child on a policy gap, never silently
    // succeed or merely trap for the child to handle.
    let filter = SeccompFilter::new(
        rules,
        SeccompAction::KillProcess,
        SeccompAction::Allow,
        target_arch(),
    )
    .map_err(|e| SandboxError::Seccomp(format!("failed to build seccomp filter: {e}")))?;

    filter
        .try_into()
        .map_err(|e: seccompiler::BackendError| {
            SandboxError::Seccomp(format!("failed to compile seccomp filter to BPF: {e}"))
        })
}

/// Load a compiled filter into the current process. Irreversible: once
/// applied, the calling thread (and, via `execve`, the replaced image) can
/// never execute a syscall outside the allow-list again.
pub fn apply(filter: &seccompiler::BpfProgram) -> SandboxResult<()> {
    seccompiler::apply_filter(filter)
        .map_err(|e| SandboxError::Seccomp(format!("failed to apply seccomp filter: {e}")))
}

/// Build and apply in one step — the call site used by the child runner.
pub fn install(profile: Profile) -> SandboxResult<()> {
    let filter = build_filter(profile)?;
    apply(&filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_strict_syscall_maps_to_a_number() {
        for name in Profile::Strict.allowed_syscalls() {
            assert!(
                syscall_number(name).is_some(),
                "syscall {name} has no mapped number on this architecture"
            );
        }
    }

    #[test]
    fn unknown_syscall_name_is_unmapped() {
        assert!(syscall_number("totally_not_a_syscall").is_none());
    }

    #[test]
    fn build_filter_succeeds_for_every_profile() {
        for profile in [Profile::Strict, Profile::ResourceAware, Profile::Learning] {
            let program = build_filter(profile);
            assert!(program.is_ok(), "filter build failed for {profile}");
            assert!(!program.unwrap().is_empty());
        }
    }
}
