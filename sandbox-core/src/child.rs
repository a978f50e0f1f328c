//! Code that runs inside the freshly-cloned child, before image replacement
//! (spec §4.4): isolation setup, syscall filter install, then `execve`.
//!
//! Command and environment preparation are adapted from the teacher's
//! `libnexuscontainer::child_process::{prepare_command, prepare_env,
//! execute_command}`; the host-facing API is narrowed to what this design
//! needs (no custom environment override, no `execvpe` — the allow-list has
//! no `execve`-with-environment variant distinct from plain `execve`, so
//! `nix::unistd::execvp` inheriting the parent's environment is used
//! instead).

use std::ffi::CString;

use crate::isolation;
use crate::policy::Profile;
use crate::seccomp;
use sandbox_shared::{SandboxError, SandboxResult};

fn to_cstring(s: &str) -> SandboxResult<CString> {
    CString::new(s).map_err(|e| SandboxError::ChildExec(format!("argument contains NUL byte: {e}")))
}

fn prepare_argv(target: &str, args: &[String]) -> SandboxResult<Vec<CString>> {
    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(to_cstring(target)?);
    for arg in args {
        argv.push(to_cstring(arg)?);
    }
    Ok(argv)
}

/// Run the full child-side sequence: isolation setup, syscall filter
/// install, then `execve`. Never returns on success — `execve` replaces the
/// process image. On any failure the caller must exit non-zero without
/// falling through to further setup (spec §4.4: no silent downgrade).
///
/// # Safety
/// Must run on the newly-cloned child immediately after `clone()` returns in
/// the child, before any other work. Calling this from the supervisor
/// process would apply rlimits and a syscall filter to the supervisor
/// itself.
pub fn run(target: &str, args: &[String], profile: Profile) -> SandboxResult<()> {
    isolation::setup(&profile.rlimits())?;
    seccomp::install(profile)?;

    let argv = prepare_argv(target, args)?;
    let path = to_cstring(target)?;

    // execvp only returns on failure; a success replaces this process image
    // entirely and the function never returns.
    let err = nix::unistd::execvp(&path, &argv).unwrap_err();
    Err(SandboxError::ChildExec(format!(
        "execve of {target} failed: {err}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_argv_puts_target_at_argv_zero() {
        let argv = prepare_argv("/bin/echo", &["hello".to_string()]).unwrap();
        assert_eq!(argv[0].to_str().unwrap(), "/bin/echo");
        assert_eq!(argv[1].to_str().unwrap(), "hello");
        assert_eq!(argv.len(), 2);
    }

    #[test]
    fn prepare_argv_rejects_interior_nul() {
        let result = prepare_argv("/bin/echo", &["bad\0arg".to_string()]);
        assert!(result.is_err());
    }
}
