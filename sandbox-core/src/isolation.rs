//! Isolation setup executed inside the child, before the syscall filter is
//! installed and the image is replaced (spec §4.3).
//!
//! Steps run in a fixed order: mount-tree privatization, read-only root
//! remount, rlimit application. The first two are best-effort — an
//! unprivileged user namespace can refuse them — and a failure there is
//! logged, not propagated, since the remaining layers (rlimits, the syscall
//! filter) still bound what the child can do. rlimit failures are fatal:
//! spec §4.3 lists them as one of the layers a broken or absent cgroup setup
//! depends on, so silently running without them would widen the sandbox
//! without telling anyone.
//!
//! Mount handling is adapted from the teacher's
//! `libnexuscontainer::namespace::NamespaceManager::setup_mount_namespace`,
//! which marks `/` `MS_SLAVE`; this spec calls for full privatization, so
//! the flag here is `MS_PRIVATE` instead.

use crate::policy::RlimitVector;
use sandbox_shared::{SandboxError, SandboxResult};

/// Recursively mark `/` private so mount operations performed inside the
/// child's mount namespace never propagate back to the host. Best-effort:
/// logged on failure, never fatal.
pub fn privatize_mounts() {
    use nix::mount::{mount, MsFlags};

    let result = mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_PRIVATE | MsFlags::MS_REC,
        None::<&str>,
    );

    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to privatize mount tree; continuing best-effort");
    }
}

/// Remount `/` bind+read-only. Best-effort for the same reason as
/// `privatize_mounts`: an unprivileged user namespace may reject it.
pub fn remount_root_readonly() {
    use nix::mount::{mount, MsFlags};

    let bind = mount(
        Some("/"),
        "/",
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REC,
        None::<&str>,
    );
    if let Err(e) = bind {
        tracing::warn!(error = %e, "failed to bind-mount root; skipping read-only remount");
        return;
    }

    let remount = mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_BIND | MsFlags::MS_REMOUNT | MsFlags::MS_RDONLY | MsFlags::MS_REC,
        None::<&str>,
    );
    if let Err(e) = remount {
        tracing::warn!(error = %e, "failed to remount root read-only; continuing best-effort");
    }
}

/// Apply a resource-limit vector via raw `setrlimit(2)` calls. Uses `libc`
/// directly rather than a higher-level wrapper, in the same async-signal-safe
/// spirit as the teacher's `jailer::cgroup::add_self_to_cgroup_raw`: this
/// runs after `clone()` and before `execve`, a context where panicking or
/// allocating unexpectedly is something to avoid.
///
/// Fatal on failure (spec §4.3): unlike the mount steps, rlimits are one of
/// the layers this design depends on when cgroups are absent or broken, so a
/// silent downgrade here would widen the sandbox without telling anyone.
pub fn apply_rlimits(limits: &RlimitVector) -> SandboxResult<()> {
    set_rlimit(libc::RLIMIT_STACK, limits.stack_bytes)?;
    set_rlimit(libc::RLIMIT_NOFILE, limits.nofile)?;
    set_rlimit(libc::RLIMIT_AS, limits.address_space_bytes)?;
    set_rlimit(libc::RLIMIT_NPROC, limits.nproc)?;
    Ok(())
}

fn set_rlimit(resource: libc::__rlimit_resource_t, value: u64) -> SandboxResult<()> {
    let limit = libc::rlimit {
        rlim_cur: value,
        rlim_max: value,
    };
    // SAFETY: `limit` is a plain-old-data struct fully initialized above;
    // `setrlimit` only reads it.
    let rc = unsafe { libc::setrlimit(resource, &limit) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        return Err(SandboxError::Rlimit(format!(
            "setrlimit({resource}, {value}) failed: {err}"
        )));
    }
    Ok(())
}

/// Run the full isolation sequence in spec order: privatize, remount
/// read-only, apply rlimits. Steps 1-2 are best-effort; step 3 is fatal.
pub fn setup(limits: &RlimitVector) -> SandboxResult<()> {
    privatize_mounts();
    remount_root_readonly();
    apply_rlimits(limits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rlimit_rejects_an_unknown_resource() {
        // A resource value outside the kernel's known set (not a real
        // RLIMIT_* constant) must surface as an error, not panic.
        let bogus_resource: libc::__rlimit_resource_t = libc::__rlimit_resource_t::MAX;
        let result = set_rlimit(bogus_resource, 1024);
        assert!(result.is_err());
    }
}
