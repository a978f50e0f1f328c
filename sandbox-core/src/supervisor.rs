//! The supervisor (spec §4.4, §4.5): allocates the child's stack, creates it
//! in new namespaces, polls liveness at a fixed cadence, accumulates
//! telemetry, reaps, classifies termination, and emits the log.
//!
//! The polling loop's shape — sleep a fixed interval, check a liveness
//! condition, act — is adapted from the teacher's
//! `bin/shim::start_parent_watchdog`, which polls `is_process_alive` once a
//! second in its own thread. This supervisor runs the loop on the calling
//! thread instead, since spec §5 has the loop be the only thread of control
//! the supervisor needs.

use std::time::Instant;

use nix::sched::clone;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::exit_reason::classify;
use crate::policy::{self, Profile};
use crate::procfs;
use crate::telemetry::{Recorder, Sample};
use sandbox_shared::{SandboxError, SandboxResult};

/// Immutable input for one supervised run (spec §3 "Run configuration").
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Absolute path of the target executable.
    pub target: String,
    /// Arguments passed to the target. `argv[0]` is `target` by convention;
    /// this list holds everything after it.
    pub args: Vec<String>,
    pub profile: Profile,
}

const CHILD_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Create the child in new namespaces and run it to completion, producing a
/// telemetry log. This is the supervisor's entire job for one invocation
/// (spec invariant (v): exactly one summary log per invocation).
pub fn run(config: &RunConfig, logs_dir: &std::path::Path, unix_seconds: u64) -> SandboxResult<std::path::PathBuf> {
    let start = Instant::now();
    let (pid, stack) = spawn_child(config)?;

    let (recorder, status, (final_cpu_percent, final_memory_kb)) =
        poll_until_exit(pid, &mut Recorder::new(Profile::max_samples()), start)?;

    // The child has been reaped: its `/proc` entry and cloned address space
    // are gone, and the stack it ran on (spec §4.4) is deallocated here.
    drop(stack);

    let total_runtime_ms = start.elapsed().as_millis() as u64;
    let classification = classify(status);

    let log = recorder.finish(
        pid.as_raw(),
        config.target.clone(),
        config.profile.name().to_string(),
        total_runtime_ms,
        final_cpu_percent,
        final_memory_kb,
        classification.reason,
        classification.termination_signal,
        classification.blocked_syscall,
    );

    log.write(logs_dir, unix_seconds)
}

fn cpu_percent(total_ticks: u64, wall_seconds: f64) -> u32 {
    if wall_seconds <= 0.0 {
        return 0;
    }
    let hz = procfs::clock_ticks_per_second() as f64;
    let percent = 100.0 * (total_ticks as f64 / hz) / wall_seconds;
    percent.round().clamp(0.0, u32::MAX as f64) as u32
}

/// Allocate the child's stack and create it with the namespace flag mask
/// from spec §4.4. The child itself runs `child::run` to completion. The
/// stack is returned to the caller rather than leaked: it must stay valid
/// for as long as the child may still be running, so the caller is
/// responsible for holding it until the child is reaped.
fn spawn_child(config: &RunConfig) -> SandboxResult<(Pid, Vec<u8>)> {
    let mut stack = vec![0u8; CHILD_STACK_SIZE];
    let flags = policy::namespace_flags();

    let target = config.target.clone();
    let args = config.args.clone();
    let profile = config.profile;

    let child_fn = Box::new(move || -> isize {
        match crate::child::run(&target, &args, profile) {
            Ok(()) => unreachable!("child::run only returns on failure"),
            Err(e) => {
                tracing::error!(error = %e, "child setup/exec failed");
                127
            }
        }
    });

    // SAFETY: `stack` is sized generously above for the child's full call
    // depth, and the caller keeps it alive until the child has been reaped.
    let pid = unsafe { clone(child_fn, &mut stack, flags, Some(libc::SIGCHLD)) }
        .map_err(|e| SandboxError::Setup(format!("clone() failed: {e}")))?;

    Ok((pid, stack))
}

/// Poll at the fixed 100 ms cadence until the child is reaped (spec §4.5).
///
/// Each iteration reads `/proc` *before* checking for exit, so the reading
/// taken on the iteration that observes the reap is the freshest available —
/// effectively a reading computed at reap time, not a stale periodic sample
/// up to 100 ms old. That reading is returned alongside the recorder and
/// wait status for the caller to fold into the summary's peak fields.
fn poll_until_exit(
    pid: Pid,
    recorder: &mut Recorder,
    start: Instant,
) -> SandboxResult<(Recorder, WaitStatus, (u32, u64))> {
    let mut last_reading = (0u32, 0u64);

    loop {
        if let (Ok(stat), Ok(vm_peak_kb)) =
            (procfs::read_stat(pid.as_raw()), procfs::read_vm_peak_kb(pid.as_raw()))
        {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            let cpu = cpu_percent(stat.total_ticks, start.elapsed().as_secs_f64());
            last_reading = (cpu, vm_peak_kb);
            recorder.record(
                Sample { elapsed_ms, cpu_percent: cpu, memory_kb: vm_peak_kb },
                stat.minflt,
                stat.majflt,
            );
        }

        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {
                std::thread::sleep(Profile::sample_interval());
            }
            Ok(status) => {
                return Ok((std::mem::take(recorder), status, last_reading));
            }
            Err(e) => {
                // The reap call itself erroring is terminal (spec §4.5): do
                // not loop further. Treat as an abnormal signal termination
                // since no further information is available.
                tracing::error!(error = %e, "waitpid failed; treating child as terminated");
                return Ok((
                    std::mem::take(recorder),
                    WaitStatus::Signaled(pid, Signal::SIGKILL, false),
                    last_reading,
                ));
            }
        }
    }
}
