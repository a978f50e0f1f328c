//! Clock and `/proc` reader (spec §4.5): pulls cumulative CPU ticks and
//! fault counters from `/proc/<pid>/stat`, and peak virtual memory from
//! `/proc/<pid>/status`, for the supervisor's polling loop.
//!
//! Reads go through `std::fs::read_to_string`, the same approach the teacher
//! uses for other single-shot `/proc` and `/sys` reads (see
//! `jailer::bwrap::boot_id`'s read of `/proc/sys/kernel/random/boot_id`).

use sandbox_shared::{SandboxError, SandboxResult};

/// Cumulative counters read from `/proc/<pid>/stat` at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatSnapshot {
    /// utime + stime, in clock ticks (`sysconf(_SC_CLK_TCK)` units).
    pub total_ticks: u64,
    /// Cumulative minor page faults.
    pub minflt: u64,
    /// Cumulative major page faults.
    pub majflt: u64,
}

/// Read and parse `/proc/<pid>/stat`.
///
/// The process name field (`comm`) is parenthesized and may itself contain
/// spaces or parentheses, so every other field is located relative to the
/// *last* `)` in the line rather than by naive whitespace splitting — this
/// is the same defensive approach the `proc` family of crates documents as
/// required for `stat` parsing.
pub fn read_stat(pid: i32) -> SandboxResult<StatSnapshot> {
    let path = format!("/proc/{pid}/stat");
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| SandboxError::Telemetry(format!("failed to read {path}: {e}")))?;

    let after_comm = contents
        .rfind(')')
        .map(|idx| &contents[idx + 1..])
        .ok_or_else(|| SandboxError::Telemetry(format!("malformed {path}: no ')' found")))?;

    // Fields after `comm`, 1-indexed from `state` (field 3) in the proc(5)
    // table: state(3) ... utime(14) stime(15) ... minflt is field 10,
    // majflt is field 12 (both before utime/stime).
    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    // `fields[0]` is field 3 (`state`); field N is `fields[N - 3]`.
    let field = |n: usize| -> SandboxResult<&str> {
        fields
            .get(n - 3)
            .copied()
            .ok_or_else(|| SandboxError::Telemetry(format!("malformed {path}: missing field {n}")))
    };

    let parse_u64 = |s: &str, name: &str| -> SandboxResult<u64> {
        s.parse::<u64>()
            .map_err(|e| SandboxError::Telemetry(format!("malformed {path}: field {name} ({s:?}): {e}")))
    };

    let minflt = parse_u64(field(10)?, "minflt")?;
    let majflt = parse_u64(field(12)?, "majflt")?;
    let utime = parse_u64(field(14)?, "utime")?;
    let stime = parse_u64(field(15)?, "stime")?;

    Ok(StatSnapshot {
        total_ticks: utime + stime,
        minflt,
        majflt,
    })
}

/// Read peak virtual memory (`VmPeak`) from `/proc/<pid>/status`, in KiB.
pub fn read_vm_peak_kb(pid: i32) -> SandboxResult<u64> {
    let path = format!("/proc/{pid}/status");
    let contents = std::fs::read_to_string(&path)
        .map_err(|e| SandboxError::Telemetry(format!("failed to read {path}: {e}")))?;

    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("VmPeak:") {
            let digits = rest.trim().trim_end_matches(" kB").trim();
            return digits
                .parse::<u64>()
                .map_err(|e| SandboxError::Telemetry(format!("malformed VmPeak line {rest:?}: {e}")));
        }
    }

    // A process that has not yet touched any memory (vanishingly rare, but
    // possible in the instant after clone) may not have VmPeak populated
    // yet; treat as zero rather than erroring the whole sample.
    Ok(0)
}

/// Clock ticks per second (`sysconf(_SC_CLK_TCK)`), used to convert
/// cumulative ticks into seconds of CPU time.
pub fn clock_ticks_per_second() -> u64 {
    // SAFETY: `sysconf` with a valid name constant has no preconditions.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as u64
    } else {
        100 // conventional default on Linux when sysconf fails
    }
}
