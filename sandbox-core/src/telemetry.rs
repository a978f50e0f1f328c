//! Telemetry recorder (spec §4.7): an in-memory sample buffer, a summary
//! record, and the JSON document the supervisor writes under `logs/` at the
//! end of a run.
//!
//! The lazy `logs/` directory creation follows the teacher's
//! `init_logging_for`, which creates its log directory with
//! `create_dir_all` the first time it is needed rather than at startup
//! unconditionally.
//!
//! Field names on `Summary` are renamed at the serde boundary to match the
//! external schema from spec §6 (`runtime_ms`, `peak_cpu`, ...) while the
//! Rust-side names stay self-descriptive (`total_runtime_ms`,
//! `peak_cpu_percent`, ...).

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::exit_reason::ExitReason;
use sandbox_shared::{SandboxError, SandboxResult};

/// One (elapsed_ms, cpu_percent, memory_kb) reading (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub elapsed_ms: u64,
    pub cpu_percent: u32,
    pub memory_kb: u64,
}

/// In-memory append-only buffer, capped at `Profile::max_samples()` entries
/// (spec invariant: "Samples form an ordered sequence of up to 1,000
/// entries"). Appends beyond the cap are silently dropped, per spec §4.7 —
/// the summary's peak fields still track the true peak regardless (spec
/// invariant (iv)), since the recorder is fed each sample's peak-relevant
/// fields directly by the supervisor before the sample is (possibly)
/// dropped.
#[derive(Debug, Default)]
pub struct Recorder {
    samples: Vec<Sample>,
    cap: usize,
    peak_cpu_percent: u32,
    peak_memory_kb: u64,
    cumulative_minflt: u64,
    cumulative_majflt: u64,
}

impl Recorder {
    pub fn new(cap: usize) -> Self {
        Recorder {
            samples: Vec::new(),
            cap,
            peak_cpu_percent: 0,
            peak_memory_kb: 0,
            cumulative_minflt: 0,
            cumulative_majflt: 0,
        }
    }

    /// Record one poll's reading. Peaks and fault counters are updated
    /// unconditionally (spec invariant (iv)); only the timeline entry itself
    /// is subject to the cap.
    pub fn record(&mut self, sample: Sample, minflt: u64, majflt: u64) {
        self.peak_cpu_percent = self.peak_cpu_percent.max(sample.cpu_percent);
        self.peak_memory_kb = self.peak_memory_kb.max(sample.memory_kb);
        self.cumulative_minflt = minflt;
        self.cumulative_majflt = majflt;

        if self.samples.len() < self.cap {
            self.samples.push(sample);
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Compose the final log document. `final_memory_kb` and
    /// `final_cpu_percent` are folded into the running peaks one last time
    /// (spec invariant (iv): "the componentwise max over all samples *plus
    /// any final reading*").
    #[allow(clippy::too_many_arguments)]
    pub fn finish(
        mut self,
        pid: i32,
        program: String,
        profile: String,
        total_runtime_ms: u64,
        final_cpu_percent: u32,
        final_memory_kb: u64,
        exit_reason: ExitReason,
        termination_signal: String,
        blocked_syscall: String,
    ) -> TelemetryLog {
        self.peak_cpu_percent = self.peak_cpu_percent.max(final_cpu_percent);
        self.peak_memory_kb = self.peak_memory_kb.max(final_memory_kb);

        let timeline = Timeline {
            time_ms: self.samples.iter().map(|s| s.elapsed_ms).collect(),
            cpu_percent: self.samples.iter().map(|s| s.cpu_percent).collect(),
            memory_kb: self.samples.iter().map(|s| s.memory_kb).collect(),
        };

        let summary = Summary {
            total_runtime_ms,
            peak_cpu_percent: self.peak_cpu_percent,
            peak_memory_kb: self.peak_memory_kb,
            minor_page_faults: self.cumulative_minflt,
            major_page_faults: self.cumulative_majflt,
            termination_signal,
            blocked_syscall,
            exit_reason,
        };

        TelemetryLog { pid, program, profile, timeline, summary }
    }
}

/// Timeline as three parallel arrays, chosen for compactness and trivial
/// plotting ingest over an array-of-records layout (spec §4.7).
#[derive(Debug, Serialize)]
pub struct Timeline {
    time_ms: Vec<u64>,
    cpu_percent: Vec<u32>,
    memory_kb: Vec<u64>,
}

/// The `summary` object from the spec §6 schema.
#[derive(Debug, Serialize)]
pub struct Summary {
    #[serde(rename = "runtime_ms")]
    total_runtime_ms: u64,
    #[serde(rename = "peak_cpu")]
    peak_cpu_percent: u32,
    peak_memory_kb: u64,
    #[serde(rename = "page_faults_minor")]
    minor_page_faults: u64,
    #[serde(rename = "page_faults_major")]
    major_page_faults: u64,
    #[serde(rename = "termination")]
    termination_signal: String,
    blocked_syscall: String,
    exit_reason: ExitReason,
}

/// The full document written to a log file: top-level `pid`, `program`,
/// `profile`, plus `timeline` and `summary` (spec §6).
#[derive(Debug, Serialize)]
pub struct TelemetryLog {
    pid: i32,
    program: String,
    profile: String,
    timeline: Timeline,
    summary: Summary,
}

impl TelemetryLog {
    /// Serialize and write this log under `logs_dir`, creating the
    /// directory if absent. Filename is derived from a Unix-seconds
    /// timestamp: `run_<unix_seconds>.json`.
    pub fn write(&self, logs_dir: &Path, unix_seconds: u64) -> SandboxResult<PathBuf> {
        std::fs::create_dir_all(logs_dir)
            .map_err(|e| SandboxError::Telemetry(format!("failed to create {}: {e}", logs_dir.display())))?;

        let path = logs_dir.join(format!("run_{unix_seconds}.json"));
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)
            .map_err(|e| SandboxError::Telemetry(format!("failed to write {}: {e}", path.display())))?;
        Ok(path)
    }
}
