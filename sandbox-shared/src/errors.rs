//! Error types used across the sandbox launcher.

use thiserror::Error;

/// Result type for sandbox launcher operations.
pub type SandboxResult<T> = Result<T, SandboxError>;

#[derive(Debug, Error)]
pub enum SandboxError {
    /// Child-stack allocation or namespace-creation failure. The sandbox
    /// could not be established; no telemetry is produced for the run.
    #[error("setup error: {0}")]
    Setup(String),

    /// rlimit installation failed.
    #[error("resource limit error: {0}")]
    Rlimit(String),

    /// Seccomp filter construction or installation failed.
    #[error("seccomp error: {0}")]
    Seccomp(String),

    /// The child could not replace its image with the target executable.
    #[error("exec error: {0}")]
    ChildExec(String),

    /// Telemetry serialization or log-file write failure. Never alters
    /// child disposition.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<std::io::Error> for SandboxError {
    fn from(err: std::io::Error) -> Self {
        SandboxError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SandboxError {
    fn from(err: serde_json::Error) -> Self {
        SandboxError::Json(err.to_string())
    }
}
