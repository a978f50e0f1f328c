//! Sandboxed execution engine: runs one untrusted binary under namespace,
//! seccomp, and rlimit isolation, and produces a JSON telemetry log
//! describing how it ran and how it ended.

pub mod child;
pub mod exit_reason;
pub mod isolation;
pub mod policy;
pub mod procfs;
pub mod seccomp;
pub mod supervisor;
pub mod telemetry;

pub use exit_reason::{classify, Classification, ExitReason};
pub use policy::Profile;
pub use supervisor::{run, RunConfig};
