//! Shared error types for the sandbox launcher.

pub mod errors;

pub use errors::{SandboxError, SandboxResult};
