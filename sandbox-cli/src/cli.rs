//! CLI definition and argument parsing for the sandbox launcher.
//!
//! Shape follows the teacher's `boxlite_cli::cli` module: a top-level
//! `Parser` struct, `trailing_var_arg` for the "everything after this is the
//! target's own argv" pattern (spec §6:
//! `launcher [--profile=...] <executable> [args...]`).

use std::path::PathBuf;

use clap::Parser;

use sandbox_core::Profile;

#[derive(Parser, Debug)]
#[command(name = "sandbox-launcher", author, version, about = "Runs one untrusted binary under namespace/seccomp/rlimit isolation")]
pub struct Cli {
    /// Isolation profile: STRICT, RESOURCE-AWARE, or LEARNING. Unknown
    /// tokens warn and fall back to STRICT (spec §6).
    #[arg(long, default_value = "STRICT")]
    pub profile: String,

    /// Directory under which `run_<unix_seconds>.json` telemetry logs are
    /// written. Created if absent.
    #[arg(long, default_value = "logs")]
    pub logs_dir: PathBuf,

    /// Absolute path of the executable to run under isolation.
    pub executable: String,

    /// Arguments passed to the executable.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Resolve `--profile` to a `Profile`, warning and defaulting to
    /// `Strict` on an unrecognized token (spec §6).
    pub fn resolve_profile(&self) -> Profile {
        match Profile::parse(&self.profile) {
            Some(profile) => profile,
            None => {
                tracing::warn!(
                    requested = %self.profile,
                    "unknown profile, defaulting to STRICT"
                );
                Profile::Strict
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_profile_falls_back_to_strict() {
        let cli = Cli {
            profile: "paranoid".to_string(),
            logs_dir: PathBuf::from("logs"),
            executable: "/bin/true".to_string(),
            args: vec![],
        };
        assert_eq!(cli.resolve_profile(), Profile::Strict);
    }

    #[test]
    fn known_profile_parses_case_insensitively() {
        let cli = Cli {
            profile: "resource-aware".to_string(),
            logs_dir: PathBuf::from("logs"),
            executable: "/bin/true".to_string(),
            args: vec![],
        };
        assert_eq!(cli.resolve_profile(), Profile::ResourceAware);
    }
}
