mod cli;

use std::process;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sandbox_core::RunConfig;

fn main() {
    // `try_parse` instead of `parse` so a missing executable or bad flag
    // exits 1 (spec §6), not clap's default usage-error code of 2.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprint!("{e}");
            process::exit(1);
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(error) = run(cli) {
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let profile = cli.resolve_profile();

    tracing::info!(
        executable = %cli.executable,
        profile = %profile,
        "starting sandboxed run"
    );

    let config = RunConfig {
        target: cli.executable.clone(),
        args: cli.args.clone(),
        profile,
    };

    let unix_seconds = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("system clock is before the Unix epoch: {e}"))?
        .as_secs();

    let log_path = sandbox_core::run(&config, &cli.logs_dir, unix_seconds)?;

    tracing::info!(log_path = %log_path.display(), "run complete");
    println!("telemetry log written to {}", log_path.display());

    Ok(())
}
