//! LockSleuth: finds password-protected documents.
//!
//! Thin binary entry point. All logic lives in the `locksleuth-core`
//! and `locksleuth-cli` crates.

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = locksleuth_cli::parse_args();

    // Logs go to stderr so stdout carries only results.
    let filter = EnvFilter::try_from_env(locksleuth_cli::LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("LockSleuth starting");

    locksleuth_cli::run(&cli)?;
    Ok(())
}
