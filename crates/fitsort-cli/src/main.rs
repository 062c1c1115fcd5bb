use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fitsort_cli::commands::sort;
use fitsort_cli::{Cli, Config};
use fitsort_core::CancelFlag;
use fitsort_fit::FitDecoder;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Use try_init to avoid panic if tracing is already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(&cli);
    tracing::debug!(?config, "loaded configuration");

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::warn!("interrupt received, finishing in-flight files");
        handler_flag.cancel();
    }) {
        tracing::warn!(error = %e, "failed to install interrupt handler");
    }

    let stdout = io::stdout();
    sort::run(&mut stdout.lock(), &config, FitDecoder::new(), &cancel, cli.json)?;
    Ok(())
}
