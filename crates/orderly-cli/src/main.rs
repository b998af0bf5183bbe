//! orderly command-line tool
//!
//! Reads lines from a file or stdin, runs a simulated transform over them on a
//! bounded worker pool and prints the results in input order.
//!
//! ```bash
//! seq 1 20 | orderly -w 4 --delay 20ms --early-stop 10
//! orderly --config pool.toml --fail-on bad --panic-as-error input.txt
//! ```
//!
//! Options are resolved from the `--config` file, then `ORDERLY_*`
//! environment variables, then command-line flags. Out-of-range values are
//! clamped with a warning rather than rejected.

mod args;
mod runner;

use anyhow::Context;
use args::{Cli, LogFormat};
use clap::Parser;
use orderly_core::OrderedPool;
use runner::SimulatedWork;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli);

    let loaded = orderly_core::config::load(cli.config.as_deref())
        .context("Failed to load pool options")?;
    let options = cli.apply_to(loaded);
    if options.needs_normalization() {
        tracing::warn!(
            workers = options.workers,
            max_in_flight = ?options.max_in_flight,
            "Pool options out of range, clamping"
        );
    }
    let options = options.normalized();
    tracing::debug!(?options, "Resolved pool options");

    let pool = OrderedPool::new(options)?;

    // Ctrl+C stops the run; results already delivered stay printed
    let interrupt = pool.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            interrupt.cancel_all();
        }
    });

    let work = SimulatedWork {
        delay: cli.delay,
        scale_delay: cli.scale_delay,
        fail_on: cli.fail_on.clone(),
        panic_on: cli.panic_on.clone(),
    };
    let reader = runner::open_input(cli.input.as_deref()).await?;
    let summary = runner::run(&pool, reader, tokio::io::stdout(), work, cli.number).await?;

    if summary.failed > 0 {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn init_logging(cli: &Cli) {
    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
