//! CLI argument definitions using clap
//!
//! - orderly < lines.txt                   # Map stdin lines with defaults
//! - orderly -w 4 --delay 50ms input.txt   # Four workers over a file
//! - orderly --early-stop 3 --panic-on boom --panic-policy capture

use clap::{Parser, ValueEnum};
use orderly_core::{PanicPolicy, PoolOptions};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "orderly")]
#[command(about = "Run a simulated transform over input lines in parallel, printing results in input order")]
#[command(version)]
pub struct Cli {
    /// Input file (reads stdin when omitted or `-`)
    pub input: Option<PathBuf>,

    /// Options file (TOML, YAML or JSON); flags override it
    #[arg(long, env = "ORDERLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Queue capacity; defaults to the worker count
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Stop after this many successful results (0 disables)
    #[arg(long)]
    pub early_stop: Option<usize>,

    /// Panic handling
    #[arg(long, value_enum)]
    pub panic_policy: Option<PanicPolicyArg>,

    /// Shorthand for `--panic-policy capture`
    #[arg(long, conflicts_with = "panic_policy")]
    pub panic_as_error: bool,

    /// Per-line deadline, e.g. `250ms` (0 disables)
    #[arg(long, value_parser = parse_duration)]
    pub task_timeout: Option<Duration>,

    /// Simulated work per line
    #[arg(long, default_value = "10ms", value_parser = parse_duration)]
    pub delay: Duration,

    /// Add one `--delay` per character of the line, so longer lines finish later
    #[arg(long)]
    pub scale_delay: bool,

    /// Lines containing this text fail
    #[arg(long)]
    pub fail_on: Option<String>,

    /// Lines containing this text panic
    #[arg(long)]
    pub panic_on: Option<String>,

    /// Prefix every output line with its input position
    #[arg(short = 'n', long)]
    pub number: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// CLI spelling of [`PanicPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PanicPolicyArg {
    /// Abort the run with the original panic
    Propagate,
    /// Report the panic as that line's error
    Capture,
}

impl From<PanicPolicyArg> for PanicPolicy {
    fn from(arg: PanicPolicyArg) -> Self {
        match arg {
            PanicPolicyArg::Propagate => PanicPolicy::Propagate,
            PanicPolicyArg::Capture => PanicPolicy::Capture,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Layer the command-line flags over options loaded from file and env
    pub fn apply_to(&self, mut options: PoolOptions) -> PoolOptions {
        if let Some(workers) = self.workers {
            options.workers = workers;
        }
        if let Some(max_in_flight) = self.max_in_flight {
            options.max_in_flight = Some(max_in_flight);
        }
        if let Some(limit) = self.early_stop {
            options.early_stop_after = NonZeroUsize::new(limit);
        }
        if let Some(policy) = self.panic_policy {
            options.panic_policy = policy.into();
        }
        if self.panic_as_error {
            options.panic_policy = PanicPolicy::Capture;
        }
        if let Some(timeout) = self.task_timeout {
            options.task_timeout = Some(timeout);
        }
        options
    }
}

fn parse_duration(value: &str) -> Result<Duration, humantime_serde::re::humantime::DurationError> {
    humantime_serde::re::humantime::parse_duration(value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_leave_options_untouched() {
        let cli = Cli::parse_from(["orderly"]);
        assert_eq!(cli.apply_to(PoolOptions::default()), PoolOptions::default());
        assert_eq!(cli.delay, Duration::from_millis(10));
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_flags_override_options() {
        let cli = Cli::parse_from([
            "orderly",
            "-w",
            "4",
            "--max-in-flight",
            "8",
            "--early-stop",
            "3",
            "--panic-as-error",
            "--task-timeout",
            "1s 500ms",
        ]);
        let options = cli.apply_to(PoolOptions::with_workers(2));

        assert_eq!(options.workers, 4);
        assert_eq!(options.max_in_flight, Some(8));
        assert_eq!(options.early_stop_limit(), Some(3));
        assert_eq!(options.panic_policy, PanicPolicy::Capture);
        assert_eq!(options.task_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_early_stop_zero_disables() {
        let cli = Cli::parse_from(["orderly", "--early-stop", "0"]);
        let options = PoolOptions {
            early_stop_after: NonZeroUsize::new(5),
            ..PoolOptions::default()
        };
        assert_eq!(cli.apply_to(options).early_stop_after, None);
    }

    #[test]
    fn test_panic_policy_flags_conflict() {
        let result = Cli::try_parse_from([
            "orderly",
            "--panic-policy",
            "propagate",
            "--panic-as-error",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_duration_rejected() {
        assert!(Cli::try_parse_from(["orderly", "--delay", "soon"]).is_err());
    }
}
