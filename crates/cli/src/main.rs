// # -----------------------------
// # crates/cli/src/main.rs
// # -----------------------------
use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use benchlog_common::{ConfigOverrides, HookKind};

mod ack;
mod hook;
mod report;

/// Environment variable consulted before RUST_LOG.
const ENV_LOG_FILTER: &str = "BENCHLOG_LOG";

#[derive(Parser, Debug)]
#[command(name = "benchlog", version, about = "Benchmark event logger for agent lifecycle hooks", long_about = None)]
struct Cli {
    /// Directory holding the per-session logs (overrides BENCHLOG_DIR and the config file)
    #[arg(long = "log-dir", global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,
    /// Configuration file (defaults to BENCHLOG_CONFIG, then ./benchlog.toml)
    #[arg(long = "config", global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error, off). Overrides BENCHLOG_LOG / RUST_LOG if set.
    #[arg(long = "log-level", global = true, value_name = "LEVEL")]
    log_level: Option<String>,
    /// Enable structured JSON logging on stderr
    #[arg(long = "json-logs", global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Handle a lifecycle hook: read the JSON payload on stdin, append to the
    /// session log, acknowledge on stdout. Always exits 0.
    Hook {
        #[command(subcommand)]
        kind: HookCommand,
    },
    /// Summarize session logs as Markdown or JSON
    Report(report::ReportArgs),
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum HookCommand {
    /// Tool use callbacks (PreToolUse / PostToolUse): tool and token events
    #[command(visible_aliases = ["pre-tool-use", "post-tool-use"])]
    Tool,
    /// Stop callback: final token counts for an existing session log
    #[command(visible_alias = "stop")]
    SessionEnd,
}

impl From<HookCommand> for HookKind {
    fn from(value: HookCommand) -> Self {
        match value {
            HookCommand::Tool => HookKind::Tool,
            HookCommand::SessionEnd => HookKind::SessionEnd,
        }
    }
}

/// Initialize logging based on CLI arguments and environment.
///
/// Traces always go to stderr: stdout belongs to the hook acknowledgment.
fn init_logging(log_level: Option<&str>, json_logs: bool, default_level: &str) -> Result<()> {
    let filter = if let Some(level) = log_level {
        match level.to_lowercase().as_str() {
            "off" => EnvFilter::new("off"),
            "error" => EnvFilter::new("error"),
            "warn" | "warning" => EnvFilter::new("warn"),
            "info" => EnvFilter::new("info"),
            "debug" => EnvFilter::new("debug"),
            "trace" => EnvFilter::new("trace"),
            _ => EnvFilter::new(default_level),
        }
    } else {
        EnvFilter::try_from_env(ENV_LOG_FILTER)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let builder = fmt().with_env_filter(filter).with_writer(io::stderr);
    let installed = if json_logs {
        builder
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .try_init()
    } else {
        builder.with_target(false).try_init()
    };
    installed.map_err(|err| anyhow::anyhow!(err))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let overrides = ConfigOverrides {
        config_path: cli.config,
        log_dir: cli.log_dir,
    }
    .with_env();

    match cli.command {
        Commands::Hook { kind } => {
            // Hooks stay silent unless asked; a logging failure must not stop them.
            let _ = init_logging(cli.log_level.as_deref(), cli.json_logs, "off");
            hook::run(kind.into(), &overrides);
            Ok(())
        }
        Commands::Report(args) => {
            init_logging(cli.log_level.as_deref(), cli.json_logs, "warn")?;
            report::run(args, &overrides)
        }
    }
}
