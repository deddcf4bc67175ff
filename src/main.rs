//! capcheck CLI - finds accidental captures in Go callbacks.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use capcheck::config::{Config, LogLevel};
use capcheck::driver;

/// Detects accidental captures of callback-shadowed receivers in Go code.
///
/// A callback parameter often hands the function a fresh, scoped value (a
/// transaction handle, a sub-context). When the body calls a method on the
/// captured outer variable instead of on the parameter, the code compiles
/// but operates on the wrong receiver. capcheck reports those calls.
///
/// Examples:
///     capcheck ./...                      # everything under the tree
///     capcheck pkg/ --ignore-interface Logger
///     capcheck pkg/ --allow-interface Tx --format json
#[derive(Parser, Debug)]
#[command(name = "capcheck", version, about, long_about = None)]
struct Cli {
    /// Go files or directories to analyze.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Only report captures of interfaces with this name (repeatable).
    /// A non-empty allow-list is exhaustive.
    #[arg(long = "allow-interface", value_name = "NAME")]
    allow_interfaces: Vec<String>,

    /// Never report captures of interfaces with this name (repeatable).
    /// Consulted only when no allow-list is given.
    #[arg(long = "ignore-interface", value_name = "NAME")]
    ignore_interfaces: Vec<String>,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration is validated before any analysis runs; a bad log level
    // is the one fatal startup condition.
    let level: LogLevel = match cli.log_level.parse() {
        Ok(level) => level,
        Err(err) => {
            eprintln!("capcheck: {err}");
            return ExitCode::from(2);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level.as_tracing())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::default()
        .with_allow_interfaces(cli.allow_interfaces)
        .with_ignore_interfaces(cli.ignore_interfaces)
        .with_log_level(level);

    match run(&cli.paths, &config, cli.format) {
        Ok(found) => {
            if found {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("capcheck: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(paths: &[PathBuf], config: &Config, format: OutputFormat) -> anyhow::Result<bool> {
    let findings = driver::analyze_paths(paths, config).context("analysis failed")?;
    match format {
        OutputFormat::Text => print!("{}", driver::render_text(&findings)),
        OutputFormat::Json => {
            println!("{}", driver::render_json(&findings).context("render findings")?)
        }
    }
    Ok(!findings.is_empty())
}
