// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use bindsync::{
    config::AppConfig,
    constants::{EXIT_CODE_SYNC_ERROR, EXIT_CODE_UNEXPECTED, TOKIO_WORKER_THREADS},
    controller::{ApplyOutcome, PlanResult, ZoneController},
    errors::{ConfigError, ExportError, SyncError, ValidationError},
    exporter::{write_export, ExportFormat, ZoneExport},
    metrics,
    record::Record,
};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};

/// Manage BIND9 zones declaratively.
#[derive(Debug, Parser)]
#[command(name = "bindsync", version, about)]
struct Cli {
    /// Override the log level (default from LOG_LEVEL or RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write Prometheus metrics in text format to this file after the run
    #[arg(long, global = true)]
    metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the diff between desired and current state
    Plan {
        #[command(flatten)]
        desired: DesiredArgs,

        /// Write the diff as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Apply changes to the zone
    Apply {
        #[command(flatten)]
        desired: DesiredArgs,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Fetch the current zone state from BIND
    Pull {
        /// Zone name to pull
        #[arg(long)]
        zone: String,

        /// Write the exported state here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Serialisation format for the exported state
        #[arg(long, value_enum, default_value_t = ExportFormat::Yaml)]
        format: ExportFormat,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments shared by `plan` and `apply`.
#[derive(Debug, Args)]
struct DesiredArgs {
    /// Path to the desired-state YAML file
    #[arg(long)]
    desired: PathBuf,

    /// Zone name (overrides the YAML)
    #[arg(long)]
    zone: Option<String>,

    /// Template variable in KEY=VALUE form; can be repeated
    #[arg(short = 'e', long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Command::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "bindsync", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    let result = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("bindsync")
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")
        .and_then(|runtime| runtime.block_on(async_main(&cli)));

    if let Some(path) = &cli.metrics_file {
        if let Err(e) = write_metrics(path) {
            eprintln!("Failed to write metrics to {}: {e:#}", path.display());
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            if code == EXIT_CODE_SYNC_ERROR {
                eprintln!("Error: {e:#}");
            } else {
                eprintln!("Unexpected error: {e:#}");
            }
            ExitCode::from(code)
        }
    }
}

async fn async_main(cli: &Cli) -> Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(cli.log_level.as_deref(), &config.log_level);

    debug!(
        "Configuration loaded: server={} strategy={} serial={}",
        config.server_address(),
        config.apply_strategy,
        config.serial_strategy.as_str()
    );

    let controller = ZoneController::new(&config);

    match &cli.command {
        Command::Plan { desired, json } => {
            run_plan(&controller, desired, json.as_deref()).await?;
        }
        Command::Apply { desired, yes } => {
            let plan = run_plan(&controller, desired, None).await?;
            match controller.apply(&plan, *yes).await? {
                ApplyOutcome::Unchanged => {}
                ApplyOutcome::Aborted => println!("Aborted."),
                ApplyOutcome::Applied { strategy, changes } => {
                    println!("Applied {changes} changes to {} ({strategy})", plan.desired.origin);
                }
            }
        }
        Command::Pull {
            zone,
            output,
            format,
        } => {
            run_pull(&controller, zone, output.as_deref(), *format).await?;
        }
        Command::Completions { .. } => {}
    }

    Ok(())
}

/// Initialise tracing.
///
/// `--log-level` wins over `RUST_LOG`, which wins over `LOG_LEVEL`.
/// `RUST_LOG_FORMAT=json` switches to JSON output.
fn init_tracing(cli_level: Option<&str>, config_level: &str) {
    let env_filter = match cli_level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config_level)),
    };

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    // Logs go to stderr so plan output and exports on stdout stay clean
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
    }
}

async fn run_plan(
    controller: &ZoneController<'_>,
    args: &DesiredArgs,
    json_path: Option<&Path>,
) -> Result<PlanResult> {
    let vars = parse_template_vars(&args.vars)?;
    let plan = controller
        .plan_file(&args.desired, args.zone.as_deref(), &vars)
        .await?;

    for line in diff_summary(&plan) {
        println!("{line}");
    }

    if let Some(path) = json_path {
        let report = serde_json::to_string_pretty(&DiffReport::from(&plan))?;
        tokio::fs::write(path, report)
            .await
            .map_err(|source| ExportError::Io {
                path: path.display().to_string(),
                source,
            })?;
        println!("Wrote diff JSON to {}", path.display());
    }

    if !plan.diff.has_changes() {
        println!("No changes detected.");
    }
    Ok(plan)
}

async fn run_pull(
    controller: &ZoneController<'_>,
    zone: &str,
    output: Option<&Path>,
    format: ExportFormat,
) -> Result<()> {
    let origin = bindsync::record::ensure_absolute(zone);
    let (state, soa) = controller.pull(&origin).await?;
    info!("Pulled {} records for {}", state.records.len(), origin);

    let content = ZoneExport::new(&state, soa).render(format)?;
    match output {
        Some(path) => {
            write_export(path, &content).await?;
            println!("Wrote zone state to {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

/// Convert `KEY=VALUE` pairs into a map. The value may contain `=`.
fn parse_template_vars(values: &[String]) -> Result<HashMap<String, String>, SyncError> {
    values
        .iter()
        .map(|value| {
            value
                .split_once('=')
                .map(|(key, val)| (key.trim().to_string(), val.to_string()))
                .ok_or_else(|| {
                    ValidationError::Schema(format!(
                        "Invalid template var '{value}', expected KEY=VALUE"
                    ))
                    .into()
                })
        })
        .collect()
}

/// Human-readable plan listing.
fn diff_summary(plan: &PlanResult) -> Vec<String> {
    let diff = &plan.diff;
    let mut lines = vec![
        format!("Zone: {}", plan.desired.origin),
        format!("Added: {}", diff.added.len()),
    ];
    lines.extend(diff.added.iter().map(|r| {
        format!(
            " + {} {} -> {} (ttl {})",
            r.canonical_type(),
            r.name,
            r.presentation_value(),
            r.ttl
        )
    }));
    lines.push(format!("Removed: {}", diff.removed.len()));
    lines.extend(
        diff.removed
            .iter()
            .map(|r| format!(" - {} {} -> {}", r.canonical_type(), r.name, r.presentation_value())),
    );
    lines.push(format!("TTL changes: {}", diff.ttl_changed.len()));
    lines.extend(diff.ttl_changed.iter().map(|(before, after)| {
        format!(
            " ~ {} {} {} -> {} value {}",
            before.canonical_type(),
            before.name,
            before.ttl,
            after.ttl,
            before.presentation_value()
        )
    }));
    lines.push(format!("Serial: {}", plan.soa.serial));
    lines
}

#[derive(Debug, Serialize)]
struct TtlChange<'a> {
    before: &'a Record,
    after: &'a Record,
}

/// JSON document written by `plan --json`.
#[derive(Debug, Serialize)]
struct DiffReport<'a> {
    zone: &'a str,
    added: &'a [Record],
    removed: &'a [Record],
    ttl_changed: Vec<TtlChange<'a>>,
    serial: u32,
    fingerprint: &'a str,
}

impl<'a> From<&'a PlanResult> for DiffReport<'a> {
    fn from(plan: &'a PlanResult) -> Self {
        Self {
            zone: &plan.desired.origin,
            added: &plan.diff.added,
            removed: &plan.diff.removed,
            ttl_changed: plan
                .diff
                .ttl_changed
                .iter()
                .map(|(before, after)| TtlChange { before, after })
                .collect(),
            serial: plan.soa.serial,
            fingerprint: &plan.fingerprint,
        }
    }
}

fn write_metrics(path: &Path) -> Result<()> {
    let text = metrics::gather_metrics()?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Typed bindsync errors exit with 2, everything else with 3.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    let typed = err.downcast_ref::<SyncError>().is_some()
        || err.downcast_ref::<ConfigError>().is_some()
        || err.downcast_ref::<ExportError>().is_some();
    if typed {
        EXIT_CODE_SYNC_ERROR
    } else {
        error!("Unexpected failure: {:?}", err);
        EXIT_CODE_UNEXPECTED
    }
}
