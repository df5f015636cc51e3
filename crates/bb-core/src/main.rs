//! Black-box robustness auditor CLI.
//!
//! The main entry point for bb-core, handling:
//! - Experiment runs (load, train, mutate, drift, robustness, explain, persist)
//! - Configuration inspection and validation
//!
//! stdout carries the command payload (markdown, JSON or a summary line);
//! logs go to stderr.

use clap::{Args, Parser, Subcommand};
use bb_common::{Error, Metric, OutputFormat, StructuredError, SCHEMA_VERSION};
use bb_config::{load_config, validate_config, ConfigError, ConfigOptions, ExperimentConfig, ModelKind};
use bb_core::exit_codes::ExitCode;
use bb_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use bb_core::pipeline::{PersistenceStatus, Pipeline, PipelineOutcome};
use std::path::PathBuf;

/// Black-box robustness auditor - stress a tabular classifier with controlled mutations
#[derive(Parser)]
#[command(name = "bb-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Experiment config file (JSON or TOML)
    #[arg(long, global = true, env = "BB_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "md")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a robustness experiment on a dataset
    Run(RunArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Dataset path (.csv, .parquet or .arff)
    #[arg(long)]
    data: PathBuf,

    /// Baseline model
    #[arg(long, value_enum)]
    model: Option<ModelKind>,

    /// Label column (default: `label`, else the last column)
    #[arg(long)]
    label: Option<String>,

    /// Seed for the mutation plan
    #[arg(long)]
    seed: Option<u64>,

    /// Standard deviation of additive Gaussian noise
    #[arg(long)]
    noise: Option<f64>,

    /// Fraction of feature columns to drop
    #[arg(long)]
    drop: Option<f64>,

    /// Standard deviation of the distribution shift
    #[arg(long)]
    drift: Option<f64>,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    test_size: Option<f64>,

    /// Drift backends to run (comma-separated)
    #[arg(long, value_delimiter = ',')]
    backends: Option<Vec<String>>,

    /// Per-backend drift timeout in milliseconds
    #[arg(long)]
    drift_timeout_ms: Option<u64>,

    /// Root directory for run artifacts
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not write the run directory
    #[arg(long)]
    no_persist: bool,

    /// Skip feature attribution
    #[arg(long)]
    no_explain: bool,

    /// Skip the post-run notification
    #[arg(long)]
    no_notify: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the resolved config)
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.global.quiet {
        LogLevel::Error
    } else {
        match cli.global.verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    };
    let log_format = if cli.global.format == OutputFormat::Json {
        LogFormat::Jsonl
    } else {
        LogFormat::Human
    };
    init_logging(&LogConfig::from_env(Some(log_level), Some(log_format)));

    let exit_code = match &cli.command {
        Commands::Run(args) => run_experiment(&cli.global, args),
        Commands::Config(args) => run_config(&cli.global, args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// run
// ============================================================================

fn run_experiment(global: &GlobalOpts, args: &RunArgs) -> ExitCode {
    let resolved = match load_config(&ConfigOptions {
        config_path: global.config.clone(),
    }) {
        Ok(r) => r,
        Err(e) => return output_config_error(global, &e),
    };
    tracing::debug!(
        target: bb_core::logging::event_names::CONFIG_LOADED,
        source = %resolved.source,
        path = ?resolved.path,
        "Resolved configuration"
    );

    let mut config = resolved.config;
    apply_overrides(&mut config, args);
    if let Err(e) = validate_config(&config) {
        return output_error(global, &Error::Configuration(e.to_string()));
    }

    let pipeline = match Pipeline::new(config) {
        Ok(p) => p.with_snapshot(resolved.snapshot),
        Err(e) => return output_error(global, &e),
    };
    let pipeline = if args.no_persist {
        pipeline.with_sink(None)
    } else {
        pipeline
    };
    let pipeline = if args.no_explain {
        pipeline.with_explainer(None)
    } else {
        pipeline
    };
    let pipeline = if args.no_notify {
        pipeline.with_notifier(None)
    } else {
        pipeline
    };

    match pipeline.run(&args.data) {
        Ok(outcome) => {
            output_outcome(global, &outcome);
            if outcome.persistence.is_failed() {
                ExitCode::PartialFail
            } else {
                ExitCode::Clean
            }
        }
        Err(e) => output_error(global, e.error()),
    }
}

fn apply_overrides(config: &mut ExperimentConfig, args: &RunArgs) {
    if let Some(model) = args.model {
        config.model.kind = model;
    }
    if let Some(label) = &args.label {
        config.data.label_column = Some(label.clone());
    }
    if let Some(seed) = args.seed {
        config.mutation.seed = seed;
    }
    if let Some(noise) = args.noise {
        config.mutation.noise_intensity = noise;
    }
    if let Some(drop) = args.drop {
        config.mutation.drop_ratio = drop;
    }
    if let Some(drift) = args.drift {
        config.mutation.drift_ratio = drift;
    }
    if let Some(test_size) = args.test_size {
        config.data.test_size = test_size;
    }
    if let Some(backends) = &args.backends {
        config.drift.backends = backends.clone();
    }
    if let Some(timeout_ms) = args.drift_timeout_ms {
        config.drift.timeout_ms = timeout_ms;
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
}

fn output_outcome(global: &GlobalOpts, outcome: &PipelineOutcome) {
    match global.format {
        OutputFormat::Md => print!("{}", outcome.markdown),
        OutputFormat::Json => match serde_json::to_string_pretty(outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("bb-core: failed to serialize outcome: {}", e),
        },
        OutputFormat::Summary => println!("{}", summary_line(outcome)),
        OutputFormat::Exitcode => {}
    }
}

fn summary_line(outcome: &PipelineOutcome) -> String {
    let report = &outcome.report;
    let accuracy = |set: &bb_common::MetricSet| {
        set.get(Metric::Accuracy)
            .map(|v| format!("{:.4}", v))
            .unwrap_or_else(|| "n/a".to_string())
    };
    let worst = report
        .degradation()
        .worst()
        .map(|(m, v)| format!("{} {:.2}%", m, v))
        .unwrap_or_else(|| "n/a".to_string());
    let persisted = match &outcome.persistence {
        PersistenceStatus::Persisted { run_dir, .. } => run_dir.display().to_string(),
        PersistenceStatus::Failed { .. } => "FAILED".to_string(),
        PersistenceStatus::Skipped => "skipped".to_string(),
    };
    format!(
        "[{}] model={} accuracy {} -> {} worst={} drift={}/{} persisted={}",
        outcome.run_id,
        report.model().unwrap_or("?"),
        accuracy(report.reference_metrics()),
        accuracy(report.mutated_metrics()),
        worst,
        report.drift().succeeded(),
        report.drift().len(),
        persisted
    )
}

// ============================================================================
// config
// ============================================================================

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    match &args.command {
        ConfigCommands::Show => run_config_show(global),
        ConfigCommands::Validate { path } => run_config_validate(global, path.as_ref()),
    }
}

fn run_config_show(global: &GlobalOpts) -> ExitCode {
    let resolved = match load_config(&ConfigOptions {
        config_path: global.config.clone(),
    }) {
        Ok(r) => r,
        Err(e) => return output_config_error(global, &e),
    };

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "source": resolved.source.to_string(),
                "path": resolved.path.as_ref().map(|p| p.display().to_string()),
                "snapshot": &resolved.snapshot,
                "config": &resolved.config,
            });
            match serde_json::to_string_pretty(&response) {
                Ok(json) => println!("{}", json),
                Err(e) => return output_error(global, &Error::Json(e)),
            }
        }
        OutputFormat::Summary => {
            let path = resolved
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in defaults".to_string());
            println!(
                "config: {} ({}) model={} backends={}",
                path,
                resolved.source,
                resolved.config.model.kind,
                resolved.config.drift.backends.join(",")
            );
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# bb-core config show");
            println!();
            match &resolved.path {
                Some(path) => {
                    println!("Source: {} ({})", path.display(), resolved.source);
                    println!(
                        "Hash: {}",
                        resolved.snapshot.content_hash.as_deref().unwrap_or("n/a")
                    );
                }
                None => println!("Source: **built-in defaults** (no config file found)"),
            }
            println!("Schema version: {}", resolved.config.schema_version);
            println!();
            match serde_json::to_string_pretty(&resolved.config) {
                Ok(body) => println!("```json\n{}\n```", body),
                Err(e) => return output_error(global, &Error::Json(e)),
            }
        }
    }
    ExitCode::Clean
}

fn run_config_validate(global: &GlobalOpts, path: Option<&PathBuf>) -> ExitCode {
    let options = ConfigOptions {
        config_path: path.cloned().or_else(|| global.config.clone()),
    };
    match load_config(&options) {
        Ok(resolved) => {
            match global.format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({
                        "valid": true,
                        "source": resolved.source.to_string(),
                        "path": resolved.path.as_ref().map(|p| p.display().to_string()),
                    })
                ),
                OutputFormat::Exitcode => {}
                _ => println!(
                    "Configuration is valid ({})",
                    resolved
                        .path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "built-in defaults".to_string())
                ),
            }
            ExitCode::Clean
        }
        Err(e) => output_config_error(global, &e),
    }
}

// ============================================================================
// output helpers
// ============================================================================

fn output_config_error(global: &GlobalOpts, err: &ConfigError) -> ExitCode {
    output_error(global, &Error::Configuration(err.to_string()))
}

fn output_error(global: &GlobalOpts, err: &Error) -> ExitCode {
    let code = ExitCode::for_error(err);
    match global.format {
        OutputFormat::Json => println!("{}", StructuredError::from(err).to_json()),
        OutputFormat::Exitcode => {}
        _ => eprintln!("{}", bb_common::error::format_error_human(err)),
    }
    code
}

fn print_version(global: &GlobalOpts) {
    match global.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "schema_version": SCHEMA_VERSION,
            })
        ),
        _ => println!("bb-core {} (schema {})", env!("CARGO_PKG_VERSION"), SCHEMA_VERSION),
    }
}
