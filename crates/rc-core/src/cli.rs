//! Command-line interface for rc-core.
//!
//! `run` loads a CSV, runs the pipeline, and prints the report; `config`
//! inspects configuration; `completions` emits shell completion scripts.

use crate::dataset::Dataset;
use crate::exit_codes::ExitCode;
use crate::logging::{LogFormat, Verbosity};
use crate::pipeline::Pipeline;
use crate::report::{ErrorReport, PipelineReport};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rc_common::{Error, OutputFormat, Result};
use rc_config::{load_config_from_path, resolve_config, ConfigSnapshot, PipelineConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "rc-core",
    version,
    about = "Pick the probability cutoff that minimises expected misclassification cost"
)]
pub struct Cli {
    /// Config file (TOML, YAML or JSON); falls back to $RC_CONFIG, then the user config dir
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format for results on stdout
    #[arg(long, short = 'f', global = true, value_enum, default_value = "summary")]
    pub format: OutputFormat,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select a threshold for a labelled CSV dataset
    Run(RunArgs),
    /// Inspect or check configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print a shell completion script
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Dataset path plus per-run overrides of the resolved config.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// CSV file with a header row
    pub data: PathBuf,

    /// Seed for both resampling and fold shuffling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of stratified folds
    #[arg(long)]
    pub folds: Option<usize>,

    /// Cost of one false positive
    #[arg(long, value_name = "COST")]
    pub fp_cost: Option<f64>,

    /// Cost of one false negative
    #[arg(long, value_name = "COST")]
    pub fn_cost: Option<f64>,

    /// Number of candidate thresholds
    #[arg(long, value_name = "N")]
    pub grid_points: Option<usize>,

    /// Never oversample the minority class
    #[arg(long)]
    pub no_resample: bool,
}

impl RunArgs {
    /// Apply flag overrides on top of `cfg`.
    pub fn apply(&self, cfg: &mut PipelineConfig) {
        if let Some(seed) = self.seed {
            cfg.resampling.seed = seed;
            cfg.folds.seed = seed;
        }
        if let Some(folds) = self.folds {
            cfg.folds.count = folds;
        }
        if let Some(cost) = self.fp_cost {
            cfg.costs.false_positive = cost;
        }
        if let Some(cost) = self.fn_cost {
            cfg.costs.false_negative = cost;
        }
        if let Some(points) = self.grid_points {
            cfg.grid.points = points;
        }
        if self.no_resample {
            cfg.resampling.enabled = false;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Check a config file without running anything
    Validate {
        /// Config file to check
        path: PathBuf,
    },
    /// Print the JSON schema of the config file
    Schema,
}

/// Dispatch a parsed command line.
pub fn run(cli: &Cli) -> ExitCode {
    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(cli, args),
        Commands::Config { command } => run_config(cli, command),
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "rc-core", &mut std::io::stdout());
            Ok(())
        }
    };
    match result {
        Ok(()) => ExitCode::Ok,
        Err(err) => {
            report_error(cli.format, &err);
            ExitCode::from_error(&err)
        }
    }
}

fn run_pipeline(cli: &Cli, args: &RunArgs) -> Result<()> {
    let (mut config, source) = resolve_config(cli.config.as_deref())?;
    args.apply(&mut config);
    let pipeline = Pipeline::new(config)?;

    let dataset = Dataset::from_csv_path(&args.data, &pipeline.config().data)?;
    info!(
        rows = dataset.len(),
        features = dataset.n_features(),
        path = %args.data.display(),
        "dataset loaded"
    );
    let outcome = pipeline.run(&dataset)?;

    let snapshot = ConfigSnapshot::new(pipeline.config().clone(), source)?;
    let report = PipelineReport::new(snapshot, outcome);
    match cli.format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Summary => print!("{}", report.render_summary()),
    }
    Ok(())
}

fn run_config(cli: &Cli, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let (config, source) = resolve_config(cli.config.as_deref())?;
            let snapshot = ConfigSnapshot::new(config, source)?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                OutputFormat::Summary => {
                    let body = toml::to_string_pretty(&snapshot.config)
                        .map_err(|e| Error::Config(format!("cannot render config as TOML: {e}")))?;
                    println!("# fingerprint: {}", snapshot.fingerprint);
                    print!("{body}");
                }
            }
        }
        ConfigCommands::Validate { path } => {
            load_config_from_path(path)?;
            match cli.format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::json!({ "valid": true, "path": path.display().to_string() })
                ),
                OutputFormat::Summary => println!("{}: valid", path.display()),
            }
        }
        ConfigCommands::Schema => {
            let schema = schemars::schema_for!(PipelineConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }
    Ok(())
}

fn report_error(format: OutputFormat, err: &Error) {
    let report = ErrorReport::from_error(err);
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("{}", report.render_summary()),
        },
        OutputFormat::Summary => eprintln!("{}", report.render_summary()),
    }
}
