//! eecalc - command-line front end for the EE Calc engine
//!
//! Feeds parameter files, environment overrides and `--set` pairs into a
//! calculator and prints the resulting report.

mod config;
mod params;
mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use ee_calc::{CalcEngine, CalculatorKind, ExplainRequest};
use std::path::PathBuf;
use tracing::debug;

use crate::config::{CliConfig, OutputFormat};

#[derive(Parser)]
#[command(name = "eecalc")]
#[command(about = "EE Calc - electrical engineering calculators")]
#[command(long_about = "EE Calc - electrical engineering calculators

Commands:
  list             List calculators
  describe         Show the parameters a calculator accepts
  run              Evaluate a calculator and print the report
  explain-payload  Print the snapshot sent to an explanation service

Parameters are layered: calculator defaults < --params file <
EECALC_PARAM_* environment < --set key=value.

Examples:
  eecalc describe scaling
  eecalc run ct --set ifault=2500
  eecalc run opamp -p opamp.yaml --format json")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (default: ./eecalc.toml when present)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ParamArgs {
    /// Calculator name (see `eecalc list`)
    calculator: String,

    /// Parameter file (yaml, json or toml)
    #[arg(short = 'p', long = "params")]
    params: Option<PathBuf>,

    /// Override a parameter, may be repeated
    #[arg(short = 's', long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List calculators
    List,

    /// Show the parameter catalogue of a calculator
    Describe {
        /// Calculator name
        calculator: String,
    },

    /// Evaluate a calculator
    Run {
        #[command(flatten)]
        args: ParamArgs,

        /// Output format (default from config)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Decimal places for text output (default from config)
        #[arg(long)]
        precision: Option<usize>,
    },

    /// Print the explanation snapshot JSON for a successful evaluation
    ExplainPayload {
        #[command(flatten)]
        args: ParamArgs,
    },
}

fn parse_kind(name: &str) -> Result<CalculatorKind> {
    name.parse::<CalculatorKind>()
        .context("run 'eecalc list' to see available calculators")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = CliConfig::load(cli.config.as_deref())?;

    let mut log = config.log.clone();
    log.level = common::logging::level_for_verbosity(&log.level, cli.verbose).to_string();
    log.ansi = log.ansi && !cli.no_color;
    common::logging::init_with_config(&log).context("failed to initialise logging")?;
    debug!(precision = config.precision, format = ?config.format, "configuration loaded");

    let engine = CalcEngine::new();

    match cli.command {
        Commands::List => {
            println!("{}", "Calculators:".bright_cyan());
            print!("{}", render::calculator_list());
        },
        Commands::Describe { calculator } => {
            let kind = parse_kind(&calculator)?;
            print!("{}", render::parameter_table(kind, &kind.parameters()));
        },
        Commands::Run {
            args,
            format,
            precision,
        } => {
            let kind = parse_kind(&args.calculator)?;
            let set = params::collect(args.params.as_deref(), &args.set)?;
            let report = engine
                .evaluate(kind, &set)
                .with_context(|| format!("{} rejected the input", kind))?;

            let output = render::report(
                &report,
                format.unwrap_or(config.format),
                precision.unwrap_or(config.precision),
            )?;
            println!("{}", output.trim_end());
        },
        Commands::ExplainPayload { args } => {
            let kind = parse_kind(&args.calculator)?;
            let set = params::collect(args.params.as_deref(), &args.set)?;
            let report = engine
                .evaluate(kind, &set)
                .with_context(|| format!("{} rejected the input", kind))?;
            let request = ExplainRequest::new(kind, &set, &report)?;
            println!("{}", request.to_json_pretty()?);
        },
    }

    Ok(())
}
