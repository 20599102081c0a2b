pub mod commands;
pub mod loader;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use salesight_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use salesight_core::Bucket;

#[derive(Debug, Parser)]
#[command(
    name = "salesight",
    about = "Sales and basket analysis over an e-commerce order history",
    long_about = "Load the order, item, customer, product, and category translation tables and \
                  report regional sales, revenue trends, and categories bought together.",
    after_help = "Examples:\n  salesight summary --data-dir data\n  salesight trend --state SP --bucket day\n  salesight pairs --top 15\n  salesight pair bed_bath_table furniture_decor"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Override the configured log level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

/// Filter flags shared by every analysis command.
#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    #[arg(long, help = "Directory holding the source CSV tables")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, help = "First purchase date to include (YYYY-MM-DD)")]
    pub from: Option<NaiveDate>,
    #[arg(long, help = "Last purchase date to include (YYYY-MM-DD)")]
    pub to: Option<NaiveDate>,
    #[arg(long, help = "Restrict sales to one customer state code")]
    pub state: Option<String>,
    #[arg(long, help = "Number of ranked pairs to return (1-50)")]
    pub top: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Full report: states, trends, top pairs, and heatmap")]
    Summary {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, help = "Trend granularity (day|month)")]
        bucket: Option<Bucket>,
        #[arg(
            long,
            num_args = 2,
            value_names = ["FIRST", "SECOND"],
            help = "Also count one category pair"
        )]
        pair: Vec<String>,
    },
    #[command(about = "Distinct delivered orders per customer state")]
    States {
        #[command(flatten)]
        query: QueryArgs,
    },
    #[command(about = "Revenue per day or month")]
    Trend {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, help = "Trend granularity (day|month)")]
        bucket: Option<Bucket>,
        #[arg(long, help = "Emit one series per state")]
        by_state: bool,
    },
    #[command(about = "Most frequent category pairs")]
    Pairs {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, help = "Count item-level pairs, including repeats of a category")]
        raw: bool,
    },
    #[command(about = "How often two categories were bought together")]
    Pair {
        #[command(flatten)]
        query: QueryArgs,
        first: String,
        second: String,
    },
    #[command(about = "Symmetric count matrix over the labels of the top pairs")]
    Matrix {
        #[command(flatten)]
        query: QueryArgs,
        #[arg(long, help = "Count item-level pairs, including repeats of a category")]
        raw: bool,
        #[arg(long, help = "Number of top pairs whose labels span the matrix")]
        pairs: Option<usize>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Check configuration, source files, and row quality")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions {
        overrides: ConfigOverrides {
            log_level: cli.log_level.clone(),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    }) {
        if let Err(error) = init_logging(&config) {
            eprintln!("logging disabled: {error}");
        }
    }

    let result = match cli.command {
        Command::Summary { query, bucket, pair } => {
            let pair = match pair.as_slice() {
                [first, second] => Some((first.clone(), second.clone())),
                _ => None,
            };
            commands::summary::run(&query, bucket, pair)
        }
        Command::States { query } => commands::states::run(&query),
        Command::Trend { query, bucket, by_state } => commands::trend::run(&query, bucket, by_state),
        Command::Pairs { query, raw } => commands::pairs::run(&query, raw),
        Command::Pair { query, first, second } => commands::pair::run(&query, &first, &second),
        Command::Matrix { query, raw, pairs } => commands::matrix::run(&query, raw, pairs),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}
