//! fremantle command-line tool.
//!
//! Runs the quarterly factor-selection backtest for every industry in a folder of
//! cleaned fundamentals tables and writes per-industry result tables.
//!
//! Usage: `cargo run --features cli --bin fremantle -- backtest --fundamentals-dir DIR`

use std::{error::Error, fs::File, path::PathBuf, process};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use fremantle::{backtest::BacktestConfig, batch::run_batch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "fremantle")]
#[command(about = "Rolling factor-analysis stock selection backtest", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest every industry in a fundamentals folder
    Backtest {
        /// Folder of `<industry>_清洗后.csv` files
        #[arg(long)]
        fundamentals_dir: PathBuf,

        /// Folder of `<industry>_股价整理.csv` files (defaults to the fundamentals folder)
        #[arg(long)]
        prices_dir: Option<PathBuf>,

        /// Output folder
        #[arg(long, default_value = "fremantle_output")]
        output: PathBuf,

        #[command(flatten)]
        settings: ConfigArgs,
    },

    /// Print the effective configuration as JSON
    Config {
        #[command(flatten)]
        settings: ConfigArgs,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// First date of the schedule range (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date of the schedule range (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Initial capital
    #[arg(long)]
    capital: Option<f64>,

    /// Number of securities bought each quarter
    #[arg(long)]
    top_n: Option<usize>,

    /// Cumulative explained variance the retained factors must reach
    #[arg(long)]
    min_variance: Option<f64>,
}

impl ConfigArgs {
    /// Load the configuration file, if any, and apply command-line overrides.
    fn resolve(&self) -> CliResult<BacktestConfig> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_reader(File::open(path)?)?,
            None => BacktestConfig::default(),
        };
        if let Some(start) = self.start {
            config.start = start;
        }
        if let Some(end) = self.end {
            config.end = end;
        }
        if let Some(capital) = self.capital {
            config.initial_capital = capital;
        }
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(threshold) = self.min_variance {
            config.extractor.min_cumulative_variance = threshold;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fremantle=info".into()),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest { fundamentals_dir, prices_dir, output, settings } => {
            let config = settings.resolve()?;
            let prices_dir = prices_dir.unwrap_or_else(|| fundamentals_dir.clone());
            let summary = run_batch(&fundamentals_dir, &prices_dir, &output, &config)?;
            for (industry, err) in &summary.failed {
                eprintln!("{industry}: {err}");
            }
        }
        Commands::Config { settings } => {
            println!("{}", serde_json::to_string_pretty(&settings.resolve()?)?);
        }
    }

    Ok(())
}
