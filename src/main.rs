use anyhow::Result;
use backtest::dataset;
use backtest::engine::{BacktestEngine, DEFAULT_INITIAL_CASH};
use backtest::models::{LagPolicy, PerformanceReport};
use backtest::strategy::{MacdStrategy, SpreadStrategy};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "backtest")]
#[command(about = "Evaluates trading strategies against historical price series")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// Starting capital for the strategy curve
    #[arg(long = "initial-cash", default_value_t = DEFAULT_INITIAL_CASH)]
    initial_cash: f64,
    /// Keep only observations on or after this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Keep only observations on or before this date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Write the full result series to this CSV file
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest the MACD crossover strategy on a single instrument
    Macd {
        /// CSV file with date and close columns
        data_file: PathBuf,
        /// Benchmark CSV (date, close) for an independent comparison curve
        #[arg(long, value_name = "PATH")]
        bench: Option<PathBuf>,
        /// Fast EMA period
        #[arg(long, default_value_t = 12)]
        fast: usize,
        /// Slow EMA period
        #[arg(long, default_value_t = 26)]
        slow: usize,
        /// Signal EMA period
        #[arg(long, default_value_t = 9)]
        signal: usize,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Backtest the paired-instrument spread strategy
    Spread {
        /// CSV file for instrument 1 (date, close)
        data_file_1: PathBuf,
        /// CSV file for instrument 2 (date, close)
        data_file_2: PathBuf,
        /// Spread level at or above which instrument 1 is entered
        #[arg(long, default_value_t = 2.3)]
        upper: f64,
        /// Spread level at or below which instrument 2 is entered
        #[arg(long, default_value_t = 1.7)]
        lower: f64,
        /// Return attribution for the held instrument
        #[arg(long = "lag-policy", value_enum, default_value_t = LagPolicy::Immediate)]
        lag_policy: LagPolicy,
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Macd {
            data_file,
            bench,
            fast,
            slow,
            signal,
            common,
        } => {
            let data = dataset::between_date(dataset::load_series(&data_file)?, common.from, common.to);
            let parameters = HashMap::from([
                ("fastPeriod".to_string(), fast as f64),
                ("slowPeriod".to_string(), slow as f64),
                ("signalPeriod".to_string(), signal as f64),
            ]);
            let mut engine = BacktestEngine::new(Box::new(MacdStrategy::new(&parameters)));
            engine.set_initial_cash(common.initial_cash);
            if let Some(bench_path) = bench {
                engine.set_bench(dataset::load_series(&bench_path)?);
            }

            engine.run(data)?;
            finish(&engine, &common)?;
        }
        Commands::Spread {
            data_file_1,
            data_file_2,
            upper,
            lower,
            lag_policy,
            common,
        } => {
            let series_1 =
                dataset::between_date(dataset::load_series(&data_file_1)?, common.from, common.to);
            let series_2 =
                dataset::between_date(dataset::load_series(&data_file_2)?, common.from, common.to);
            let data = dataset::merge_pair(&series_1, &series_2)?;

            let parameters = HashMap::from([
                ("upper".to_string(), upper),
                ("lower".to_string(), lower),
            ]);
            let mut engine = BacktestEngine::new(Box::new(SpreadStrategy::new(&parameters)));
            engine.set_initial_cash(common.initial_cash);
            engine.set_lag_policy(lag_policy);

            engine.run_pairs(data)?;
            finish(&engine, &common)?;
        }
    }

    Ok(())
}

fn finish(engine: &BacktestEngine, common: &CommonArgs) -> Result<()> {
    let report = engine.report()?;

    if let Some(export_path) = &common.export {
        engine.export_csv(export_path)?;
        info!("Result series written to {}", export_path.display());
    }

    if let Some(curve) = engine.bench_curve() {
        if let Some((date, value)) = curve.last() {
            info!("Benchmark cumulative return at {}: {:.2}%", date, (value - 1.0) * 100.0);
        }
    }

    if common.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &PerformanceReport) {
    println!("Total Market Return: {:.2}%", report.total_market_return * 100.0);
    println!(
        "Total Strategy Return: {:.2}%",
        report.total_strategy_return * 100.0
    );
    println!("Max Drawdown: {:.2}%", report.max_drawdown * 100.0);
    println!("Annualized Return: {:.2}%", report.annualized_return * 100.0);
    println!(
        "Annualized Volatility: {:.2}%",
        report.annualized_volatility * 100.0
    );
    println!("Risk-Adjusted Ratio: {:.4}", report.risk_adjusted);
}
