//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::SepaConfig;
use crate::domain::config_validation::load_sepa_config;
use crate::domain::error::SepaError;
use crate::domain::scan::{rank_results, scan_many, FetchFailure, ScanResult, SeriesFetch};
use crate::domain::series::PriceSeries;
use crate::domain::universe::{parse_tickers, sanitize_ticker};
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "sepagrade", about = "Grade stocks against the SEPA methodology")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Grade every ticker and print one line per result
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding one <TICKER>.csv per instrument
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Comma-separated tickers; overrides [scan] tickers
        #[arg(short, long)]
        tickers: Option<String>,
        #[arg(short, long)]
        benchmark: Option<String>,
        /// Sort by grade, then by distance to the 52-week high
        #[arg(long)]
        rank: bool,
    },
    /// Load and validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers with data files in a directory
    ListTickers {
        #[arg(short, long)]
        data_dir: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Scan {
            config,
            data_dir,
            tickers,
            benchmark,
            rank,
        } => run_scan(&ScanArgs {
            config,
            data_dir,
            tickers,
            benchmark,
            rank,
        }),
        Command::Validate { config } => run_validate(&config),
        Command::ListTickers { data_dir } => run_list_tickers(&data_dir),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<SepaConfig, SepaError> {
    info!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    load_sepa_config(&adapter)
}

pub struct ScanArgs {
    pub config: PathBuf,
    pub data_dir: Option<PathBuf>,
    pub tickers: Option<String>,
    pub benchmark: Option<String>,
    pub rank: bool,
}

/// Where the scan reads from, after command-line overrides are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPlan {
    pub data_dir: PathBuf,
    pub benchmark: String,
    /// Empty means every ticker with a data file except the benchmark.
    pub tickers: Vec<String>,
}

pub fn resolve_plan(args: &ScanArgs, config: &SepaConfig) -> Result<ScanPlan, SepaError> {
    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| config.scan.data_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let benchmark = match &args.benchmark {
        Some(b) => sanitize_ticker(b)?,
        None => config.scan.benchmark.clone(),
    };
    let tickers = match &args.tickers {
        Some(list) => parse_tickers(list)?,
        None => config.scan.tickers.clone(),
    };
    Ok(ScanPlan {
        data_dir,
        benchmark,
        tickers,
    })
}

/// Scans the planned tickers against the benchmark using `data`.
pub fn execute_scan(
    data: &dyn DataPort,
    plan: &ScanPlan,
    config: &SepaConfig,
) -> Result<Vec<ScanResult>, SepaError> {
    let tickers = if plan.tickers.is_empty() {
        data.list_tickers()?
            .into_iter()
            .filter(|t| !t.eq_ignore_ascii_case(&plan.benchmark))
            .collect()
    } else {
        plan.tickers.clone()
    };
    if tickers.is_empty() {
        return Err(SepaError::Data {
            reason: format!("no tickers to scan in {}", plan.data_dir.display()),
        });
    }

    let benchmark_bars = data.fetch_series(&plan.benchmark)?;
    let benchmark = PriceSeries::new(&benchmark_bars).map_err(|source| SepaError::Series {
        ticker: plan.benchmark.clone(),
        source,
    })?;
    info!(
        "Scanning {} tickers against {} ({} bars)",
        tickers.len(),
        plan.benchmark,
        benchmark.len()
    );

    let instruments: Vec<(String, SeriesFetch)> = tickers
        .into_iter()
        .map(|ticker| {
            let fetch = data.fetch_series(&ticker).map_err(|e| FetchFailure {
                message: e.to_string(),
                timestamp: Utc::now().naive_utc(),
            });
            (ticker, fetch)
        })
        .collect();

    Ok(scan_many(&instruments, &benchmark, config))
}

pub fn format_result_line(result: &ScanResult) -> String {
    let note = match (&result.error, result.first_failure()) {
        (Some(err), _) => format!("error: {}", err),
        (None, Some(failure)) => failure.to_string(),
        (None, None) => String::new(),
    };
    format!(
        "{:<10} {:<2} {:<4} {:>2} failure(s)  {}",
        result.ticker, result.grade, result.position_size, result.total_failures, note
    )
    .trim_end()
    .to_string()
}

fn run_scan(args: &ScanArgs) -> Result<(), SepaError> {
    let config = load_config(&args.config)?;
    let plan = resolve_plan(args, &config)?;
    let data = CsvAdapter::new(plan.data_dir.clone());

    let mut results = execute_scan(&data, &plan, &config)?;
    if args.rank {
        rank_results(&mut results);
    }

    for result in &results {
        println!("{}", format_result_line(result));
    }
    let actionable = results.iter().filter(|r| r.meets_criteria).count();
    let errors = results.iter().filter(|r| r.error.is_some()).count();
    println!(
        "{} scanned, {} meet criteria, {} error(s)",
        results.len(),
        actionable,
        errors
    );
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SepaError> {
    let config = load_config(config_path)?;
    println!("Config is valid: {}", config_path.display());
    println!("  benchmark: {}", config.scan.benchmark);
    println!(
        "  SMA windows: {}/{}/{}, minimum history {} bars",
        config.trend.sma_fast, config.trend.sma_mid, config.trend.sma_slow, config.trend.min_history
    );
    println!(
        "  grade thresholds: A+ <= {}, A <= {}, B <= {}, C <= {}",
        config.grade.a_plus_max, config.grade.a_max, config.grade.b_max, config.grade.c_max
    );
    Ok(())
}

fn run_list_tickers(data_dir: &Path) -> Result<(), SepaError> {
    let data = CsvAdapter::new(data_dir.to_path_buf());
    let tickers = data.list_tickers()?;
    if tickers.is_empty() {
        println!("No data files in {}", data_dir.display());
        return Ok(());
    }
    for ticker in &tickers {
        println!("{}", ticker);
    }
    println!("{} ticker(s)", tickers.len());
    Ok(())
}
