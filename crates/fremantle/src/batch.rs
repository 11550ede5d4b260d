//! Batch backtests over a folder of industry tables.
//!
//! Every `<industry>_清洗后.csv` in the fundamentals folder is one independent run. A
//! matching `<industry>_股价整理.csv` in the prices folder enables trading; without it the
//! industry is ranked only. A failing industry is logged and recorded in the summary while
//! the remaining industries still run.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    path::{Path, PathBuf},
};

use fremantle_backtest::{BacktestConfig, BacktestError, BacktestReport, Backtester, NavPoint};
use fremantle_data::{DataError, FundamentalsTable, PriceSeries};
use fremantle_model::LoadingsTable;
use polars::prelude::*;

/// File name suffix of cleaned fundamentals tables.
pub const FUNDAMENTALS_SUFFIX: &str = "_清洗后.csv";

/// File name suffix of price tables.
pub const PRICES_SUFFIX: &str = "_股价整理.csv";

/// File name suffix of the per-quarter asset history.
pub const HISTORY_SUFFIX: &str = "_收益回测明细.csv";

/// File name suffix of the per-quarter selections.
pub const SELECTIONS_SUFFIX: &str = "_每季度选股策略.csv";

/// File name suffix of the per-quarter loadings.
pub const LOADINGS_SUFFIX: &str = "_因子载荷.json";

/// Cross-industry NAV table written after a batch.
pub const NAV_COMPARISON_FILE: &str = "多行业策略净值对比.csv";

/// Errors of a batch run.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// No fundamentals table was found.
    #[error("no *_清洗后.csv files in {}", .0.display())]
    NoIndustries(PathBuf),

    /// Loading or simulating an industry failed.
    #[error("backtest error: {0}")]
    Backtest(#[from] BacktestError),

    /// Writing an output table failed.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Writing the loadings failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BatchError {
    /// Returns whether the batch may continue with the next industry.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::NoIndustries(_) => false,
            Self::Backtest(err) => err.is_recoverable(),
            Self::Polars(_) | Self::Json(_) | Self::Io(_) => true,
        }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Industries whose outputs were written.
    pub succeeded: Vec<String>,
    /// Industries that failed, with the cause.
    pub failed: Vec<(String, BatchError)>,
    /// Path of the NAV comparison table, if any industry was priced.
    pub nav_comparison: Option<PathBuf>,
}

/// Backtest every industry found in `fundamentals_dir`, writing results to `output`.
///
/// # Errors
/// Returns error if no industry is found, the output folder cannot be created, or an
/// industry fails in a way that would repeat for every industry.
pub fn run_batch(
    fundamentals_dir: &Path,
    prices_dir: &Path,
    output: &Path,
    config: &BacktestConfig,
) -> Result<BatchSummary, BatchError> {
    let industries = discover_industries(fundamentals_dir)?;
    if industries.is_empty() {
        return Err(BatchError::NoIndustries(fundamentals_dir.to_path_buf()));
    }
    fs::create_dir_all(output)?;

    let mut summary = BatchSummary::default();
    let mut curves = Vec::new();
    for (industry, path) in &industries {
        let prices_path = prices_dir.join(format!("{industry}{PRICES_SUFFIX}"));
        match run_industry(industry, path, &prices_path, output, config) {
            Ok(report) => {
                curves.push((industry.clone(), report.nav()));
                summary.succeeded.push(industry.clone());
            }
            Err(err) if err.is_recoverable() => {
                tracing::error!(%industry, error = %err, "industry failed, continuing");
                summary.failed.push((industry.clone(), err));
            }
            Err(err) => return Err(err),
        }
    }

    if curves.iter().any(|(_, nav)| !nav.is_empty()) {
        let path = output.join(NAV_COMPARISON_FILE);
        write_nav_comparison(&curves, &path)?;
        summary.nav_comparison = Some(path);
    }
    tracing::info!(
        industries = industries.len(),
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        "batch finished"
    );
    Ok(summary)
}

/// Industry names and fundamentals paths, sorted by name.
///
/// Lock files starting with `~` are skipped.
///
/// # Errors
/// Returns error if the folder cannot be read.
pub fn discover_industries(dir: &Path) -> Result<Vec<(String, PathBuf)>, BatchError> {
    let mut industries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('~') {
            continue;
        }
        if let Some(industry) = file_name.strip_suffix(FUNDAMENTALS_SUFFIX) {
            industries.push((industry.to_string(), path.clone()));
        }
    }
    industries.sort();
    Ok(industries)
}

/// Backtest one industry and write its result tables.
///
/// An unreadable price table downgrades the run to ranking only.
///
/// # Errors
/// Returns error if the fundamentals table cannot be loaded, the backtest aborts, or an
/// output cannot be written.
pub fn run_industry(
    industry: &str,
    fundamentals_path: &Path,
    prices_path: &Path,
    output: &Path,
    config: &BacktestConfig,
) -> Result<BacktestReport, BatchError> {
    let _span = tracing::info_span!("industry", name = industry).entered();

    let fundamentals = load_fundamentals(fundamentals_path)?;
    tracing::info!(
        securities = fundamentals.n_securities(),
        columns = fundamentals.columns().len(),
        ignored = fundamentals.ignored_columns().len(),
        "loaded fundamentals"
    );

    let prices = if prices_path.exists() {
        match load_prices(prices_path) {
            Ok(series) => {
                tracing::info!(dates = series.len(), "loaded prices");
                Some(series)
            }
            Err(e) => {
                tracing::warn!(path = %prices_path.display(), error = %e, "unreadable prices, ranking only");
                None
            }
        }
    } else {
        tracing::info!(path = %prices_path.display(), "no price table, ranking only");
        None
    };

    let report = Backtester::from_config(config.clone())?.run(&fundamentals, prices.as_ref())?;

    if !report.history.is_empty() {
        write_history(&report, &output.join(format!("{industry}{HISTORY_SUFFIX}")))?;
    }
    if !report.selections.is_empty() {
        write_selections(&report, &output.join(format!("{industry}{SELECTIONS_SUFFIX}")))?;
        write_loadings(&report, &output.join(format!("{industry}{LOADINGS_SUFFIX}")))?;
    }
    if let Some(total) = report.total_return() {
        tracing::info!(total_return_pct = total, "industry finished");
    }

    Ok(report)
}

/// Read a fundamentals CSV.
///
/// # Errors
/// Returns `BacktestError::Data` if the file cannot be parsed or the table is malformed.
pub fn load_fundamentals(path: &Path) -> Result<FundamentalsTable, BacktestError> {
    let frame = read_csv(path, false).map_err(DataError::from)?;
    Ok(FundamentalsTable::from_frame(&frame)?)
}

/// Read a price CSV.
///
/// # Errors
/// Returns `BacktestError::Data` if the file cannot be parsed or has no date column.
pub fn load_prices(path: &Path) -> Result<PriceSeries, BacktestError> {
    let frame = read_csv(path, true).map_err(DataError::from)?;
    Ok(PriceSeries::from_frame(&frame)?)
}

fn read_csv(path: &Path, parse_dates: bool) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(parse_dates))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), BatchError> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    tracing::info!(path = %path.display(), rows = df.height(), "wrote table");
    Ok(())
}

/// Quarter, trade date, start and end asset, and period return.
fn write_history(report: &BacktestReport, path: &Path) -> Result<(), BatchError> {
    let history = &report.history;
    let mut df = DataFrame::new(vec![
        Column::new("季度".into(), history.iter().map(|r| r.label.to_string()).collect::<Vec<_>>()),
        Column::new(
            "交易日期".into(),
            history.iter().map(|r| r.trade_date.to_string()).collect::<Vec<_>>(),
        ),
        Column::new("期初总资产".into(), history.iter().map(|r| r.start_asset).collect::<Vec<_>>()),
        Column::new("期末总资产".into(), history.iter().map(|r| r.end_asset).collect::<Vec<_>>()),
        Column::new("季度收益率(%)".into(), report.period_returns()),
    ])?;
    write_csv(&mut df, path)
}

/// One row per selected security and quarter.
fn write_selections(report: &BacktestReport, path: &Path) -> Result<(), BatchError> {
    let mut quarters = Vec::new();
    let mut ranks = Vec::new();
    let mut names = Vec::new();
    let mut scores = Vec::new();
    for selection in &report.selections {
        for (rank, stock) in selection.top.iter().enumerate() {
            quarters.push(selection.label.to_string());
            ranks.push(rank as u32 + 1);
            names.push(stock.name.to_string());
            scores.push(stock.score);
        }
    }

    let mut df = DataFrame::new(vec![
        Column::new("季度".into(), quarters),
        Column::new("排名".into(), ranks),
        Column::new("证券名称".into(), names),
        Column::new("综合得分".into(), scores),
    ])?;
    write_csv(&mut df, path)
}

/// Loadings of every quarter, keyed by quarter label.
fn write_loadings(report: &BacktestReport, path: &Path) -> Result<(), BatchError> {
    let loadings: BTreeMap<String, &LoadingsTable> =
        report.selections.iter().map(|s| (s.label.to_string(), &s.loadings)).collect();
    serde_json::to_writer_pretty(File::create(path)?, &loadings)?;
    tracing::info!(path = %path.display(), quarters = loadings.len(), "wrote loadings");
    Ok(())
}

/// NAV curves of every industry in long format.
fn write_nav_comparison(curves: &[(String, Vec<NavPoint>)], path: &Path) -> Result<(), BatchError> {
    let mut industries = Vec::new();
    let mut dates = Vec::new();
    let mut navs = Vec::new();
    for (industry, curve) in curves {
        for point in curve {
            industries.push(industry.clone());
            dates.push(point.date.to_string());
            navs.push(point.nav);
        }
    }

    let mut df = DataFrame::new(vec![
        Column::new("行业".into(), industries),
        Column::new("日期".into(), dates),
        Column::new("净值".into(), navs),
    ])?;
    write_csv(&mut df, path)
}
