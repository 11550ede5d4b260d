//! Example: quarterly backtest on a synthetic industry
//!
//! Generates fundamentals for thirty securities driven by one latent quality factor,
//! simulates weekly prices whose drift follows quality, and runs the default backtest.
//!
//! Run with: `cargo run --example synthetic_backtest`

use chrono::{Duration, NaiveDate};
use fremantle::{
    backtest::{BacktestConfig, Backtester, QuarterStatus},
    data::{FundamentalsTable, PriceSeries, PriceSnapshot},
    primitives::{ReportTag, SecurityName},
};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

// ============================================================================
// CONFIGURATION
// ============================================================================

const N_SECURITIES: usize = 30;
const FIRST_REPORT_YEAR: i32 = 2019;
const LAST_REPORT_YEAR: i32 = 2024;
const SEED: u64 = 7;

/// Indicator name, intercept, and sensitivity to quality.
const INDICATORS: &[(&str, f64, f64)] = &[
    ("ROE", 10.0, 3.0),
    ("毛利率", 30.0, 5.0),
    ("资产负债率", 50.0, -4.0),
    ("营收增长率", 8.0, 0.0),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("fremantle=info").init();

    let mut rng = StdRng::seed_from_u64(SEED);
    let normal = Normal::new(0.0, 1.0)?;

    let names: Vec<SecurityName> =
        (1..=N_SECURITIES).map(|i| SecurityName::new(format!("S{i:02}"))).collect();
    let quality: Vec<f64> = (0..N_SECURITIES).map(|_| normal.sample(&mut rng)).collect();

    // Step 1: Fundamentals, one column per indicator and report period
    let mut columns = Vec::new();
    for year in FIRST_REPORT_YEAR..=LAST_REPORT_YEAR {
        for tag in ReportTag::ALL {
            for (indicator, intercept, beta) in INDICATORS {
                let label = format!("{indicator}\n{year}年{}", tag.token());
                let values = quality
                    .iter()
                    .map(|q| Some(intercept + beta * q + normal.sample(&mut rng)))
                    .collect();
                columns.push((label, values));
            }
        }
    }
    let fundamentals = FundamentalsTable::from_columns(names.clone(), columns)?;
    println!(
        "[*] {} securities, {} indicator columns",
        fundamentals.n_securities(),
        fundamentals.columns().len()
    );

    // Step 2: Weekly prices with quality-dependent drift
    let start = NaiveDate::from_ymd_opt(2021, 1, 4).ok_or("invalid start date")?;
    let mut levels = vec![10.0_f64; N_SECURITIES];
    let mut rows = Vec::new();
    for week in 0..210 {
        let date = start + Duration::weeks(week);
        for (level, q) in levels.iter_mut().zip(&quality) {
            *level *= (0.002 * q + 0.02 * normal.sample(&mut rng)).exp();
        }
        let snapshot = PriceSnapshot::new(names.iter().cloned().zip(levels.iter().copied()));
        rows.push((date, snapshot));
    }
    let prices = PriceSeries::new(rows);
    println!("[*] {} trading dates\n", prices.len());

    // Step 3: Backtest with default settings
    let backtester = Backtester::from_config(BacktestConfig::default())?;
    let report = backtester.run(&fundamentals, Some(&prices))?;

    println!("{:<8} {:>16} {:>10}  Selection", "Quarter", "Start asset", "Return %");
    let returns = report.period_returns();
    for (record, ret) in report.history.iter().zip(&returns) {
        let picks = match report.status(record.label) {
            Some(QuarterStatus::Rebalanced { bought }) => {
                bought.iter().map(SecurityName::as_str).collect::<Vec<_>>().join(", ")
            }
            Some(QuarterStatus::HeldCash) => "(cash)".to_string(),
            Some(QuarterStatus::Ranked) => "(final quarter)".to_string(),
            Some(QuarterStatus::Skipped(reason)) => format!("skipped: {reason:?}"),
            None => String::new(),
        };
        println!("{:<8} {:>16.2} {:>10.2}  {}", record.label.to_string(), record.start_asset, ret, picks);
    }

    if let (Some(final_value), Some(total)) = (report.final_value, report.total_return()) {
        println!("\n[+] Final value {final_value:.2} ({total:.2}% total return)");
    }

    Ok(())
}
