//! End-to-end backtest scenarios.
#![allow(missing_docs)]

use approx::assert_relative_eq;
use fremantle_backtest::{
    BacktestConfig, BacktestError, Backtester, QuarterStatus, SimulationContext, SkipReason,
};
use fremantle_data::{FundamentalsTable, PriceSeries, PriceSnapshot};
use fremantle_primitives::{Date, QuarterLabel, SecurityName};
use fremantle_traits::{ExtractionError, FactorExtractor, FactorSolution};
use ndarray::{Array2, Axis, array};

fn date(y: i32, m: u32, d: u32) -> Date {
    Date::from_ymd_opt(y, m, d).unwrap()
}

fn quarter(y: i32, m: u32) -> QuarterLabel {
    QuarterLabel::from_date(date(y, m, 1))
}

/// Scores every security by its first indicator.
#[derive(Debug, Clone, Default)]
struct FirstColumnExtractor {
    fail_config: bool,
}

impl FactorExtractor for FirstColumnExtractor {
    type Config = bool;

    fn with_config(fail_config: Self::Config) -> Self {
        Self { fail_config }
    }

    fn config(&self) -> &Self::Config {
        &self.fail_config
    }

    fn extract(&self, features: &Array2<f64>) -> Result<FactorSolution, ExtractionError> {
        if self.fail_config {
            return Err(ExtractionError::InvalidConfig("always".to_string()));
        }
        if features.nrows() < 2 {
            return Err(ExtractionError::InsufficientData { required: 2, actual: features.nrows() });
        }
        let composite = features.column(0).to_owned();
        Ok(FactorSolution {
            loadings: Array2::ones((features.ncols(), 1)),
            weights: array![1.0],
            scores: composite.clone().insert_axis(Axis(1)),
            composite,
            candidate_shares: array![1.0],
        })
    }
}

/// One indicator observed in every report period from mid 2020 to mid 2021.
fn roe_table(rows: &[(&str, f64)]) -> FundamentalsTable {
    let names = rows.iter().map(|(n, _)| SecurityName::from(*n)).collect();
    let values: Vec<Option<f64>> = rows.iter().map(|(_, v)| Some(*v)).collect();
    let columns = ["2020年中报", "2020年三季", "2020年报", "2021年一季", "2021年中报"]
        .iter()
        .map(|period| (format!("ROE\n{period}"), values.clone()))
        .collect();
    FundamentalsTable::from_columns(names, columns).unwrap()
}

fn prices(rows: &[(Date, &[(&str, f64)])]) -> PriceSeries {
    PriceSeries::new(rows.iter().map(|(d, quotes)| {
        (*d, PriceSnapshot::new(quotes.iter().map(|(n, p)| (SecurityName::from(*n), *p))))
    }))
}

fn config(start: Date, end: Date, top_n: usize) -> BacktestConfig {
    BacktestConfig { start, end, top_n, ..Default::default() }
}

#[test]
fn two_security_scenario() {
    let fundamentals = FundamentalsTable::from_columns(
        vec!["A".into(), "B".into()],
        vec![
            ("ROE\n2020年中报".to_string(), vec![Some(3.0), Some(1.0)]),
            ("EPS\n2020年中报".to_string(), vec![Some(5.0), Some(2.0)]),
        ],
    )
    .unwrap();
    let series = prices(&[
        (date(2021, 4, 1), &[("A", 10.0), ("B", 8.0)]),
        (date(2021, 7, 1), &[("A", 12.0), ("B", 8.0)]),
    ]);

    let backtester = Backtester::from_config(config(date(2021, 3, 31), date(2021, 7, 1), 1)).unwrap();
    let report = backtester.run(&fundamentals, Some(&series)).unwrap();

    assert_eq!(report.selections.len(), 2);
    let first = report.selection(quarter(2021, 4)).unwrap();
    assert_eq!(first.top.len(), 1);
    assert_eq!(first.top[0].name.as_str(), "A");
    assert_eq!(first.loadings.indicators, vec!["EPS".to_string(), "ROE".to_string()]);

    assert_eq!(
        report.status(quarter(2021, 4)),
        Some(&QuarterStatus::Rebalanced { bought: vec!["A".into()] })
    );
    assert_eq!(report.status(quarter(2021, 7)), Some(&QuarterStatus::Ranked));

    assert_eq!(report.history.len(), 2);
    assert_relative_eq!(report.history[0].start_asset, 1_000_000.0);
    assert_relative_eq!(report.history[1].start_asset, 1_200_000.0, epsilon = 1e-6);
    assert_relative_eq!(report.history[1].end_asset.unwrap(), 1_200_000.0, epsilon = 1e-6);
    assert_relative_eq!(report.final_value.unwrap(), 1_200_000.0, epsilon = 1e-6);

    let returns = report.period_returns();
    assert_relative_eq!(returns[0], 0.0);
    assert_relative_eq!(returns[1], 20.0, epsilon = 1e-9);

    let nav = report.nav();
    assert_eq!(nav.len(), 3);
    assert_relative_eq!(nav[2].nav, 1.2, epsilon = 1e-9);
    assert_relative_eq!(report.total_return().unwrap(), 20.0, epsilon = 1e-6);
}

#[test]
fn first_quarter_buys_whole_shares_of_winner() {
    let fundamentals = roe_table(&[("A", 3.0), ("B", 1.0)]);
    let series = prices(&[(date(2021, 4, 1), &[("A", 10.0), ("B", 8.0)])]);
    let backtester = Backtester::new(config(date(2021, 4, 1), date(2021, 7, 1), 1), FirstColumnExtractor::default())
        .unwrap();

    let mut ctx = SimulationContext::new(1_000_000.0);
    backtester.step(&mut ctx, &fundamentals, Some(&series), date(2021, 4, 1), false).unwrap();
    assert_relative_eq!(ctx.holdings()["A"], 100_000.0, epsilon = 1e-9);
    assert_relative_eq!(ctx.cash(), 0.0, epsilon = 1e-6);
}

#[test]
fn accounting_identity_holds_every_quarter() {
    let fundamentals = roe_table(&[("A", 4.0), ("B", 3.0), ("C", 2.0), ("D", 1.0)]);
    let series = prices(&[
        (date(2021, 4, 1), &[("A", 10.0), ("B", 20.0), ("C", 5.0), ("D", 1.0)]),
        (date(2021, 7, 2), &[("A", 11.0), ("B", 18.0), ("C", 6.0), ("D", 1.5)]),
        (date(2021, 10, 8), &[("A", 9.5), ("B", 25.0), ("C", 4.0), ("D", 1.2)]),
        (date(2022, 1, 4), &[("A", 13.0), ("B", 22.0), ("C", 7.0), ("D", 0.9)]),
    ]);
    let backtester = Backtester::new(config(date(2021, 4, 1), date(2022, 1, 1), 2), FirstColumnExtractor::default())
        .unwrap();

    let mut ctx = SimulationContext::new(1_000_000.0);
    let schedule = backtester.schedule();
    assert_eq!(schedule.len(), 4);

    for (i, &trade_date) in schedule.iter().enumerate() {
        let (priced, snapshot) = series.resolve(trade_date).unwrap();
        let expected = ctx.mark_to_market(snapshot);
        backtester
            .step(&mut ctx, &fundamentals, Some(&series), trade_date, i + 1 == schedule.len())
            .unwrap();
        let record = ctx.history().last().unwrap();
        assert_eq!(record.trade_date, priced);
        assert_relative_eq!(record.start_asset, expected, epsilon = 1e-6);
    }

    // A and B are held from the first quarter: 50,000 and 25,000 shares.
    assert_relative_eq!(ctx.history()[1].start_asset, 50_000.0 * 11.0 + 25_000.0 * 18.0, epsilon = 1e-6);
    assert!(ctx.holdings().is_empty());
}

#[test]
fn unpriced_security_never_allocated() {
    let fundamentals = roe_table(&[("A", 3.0), ("B", 2.0), ("C", 1.0)]);
    let series = prices(&[
        (date(2021, 4, 1), &[("A", 10.0), ("C", 5.0)]),
        (date(2021, 7, 1), &[("A", 10.0), ("C", 5.0)]),
    ]);
    let backtester = Backtester::new(config(date(2021, 4, 1), date(2021, 7, 1), 2), FirstColumnExtractor::default())
        .unwrap();
    let report = backtester.run(&fundamentals, Some(&series)).unwrap();

    let top: Vec<&str> =
        report.selection(quarter(2021, 4)).unwrap().top.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(top, vec!["A", "B"]);
    assert_eq!(
        report.status(quarter(2021, 4)),
        Some(&QuarterStatus::Rebalanced { bought: vec!["A".into()] })
    );
    assert_relative_eq!(report.history[1].start_asset, 1_000_000.0, epsilon = 1e-6);
}

#[test]
fn zero_tradable_names_hold_cash() {
    let fundamentals = roe_table(&[("A", 3.0), ("B", 2.0)]);
    let series = prices(&[
        (date(2021, 4, 1), &[("A", 0.0), ("B", 8.0)]),
        (date(2021, 7, 1), &[("A", 20.0), ("B", 16.0)]),
    ]);
    let backtester = Backtester::new(config(date(2021, 4, 1), date(2021, 7, 1), 1), FirstColumnExtractor::default())
        .unwrap();

    let mut ctx = SimulationContext::new(750_000.0);
    let outcome = backtester.step(&mut ctx, &fundamentals, Some(&series), date(2021, 4, 1), false).unwrap();
    assert_eq!(outcome.status, QuarterStatus::HeldCash);
    assert!(outcome.selection.is_some());
    assert_relative_eq!(ctx.cash(), 750_000.0);
    assert!(ctx.holdings().is_empty());

    let report = backtester.run(&fundamentals, Some(&series)).unwrap();
    assert_eq!(report.status(quarter(2021, 4)), Some(&QuarterStatus::HeldCash));
    assert_relative_eq!(report.history[1].start_asset, 1_000_000.0);
}

#[test]
fn quarter_without_prices_is_skipped() {
    let fundamentals = roe_table(&[("A", 3.0), ("B", 2.0)]);
    let series = prices(&[(date(2021, 4, 1), &[("A", 10.0), ("B", 8.0)])]);
    let backtester = Backtester::new(config(date(2021, 4, 1), date(2021, 10, 1), 1), FirstColumnExtractor::default())
        .unwrap();
    let report = backtester.run(&fundamentals, Some(&series)).unwrap();

    assert_eq!(report.history.len(), 1);
    assert_eq!(report.status(quarter(2021, 7)), Some(&QuarterStatus::Skipped(SkipReason::NoPrices)));
    assert_eq!(report.status(quarter(2021, 10)), Some(&QuarterStatus::Skipped(SkipReason::NoPrices)));
    assert!(report.selection(quarter(2021, 7)).is_none());

    // The final quarter was never priced, so no record carries an end value.
    assert_eq!(report.history[0].end_asset, None);
    assert_relative_eq!(report.final_value.unwrap(), 1_000_000.0, epsilon = 1e-6);
    assert_eq!(report.nav().len(), 1);
}

#[test]
fn empty_window_is_skipped_after_liquidation() {
    let fundamentals = FundamentalsTable::from_columns(
        vec!["A".into(), "B".into()],
        vec![("ROE\n2015年报".to_string(), vec![Some(1.0), Some(2.0)])],
    )
    .unwrap();
    let series = prices(&[(date(2021, 4, 1), &[("A", 10.0), ("B", 8.0)])]);
    let backtester = Backtester::new(config(date(2021, 4, 1), date(2021, 4, 1), 1), FirstColumnExtractor::default())
        .unwrap();
    let report = backtester.run(&fundamentals, Some(&series)).unwrap();

    assert_eq!(report.status(quarter(2021, 4)), Some(&QuarterStatus::Skipped(SkipReason::NoWindowData)));
    assert_eq!(report.history.len(), 1);
    assert!(report.selections.is_empty());
}

#[test]
fn model_failure_holds_cash() {
    let fundamentals = roe_table(&[("A", 3.0)]);
    let series = prices(&[
        (date(2021, 4, 1), &[("A", 10.0)]),
        (date(2021, 7, 1), &[("A", 30.0)]),
    ]);
    let backtester = Backtester::new(config(date(2021, 4, 1), date(2021, 7, 1), 1), FirstColumnExtractor::default())
        .unwrap();
    let report = backtester.run(&fundamentals, Some(&series)).unwrap();

    assert!(matches!(
        report.status(quarter(2021, 4)),
        Some(QuarterStatus::Skipped(SkipReason::ModelFailed(_)))
    ));
    assert_relative_eq!(report.history[1].start_asset, 1_000_000.0);
}

#[test]
fn sparse_indicator_never_imputed() {
    let names: Vec<SecurityName> = ["A", "B", "C", "D", "E", "F"].iter().map(|n| (*n).into()).collect();
    let fundamentals = FundamentalsTable::from_columns(
        names,
        vec![
            ("AAA\n2020年中报".to_string(), vec![Some(9.0), None, None, None, None, None]),
            ("ROE\n2020年中报".to_string(), vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)]),
        ],
    )
    .unwrap();
    let backtester = Backtester::new(config(date(2021, 4, 1), date(2021, 4, 1), 1), FirstColumnExtractor::default())
        .unwrap();
    let report = backtester.run(&fundamentals, None).unwrap();

    // The sparse indicator sorts first; had it been kept, only A would be ranked.
    let selection = report.selection(quarter(2021, 4)).unwrap();
    assert_eq!(selection.loadings.indicators, vec!["ROE".to_string()]);
    assert_eq!(selection.top[0].name.as_str(), "F");
}

#[test]
fn ranking_only_without_prices() {
    let fundamentals = roe_table(&[("A", 1.0), ("B", 2.0)]);
    let backtester = Backtester::new(config(date(2021, 4, 1), date(2021, 7, 1), 1), FirstColumnExtractor::default())
        .unwrap();
    let report = backtester.run(&fundamentals, None).unwrap();

    assert_eq!(report.selections.len(), 2);
    assert!(report.history.is_empty());
    assert!(report.final_value.is_none());
    assert!(report.nav().is_empty());
    assert!(report.quarters.iter().all(|(_, _, status)| *status == QuarterStatus::Ranked));
}

#[test]
fn fatal_extractor_error_aborts() {
    let fundamentals = roe_table(&[("A", 1.0), ("B", 2.0)]);
    let backtester =
        Backtester::new(config(date(2021, 4, 1), date(2021, 7, 1), 1), FirstColumnExtractor::with_config(true))
            .unwrap();
    let err = backtester.run(&fundamentals, None).unwrap_err();
    assert!(matches!(err, BacktestError::Model(_)));
    assert!(!err.is_recoverable());
}

#[test]
fn invalid_config_rejected() {
    let result = Backtester::from_config(BacktestConfig { top_n: 0, ..Default::default() });
    assert!(matches!(result, Err(BacktestError::InvalidConfig(_))));
}
