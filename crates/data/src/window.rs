//! Lookback window aggregation.

use std::collections::BTreeMap;

use fremantle_primitives::{
    DEFAULT_REPORT_LAG_MONTHS, DEFAULT_WINDOW_SPAN_MONTHS, Date, LookbackWindow, SecurityName,
};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::FundamentalsTable;

/// Configuration for lookback window aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Months between the trade date and the window end.
    pub lag_months: u32,
    /// Months covered by the window.
    pub span_months: u32,
    /// Indicators missing in a larger share of their window cells are excluded.
    pub max_missing_share: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lag_months: DEFAULT_REPORT_LAG_MONTHS,
            span_months: DEFAULT_WINDOW_SPAN_MONTHS,
            max_missing_share: 0.8,
        }
    }
}

impl WindowConfig {
    /// Lookback window for a trade date.
    #[must_use]
    pub fn window_for(&self, trade_date: Date) -> Option<LookbackWindow> {
        LookbackWindow::before(trade_date, self.lag_months, self.span_months)
    }
}

/// Complete indicator matrix for one lookback window.
///
/// Rows are securities with a value for every kept indicator, columns are indicators
/// sorted by name.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorMatrix {
    names: Vec<SecurityName>,
    indicators: Vec<String>,
    values: Array2<f64>,
    excluded: Vec<String>,
    dropped: Vec<SecurityName>,
}

impl IndicatorMatrix {
    /// Create a matrix from parts.
    ///
    /// Returns `None` if the shape disagrees with the labels.
    #[must_use]
    pub fn new(names: Vec<SecurityName>, indicators: Vec<String>, values: Array2<f64>) -> Option<Self> {
        (values.dim() == (names.len(), indicators.len())).then_some(Self {
            names,
            indicators,
            values,
            excluded: Vec::new(),
            dropped: Vec::new(),
        })
    }

    /// Securities in row order.
    #[must_use]
    pub fn names(&self) -> &[SecurityName] {
        &self.names
    }

    /// Indicators in column order.
    #[must_use]
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    /// Values (n_securities x n_indicators).
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of securities.
    #[must_use]
    pub fn n_securities(&self) -> usize {
        self.names.len()
    }

    /// Number of indicators.
    #[must_use]
    pub fn n_indicators(&self) -> usize {
        self.indicators.len()
    }

    /// Returns whether the matrix has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Indicators observed in the window but excluded as too sparse.
    #[must_use]
    pub fn excluded_indicators(&self) -> &[String] {
        &self.excluded
    }

    /// Securities dropped for lacking a value on a kept indicator.
    #[must_use]
    pub fn dropped_securities(&self) -> &[SecurityName] {
        &self.dropped
    }

    /// Values of one security.
    #[must_use]
    pub fn row(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let index = self.names.iter().position(|n| n.as_str() == name)?;
        Some(self.values.index_axis(Axis(0), index))
    }
}

/// Builds indicator matrices from a fundamentals table.
#[derive(Debug, Clone, Default)]
pub struct WindowAggregator {
    config: WindowConfig,
}

impl WindowAggregator {
    /// Create an aggregator.
    #[must_use]
    pub const fn new(config: WindowConfig) -> Self {
        Self { config }
    }

    /// Aggregator configuration.
    #[must_use]
    pub const fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Aggregate the window preceding `trade_date`.
    ///
    /// Returns `None` if the window bounds are out of the calendar range.
    #[must_use]
    pub fn aggregate_at(&self, table: &FundamentalsTable, trade_date: Date) -> Option<IndicatorMatrix> {
        let window = self.config.window_for(trade_date)?;
        Some(self.aggregate(table, &window))
    }

    /// Aggregate the columns of `table` whose period ends inside `window`.
    ///
    /// Each indicator becomes the per-security mean of its non-missing window columns.
    /// Indicators whose missing share across those columns exceeds the configured limit
    /// are excluded, then securities still missing a value are dropped.
    #[must_use]
    pub fn aggregate(&self, table: &FundamentalsTable, window: &LookbackWindow) -> IndicatorMatrix {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for index in table.columns_in(window) {
            groups.entry(table.columns()[index].indicator.as_str()).or_default().push(index);
        }

        let observations = table.observations();
        let n = table.n_securities();
        let mut indicators = Vec::with_capacity(groups.len());
        let mut means: Vec<Vec<f64>> = Vec::with_capacity(groups.len());
        let mut excluded = Vec::new();

        for (indicator, columns) in groups {
            let cells = n * columns.len();
            let missing = columns
                .iter()
                .map(|&c| observations.column(c).iter().filter(|v| v.is_nan()).count())
                .sum::<usize>();
            let missing_share = if cells == 0 { 0.0 } else { missing as f64 / cells as f64 };

            if missing_share > self.config.max_missing_share {
                tracing::debug!(indicator, missing_share, "excluding sparse indicator");
                excluded.push(indicator.to_string());
                continue;
            }

            let column_means = (0..n)
                .map(|row| {
                    let (sum, count) = columns
                        .iter()
                        .map(|&c| observations[[row, c]])
                        .filter(|v| !v.is_nan())
                        .fold((0.0, 0usize), |(s, k), v| (s + v, k + 1));
                    if count == 0 { f64::NAN } else { sum / count as f64 }
                })
                .collect();
            indicators.push(indicator.to_string());
            means.push(column_means);
        }

        let mut names = Vec::with_capacity(n);
        let mut dropped = Vec::new();
        let mut cells = Vec::with_capacity(n * indicators.len());
        for (row, name) in table.names().iter().enumerate() {
            if means.iter().any(|column| column[row].is_nan()) {
                dropped.push(name.clone());
                continue;
            }
            names.push(name.clone());
            cells.extend(means.iter().map(|column| column[row]));
        }

        let values = Array2::from_shape_vec((names.len(), indicators.len()), cells)
            .unwrap_or_else(|_| Array2::zeros((0, 0)));

        IndicatorMatrix { names, indicators, values, excluded, dropped }
    }
}
