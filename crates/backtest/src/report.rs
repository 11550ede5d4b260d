//! Backtest results.

use fremantle_model::LoadingsTable;
use fremantle_primitives::{Date, QuarterLabel, RankedStock, SecurityName};
use serde::{Deserialize, Serialize};

use crate::{NavPoint, QuarterRecord, nav_series, period_returns};

/// Why a quarter produced no selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// No trading date on or after the scheduled date.
    NoPrices,
    /// No fundamentals column falls inside the lookback window.
    NoWindowData,
    /// The factor model could not be fitted.
    ModelFailed(String),
}

/// What happened in one scheduled quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuarterStatus {
    /// A model was fitted and cash was allocated to the tradable targets.
    Rebalanced {
        /// Securities bought.
        bought: Vec<SecurityName>,
    },
    /// A model was fitted but no target had a tradable price, so the quarter is held in
    /// cash.
    HeldCash,
    /// A model was fitted without trading: the final quarter, or no price series.
    Ranked,
    /// The quarter was skipped.
    Skipped(SkipReason),
}

/// Factor model output for one quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterSelection {
    /// Quarter label.
    pub label: QuarterLabel,
    /// Labeled factor loadings.
    pub loadings: LoadingsTable,
    /// Top-ranked securities with composite scores.
    pub top: Vec<RankedStock>,
}

/// Complete output of a backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Capital the run started with.
    pub initial_capital: f64,
    /// Status of every scheduled quarter.
    pub quarters: Vec<(QuarterLabel, Date, QuarterStatus)>,
    /// Model output of every quarter that produced one.
    pub selections: Vec<QuarterSelection>,
    /// Asset history of every priced quarter.
    pub history: Vec<QuarterRecord>,
    /// Liquidation value at the end of the run, if any quarter was priced.
    pub final_value: Option<f64>,
}

impl BacktestReport {
    /// Percentage change of each start asset over the previous quarter.
    #[must_use]
    pub fn period_returns(&self) -> Vec<f64> {
        period_returns(&self.history)
    }

    /// Net asset value curve.
    #[must_use]
    pub fn nav(&self) -> Vec<NavPoint> {
        nav_series(&self.history, self.initial_capital)
    }

    /// Percent return of the last NAV point over the initial capital.
    #[must_use]
    pub fn total_return(&self) -> Option<f64> {
        self.nav().last().map(|point| (point.nav - 1.0) * 100.0)
    }

    /// Selection of a quarter.
    #[must_use]
    pub fn selection(&self, label: QuarterLabel) -> Option<&QuarterSelection> {
        self.selections.iter().find(|s| s.label == label)
    }

    /// Record of a quarter.
    #[must_use]
    pub fn record(&self, label: QuarterLabel) -> Option<&QuarterRecord> {
        self.history.iter().find(|r| r.label == label)
    }

    /// Status of a quarter.
    #[must_use]
    pub fn status(&self, label: QuarterLabel) -> Option<&QuarterStatus> {
        self.quarters.iter().find(|(l, _, _)| *l == label).map(|(_, _, status)| status)
    }
}
