//! Asset history and derived performance series.

use fremantle_primitives::{Date, QuarterLabel};
use serde::{Deserialize, Serialize};

/// Portfolio value at one executed rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterRecord {
    /// Quarter of the scheduled rebalance.
    pub label: QuarterLabel,
    /// Trading date the rebalance was priced at.
    pub trade_date: Date,
    /// Marked-to-market value before rebalancing.
    pub start_asset: f64,
    /// Liquidation value at the end of the backtest, set on the final quarter only.
    pub end_asset: Option<f64>,
    /// Trading date of the final liquidation prices.
    pub end_date: Option<Date>,
}

impl QuarterRecord {
    /// Create a record without an end value.
    #[must_use]
    pub const fn new(label: QuarterLabel, trade_date: Date, start_asset: f64) -> Self {
        Self { label, trade_date, start_asset, end_asset: None, end_date: None }
    }
}

/// A point of the net asset value curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    /// Valuation date.
    pub date: Date,
    /// Value relative to the initial capital.
    pub nav: f64,
}

/// Percentage change of each start asset over the previous record.
///
/// The first record, and any record following a zero start asset, has a return of 0.
#[must_use]
pub fn period_returns(records: &[QuarterRecord]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(records.len());
    let mut previous: Option<f64> = None;
    for record in records {
        let change = match previous {
            Some(prev) if prev != 0.0 => (record.start_asset / prev - 1.0) * 100.0,
            _ => 0.0,
        };
        returns.push(change);
        previous = Some(record.start_asset);
    }
    returns
}

/// Net asset value curve: one point per record, plus a terminal point when the final
/// record carries an end value.
///
/// The terminal point is dated at the trading date of the liquidation prices.
#[must_use]
pub fn nav_series(records: &[QuarterRecord], initial_capital: f64) -> Vec<NavPoint> {
    let mut points: Vec<NavPoint> = records
        .iter()
        .map(|r| NavPoint { date: r.trade_date, nav: r.start_asset / initial_capital })
        .collect();

    if let Some(QuarterRecord { end_asset: Some(end), end_date: Some(date), .. }) = records.last() {
        points.push(NavPoint { date: *date, nav: end / initial_capital });
    }
    points
}
