//! Mutable simulation state.

use std::collections::BTreeMap;

use fremantle_data::PriceSnapshot;
use fremantle_primitives::{Date, QuarterLabel, SecurityName};

use crate::QuarterRecord;

/// Cash, holdings and asset history carried from one quarter to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationContext {
    cash: f64,
    holdings: BTreeMap<SecurityName, f64>,
    history: Vec<QuarterRecord>,
}

impl SimulationContext {
    /// Start with all capital in cash.
    #[must_use]
    pub const fn new(initial_capital: f64) -> Self {
        Self { cash: initial_capital, holdings: BTreeMap::new(), history: Vec::new() }
    }

    /// Uninvested cash.
    #[must_use]
    pub const fn cash(&self) -> f64 {
        self.cash
    }

    /// Share count per held security.
    #[must_use]
    pub const fn holdings(&self) -> &BTreeMap<SecurityName, f64> {
        &self.holdings
    }

    /// Recorded quarters in order.
    #[must_use]
    pub fn history(&self) -> &[QuarterRecord] {
        &self.history
    }

    /// Consume the context, returning its history.
    #[must_use]
    pub fn into_history(self) -> Vec<QuarterRecord> {
        self.history
    }

    /// Cash plus holdings valued at `prices`; unpriced holdings count as zero.
    #[must_use]
    pub fn mark_to_market(&self, prices: &PriceSnapshot) -> f64 {
        self.cash + prices.value_of(&self.holdings)
    }

    /// Record the quarter's start asset and convert everything to cash.
    ///
    /// Returns the start asset.
    pub fn open_quarter(&mut self, label: QuarterLabel, trade_date: Date, prices: &PriceSnapshot) -> f64 {
        let start_asset = self.mark_to_market(prices);
        self.history.push(QuarterRecord::new(label, trade_date, start_asset));
        self.cash = start_asset;
        self.holdings.clear();
        start_asset
    }

    /// Split cash equally across the targets that have a tradable price.
    ///
    /// Targets without a finite positive price are skipped. Returns the names bought;
    /// when none is tradable, cash is left untouched.
    pub fn buy_equal_weight(&mut self, targets: &[SecurityName], prices: &PriceSnapshot) -> Vec<SecurityName> {
        let tradable: Vec<(&SecurityName, f64)> = targets
            .iter()
            .filter_map(|name| prices.tradable_price(name.as_str()).map(|price| (name, price)))
            .collect();
        if tradable.is_empty() {
            return Vec::new();
        }

        let allocation = self.cash / tradable.len() as f64;
        let mut bought = Vec::with_capacity(tradable.len());
        for (name, price) in tradable {
            *self.holdings.entry(name.clone()).or_insert(0.0) += allocation / price;
            self.cash -= allocation;
            bought.push(name.clone());
        }
        bought
    }

    /// Liquidate at `prices` and attach the result to the record of `last_quarter`.
    ///
    /// The end value is attached only if the most recent record belongs to
    /// `last_quarter`. Returns the liquidation value.
    pub fn close(&mut self, last_quarter: QuarterLabel, date: Date, prices: &PriceSnapshot) -> f64 {
        let final_value = self.mark_to_market(prices);
        if let Some(record) = self.history.last_mut().filter(|r| r.label == last_quarter) {
            record.end_asset = Some(final_value);
            record.end_date = Some(date);
        }
        final_value
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot(prices: &[(&str, f64)]) -> PriceSnapshot {
        PriceSnapshot::new(prices.iter().map(|(n, p)| (SecurityName::from(*n), *p)))
    }

    fn names(list: &[&str]) -> Vec<SecurityName> {
        list.iter().map(|n| SecurityName::from(*n)).collect()
    }

    #[test]
    fn equal_weight_allocation() {
        let mut ctx = SimulationContext::new(1_000.0);
        let prices = snapshot(&[("A", 10.0), ("B", 25.0)]);
        let bought = ctx.buy_equal_weight(&names(&["A", "B"]), &prices);

        assert_eq!(bought, names(&["A", "B"]));
        assert_relative_eq!(ctx.holdings()["A"], 50.0);
        assert_relative_eq!(ctx.holdings()["B"], 20.0);
        assert_relative_eq!(ctx.cash(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(ctx.mark_to_market(&prices), 1_000.0, epsilon = 1e-9);
    }

    #[test]
    fn untradable_targets_skipped() {
        let mut ctx = SimulationContext::new(900.0);
        let prices = snapshot(&[("A", 10.0), ("B", 0.0)]);
        let bought = ctx.buy_equal_weight(&names(&["A", "B", "C"]), &prices);

        assert_eq!(bought, names(&["A"]));
        assert_relative_eq!(ctx.holdings()["A"], 90.0);
        assert!(!ctx.holdings().contains_key("B"));
        assert!(!ctx.holdings().contains_key("C"));
    }

    #[test]
    fn no_tradable_names_keeps_cash() {
        let mut ctx = SimulationContext::new(500.0);
        let bought = ctx.buy_equal_weight(&names(&["X"]), &snapshot(&[("A", 1.0)]));
        assert!(bought.is_empty());
        assert_relative_eq!(ctx.cash(), 500.0);
        assert!(ctx.holdings().is_empty());
    }

    #[test]
    fn accounting_identity_across_quarters() {
        let mut ctx = SimulationContext::new(1_000.0);
        let q1 = date(2021, 4, 1);
        let q2 = date(2021, 7, 1);

        let first = snapshot(&[("A", 10.0), ("B", 20.0)]);
        ctx.open_quarter(QuarterLabel::from_date(q1), q1, &first);
        ctx.buy_equal_weight(&names(&["A", "B"]), &first);

        let second = snapshot(&[("A", 12.0)]);
        let expected = ctx.cash() + 50.0 * 12.0;
        let start = ctx.open_quarter(QuarterLabel::from_date(q2), q2, &second);

        assert_relative_eq!(start, expected, epsilon = 1e-9);
        assert_relative_eq!(ctx.cash(), start);
        assert!(ctx.holdings().is_empty());
        assert_eq!(ctx.history().len(), 2);
        assert_relative_eq!(ctx.history()[1].start_asset, 600.0, epsilon = 1e-9);
    }

    #[test]
    fn close_attaches_end_to_last_quarter_only() {
        let q = date(2021, 4, 1);
        let label = QuarterLabel::from_date(q);
        let prices = snapshot(&[("A", 10.0)]);

        let mut ctx = SimulationContext::new(100.0);
        ctx.open_quarter(label, q, &prices);
        ctx.buy_equal_weight(&names(&["A"]), &prices);

        let closing = snapshot(&[("A", 11.0)]);
        let other = QuarterLabel::from_date(date(2021, 7, 1));
        let mut skipped = ctx.clone();
        assert_relative_eq!(skipped.close(other, date(2021, 9, 30), &closing), 110.0, epsilon = 1e-9);
        assert_eq!(skipped.history()[0].end_asset, None);

        ctx.close(label, date(2021, 9, 30), &closing);
        let record = &ctx.history()[0];
        assert_relative_eq!(record.end_asset.unwrap(), 110.0, epsilon = 1e-9);
        assert_eq!(record.end_date, Some(date(2021, 9, 30)));
    }
}
