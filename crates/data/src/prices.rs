//! Closing price series.

use std::collections::{BTreeMap, HashMap};

use fremantle_primitives::{Date, SecurityName};
use polars::prelude::*;

use crate::DataError;

/// Accepted labels of the date column, in lookup order.
pub const DATE_COLUMNS: [&str; 2] = ["date", "日期"];

/// Days from 0001-01-01 to the Unix epoch, as counted by `chrono`.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Closing prices of every security on one trading date.
///
/// Only finite prices are stored; an absent entry means the security is unpriced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSnapshot {
    prices: HashMap<SecurityName, f64>,
}

impl PriceSnapshot {
    /// Create a snapshot, discarding non-finite prices.
    pub fn new(prices: impl IntoIterator<Item = (SecurityName, f64)>) -> Self {
        Self { prices: prices.into_iter().filter(|(_, p)| p.is_finite()).collect() }
    }

    /// Price of a security.
    #[must_use]
    pub fn price(&self, name: &str) -> Option<f64> {
        self.prices.get(name).copied()
    }

    /// Price of a security if it can be bought: finite and strictly positive.
    #[must_use]
    pub fn tradable_price(&self, name: &str) -> Option<f64> {
        self.price(name).filter(|p| *p > 0.0)
    }

    /// Value of a set of holdings, counting unpriced securities as worth nothing.
    #[must_use]
    pub fn value_of<'a>(&self, holdings: impl IntoIterator<Item = (&'a SecurityName, &'a f64)>) -> f64 {
        holdings
            .into_iter()
            .map(|(name, shares)| shares * self.price(name.as_str()).unwrap_or(0.0))
            .sum()
    }

    /// Number of priced securities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Returns whether no security is priced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Closing prices indexed by trading date, ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    rows: BTreeMap<Date, PriceSnapshot>,
}

impl PriceSeries {
    /// Create a series from dated snapshots. A repeated date keeps the last snapshot.
    pub fn new(rows: impl IntoIterator<Item = (Date, PriceSnapshot)>) -> Self {
        Self { rows: rows.into_iter().collect() }
    }

    /// Build a series from a polars frame with a date column and one column per security.
    ///
    /// The date column may hold dates, datetimes, or `YYYY-MM-DD` strings. Price cells
    /// are cast to `f64` non-strictly.
    ///
    /// # Errors
    /// Returns error if no date column exists, a date cannot be read, or a column cannot
    /// be cast.
    pub fn from_frame(frame: &DataFrame) -> Result<Self, DataError> {
        let labels: Vec<String> =
            frame.get_column_names().iter().map(|name| name.to_string()).collect();
        let date_column = DATE_COLUMNS
            .iter()
            .find(|candidate| labels.iter().any(|label| label == *candidate))
            .ok_or_else(|| DataError::MissingColumn(DATE_COLUMNS.join(" or ")))?;

        let dates = read_dates(frame.column(date_column)?)?;

        let mut columns = Vec::with_capacity(labels.len().saturating_sub(1));
        for label in labels.iter().filter(|label| label != date_column) {
            let values = frame.column(label)?.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = values.f64()?.into_iter().collect();
            columns.push((SecurityName::from(label.as_str()), values));
        }

        let mut rows = BTreeMap::new();
        for (row, date) in dates.into_iter().enumerate() {
            let Some(date) = date else {
                tracing::debug!(row, "skipping price row without a date");
                continue;
            };
            let snapshot = PriceSnapshot::new(
                columns.iter().filter_map(|(name, values)| Some((name.clone(), values[row]?))),
            );
            rows.insert(date, snapshot);
        }

        Ok(Self { rows })
    }

    /// First trading date on or after `date`, with its snapshot.
    #[must_use]
    pub fn resolve(&self, date: Date) -> Option<(Date, &PriceSnapshot)> {
        self.rows.range(date..).next().map(|(d, snapshot)| (*d, snapshot))
    }

    /// Last trading date with its snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<(Date, &PriceSnapshot)> {
        self.rows.last_key_value().map(|(d, snapshot)| (*d, snapshot))
    }

    /// Most recent finite price of every security that was ever priced.
    #[must_use]
    pub fn last_prices(&self) -> PriceSnapshot {
        let mut prices = HashMap::new();
        for snapshot in self.rows.values() {
            for (name, price) in &snapshot.prices {
                prices.insert(name.clone(), *price);
            }
        }
        PriceSnapshot { prices }
    }

    /// Trading dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = Date> + '_ {
        self.rows.keys().copied()
    }

    /// Number of trading dates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the series has no trading dates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn read_dates(column: &Column) -> Result<Vec<Option<Date>>, DataError> {
    match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|text| text.map(parse_date).transpose())
            .collect(),
        DataType::Date => Ok(epoch_days(&column.cast(&DataType::Int32)?)?),
        DataType::Datetime(_, _) => {
            Ok(epoch_days(&column.cast(&DataType::Date)?.cast(&DataType::Int32)?)?)
        }
        other => Err(DataError::InvalidTable(format!("unsupported date column type {other}"))),
    }
}

fn epoch_days(column: &Column) -> PolarsResult<Vec<Option<Date>>> {
    Ok(column
        .i32()?
        .into_iter()
        .map(|days| {
            days.and_then(|d| d.checked_add(UNIX_EPOCH_DAYS_FROM_CE))
                .and_then(Date::from_num_days_from_ce_opt)
        })
        .collect())
}

fn parse_date(text: &str) -> Result<Date, DataError> {
    let head = text.split_whitespace().next().unwrap_or_default();
    ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"]
        .iter()
        .find_map(|format| Date::parse_from_str(head, format).ok())
        .ok_or_else(|| DataError::InvalidTable(format!("unreadable date {text:?}")))
}
