//! Fiscal report periods and lookback windows.

use chrono::Months;
use serde::{Deserialize, Serialize};

use crate::Date;

/// Months between a rebalance date and the most recent report it may use.
pub const DEFAULT_REPORT_LAG_MONTHS: u32 = 6;

/// Months of report history covered by a lookback window.
pub const DEFAULT_WINDOW_SPAN_MONTHS: u32 = 9;

/// Kind of periodic report embedded in a fundamentals column label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportTag {
    /// First-quarter report (`一季`), fiscal month 3.
    FirstQuarter,
    /// Mid-year report (`中报`), fiscal month 6.
    MidYear,
    /// Third-quarter report (`三季`), fiscal month 9.
    ThirdQuarter,
    /// Annual report (`年报`), fiscal month 12.
    Annual,
}

impl ReportTag {
    /// All report tags in fiscal order.
    pub const ALL: [Self; 4] = [Self::FirstQuarter, Self::MidYear, Self::ThirdQuarter, Self::Annual];

    /// Token that marks this report kind inside a column label.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::FirstQuarter => "一季",
            Self::MidYear => "中报",
            Self::ThirdQuarter => "三季",
            Self::Annual => "年报",
        }
    }

    /// Month in which the reporting period ends.
    #[must_use]
    pub const fn fiscal_month(self) -> u32 {
        match self {
            Self::FirstQuarter => 3,
            Self::MidYear => 6,
            Self::ThirdQuarter => 9,
            Self::Annual => 12,
        }
    }

    /// Parse a report token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.token() == token)
    }
}

/// A fiscal reporting period: a year and a report tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportPeriod {
    /// Fiscal year.
    pub year: i32,
    /// Report kind.
    pub tag: ReportTag,
}

impl ReportPeriod {
    /// Create a new report period.
    #[must_use]
    pub const fn new(year: i32, tag: ReportTag) -> Self {
        Self { year, tag }
    }

    /// Last calendar day of the period's fiscal month.
    #[must_use]
    pub fn end_date(&self) -> Option<Date> {
        Date::from_ymd_opt(self.year, self.tag.fiscal_month(), 1)?
            .checked_add_months(Months::new(1))?
            .pred_opt()
    }
}

/// Closed date interval `[start, end]` of report periods usable at a rebalance date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookbackWindow {
    start: Date,
    end: Date,
}

impl LookbackWindow {
    /// Create a window from explicit bounds.
    #[must_use]
    pub const fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Window ending `lag_months` before `trade_date` and reaching `span_months` further back.
    ///
    /// Month arithmetic clamps to the end of shorter months.
    #[must_use]
    pub fn before(trade_date: Date, lag_months: u32, span_months: u32) -> Option<Self> {
        let end = trade_date.checked_sub_months(Months::new(lag_months))?;
        let start = end.checked_sub_months(Months::new(span_months))?;
        Some(Self { start, end })
    }

    /// Window with the default six month lag and nine month span.
    #[must_use]
    pub fn for_trade_date(trade_date: Date) -> Option<Self> {
        Self::before(trade_date, DEFAULT_REPORT_LAG_MONTHS, DEFAULT_WINDOW_SPAN_MONTHS)
    }

    /// Earliest included date.
    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Latest included date.
    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Returns whether `date` lies in the window, bounds included.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}
