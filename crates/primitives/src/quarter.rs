//! Calendar quarter labels.

use chrono::Datelike;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::Date;

/// Calendar quarter such as `2021Q2`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[display("{year}Q{quarter}")]
pub struct QuarterLabel {
    /// Calendar year.
    pub year: i32,
    /// Quarter number in `1..=4`.
    pub quarter: u32,
}

impl QuarterLabel {
    /// Label of the quarter containing `date`.
    #[must_use]
    pub fn from_date(date: Date) -> Self {
        Self { year: date.year(), quarter: date.month0() / 3 + 1 }
    }

    /// First day of the quarter.
    #[must_use]
    pub fn start_date(&self) -> Option<Date> {
        Date::from_ymd_opt(self.year, self.quarter.checked_sub(1)? * 3 + 1, 1)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1, 1, "2021Q1")]
    #[case(3, 31, "2021Q1")]
    #[case(4, 1, "2021Q2")]
    #[case(9, 30, "2021Q3")]
    #[case(12, 31, "2021Q4")]
    fn label_from_date(#[case] month: u32, #[case] day: u32, #[case] expected: &str) {
        let date = Date::from_ymd_opt(2021, month, day).unwrap();
        assert_eq!(QuarterLabel::from_date(date).to_string(), expected);
    }

    #[test]
    fn quarter_start() {
        let label = QuarterLabel { year: 2022, quarter: 3 };
        assert_eq!(label.start_date(), Date::from_ymd_opt(2022, 7, 1));
    }

    #[test]
    fn labels_order_chronologically() {
        let a = QuarterLabel { year: 2021, quarter: 4 };
        let b = QuarterLabel { year: 2022, quarter: 1 };
        assert!(a < b);
    }
}
