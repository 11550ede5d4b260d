//! Rebalance schedule.

use chrono::Months;
use fremantle_primitives::{Date, QuarterLabel};

/// Calendar quarter starts (Jan 1, Apr 1, Jul 1, Oct 1) inside `[start, end]`, ascending.
#[must_use]
pub fn quarter_starts(start: Date, end: Date) -> Vec<Date> {
    let mut dates = Vec::new();
    let Some(mut current) = QuarterLabel::from_date(start).start_date() else {
        return dates;
    };
    if current < start {
        match current.checked_add_months(Months::new(3)) {
            Some(next) => current = next,
            None => return dates,
        }
    }

    while current <= end {
        dates.push(current);
        match current.checked_add_months(Months::new(3)) {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_range() {
        let dates = quarter_starts(date(2021, 3, 31), date(2024, 12, 31));
        assert_eq!(dates.len(), 15);
        assert_eq!(dates.first(), Some(&date(2021, 4, 1)));
        assert_eq!(dates.last(), Some(&date(2024, 10, 1)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let dates = quarter_starts(date(2021, 1, 1), date(2021, 7, 1));
        assert_eq!(dates, vec![date(2021, 1, 1), date(2021, 4, 1), date(2021, 7, 1)]);
    }

    #[test]
    fn empty_when_no_quarter_start_inside() {
        assert!(quarter_starts(date(2021, 4, 2), date(2021, 6, 30)).is_empty());
        assert!(quarter_starts(date(2022, 1, 1), date(2021, 1, 1)).is_empty());
    }
}
