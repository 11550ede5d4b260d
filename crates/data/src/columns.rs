//! Semantics of periodic indicator column labels.
//!
//! A cleaned fundamentals table carries one column per (indicator, report period), with
//! labels such as `"ROE\n2020年中报"` or `"营业收入 2021 一季"`. The indicator name is
//! the text before the first line break, and the report period is a four-digit year
//! followed somewhere later by one of the period tokens.

use fremantle_primitives::{Date, ReportPeriod, ReportTag, SecurityName};

/// A resolved periodic indicator column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorColumn {
    /// Raw column label.
    pub label: String,
    /// Base indicator name.
    pub indicator: String,
    /// Report period the column covers.
    pub period: ReportPeriod,
    /// Last calendar day of the report period.
    pub period_end: Date,
}

/// Base indicator name of a column label: the text before the first line break, trimmed.
#[must_use]
pub fn base_indicator_name(label: &str) -> &str {
    label.split_once('\n').map_or(label, |(head, _)| head).trim()
}

/// Find the report period encoded in a label.
///
/// Line breaks are treated as spaces. The year is the first run of four ASCII digits that
/// is followed, anywhere later in the label, by a period token; the earliest such token
/// wins.
#[must_use]
pub fn parse_report_period(label: &str) -> Option<ReportPeriod> {
    let text = label.replace('\n', " ");
    let chars: Vec<(usize, char)> = text.char_indices().collect();

    for start in 0..chars.len() {
        let Some(digits) = chars.get(start..start + 4) else {
            break;
        };
        if !digits.iter().all(|(_, c)| c.is_ascii_digit()) {
            continue;
        }

        let year_text: String = digits.iter().map(|(_, c)| *c).collect();
        let rest_offset = chars.get(start + 4).map_or(text.len(), |(offset, _)| *offset);
        let rest = &text[rest_offset..];

        // Later year candidates only see a suffix of `rest`, so a miss here is final.
        let tag = ReportTag::ALL
            .iter()
            .filter_map(|tag| rest.find(tag.token()).map(|pos| (pos, *tag)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, tag)| tag)?;

        let year = year_text.parse().ok()?;
        return Some(ReportPeriod::new(year, tag));
    }
    None
}

/// Resolve a column label into an indicator column.
///
/// Returns `None` for reserved identifier columns, labels without a recognizable period,
/// labels with an empty indicator name, and periods whose end date is out of range.
#[must_use]
pub fn parse_column_label(label: &str) -> Option<IndicatorColumn> {
    if SecurityName::is_reserved_column(label.trim()) {
        return None;
    }

    let period = parse_report_period(label)?;
    let indicator = base_indicator_name(label);
    if indicator.is_empty() {
        return None;
    }

    Some(IndicatorColumn {
        label: label.to_string(),
        indicator: indicator.to_string(),
        period,
        period_end: period.end_date()?,
    })
}
