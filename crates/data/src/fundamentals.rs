//! Cleaned fundamentals table.

use std::collections::HashSet;

use fremantle_primitives::{LookbackWindow, SECURITY_NAME_COLUMN, SecurityName};
use ndarray::Array2;
use polars::prelude::*;

use crate::{DataError, IndicatorColumn, parse_column_label};

/// Per-security periodic indicator observations.
///
/// Only columns whose label resolves to an (indicator, period) pair are kept. Missing and
/// non-numeric cells are stored as `NaN`.
#[derive(Debug, Clone)]
pub struct FundamentalsTable {
    names: Vec<SecurityName>,
    columns: Vec<IndicatorColumn>,
    observations: Array2<f64>,
    ignored: Vec<String>,
}

impl FundamentalsTable {
    /// Build a table from a polars frame.
    ///
    /// Rows are keyed by the `证券名称` column when present, otherwise by the first
    /// column. Indicator cells are cast to `f64` non-strictly, so text cells become
    /// missing values.
    ///
    /// # Errors
    /// Returns error if the frame has no columns, a security name is missing or repeated,
    /// or a column cannot be cast.
    pub fn from_frame(frame: &DataFrame) -> Result<Self, DataError> {
        let labels: Vec<String> =
            frame.get_column_names().iter().map(|name| name.to_string()).collect();
        let name_column = if labels.iter().any(|label| label == SECURITY_NAME_COLUMN) {
            SECURITY_NAME_COLUMN.to_string()
        } else {
            labels
                .first()
                .cloned()
                .ok_or_else(|| DataError::InvalidTable("fundamentals table has no columns".into()))?
        };

        let raw_names = frame.column(&name_column)?.cast(&DataType::String)?;
        let names = raw_names
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, name)| {
                name.map(SecurityName::from).ok_or_else(|| {
                    DataError::InvalidTable(format!("missing security name in row {row}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut indicator_columns = Vec::new();
        for label in labels.iter().filter(|label| **label != name_column) {
            let values = frame.column(label)?.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = values.f64()?.into_iter().collect();
            indicator_columns.push((label.clone(), values));
        }

        Self::from_columns(names, indicator_columns)
    }

    /// Build a table from security names and labeled value columns.
    ///
    /// Columns whose label does not resolve are recorded as ignored.
    ///
    /// # Errors
    /// Returns error if a security name is repeated or a column length differs from the
    /// number of securities.
    pub fn from_columns(
        names: Vec<SecurityName>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, DataError> {
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(DataError::DuplicateSecurity(name.to_string()));
            }
        }

        let n = names.len();
        let mut resolved = Vec::new();
        let mut ignored = Vec::new();
        let mut cells = Vec::new();

        for (label, values) in columns {
            if values.len() != n {
                return Err(DataError::LengthMismatch {
                    column: label,
                    expected: n,
                    actual: values.len(),
                });
            }
            match parse_column_label(&label) {
                Some(column) => {
                    cells.extend(
                        values.into_iter().map(|v| v.filter(|x| x.is_finite()).unwrap_or(f64::NAN)),
                    );
                    resolved.push(column);
                }
                None => ignored.push(label),
            }
        }

        if !ignored.is_empty() {
            tracing::debug!(count = ignored.len(), columns = ?ignored, "ignoring unparsable columns");
        }

        // Cells were pushed column by column.
        let observations = Array2::from_shape_vec((resolved.len(), n), cells)
            .map_err(|e| DataError::InvalidTable(e.to_string()))?
            .reversed_axes();

        Ok(Self { names, columns: resolved, observations, ignored })
    }

    /// Security names in row order.
    #[must_use]
    pub fn names(&self) -> &[SecurityName] {
        &self.names
    }

    /// Resolved indicator columns in table order.
    #[must_use]
    pub fn columns(&self) -> &[IndicatorColumn] {
        &self.columns
    }

    /// Labels of columns that did not resolve to an indicator period.
    #[must_use]
    pub fn ignored_columns(&self) -> &[String] {
        &self.ignored
    }

    /// Observations (n_securities x n_columns), `NaN` where missing.
    #[must_use]
    pub const fn observations(&self) -> &Array2<f64> {
        &self.observations
    }

    /// Number of securities.
    #[must_use]
    pub fn n_securities(&self) -> usize {
        self.names.len()
    }

    /// Positions of the columns whose report period ends inside `window`.
    pub fn columns_in(&self, window: &LookbackWindow) -> impl Iterator<Item = usize> + '_ {
        let window = *window;
        self.columns
            .iter()
            .enumerate()
            .filter(move |(_, column)| window.contains(column.period_end))
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use fremantle_primitives::{Date, ReportTag};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn from_frame_resolves_columns() {
        let df = df! {
            "证券代码" => ["000001.SZ", "000002.SZ"],
            "证券名称" => ["A", "B"],
            "ROE\n2020年中报" => [Some(10.0), None],
            "营收\n2020年三季" => ["1.5", "n/a"],
            "备注" => ["x", "y"],
        }
        .unwrap();

        let table = FundamentalsTable::from_frame(&df).unwrap();
        assert_eq!(table.names(), &[SecurityName::from("A"), SecurityName::from("B")]);
        assert_eq!(table.columns().len(), 2);
        assert_eq!(table.columns()[0].indicator, "ROE");
        assert_eq!(table.columns()[1].period.tag, ReportTag::ThirdQuarter);
        assert_eq!(table.ignored_columns(), &["证券代码".to_string(), "备注".to_string()]);

        let obs = table.observations();
        assert_eq!(obs.dim(), (2, 2));
        assert_eq!(obs[[0, 0]], 10.0);
        assert!(obs[[1, 0]].is_nan());
        assert_eq!(obs[[0, 1]], 1.5);
        assert!(obs[[1, 1]].is_nan());
    }

    #[test]
    fn first_column_keys_rows_without_name_column() {
        let df = df! {
            "name" => ["A", "B"],
            "ROE\n2020年报" => [1.0, 2.0],
        }
        .unwrap();
        let table = FundamentalsTable::from_frame(&df).unwrap();
        assert_eq!(table.names()[1].as_str(), "B");
        assert_eq!(table.observations().column(0).to_vec(), vec![1.0, 2.0]);
        assert_eq!(table.columns().len(), 1);
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = FundamentalsTable::from_columns(
            vec!["A".into(), "A".into()],
            vec![("ROE\n2020年报".to_string(), vec![Some(1.0), Some(2.0)])],
        );
        assert!(matches!(result, Err(DataError::DuplicateSecurity(name)) if name == "A"));
    }

    #[test]
    fn length_mismatch_rejected() {
        let result = FundamentalsTable::from_columns(
            vec!["A".into(), "B".into()],
            vec![("ROE\n2020年报".to_string(), vec![Some(1.0)])],
        );
        assert!(matches!(result, Err(DataError::LengthMismatch { expected: 2, actual: 1, .. })));
    }

    #[test]
    fn columns_in_window() {
        let table = FundamentalsTable::from_columns(
            vec!["A".into()],
            vec![
                ("ROE\n2019年报".to_string(), vec![Some(1.0)]),
                ("ROE\n2020年一季".to_string(), vec![Some(2.0)]),
                ("ROE\n2020年三季".to_string(), vec![Some(3.0)]),
                ("ROE\n2020年报".to_string(), vec![Some(4.0)]),
            ],
        )
        .unwrap();
        let window = LookbackWindow::for_trade_date(date(2021, 4, 1)).unwrap();
        let selected: Vec<usize> = table.columns_in(&window).collect();
        assert_eq!(selected, vec![1, 2]);
    }
}
