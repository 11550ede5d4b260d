//! Ranked stock list type definitions.

use std::cmp::Ordering;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::SecurityName;

/// A security together with its composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStock {
    /// Security name.
    pub name: SecurityName,
    /// Composite factor score.
    pub score: f64,
}

/// Securities ordered by descending composite score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedStockList {
    stocks: Vec<RankedStock>,
}

impl RankedStockList {
    /// Rank securities by score, highest first.
    ///
    /// The sort is stable: equal scores keep their input order.
    #[must_use]
    pub fn from_scores(names: &[SecurityName], scores: &Array1<f64>) -> Self {
        debug_assert_eq!(names.len(), scores.len());
        let mut stocks: Vec<RankedStock> = names
            .iter()
            .zip(scores.iter())
            .map(|(name, &score)| RankedStock { name: name.clone(), score })
            .collect();
        stocks.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        Self { stocks }
    }

    /// Number of ranked securities.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.stocks.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    /// All ranked securities.
    #[must_use]
    pub fn stocks(&self) -> &[RankedStock] {
        &self.stocks
    }

    /// The `n` best-ranked securities (fewer if the list is shorter).
    #[must_use]
    pub fn top(&self, n: usize) -> &[RankedStock] {
        &self.stocks[..n.min(self.stocks.len())]
    }

    /// Score of a security, if ranked.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.stocks.iter().find(|s| s.name.as_str() == name).map(|s| s.score)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn names(raw: &[&str]) -> Vec<SecurityName> {
        raw.iter().copied().map(SecurityName::from).collect()
    }

    #[test]
    fn ranks_descending() {
        let list = RankedStockList::from_scores(&names(&["A", "B", "C"]), &array![0.1, 0.9, -0.4]);
        let order: Vec<&str> = list.stocks().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
        assert_eq!(list.get("C"), Some(-0.4));
    }

    #[test]
    fn ties_keep_input_order() {
        let list =
            RankedStockList::from_scores(&names(&["X", "Y", "Z"]), &array![1.0, 2.0, 1.0]);
        let order: Vec<&str> = list.stocks().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["Y", "X", "Z"]);
    }

    #[test]
    fn top_is_clamped() {
        let list = RankedStockList::from_scores(&names(&["A", "B"]), &array![1.0, 2.0]);
        assert_eq!(list.top(5).len(), 2);
        assert_eq!(list.top(1)[0].name.as_str(), "B");
        assert!(RankedStockList::default().top(3).is_empty());
    }
}
