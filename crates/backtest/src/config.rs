//! Backtest configuration.

use fremantle_data::WindowConfig;
use fremantle_model::ExtractorConfig;
use fremantle_primitives::Date;
use serde::{Deserialize, Serialize};

use crate::BacktestError;

/// Configuration for a backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// First date of the schedule range.
    pub start: Date,
    /// Last date of the schedule range.
    pub end: Date,
    /// Cash at the first rebalance.
    pub initial_capital: f64,
    /// Number of top-ranked securities targeted each quarter.
    pub top_n: usize,
    /// Factor extraction settings.
    pub extractor: ExtractorConfig,
    /// Lookback window settings.
    pub window: WindowConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            start: Date::from_ymd_opt(2021, 3, 31).unwrap_or_default(),
            end: Date::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            initial_capital: 1_000_000.0,
            top_n: 5,
            extractor: ExtractorConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl BacktestConfig {
    /// Check that every setting is usable.
    ///
    /// # Errors
    /// Returns `BacktestError::InvalidConfig` naming the first bad setting.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.start > self.end {
            return Err(BacktestError::InvalidConfig(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(BacktestError::InvalidConfig(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if self.top_n == 0 {
            return Err(BacktestError::InvalidConfig("top_n must be positive".to_string()));
        }
        let share = self.window.max_missing_share;
        if !(0.0..=1.0).contains(&share) {
            return Err(BacktestError::InvalidConfig(format!(
                "window.max_missing_share must be in [0, 1], got {share}"
            )));
        }
        self.extractor.validate().map_err(|e| BacktestError::InvalidConfig(e.to_string()))
    }
}
