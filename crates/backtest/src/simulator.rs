//! Quarterly simulation loop.

use fremantle_data::{FundamentalsTable, PriceSeries, PriceSnapshot, WindowAggregator};
use fremantle_model::{FactorModel, VarianceTargetedExtractor};
use fremantle_primitives::{Date, QuarterLabel};
use fremantle_traits::FactorExtractor;

use crate::{
    BacktestConfig, BacktestError, BacktestReport, QuarterSelection, QuarterStatus,
    SimulationContext, SkipReason, quarter_starts,
};

/// Result of a single quarter step.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterOutcome {
    /// What happened.
    pub status: QuarterStatus,
    /// Model output, when a model was fitted.
    pub selection: Option<QuarterSelection>,
}

impl QuarterOutcome {
    const fn skipped(reason: SkipReason) -> Self {
        Self { status: QuarterStatus::Skipped(reason), selection: None }
    }
}

/// Runs the quarterly select-and-rebalance loop over one fundamentals table.
#[derive(Debug, Clone)]
pub struct Backtester<E> {
    config: BacktestConfig,
    extractor: E,
    aggregator: WindowAggregator,
}

impl Backtester<VarianceTargetedExtractor> {
    /// Create a backtester using the variance-targeted extractor from `config`.
    ///
    /// # Errors
    /// Returns `BacktestError::InvalidConfig` if the configuration is invalid.
    pub fn from_config(config: BacktestConfig) -> Result<Self, BacktestError> {
        let extractor = VarianceTargetedExtractor::with_config(config.extractor.clone());
        Self::new(config, extractor)
    }
}

impl<E: FactorExtractor> Backtester<E> {
    /// Create a backtester with a custom extractor.
    ///
    /// # Errors
    /// Returns `BacktestError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: BacktestConfig, extractor: E) -> Result<Self, BacktestError> {
        config.validate()?;
        let aggregator = WindowAggregator::new(config.window);
        Ok(Self { config, extractor, aggregator })
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Scheduled rebalance dates.
    #[must_use]
    pub fn schedule(&self) -> Vec<Date> {
        quarter_starts(self.config.start, self.config.end)
    }

    /// Run the backtest.
    ///
    /// Without a price series only the factor models and rankings are produced.
    ///
    /// # Errors
    /// Returns error only for failures that would repeat every quarter, such as an
    /// invalid extractor configuration. Per-quarter data problems skip the quarter.
    pub fn run(
        &self,
        fundamentals: &FundamentalsTable,
        prices: Option<&PriceSeries>,
    ) -> Result<BacktestReport, BacktestError> {
        let schedule = self.schedule();
        let mut ctx = SimulationContext::new(self.config.initial_capital);
        let mut quarters = Vec::with_capacity(schedule.len());
        let mut selections = Vec::new();

        tracing::info!(
            quarters = schedule.len(),
            securities = fundamentals.n_securities(),
            priced = prices.is_some(),
            "starting backtest"
        );

        for (i, &trade_date) in schedule.iter().enumerate() {
            let is_last = i + 1 == schedule.len();
            let outcome = self.step(&mut ctx, fundamentals, prices, trade_date, is_last)?;
            quarters.push((QuarterLabel::from_date(trade_date), trade_date, outcome.status));
            selections.extend(outcome.selection);
        }

        let final_value = match (prices, schedule.last()) {
            (Some(series), Some(&last)) if !ctx.history().is_empty() => {
                series.latest().map(|(date, _)| {
                    let value = ctx.close(QuarterLabel::from_date(last), date, &series.last_prices());
                    tracing::info!(final_value = value, %date, "backtest finished");
                    value
                })
            }
            _ => None,
        };

        Ok(BacktestReport {
            initial_capital: self.config.initial_capital,
            quarters,
            selections,
            history: ctx.into_history(),
            final_value,
        })
    }

    /// Process one scheduled quarter.
    ///
    /// With prices: resolve the trade date, record the start asset and liquidate. Then
    /// fit a model on the lookback window and, unless this is the final quarter, split
    /// cash across the tradable top-ranked securities.
    ///
    /// # Errors
    /// Returns error only if the model failure is not recoverable.
    pub fn step(
        &self,
        ctx: &mut SimulationContext,
        fundamentals: &FundamentalsTable,
        prices: Option<&PriceSeries>,
        trade_date: Date,
        is_last: bool,
    ) -> Result<QuarterOutcome, BacktestError> {
        let label = QuarterLabel::from_date(trade_date);

        let snapshot: Option<&PriceSnapshot> = match prices {
            Some(series) => {
                let Some((priced_date, snapshot)) = series.resolve(trade_date) else {
                    tracing::warn!(quarter = %label, %trade_date, "no prices on or after trade date, skipping");
                    return Ok(QuarterOutcome::skipped(SkipReason::NoPrices));
                };
                let start_asset = ctx.open_quarter(label, priced_date, snapshot);
                tracing::info!(quarter = %label, %priced_date, start_asset, "opened quarter");
                Some(snapshot)
            }
            None => None,
        };

        let Some(window) = self.config.window.window_for(trade_date) else {
            return Ok(QuarterOutcome::skipped(SkipReason::NoWindowData));
        };
        let matrix = self.aggregator.aggregate(fundamentals, &window);
        if matrix.n_indicators() == 0 && matrix.excluded_indicators().is_empty() {
            tracing::warn!(
                quarter = %label,
                window_start = %window.start(),
                window_end = %window.end(),
                "no fundamentals in lookback window, skipping"
            );
            return Ok(QuarterOutcome::skipped(SkipReason::NoWindowData));
        }

        let model = match FactorModel::fit(&self.extractor, &matrix) {
            Ok(model) => model,
            Err(err) if err.is_recoverable() => {
                tracing::warn!(quarter = %label, error = %err, "factor model failed, no selection");
                return Ok(QuarterOutcome::skipped(SkipReason::ModelFailed(err.to_string())));
            }
            Err(err) => return Err(err.into()),
        };

        let selection = QuarterSelection {
            label,
            loadings: model.loadings_table(),
            top: model.top(self.config.top_n).to_vec(),
        };
        let targets = model.top_names(self.config.top_n);
        tracing::info!(
            quarter = %label,
            n_factors = model.n_factors(),
            selected = ?targets.iter().map(|n| n.as_str()).collect::<Vec<_>>(),
            "ranked securities"
        );

        let status = match snapshot {
            Some(snapshot) if !is_last => {
                let bought = ctx.buy_equal_weight(&targets, snapshot);
                if bought.is_empty() {
                    tracing::warn!(quarter = %label, cash = ctx.cash(), "no tradable targets, holding cash");
                    QuarterStatus::HeldCash
                } else {
                    tracing::debug!(quarter = %label, bought = bought.len(), cash = ctx.cash(), "rebuilt portfolio");
                    QuarterStatus::Rebalanced { bought }
                }
            }
            _ => QuarterStatus::Ranked,
        };

        Ok(QuarterOutcome { status, selection: Some(selection) })
    }
}
