//! # fremantle
//!
//! Rolling factor-analysis stock selection with a quarterly backtest.
//!
//! This crate re-exports the fremantle workspace crates. Individual components can be
//! enabled via feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Dates, report periods, quarter labels and rankings
//! - `traits`: The factor extractor abstraction
//! - `math`: Standardization, eigen decomposition, factor analysis and varimax
//! - `data`: Fundamentals and price tables, lookback window aggregation
//! - `model`: Variance-targeted factor model
//! - `backtest`: Quarterly simulation and performance accounting
//! - `batch` (default): Per-industry CSV batch runs with isolated failures
//! - `cli`: The `fremantle` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use fremantle::backtest::{BacktestConfig, Backtester};
//!
//! let backtester = Backtester::from_config(BacktestConfig::default())?;
//! let report = backtester.run(&fundamentals, Some(&prices))?;
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use fremantle_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use fremantle_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use fremantle_math as math;
#[cfg(feature = "data")]
#[doc(inline)]
pub use fremantle_data as data;
#[cfg(feature = "model")]
#[doc(inline)]
pub use fremantle_model as model;
#[cfg(feature = "backtest")]
#[doc(inline)]
pub use fremantle_backtest as backtest;

#[cfg(feature = "batch")]
pub mod batch;
