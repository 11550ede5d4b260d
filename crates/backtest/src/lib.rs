#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fremantle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod schedule;
pub use schedule::quarter_starts;

mod config;
pub use config::BacktestConfig;

mod context;
pub use context::SimulationContext;

mod performance;
pub use performance::{NavPoint, QuarterRecord, nav_series, period_returns};

mod report;
pub use report::{BacktestReport, QuarterSelection, QuarterStatus, SkipReason};

mod simulator;
pub use simulator::{Backtester, QuarterOutcome};

mod error;
pub use error::BacktestError;
