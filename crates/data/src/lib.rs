#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fremantle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod columns;
pub use columns::{IndicatorColumn, base_indicator_name, parse_column_label, parse_report_period};

mod fundamentals;
pub use fundamentals::FundamentalsTable;

mod window;
pub use window::{IndicatorMatrix, WindowAggregator, WindowConfig};

mod prices;
pub use prices::{DATE_COLUMNS, PriceSeries, PriceSnapshot};

mod error;
pub use error::DataError;
