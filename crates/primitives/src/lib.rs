#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fremantle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod security;
pub use security::{SECURITY_CODE_COLUMN, SECURITY_NAME_COLUMN, SecurityName};

mod period;
pub use period::{
    DEFAULT_REPORT_LAG_MONTHS, DEFAULT_WINDOW_SPAN_MONTHS, LookbackWindow, ReportPeriod, ReportTag,
};

mod quarter;
pub use quarter::QuarterLabel;

mod ranking;
pub use ranking::{RankedStock, RankedStockList};

/// Re-export common date type.
pub type Date = chrono::NaiveDate;
