#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fremantle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod standardize;
pub use standardize::{Standardizer, standardize_columns};

mod linalg;
pub use linalg::{SymmetricEigen, invert, polar_factor, symmetric_eigen};

mod rotation;
pub use rotation::{Rotation, varimax};

mod variance;
pub use variance::{explained_variance_shares, min_factors_for_share};

mod factor_analysis;
pub use factor_analysis::{FactorAnalysis, FactorAnalysisFit};

mod error;
pub use error::MathError;
