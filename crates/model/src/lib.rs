#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fremantle/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod extractor;
pub use extractor::{ExtractorConfig, VarianceTargetedExtractor};

mod model;
pub use model::{FactorModel, LoadingsTable};

mod error;
pub use error::ModelError;

/// Re-export commonly used types.
pub mod prelude {
    pub use fremantle_traits::{ExtractionError, FactorExtractor};

    pub use super::{ExtractorConfig, FactorModel, ModelError, VarianceTargetedExtractor};
}
