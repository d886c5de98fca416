//! Batch cleaner for the movies dataset CSVs (metadata, credits, links,
//! ratings, keywords). Produces clean CSVs ready for document-store insertion.

pub mod config;
pub mod dedup;
pub mod driver;
pub mod io;
pub mod normalize;
pub mod parse;
pub mod pipeline;
pub mod records;
pub mod stats;

pub use config::{CleanConfig, ConfigError, RatingsKeep, RuntimePolicy};
pub use driver::run;
pub use stats::{CleaningReport, PipelineStats, Rejection};
