use super::{run_entity, StreamOptions};
use crate::config::CleanConfig;
use crate::dedup::DedupPolicy;
use crate::normalize::normalize_rating;
use crate::records::RatingRecord;
use crate::stats::PipelineStats;
use anyhow::Result;
use std::path::Path;
use tracing::info;

pub const ENTITY: &str = "ratings";

/// Cleans `ratings`, the one file too large to hold in memory.
///
/// The index only ever holds `(userId, movieId)` keys. Under `first` and
/// `all` rows are appended as each chunk completes. Under `last` the first
/// pass records each key's final row number and a second pass over the file
/// appends those rows chunk by chunk.
pub fn clean_ratings(input: &Path, output: &Path, config: &CleanConfig) -> Result<PipelineStats> {
    info!(
        "Ratings dedup policy: {:?}, chunk size {}",
        config.ratings_keep, config.ratings_chunk_size
    );
    let options = StreamOptions {
        entity: ENTITY,
        input,
        output,
        chunk_size: config.ratings_chunk_size,
        show_progress: config.show_progress,
    };
    run_entity(
        &options,
        DedupPolicy::from(config.ratings_keep),
        RatingRecord::key,
        normalize_rating,
        |_| Ok(()),
    )
}
