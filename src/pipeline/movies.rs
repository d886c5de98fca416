use super::{run_entity, StreamOptions};
use crate::config::CleanConfig;
use crate::dedup::DedupPolicy;
use crate::normalize::normalize_movie;
use crate::records::{MovieRecord, RawMovie};
use crate::stats::PipelineStats;
use anyhow::Result;
use std::path::Path;

pub const ENTITY: &str = "movies";

/// Cleans `movies_metadata`: first occurrence of each id wins, streamed out
/// chunk by chunk.
pub fn clean_movies(input: &Path, output: &Path, config: &CleanConfig) -> Result<PipelineStats> {
    let options = StreamOptions {
        entity: ENTITY,
        input,
        output,
        chunk_size: config.chunk_size,
        show_progress: config.show_progress,
    };
    run_entity(
        &options,
        DedupPolicy::FirstWins,
        |movie: &MovieRecord| movie.id,
        |raw: &RawMovie| normalize_movie(raw, config),
        |_| Ok(()),
    )
}
