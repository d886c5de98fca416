use super::{run_entity, StreamOptions};
use crate::config::CleanConfig;
use crate::dedup::DedupPolicy;
use crate::normalize::normalize_link;
use crate::records::{LinkRecord, RawLink};
use crate::stats::PipelineStats;
use anyhow::Result;
use std::path::Path;

pub const ENTITY: &str = "links";

pub fn clean_links(input: &Path, output: &Path, config: &CleanConfig) -> Result<PipelineStats> {
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
        |link: &LinkRecord| link.movie_id,
        |raw: &RawLink| normalize_link(raw, config),
        |_| Ok(()),
    )
}
