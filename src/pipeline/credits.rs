use super::{run_entity, StreamOptions};
use crate::config::CleanConfig;
use crate::dedup::DedupPolicy;
use crate::normalize::normalize_credit;
use crate::records::CreditRecord;
use crate::stats::PipelineStats;
use anyhow::Result;
use std::path::Path;

pub const ENTITY: &str = "credits";

/// Cleans `credits`. Duplicate ids keep the row with the most cast and crew
/// entries; equal coverage keeps the first row seen.
pub fn clean_credits(input: &Path, output: &Path, config: &CleanConfig) -> Result<PipelineStats> {
    let options = StreamOptions {
        entity: ENTITY,
        input,
        output,
        chunk_size: config.chunk_size,
        show_progress: config.show_progress,
    };
    run_entity(
        &options,
        DedupPolicy::MaxBy(CreditRecord::coverage),
        |credit: &CreditRecord| credit.id,
        normalize_credit,
        |_| Ok(()),
    )
}
