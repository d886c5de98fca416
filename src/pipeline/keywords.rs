use super::{run_entity, StreamOptions};
use crate::config::CleanConfig;
use crate::dedup::{DedupPolicy, Deduplicator};
use crate::io::CleanWriter;
use crate::normalize::{explode_keywords, normalize_keywords};
use crate::records::{KeywordsRecord, MovieKeywordRecord};
use crate::stats::{PipelineStats, Rejection};
use anyhow::Result;
use std::path::Path;
use tracing::info;

pub const ENTITY: &str = "keywords";
pub const EXPLODED_ENTITY: &str = "keywords_exploded";

/// Exploded `(movie, keyword)` output, fed from kept keyword rows.
struct Exploder {
    writer: CleanWriter,
    dedup: Deduplicator<MovieKeywordRecord, ()>,
    stats: PipelineStats,
}

impl Exploder {
    fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: CleanWriter::create::<MovieKeywordRecord>(path)?,
            dedup: Deduplicator::new(DedupPolicy::FirstWins),
            stats: PipelineStats::new(EXPLODED_ENTITY),
        })
    }

    fn push(&mut self, record: &KeywordsRecord) -> Result<()> {
        for pair in explode_keywords(record) {
            self.stats.rows_read += 1;
            if self.dedup.offer(pair.clone(), ()).is_some() {
                self.writer.write(&pair)?;
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<PipelineStats> {
        self.stats
            .add_rejections(Rejection::Duplicate, self.dedup.duplicates());
        self.stats.rows_kept = self.writer.finish()?;
        info!("{}", self.stats);
        Ok(self.stats)
    }
}

/// Cleans `keywords` (first id wins) and, when `exploded_output` is given,
/// also writes one deduplicated row per `(movie, keyword)` pair.
pub fn clean_keywords(
    input: &Path,
    output: &Path,
    exploded_output: Option<&Path>,
    config: &CleanConfig,
) -> Result<(PipelineStats, Option<PipelineStats>)> {
    let options = StreamOptions {
        entity: ENTITY,
        input,
        output,
        chunk_size: config.chunk_size,
        show_progress: config.show_progress,
    };
    let mut exploder = exploded_output.map(Exploder::create).transpose()?;

    let stats = run_entity(
        &options,
        DedupPolicy::FirstWins,
        |keywords: &KeywordsRecord| keywords.id,
        normalize_keywords,
        |kept| match exploder.as_mut() {
            Some(exploder) => exploder.push(kept),
            None => Ok(()),
        },
    )?;

    let exploded = exploder.map(Exploder::finish).transpose()?;
    Ok((stats, exploded))
}
