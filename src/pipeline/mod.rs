//! Entity pipelines: raw CSV -> normalize -> dedup -> clean CSV, one chunk at
//! a time.

pub mod credits;
pub mod keywords;
pub mod links;
pub mod movies;
pub mod ratings;

use crate::dedup::{DedupPolicy, Deduplicator};
use crate::io::{memory_usage, ChunkReader, CleanWriter};
use crate::normalize::Normalized;
use crate::records::CleanRecord;
use crate::stats::{PipelineStats, Rejection};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::de::DeserializeOwned;
use std::hash::Hash;
use std::path::Path;
use tracing::{debug, info};

const MEMORY_LOG_EVERY_CHUNKS: u64 = 10;

/// Where one entity reads from and writes to, and how much it reads at once.
pub struct StreamOptions<'a> {
    pub entity: &'static str,
    pub input: &'a Path,
    pub output: &'a Path,
    pub chunk_size: usize,
    pub show_progress: bool,
}

pub(crate) fn progress_bar(entity: &str, enabled: bool) -> Result<ProgressBar> {
    if !enabled {
        return Ok(ProgressBar::hidden());
    }
    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::with_template(
        "[{elapsed_precise}] {spinner:.cyan} {pos:>12} rows | {msg}",
    )?);
    progress.set_message(format!("Cleaning {entity}..."));
    Ok(progress)
}

fn accept_row<T>(row: Result<T, csv::Error>, stats: &mut PipelineStats) -> Option<T> {
    match row {
        Ok(raw) => Some(raw),
        Err(err) => {
            debug!("[{}] skipping malformed row: {}", stats.entity, err);
            stats.reject(Rejection::MalformedRow);
            None
        }
    }
}

/// Streams one file through `normalize` and the deduplicator.
///
/// Rows the policy can decide immediately are appended after every chunk.
/// Under last-wins the file is read a second time and each key's last row is
/// appended chunk by chunk, in file order; rows held by max-wins are written
/// once the file is exhausted. `on_kept` sees every written record, in
/// output order.
pub(crate) fn run_entity<Raw, Rec, K>(
    options: &StreamOptions<'_>,
    policy: DedupPolicy<Rec>,
    key: impl Fn(&Rec) -> K,
    mut normalize: impl FnMut(&Raw) -> Result<Normalized<Rec>, Rejection>,
    mut on_kept: impl FnMut(&Rec) -> Result<()>,
) -> Result<PipelineStats>
where
    Raw: DeserializeOwned,
    Rec: CleanRecord,
    K: Hash + Eq,
{
    info!(
        "Cleaning {} from {}",
        options.entity,
        options.input.display()
    );
    let mut stats = PipelineStats::new(options.entity);
    let mut reader = ChunkReader::<Raw>::open(options.input, options.chunk_size)?;
    let mut writer = CleanWriter::create::<Rec>(options.output)?;
    let mut dedup = Deduplicator::new(policy);
    let progress = progress_bar(options.entity, options.show_progress)?;

    while let Some(chunk) = reader.next_chunk()? {
        stats.rows_read += chunk.len() as u64;

        for row in chunk {
            let Some(raw) = accept_row(row, &mut stats) else {
                continue;
            };
            match normalize(&raw) {
                Ok(Normalized { record, repaired }) => {
                    stats.repaired_fields += repaired;
                    if let Some(record) = dedup.offer(key(&record), record) {
                        writer.write(&record)?;
                        on_kept(&record)?;
                    }
                }
                Err(reason) => stats.reject(reason),
            }
        }

        writer.flush()?;
        progress.set_position(stats.rows_read);
        if reader.chunks_read() % MEMORY_LOG_EVERY_CHUNKS == 0 {
            info!(
                "[{}] {} rows read, {} unique keys, {} held rows. Memory: {}",
                options.entity,
                stats.rows_read,
                dedup.unique_keys(),
                dedup.held_rows(),
                memory_usage()
            );
        }
    }

    if dedup.replays_input() {
        replay_last_rows(options, &dedup, &key, &mut normalize, &mut on_kept, &mut writer)?;
    }

    if dedup.keeps_duplicates() {
        stats.duplicates_kept = dedup.duplicates();
    } else {
        stats.add_rejections(Rejection::Duplicate, dedup.duplicates());
    }
    for record in dedup.finish() {
        writer.write(&record)?;
        on_kept(&record)?;
    }
    stats.rows_kept = writer.finish()?;

    progress.finish_with_message(format!("{} complete", options.entity));
    info!("{}", stats);
    Ok(stats)
}

/// Second pass for last-wins: re-reads and re-normalizes the input, counting
/// ordinals exactly as the first pass offered them, and writes every row that
/// is the last one for its key.
fn replay_last_rows<Raw, Rec, K>(
    options: &StreamOptions<'_>,
    dedup: &Deduplicator<K, Rec>,
    key: &impl Fn(&Rec) -> K,
    normalize: &mut impl FnMut(&Raw) -> Result<Normalized<Rec>, Rejection>,
    on_kept: &mut impl FnMut(&Rec) -> Result<()>,
    writer: &mut CleanWriter,
) -> Result<()>
where
    Raw: DeserializeOwned,
    Rec: CleanRecord,
    K: Hash + Eq,
{
    info!(
        "[{}] writing last row per key from {}",
        options.entity,
        options.input.display()
    );
    let mut reader = ChunkReader::<Raw>::open(options.input, options.chunk_size)?;
    let mut ordinal = 0u64;

    while let Some(chunk) = reader.next_chunk()? {
        for row in chunk {
            let Ok(raw) = row else {
                continue;
            };
            let Ok(Normalized { record, .. }) = normalize(&raw) else {
                continue;
            };
            if dedup.is_last(&key(&record), ordinal) {
                writer.write(&record)?;
                on_kept(&record)?;
            }
            ordinal += 1;
        }
        writer.flush()?;
    }
    Ok(())
}
