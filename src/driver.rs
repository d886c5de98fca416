use crate::config::CleanConfig;
use crate::io::resolve_input;
use crate::pipeline::{credits, keywords, links, movies, ratings};
use crate::stats::CleaningReport;
use anyhow::{anyhow, Context, Result};
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const MOVIES_INPUT: &str = "movies_metadata";
pub const CREDITS_INPUT: &str = "credits";
pub const LINKS_INPUT: &str = "links";
pub const RATINGS_INPUT: &str = "ratings";
pub const KEYWORDS_INPUT: &str = "keywords";

pub const MOVIES_OUTPUT: &str = "movies_clean.csv";
pub const CREDITS_OUTPUT: &str = "credits_clean.csv";
pub const LINKS_OUTPUT: &str = "links_clean.csv";
pub const RATINGS_OUTPUT: &str = "ratings_clean.csv";
pub const KEYWORDS_OUTPUT: &str = "keywords_clean.csv";
pub const KEYWORDS_EXPLODED_OUTPUT: &str = "keywords_exploded.csv";

fn require_input(dir: &Path, stem: &str) -> Result<PathBuf> {
    resolve_input(dir, stem)
        .ok_or_else(|| anyhow!("missing input file {stem}.csv (or {stem}.csv.gz) in {}", dir.display()))
}

/// Runs every entity pipeline in order and returns the per-entity report.
///
/// Configuration and the presence of all required inputs are checked before
/// anything is written; the first I/O failure aborts the run.
pub fn run(config: &CleanConfig) -> Result<CleaningReport> {
    config.validate().context("invalid configuration")?;

    let movies_in = require_input(&config.in_dir, MOVIES_INPUT)?;
    let credits_in = require_input(&config.in_dir, CREDITS_INPUT)?;
    let links_in = require_input(&config.in_dir, LINKS_INPUT)?;
    let ratings_in = require_input(&config.in_dir, RATINGS_INPUT)?;
    let keywords_in = resolve_input(&config.in_dir, KEYWORDS_INPUT);

    create_dir_all(&config.out_dir)
        .with_context(|| format!("creating output directory {}", config.out_dir.display()))?;
    info!("Output directory: {}", config.out_dir.display());

    let out = |name: &str| config.out_dir.join(name);
    let mut report = CleaningReport::default();

    report.push(movies::clean_movies(&movies_in, &out(MOVIES_OUTPUT), config)?);
    report.push(credits::clean_credits(&credits_in, &out(CREDITS_OUTPUT), config)?);
    report.push(links::clean_links(&links_in, &out(LINKS_OUTPUT), config)?);
    report.push(ratings::clean_ratings(&ratings_in, &out(RATINGS_OUTPUT), config)?);

    match keywords_in {
        Some(path) => {
            let exploded_path = config
                .explode_keywords
                .then(|| out(KEYWORDS_EXPLODED_OUTPUT));
            let (stats, exploded) = keywords::clean_keywords(
                &path,
                &out(KEYWORDS_OUTPUT),
                exploded_path.as_deref(),
                config,
            )?;
            report.push(stats);
            if let Some(exploded) = exploded {
                report.push(exploded);
            }
        }
        None => warn!(
            "{}.csv not found in {}, skipping keywords",
            KEYWORDS_INPUT,
            config.in_dir.display()
        ),
    }

    info!("Clean files written to {}", config.out_dir.display());
    Ok(report)
}
