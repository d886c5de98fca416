use anyhow::Result;
use clap::Parser;
use movies_cleaner::config::{
    CleanConfig, RatingsKeep, RuntimePolicy, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RUNTIME,
    DEFAULT_RATINGS_CHUNK_SIZE,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "movies_cleaner")]
#[command(about = "Clean the movies dataset CSVs (chunk-safe, with per-entity statistics)")]
struct Cli {
    /// Input directory with the original CSVs
    #[arg(long, env = "MOVIES_CLEAN_IN_DIR", default_value = "data")]
    in_dir: PathBuf,

    /// Output directory for cleaned CSVs
    #[arg(long, env = "MOVIES_CLEAN_OUT_DIR", default_value = "data_clean")]
    out_dir: PathBuf,

    /// Minimum vote_count to keep a movie (0 = keep all)
    #[arg(long, env = "MOVIES_CLEAN_MIN_VOTES", default_value_t = 0)]
    min_votes: u32,

    /// Earliest valid release year (inclusive)
    #[arg(long, env = "MOVIES_CLEAN_YEAR_MIN", default_value_t = 1888, allow_negative_numbers = true)]
    year_min: i32,

    /// Latest valid release year (inclusive)
    #[arg(long, env = "MOVIES_CLEAN_YEAR_MAX", default_value_t = 2100, allow_negative_numbers = true)]
    year_max: i32,

    /// Keep link rows whose tmdbId is missing
    #[arg(long, env = "MOVIES_CLEAN_KEEP_NULL_TMDB")]
    keep_null_tmdb: bool,

    /// Which rating survives per (userId, movieId)
    #[arg(long, env = "MOVIES_CLEAN_RATINGS_KEEP", value_enum, default_value_t = RatingsKeep::Last)]
    ratings_keep: RatingsKeep,

    /// Also write keywords_exploded.csv
    #[arg(long, env = "MOVIES_CLEAN_EXPLODE_KEYWORDS")]
    explode_keywords: bool,

    /// Runtime cap in minutes
    #[arg(long, env = "MOVIES_CLEAN_MAX_RUNTIME", default_value_t = DEFAULT_MAX_RUNTIME)]
    max_runtime: u32,

    /// What to do with movies above the runtime cap
    #[arg(long, env = "MOVIES_CLEAN_RUNTIME_POLICY", value_enum, default_value_t = RuntimePolicy::Drop)]
    runtime_policy: RuntimePolicy,

    /// Keep movies without a parseable release date
    #[arg(long, env = "MOVIES_CLEAN_KEEP_UNDATED")]
    keep_undated: bool,

    /// Rows per chunk for movies, credits, links and keywords
    #[arg(long, env = "MOVIES_CLEAN_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Rows per chunk for ratings
    #[arg(long, env = "MOVIES_CLEAN_RATINGS_CHUNK_SIZE", default_value_t = DEFAULT_RATINGS_CHUNK_SIZE)]
    ratings_chunk_size: usize,

    /// Hide progress spinners
    #[arg(long)]
    no_progress: bool,
}

impl From<Cli> for CleanConfig {
    fn from(cli: Cli) -> Self {
        Self {
            in_dir: cli.in_dir,
            out_dir: cli.out_dir,
            min_votes: cli.min_votes,
            year_min: cli.year_min,
            year_max: cli.year_max,
            keep_null_tmdb: cli.keep_null_tmdb,
            ratings_keep: cli.ratings_keep,
            explode_keywords: cli.explode_keywords,
            max_runtime: cli.max_runtime,
            runtime_policy: cli.runtime_policy,
            keep_undated: cli.keep_undated,
            chunk_size: cli.chunk_size,
            ratings_chunk_size: cli.ratings_chunk_size,
            show_progress: !cli.no_progress,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = CleanConfig::from(Cli::parse());
    info!("Input directory: {}", config.in_dir.display());
    info!(
        "Movies: min_votes={} years=[{}, {}] max_runtime={} ({:?})",
        config.min_votes,
        config.year_min,
        config.year_max,
        config.max_runtime,
        config.runtime_policy
    );

    let report = movies_cleaner::run(&config)?;

    // Print final statistics
    info!("Final Cleaning Statistics:");
    for line in report.to_string().lines() {
        info!("  {}", line);
    }

    Ok(())
}
