use clap::ValueEnum;
use std::path::PathBuf;
use thiserror::Error;

/// Resan (The Journey), the longest released film, runs 873 minutes.
pub const DEFAULT_MAX_RUNTIME: u32 = 873;
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;
pub const DEFAULT_RATINGS_CHUNK_SIZE: usize = 1_000_000;

/// Which rating survives when a user rated the same movie more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RatingsKeep {
    First,
    #[default]
    Last,
    All,
}

/// What happens to a movie whose runtime exceeds the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RuntimePolicy {
    #[default]
    Drop,
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("year-min ({min}) is greater than year-max ({max})")]
    YearRange { min: i32, max: i32 },

    #[error("{0} must be greater than zero")]
    ZeroChunkSize(&'static str),

    #[error("max-runtime must be greater than zero")]
    ZeroMaxRuntime,

    #[error("in-dir and out-dir both point at {0}")]
    SameDirectories(PathBuf),

    #[error("input directory {0} does not exist")]
    MissingInputDir(PathBuf),
}

#[derive(Debug, Clone)]
pub struct CleanConfig {
    pub in_dir: PathBuf,
    pub out_dir: PathBuf,
    pub min_votes: u32,
    pub year_min: i32,
    pub year_max: i32,
    pub keep_null_tmdb: bool,
    pub ratings_keep: RatingsKeep,
    pub explode_keywords: bool,
    pub max_runtime: u32,
    pub runtime_policy: RuntimePolicy,
    pub keep_undated: bool,
    pub chunk_size: usize,
    pub ratings_chunk_size: usize,
    pub show_progress: bool,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            in_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("data_clean"),
            min_votes: 0,
            year_min: 1888,
            year_max: 2100,
            keep_null_tmdb: false,
            ratings_keep: RatingsKeep::default(),
            explode_keywords: false,
            max_runtime: DEFAULT_MAX_RUNTIME,
            runtime_policy: RuntimePolicy::default(),
            keep_undated: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            ratings_chunk_size: DEFAULT_RATINGS_CHUNK_SIZE,
            show_progress: true,
        }
    }
}

impl CleanConfig {
    /// Checks thresholds and paths. Runs before any input file is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.year_min > self.year_max {
            return Err(ConfigError::YearRange {
                min: self.year_min,
                max: self.year_max,
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize("chunk-size"));
        }
        if self.ratings_chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize("ratings-chunk-size"));
        }
        if self.max_runtime == 0 {
            return Err(ConfigError::ZeroMaxRuntime);
        }
        if !self.in_dir.is_dir() {
            return Err(ConfigError::MissingInputDir(self.in_dir.clone()));
        }

        // A missing out_dir cannot be the existing in_dir.
        if let (Ok(input), Ok(output)) = (self.in_dir.canonicalize(), self.out_dir.canonicalize())
        {
            if input == output {
                return Err(ConfigError::SameDirectories(self.out_dir.clone()));
            }
        }

        Ok(())
    }
}
