use std::collections::BTreeMap;
use std::fmt;

/// Why a raw row did not make it into the clean output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rejection {
    MalformedRow,
    BadId,
    MissingTitle,
    VoteAverageOutOfRange,
    LowVotes,
    BadReleaseDate,
    YearOutOfRange,
    RuntimeTooLong,
    MissingImdbId,
    NullTmdbId,
    BadUserId,
    BadMovieId,
    BadRating,
    BadTimestamp,
    Duplicate,
}

impl Rejection {
    pub fn label(self) -> &'static str {
        match self {
            Rejection::MalformedRow => "malformed_row",
            Rejection::BadId => "bad_id",
            Rejection::MissingTitle => "bad_title",
            Rejection::VoteAverageOutOfRange => "vote_average_out_of_range",
            Rejection::LowVotes => "low_votes",
            Rejection::BadReleaseDate => "bad_release_date",
            Rejection::YearOutOfRange => "year_out_of_range",
            Rejection::RuntimeTooLong => "runtime_too_long",
            Rejection::MissingImdbId => "missing_imdb_id",
            Rejection::NullTmdbId => "null_tmdb_id",
            Rejection::BadUserId => "bad_user_id",
            Rejection::BadMovieId => "bad_movie_id",
            Rejection::BadRating => "bad_rating",
            Rejection::BadTimestamp => "bad_timestamp",
            Rejection::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ====== PER-PIPELINE STATISTICS ======
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    pub entity: &'static str,
    pub rows_read: u64,
    pub rows_kept: u64,
    pub rejections: BTreeMap<Rejection, u64>,
    /// Array or date fields that could not be decoded and were defaulted.
    pub repaired_fields: u64,
    /// Duplicates written anyway because the policy keeps every occurrence.
    pub duplicates_kept: u64,
}

impl PipelineStats {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            ..Default::default()
        }
    }

    pub fn reject(&mut self, reason: Rejection) {
        self.add_rejections(reason, 1);
    }

    pub fn add_rejections(&mut self, reason: Rejection, count: u64) {
        if count > 0 {
            *self.rejections.entry(reason).or_insert(0) += count;
        }
    }

    pub fn rejected(&self, reason: Rejection) -> u64 {
        self.rejections.get(&reason).copied().unwrap_or(0)
    }

    pub fn rows_dropped(&self) -> u64 {
        self.rejections.values().sum()
    }

    pub fn kept_ratio(&self) -> f64 {
        if self.rows_read == 0 {
            0.0
        } else {
            self.rows_kept as f64 / self.rows_read as f64
        }
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] read={} kept={} dropped={} kept_ratio={:.2}%",
            self.entity,
            self.rows_read,
            self.rows_kept,
            self.rows_dropped(),
            self.kept_ratio() * 100.0
        )?;
        for (reason, count) in &self.rejections {
            write!(f, " {}={}", reason, count)?;
        }
        if self.repaired_fields > 0 {
            write!(f, " repaired_fields={}", self.repaired_fields)?;
        }
        if self.duplicates_kept > 0 {
            write!(f, " duplicates_kept={}", self.duplicates_kept)?;
        }
        Ok(())
    }
}

// ====== RUN REPORT ======
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub entities: Vec<PipelineStats>,
}

impl CleaningReport {
    pub fn push(&mut self, stats: PipelineStats) {
        self.entities.push(stats);
    }

    pub fn get(&self, entity: &str) -> Option<&PipelineStats> {
        self.entities.iter().find(|s| s.entity == entity)
    }
}

impl fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<18} {:>12} {:>12} {:>9}",
            "entity", "rows_in", "rows_out", "kept"
        )?;
        for stats in &self.entities {
            writeln!(
                f,
                "{:<18} {:>12} {:>12} {:>8.2}%",
                stats.entity,
                stats.rows_read,
                stats.rows_kept,
                stats.kept_ratio() * 100.0
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_lists_reasons_in_stable_order() {
        let mut stats = PipelineStats::new("movies");
        stats.rows_read = 8;
        stats.rows_kept = 4;
        stats.reject(Rejection::Duplicate);
        stats.reject(Rejection::BadId);
        stats.add_rejections(Rejection::LowVotes, 2);
        stats.add_rejections(Rejection::MissingTitle, 0);

        assert_eq!(stats.rows_dropped(), 4);
        assert_eq!(stats.rejected(Rejection::MissingTitle), 0);
        assert_eq!(
            stats.to_string(),
            "[movies] read=8 kept=4 dropped=4 kept_ratio=50.00% bad_id=1 low_votes=2 duplicate=1"
        );
    }

    #[test]
    fn empty_input_has_zero_ratio() {
        let stats = PipelineStats::new("links");
        assert_eq!(stats.kept_ratio(), 0.0);
    }

    #[test]
    fn report_looks_up_entities() {
        let mut report = CleaningReport::default();
        report.push(PipelineStats::new("credits"));
        assert!(report.get("credits").is_some());
        assert!(report.get("ratings").is_none());
        assert!(report.to_string().contains("credits"));
    }
}
