//! Per-entity row normalization. Every function here is pure: a raw row goes
//! in, and either a typed clean record or the reason for rejecting it comes out.

use crate::config::{CleanConfig, RuntimePolicy};
use crate::parse::{
    is_null_like, parse_array, parse_date, parse_float, parse_int, parse_object, parse_timestamp,
    JsonArray, JsonObject,
};
use crate::records::{
    CreditRecord, KeywordsRecord, LinkRecord, MovieKeywordRecord, MovieRecord, RatingRecord,
    RawCredit, RawKeywords, RawLink, RawMovie, RawRating,
};
use crate::stats::Rejection;
use chrono::Datelike;
use serde_json::Value;

// Macro for reading an optional integer column
macro_rules! int_field {
    ($raw:expr, $field:ident) => {
        $raw.$field.as_deref().and_then(parse_int)
    };
}

// Macro for reading an optional float column
macro_rules! float_field {
    ($raw:expr, $field:ident) => {
        $raw.$field.as_deref().and_then(parse_float)
    };
}

// Macro for reading a trimmed, non-empty text column
macro_rules! text_field {
    ($raw:expr, $field:ident) => {
        $raw.$field
            .as_deref()
            .map(str::trim)
            .filter(|s| !is_null_like(s))
            .map(|s| s.to_string())
    };
}

// Macro for decoding an array column, defaulting to empty and counting the repair
macro_rules! array_field {
    ($raw:expr, $field:ident, $repaired:expr) => {
        match parse_array($raw.$field.as_deref().unwrap_or("")) {
            Ok(items) => items,
            Err(_) => {
                $repaired += 1;
                JsonArray::new()
            }
        }
    };
}

/// A clean record plus the number of fields that had to be defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub record: T,
    pub repaired: u64,
}

impl<T> Normalized<T> {
    fn new(record: T, repaired: u64) -> Self {
        Self { record, repaired }
    }
}

// ====== MOVIES ======
pub fn normalize_movie(
    raw: &RawMovie,
    config: &CleanConfig,
) -> Result<Normalized<MovieRecord>, Rejection> {
    let id = int_field!(raw, id)
        .filter(|id| *id > 0)
        .ok_or(Rejection::BadId)?;
    let title = text_field!(raw, title).ok_or(Rejection::MissingTitle)?;

    let vote_average = float_field!(raw, vote_average);
    if vote_average.is_some_and(|va| !(0.0..=10.0).contains(&va)) {
        return Err(Rejection::VoteAverageOutOfRange);
    }
    let vote_average = vote_average.unwrap_or(0.0);
    let vote_count = float_field!(raw, vote_count)
        .filter(|c| *c >= 0.0)
        .map(|c| c.trunc() as u64)
        .unwrap_or(0);

    if config.min_votes > 0 && (vote_count < u64::from(config.min_votes) || vote_average == 0.0)
    {
        return Err(Rejection::LowVotes);
    }

    let release_date = raw.release_date.as_deref().and_then(parse_date);
    let year = match release_date {
        Some(date) => {
            let year = date.year();
            if !(config.year_min..=config.year_max).contains(&year) {
                return Err(Rejection::YearOutOfRange);
            }
            Some(year)
        }
        None if config.keep_undated => None,
        None => return Err(Rejection::BadReleaseDate),
    };

    let runtime = match float_field!(raw, runtime).filter(|r| *r >= 0.0) {
        Some(minutes) if minutes.round() > f64::from(config.max_runtime) => {
            match config.runtime_policy {
                RuntimePolicy::Drop => return Err(Rejection::RuntimeTooLong),
                RuntimePolicy::Clamp => Some(config.max_runtime),
            }
        }
        Some(minutes) => Some(minutes.round() as u32),
        None => None,
    };

    let mut repaired = 0;
    let genres = array_field!(raw, genres, repaired);
    let production_companies = array_field!(raw, production_companies, repaired);
    let production_countries = array_field!(raw, production_countries, repaired);
    let spoken_languages = array_field!(raw, spoken_languages, repaired);
    let belongs_to_collection =
        match parse_object(raw.belongs_to_collection.as_deref().unwrap_or("")) {
            Ok(collection) => collection,
            Err(_) => {
                repaired += 1;
                None
            }
        };

    let movie = MovieRecord {
        id,
        imdb_id: text_field!(raw, imdb_id),
        title,
        original_title: text_field!(raw, original_title),
        original_language: text_field!(raw, original_language),
        overview: text_field!(raw, overview),
        tagline: text_field!(raw, tagline),
        status: text_field!(raw, status),
        release_date,
        year,
        runtime,
        budget: float_field!(raw, budget),
        revenue: float_field!(raw, revenue),
        popularity: float_field!(raw, popularity),
        vote_average,
        vote_count,
        genres,
        production_companies,
        production_countries,
        spoken_languages,
        belongs_to_collection,
    };
    Ok(Normalized::new(movie, repaired))
}

// ====== CREDITS ======
pub fn normalize_credit(raw: &RawCredit) -> Result<Normalized<CreditRecord>, Rejection> {
    let id = int_field!(raw, id).ok_or(Rejection::BadId)?;

    let mut repaired = 0;
    let cast = array_field!(raw, cast, repaired);
    let crew = array_field!(raw, crew, repaired);

    Ok(Normalized::new(CreditRecord { id, cast, crew }, repaired))
}

// ====== LINKS ======
pub fn normalize_link(
    raw: &RawLink,
    config: &CleanConfig,
) -> Result<Normalized<LinkRecord>, Rejection> {
    let movie_id = int_field!(raw, movie_id).ok_or(Rejection::BadId)?;
    let imdb_id = int_field!(raw, imdb_id).ok_or(Rejection::MissingImdbId)?;
    let tmdb_id = int_field!(raw, tmdb_id);
    if tmdb_id.is_none() && !config.keep_null_tmdb {
        return Err(Rejection::NullTmdbId);
    }

    Ok(Normalized::new(
        LinkRecord {
            movie_id,
            imdb_id,
            tmdb_id,
        },
        0,
    ))
}

// ====== RATINGS ======
pub fn normalize_rating(raw: &RawRating) -> Result<Normalized<RatingRecord>, Rejection> {
    let user_id = int_field!(raw, user_id).ok_or(Rejection::BadUserId)?;
    let movie_id = int_field!(raw, movie_id).ok_or(Rejection::BadMovieId)?;
    let rating = float_field!(raw, rating)
        .filter(|r| (0.0..=10.0).contains(r))
        .ok_or(Rejection::BadRating)?;
    let timestamp = raw
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .ok_or(Rejection::BadTimestamp)?;

    Ok(Normalized::new(
        RatingRecord {
            user_id,
            movie_id,
            rating,
            timestamp,
        },
        0,
    ))
}

// ====== KEYWORDS ======
fn normalize_keyword_entry(entry: &JsonObject) -> Option<JsonObject> {
    let name = entry.get("name")?.as_str()?.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }
    let mut clean = JsonObject::new();
    clean.insert(
        "id".to_string(),
        entry.get("id").cloned().unwrap_or(Value::Null),
    );
    clean.insert("name".to_string(), Value::String(name));
    Some(clean)
}

/// Keeps `{id, name}` with names trimmed and lower-cased; nameless entries go.
pub fn normalize_keywords(raw: &RawKeywords) -> Result<Normalized<KeywordsRecord>, Rejection> {
    let id = int_field!(raw, id).ok_or(Rejection::BadId)?;

    let mut repaired = 0;
    let keywords = array_field!(raw, keywords, repaired)
        .iter()
        .filter_map(normalize_keyword_entry)
        .collect();

    Ok(Normalized::new(KeywordsRecord { id, keywords }, repaired))
}

/// One `(movie, keyword)` row per keyword name, in list order.
pub fn explode_keywords(record: &KeywordsRecord) -> Vec<MovieKeywordRecord> {
    record
        .keywords
        .iter()
        .filter_map(|entry| entry.get("name").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .map(|name| MovieKeywordRecord {
            movie_id: record.id,
            keyword: name.to_string(),
        })
        .collect()
}
