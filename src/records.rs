use crate::parse::{
    serialize_array, serialize_date, serialize_object, serialize_timestamp, JsonArray, JsonObject,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A row type written to one of the clean CSVs. `HEADER` lists the columns in
/// the order the `Serialize` impl emits them.
pub trait CleanRecord: Serialize {
    const HEADER: &'static [&'static str];
}

// ====== RAW INPUT ROWS ======
// Every column is optional text; typing happens in the normalizer so a bad
// cell rejects or defaults one row instead of failing the file.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMovie {
    pub id: Option<String>,
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<String>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub popularity: Option<String>,
    pub vote_average: Option<String>,
    pub vote_count: Option<String>,
    pub genres: Option<String>,
    pub production_companies: Option<String>,
    pub production_countries: Option<String>,
    pub spoken_languages: Option<String>,
    pub belongs_to_collection: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCredit {
    pub cast: Option<String>,
    pub crew: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLink {
    #[serde(rename = "movieId")]
    pub movie_id: Option<String>,
    #[serde(rename = "imdbId")]
    pub imdb_id: Option<String>,
    #[serde(rename = "tmdbId")]
    pub tmdb_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRating {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "movieId")]
    pub movie_id: Option<String>,
    pub rating: Option<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawKeywords {
    pub id: Option<String>,
    pub keywords: Option<String>,
}

// ====== CLEAN OUTPUT ROWS ======

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecord {
    pub id: i64,
    pub imdb_id: Option<String>,
    pub title: String,
    pub original_title: Option<String>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    #[serde(serialize_with = "serialize_date")]
    pub release_date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub runtime: Option<u32>,
    pub budget: Option<f64>,
    pub revenue: Option<f64>,
    pub popularity: Option<f64>,
    pub vote_average: f64,
    pub vote_count: u64,
    #[serde(serialize_with = "serialize_array")]
    pub genres: JsonArray,
    #[serde(serialize_with = "serialize_array")]
    pub production_companies: JsonArray,
    #[serde(serialize_with = "serialize_array")]
    pub production_countries: JsonArray,
    #[serde(serialize_with = "serialize_array")]
    pub spoken_languages: JsonArray,
    #[serde(serialize_with = "serialize_object")]
    pub belongs_to_collection: Option<JsonObject>,
}

impl CleanRecord for MovieRecord {
    const HEADER: &'static [&'static str] = &[
        "id",
        "imdb_id",
        "title",
        "original_title",
        "original_language",
        "overview",
        "tagline",
        "status",
        "release_date",
        "year",
        "runtime",
        "budget",
        "revenue",
        "popularity",
        "vote_average",
        "vote_count",
        "genres",
        "production_companies",
        "production_countries",
        "spoken_languages",
        "belongs_to_collection",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditRecord {
    pub id: i64,
    #[serde(serialize_with = "serialize_array")]
    pub cast: JsonArray,
    #[serde(serialize_with = "serialize_array")]
    pub crew: JsonArray,
}

impl CreditRecord {
    /// Combined cast and crew length; the richer duplicate wins.
    pub fn coverage(&self) -> usize {
        self.cast.len() + self.crew.len()
    }
}

impl CleanRecord for CreditRecord {
    const HEADER: &'static [&'static str] = &["id", "cast", "crew"];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRecord {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    #[serde(rename = "imdbId")]
    pub imdb_id: i64,
    #[serde(rename = "tmdbId")]
    pub tmdb_id: Option<i64>,
}

impl CleanRecord for LinkRecord {
    const HEADER: &'static [&'static str] = &["movieId", "imdbId", "tmdbId"];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRecord {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
}

impl RatingRecord {
    pub fn key(&self) -> (i64, i64) {
        (self.user_id, self.movie_id)
    }
}

impl CleanRecord for RatingRecord {
    const HEADER: &'static [&'static str] = &["userId", "movieId", "rating", "timestamp"];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordsRecord {
    pub id: i64,
    #[serde(serialize_with = "serialize_array")]
    pub keywords: JsonArray,
}

impl CleanRecord for KeywordsRecord {
    const HEADER: &'static [&'static str] = &["id", "keywords"];
}

/// One exploded `(movie, keyword)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MovieKeywordRecord {
    pub movie_id: i64,
    pub keyword: String,
}

impl CleanRecord for MovieKeywordRecord {
    const HEADER: &'static [&'static str] = &["movie_id", "keyword"];
}
