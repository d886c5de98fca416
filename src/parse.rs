//! Tolerant decoding of the pseudo-JSON list columns and the mixed date
//! representations found in the raw movie CSVs.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serializer;
use serde_json::{Map, Value};
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

pub type JsonObject = Map<String, Value>;
pub type JsonArray = Vec<JsonObject>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unterminated string literal starting at byte {0}")]
    UnterminatedString(usize),

    #[error("not valid JSON after literal translation: {0}")]
    Json(String),

    #[error("expected {expected}, found {found}")]
    Shape {
        expected: &'static str,
        found: &'static str,
    },
}

// ====== NULL / NUMERIC HELPERS ======

/// Empty cells and the usual textual spellings of "missing".
pub fn is_null_like(raw: &str) -> bool {
    let s = raw.trim();
    s.is_empty()
        || s.eq_ignore_ascii_case("null")
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("none")
}

pub fn parse_float(raw: &str) -> Option<f64> {
    if is_null_like(raw) {
        return None;
    }
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integers, also accepting integral floats such as `"862.0"`.
pub fn parse_int(raw: &str) -> Option<i64> {
    if is_null_like(raw) {
        return None;
    }
    let s = raw.trim();
    if let Ok(value) = s.parse::<i64>() {
        return Some(value);
    }
    let value = s.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ====== ARRAY FIELDS ======

/// Decodes a cell as JSON, falling back to Python-literal syntax.
/// Null-like cells decode to `Ok(None)`.
pub fn parse_value(raw: &str) -> Result<Option<Value>, ParseError> {
    if is_null_like(raw) {
        return Ok(None);
    }
    let s = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(s) {
        return Ok(Some(value));
    }
    let translated = pythonish_to_json(s)?;
    serde_json::from_str::<Value>(&translated)
        .map(Some)
        .map_err(|e| ParseError::Json(e.to_string()))
}

/// Parses a list-of-objects column such as `genres` or `cast`.
///
/// A missing cell is an empty list. Anything that decodes to something other
/// than a list of objects is a `ParseError`; the caller decides what to
/// substitute.
pub fn parse_array(raw: &str) -> Result<JsonArray, ParseError> {
    match parse_value(raw)? {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(object) => Ok(object),
                other => Err(ParseError::Shape {
                    expected: "object",
                    found: kind_of(&other),
                }),
            })
            .collect(),
        Some(other) => Err(ParseError::Shape {
            expected: "array",
            found: kind_of(&other),
        }),
    }
}

/// Parses a single-object column such as `belongs_to_collection`.
pub fn parse_object(raw: &str) -> Result<Option<JsonObject>, ParseError> {
    match parse_value(raw)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(object)) => Ok(Some(object)),
        Some(other) => Err(ParseError::Shape {
            expected: "object",
            found: kind_of(&other),
        }),
    }
}

/// Rewrites Python literal syntax (`'quoted'` strings, `None`, `True`,
/// `False`) into JSON. String literals are decoded and re-encoded so quotes
/// embedded in names survive.
pub fn pythonish_to_json(src: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '\'' | '"' => {
                let literal = read_string_literal(&mut chars, c, pos)?;
                out.push_str(&Value::String(literal).to_string());
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "None" | "nan" | "NaN" => "null",
                    "True" => "true",
                    "False" => "false",
                    other => other,
                });
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

fn read_string_literal(
    chars: &mut Peekable<CharIndices<'_>>,
    quote: char,
    start: usize,
) -> Result<String, ParseError> {
    let mut literal = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => literal.push('\n'),
                Some((_, 't')) => literal.push('\t'),
                Some((_, 'r')) => literal.push('\r'),
                Some((_, '0')) => literal.push('\0'),
                Some((_, 'x')) => literal.push(read_hex_escape(chars, 2)),
                Some((_, 'u')) => literal.push(read_hex_escape(chars, 4)),
                Some((_, other)) => literal.push(other),
                None => return Err(ParseError::UnterminatedString(start)),
            },
            c if c == quote => return Ok(literal),
            c => literal.push(c),
        }
    }
    Err(ParseError::UnterminatedString(start))
}

fn read_hex_escape(chars: &mut Peekable<CharIndices<'_>>, digits: usize) -> char {
    let mut hex = String::with_capacity(digits);
    for _ in 0..digits {
        match chars.peek() {
            Some(&(_, c)) if c.is_ascii_hexdigit() => {
                hex.push(c);
                chars.next();
            }
            _ => break,
        }
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

// ====== DATES ======

fn looks_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit())
}

fn from_epoch_seconds(s: &str) -> Option<NaiveDateTime> {
    let seconds = match s.parse::<i64>() {
        Ok(seconds) => seconds,
        Err(_) => s.parse::<f64>().ok().filter(|v| v.is_finite())?.trunc() as i64,
    };
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

// Shorter integers in a date column are corrupt cells, not epoch seconds.
const MIN_EPOCH_DIGITS: usize = 8;

fn is_epoch_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    digits.len() >= MIN_EPOCH_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Calendar date from ISO, slash, textual or integral epoch-second input.
/// A bare four-digit value is read as a year (January 1st). Epoch seconds
/// need at least eight digits; fractional numbers are shifted-column noise
/// and do not parse.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if is_null_like(raw) {
        return None;
    }
    let s = raw.trim();

    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i32>().ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    }
    if is_epoch_integer(s) {
        return s
            .parse::<i64>()
            .ok()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
            .map(|dt| dt.date_naive());
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(date);
    }
    if s.len() == 7 {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), DATE_FORMAT) {
            return Some(date);
        }
    }
    parse_datetime_text(s).map(|dt| dt.date())
}

/// Timestamp from epoch seconds or ISO text; plain dates map to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if is_null_like(raw) {
        return None;
    }
    let s = raw.trim();

    if looks_numeric(s) {
        return from_epoch_seconds(s);
    }
    parse_datetime_text(s).or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

// ====== CANONICAL SERIALIZATION ======

/// Compact JSON with object keys in sorted order.
pub fn canonical_json(items: &JsonArray) -> String {
    Value::Array(items.iter().cloned().map(Value::Object).collect()).to_string()
}

pub fn serialize_array<S: Serializer>(items: &JsonArray, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&canonical_json(items))
}

pub fn serialize_object<S: Serializer>(
    object: &Option<JsonObject>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match object {
        Some(object) => serializer.serialize_str(&Value::Object(object.clone()).to_string()),
        None => serializer.serialize_none(),
    }
}

pub fn serialize_date<S: Serializer>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}

pub fn serialize_timestamp<S: Serializer>(
    timestamp: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.format(TIMESTAMP_FORMAT).to_string())
}
