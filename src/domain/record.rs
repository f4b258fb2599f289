use std::collections::BTreeSet;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Calendar date a title appeared on a provider timeline.
pub type ReleaseDate = NaiveDate;

/// Absolute URL of a title's detail page.
pub type TitleLink = String;

/// Today plus `days_backwards` trailing days, oldest first.
pub fn release_window(today: ReleaseDate, days_backwards: u32) -> BTreeSet<ReleaseDate> {
    (0..=days_backwards)
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .collect()
}

/// Fields read from a title's detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailField {
    Name,
    ReleaseYear,
    ExternalRatingLink,
    ExternalRating,
    Runtime,
    StreamingLinks,
}

impl DetailField {
    pub const ALL: [DetailField; 6] = [
        DetailField::Name,
        DetailField::ReleaseYear,
        DetailField::ExternalRatingLink,
        DetailField::ExternalRating,
        DetailField::Runtime,
        DetailField::StreamingLinks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetailField::Name => "name",
            DetailField::ReleaseYear => "release_year",
            DetailField::ExternalRatingLink => "external_rating_link",
            DetailField::ExternalRating => "external_rating",
            DetailField::Runtime => "runtime",
            DetailField::StreamingLinks => "streaming_links",
        }
    }
}

impl fmt::Display for DetailField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page fragment that could not be read.
///
/// This is a cosmetic gap in one record, never a reason to abort a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUnavailable {
    pub field: DetailField,
    pub reason: String,
}

impl FieldUnavailable {
    pub fn new(field: DetailField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unavailable: {}", self.field, self.reason)
    }
}

impl std::error::Error for FieldUnavailable {}

pub type FieldResult<T> = std::result::Result<T, FieldUnavailable>;

/// Per-field extraction outcome for one detail page.
#[derive(Debug, Clone)]
pub struct DetailFields {
    pub name: FieldResult<String>,
    pub release_year: FieldResult<String>,
    pub external_rating_link: FieldResult<String>,
    pub external_rating: FieldResult<String>,
    pub runtime: FieldResult<String>,
    pub streaming_links: FieldResult<Vec<String>>,
}

/// Detail page contents as scraped, before any cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMovieRecord {
    pub date_added: ReleaseDate,
    pub name: String,
    pub release_year_text: String,
    pub external_rating_link: String,
    pub external_rating_text: String,
    pub runtime_text: String,
    pub raw_streaming_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<DetailField>,
}

impl RawMovieRecord {
    pub fn empty(date_added: ReleaseDate) -> Self {
        Self {
            date_added,
            name: String::new(),
            release_year_text: String::new(),
            external_rating_link: String::new(),
            external_rating_text: String::new(),
            runtime_text: String::new(),
            raw_streaming_links: Vec::new(),
            missing_fields: Vec::new(),
        }
    }

    /// Build a record from per-field outcomes, defaulting every
    /// unavailable field to empty.
    pub fn from_fields(date_added: ReleaseDate, fields: DetailFields) -> Self {
        let mut missing = Vec::new();
        let mut take = |result: FieldResult<String>| match result {
            Ok(value) => value,
            Err(gap) => {
                missing.push(gap.field);
                String::new()
            }
        };

        let name = take(fields.name);
        let release_year_text = take(fields.release_year);
        let external_rating_link = take(fields.external_rating_link);
        let external_rating_text = take(fields.external_rating);
        let runtime_text = take(fields.runtime);

        let raw_streaming_links = match fields.streaming_links {
            Ok(links) => links,
            Err(gap) => {
                missing.push(gap.field);
                Vec::new()
            }
        };

        Self {
            date_added,
            name,
            release_year_text,
            external_rating_link,
            external_rating_text,
            runtime_text,
            raw_streaming_links,
            missing_fields: missing,
        }
    }

    /// Rating volume from the parenthesised annotation, `0` when absent.
    pub fn popularity(&self) -> u64 {
        crate::normalizer::split_rating(&self.external_rating_text)
            .1
            .map(|count| crate::normalizer::parse_popularity(&count))
            .unwrap_or(0)
    }
}

impl From<&NormalizedMovieRecord> for RawMovieRecord {
    fn from(record: &NormalizedMovieRecord) -> Self {
        let external_rating_text = match (record.external_rating_score, &record.num_ratings) {
            (Some(score), Some(count)) => format!("{} ({})", score, count),
            (Some(score), None) => score.to_string(),
            (None, Some(count)) => format!("({})", count),
            (None, None) => String::new(),
        };

        Self {
            date_added: record.date_added,
            name: record.name.clone(),
            release_year_text: record
                .release_year
                .map(|year| year.to_string())
                .unwrap_or_default(),
            external_rating_link: record.external_rating_link.clone(),
            external_rating_text,
            runtime_text: record.runtime.clone(),
            raw_streaming_links: vec![record.canonical_streaming_link.clone()],
            missing_fields: Vec::new(),
        }
    }
}

/// Cleaned record handed to the store.
///
/// The five natural-key fields are always present; they may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMovieRecord {
    pub date_added: ReleaseDate,
    pub name: String,
    pub release_year: Option<i32>,
    pub external_rating_link: String,
    pub external_rating_score: Option<f64>,
    pub num_ratings: Option<String>,
    pub runtime: String,
    pub canonical_streaming_link: String,
    pub provider: String,
    pub country: String,
}

impl NormalizedMovieRecord {
    /// `(date_added, name, external_rating_link, provider, country)`
    pub fn natural_key(&self) -> (String, &str, &str, &str, &str) {
        (
            self.date_added.to_string(),
            &self.name,
            &self.external_rating_link,
            &self.provider,
            &self.country,
        )
    }

    /// Deterministic id derived from the natural key
    pub fn record_id(&self) -> String {
        let (date, name, rating_link, provider, country) = self.natural_key();
        let mut hasher = Sha256::new();
        for part in [date.as_str(), name, rating_link, provider, country] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }

    /// Rating volume as an integer, `0` when unknown.
    pub fn popularity(&self) -> u64 {
        self.num_ratings
            .as_deref()
            .map(crate::normalizer::parse_popularity)
            .unwrap_or(0)
    }
}
