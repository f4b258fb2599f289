pub mod sqlite;

use crate::app::Result;
use crate::domain::{NormalizedMovieRecord, ReleaseDate};

pub use sqlite::SqliteStore;

/// Outcome of an upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Records whose natural key was new
    pub inserted: usize,
    /// Records that overwrote an existing row
    pub matched: usize,
}

/// A sampled top title as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TopRelease {
    pub id: i64,
    pub record: NormalizedMovieRecord,
    pub sent: bool,
}

pub trait Store {
    // Release operations
    fn upsert_releases(&self, records: &[NormalizedMovieRecord]) -> Result<UpsertSummary>;
    fn get_release(&self, id: &str) -> Result<Option<NormalizedMovieRecord>>;
    fn get_releases_since(&self, since: ReleaseDate) -> Result<Vec<NormalizedMovieRecord>>;
    fn get_all_releases(&self) -> Result<Vec<NormalizedMovieRecord>>;
    fn count_releases(&self) -> Result<usize>;

    // Top release operations
    fn add_top_releases(&self, records: &[NormalizedMovieRecord]) -> Result<usize>;
    fn get_unsent_top_releases(&self) -> Result<Vec<TopRelease>>;
    fn mark_top_releases_sent(&self, ids: &[i64]) -> Result<usize>;
}
