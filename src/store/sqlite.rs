use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{ReelError, Result};
use crate::domain::{NormalizedMovieRecord, ReleaseDate};
use crate::store::{Store, TopRelease, UpsertSummary};

const DATE_FORMAT: &str = "%Y-%m-%d";

const RELEASE_COLUMNS: &str = "date_added, name, release_year, external_rating_link,
     external_rating_score, num_ratings, runtime, streaming_link, provider, country";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| ReelError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            ReelError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    /// Reads the ten release columns starting at `offset`.
    fn record_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<NormalizedMovieRecord> {
        let date_text: String = row.get(offset)?;
        let date_added = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(offset, Type::Text, Box::new(e))
        })?;

        Ok(NormalizedMovieRecord {
            date_added,
            name: row.get(offset + 1)?,
            release_year: row.get(offset + 2)?,
            external_rating_link: row.get(offset + 3)?,
            external_rating_score: row.get(offset + 4)?,
            num_ratings: row.get(offset + 5)?,
            runtime: row.get(offset + 6)?,
            canonical_streaming_link: row.get(offset + 7)?,
            provider: row.get(offset + 8)?,
            country: row.get(offset + 9)?,
        })
    }
}

impl Store for SqliteStore {
    fn upsert_releases(&self, records: &[NormalizedMovieRecord]) -> Result<UpsertSummary> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let stored_at = Utc::now().to_rfc3339();
        let mut summary = UpsertSummary::default();

        for record in records {
            let id = record.record_id();
            let exists = tx
                .query_row("SELECT 1 FROM releases WHERE id = ?1", params![id], |_| Ok(()))
                .optional()?
                .is_some();

            tx.execute(
                &format!(
                    "INSERT INTO releases (id, {RELEASE_COLUMNS}, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(id) DO UPDATE SET
                        release_year = excluded.release_year,
                        external_rating_score = excluded.external_rating_score,
                        num_ratings = excluded.num_ratings,
                        runtime = excluded.runtime,
                        streaming_link = excluded.streaming_link,
                        stored_at = excluded.stored_at"
                ),
                params![
                    id,
                    record.date_added.format(DATE_FORMAT).to_string(),
                    record.name,
                    record.release_year,
                    record.external_rating_link,
                    record.external_rating_score,
                    record.num_ratings,
                    record.runtime,
                    record.canonical_streaming_link,
                    record.provider,
                    record.country,
                    stored_at,
                ],
            )?;

            if exists {
                summary.matched += 1;
            } else {
                summary.inserted += 1;
            }
        }

        tx.commit()?;
        Ok(summary)
    }

    fn get_release(&self, id: &str) -> Result<Option<NormalizedMovieRecord>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                &format!("SELECT {RELEASE_COLUMNS} FROM releases WHERE id = ?1"),
                params![id],
                |row| Self::record_from_row(row, 0),
            )
            .optional()?;

        Ok(result)
    }

    fn get_releases_since(&self, since: ReleaseDate) -> Result<Vec<NormalizedMovieRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {RELEASE_COLUMNS} FROM releases
             WHERE date_added >= ?1
             ORDER BY date_added, country, provider, name"
        ))?;

        let records = stmt
            .query_map(params![since.format(DATE_FORMAT).to_string()], |row| {
                Self::record_from_row(row, 0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn get_all_releases(&self) -> Result<Vec<NormalizedMovieRecord>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {RELEASE_COLUMNS} FROM releases
             ORDER BY date_added, country, provider, name"
        ))?;

        let records = stmt
            .query_map([], |row| Self::record_from_row(row, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_releases(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM releases", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn add_top_releases(&self, records: &[NormalizedMovieRecord]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let stored_at = Utc::now().to_rfc3339();
        let mut count = 0;

        for record in records {
            count += tx.execute(
                &format!(
                    "INSERT INTO top_releases ({RELEASE_COLUMNS}, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    record.date_added.format(DATE_FORMAT).to_string(),
                    record.name,
                    record.release_year,
                    record.external_rating_link,
                    record.external_rating_score,
                    record.num_ratings,
                    record.runtime,
                    record.canonical_streaming_link,
                    record.provider,
                    record.country,
                    stored_at,
                ],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    fn get_unsent_top_releases(&self) -> Result<Vec<TopRelease>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT id, sent, {RELEASE_COLUMNS} FROM top_releases
             WHERE sent = 0
             ORDER BY id"
        ))?;

        let releases = stmt
            .query_map([], |row| {
                Ok(TopRelease {
                    id: row.get(0)?,
                    sent: row.get(1)?,
                    record: Self::record_from_row(row, 2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(releases)
    }

    fn mark_top_releases_sent(&self, ids: &[i64]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut count = 0;

        for id in ids {
            count += tx.execute(
                "UPDATE top_releases SET sent = 1 WHERE id = ?1 AND sent = 0",
                params![id],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}
