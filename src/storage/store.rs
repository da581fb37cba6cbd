//! The `JobStore` trait and its two implementations
//!
//! Decouples pipeline logic from the storage backend, enabling:
//! - Easy testing with an in-memory mock
//! - A swappable production backend (a single embedded SQLite file)
//!
//! # Architecture
//!
//! ```text
//! Pipeline coordinator, worker pool, harvester
//!                 │
//!                 ▼
//!            JobStore trait
//!                 │
//!       ┌─────────┴─────────┐
//!       ▼                   ▼
//! SqliteJobStore       MockJobStore
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;
use crate::models::{JobDetail, JobUrl, Platform};

/// A newly harvested listing, not yet persisted
#[derive(Debug, Clone)]
pub struct NewJobUrl {
    pub job_id: String,
    pub actual_role: String,
    pub url: String,
}

/// Persistent job-listing state (§3, §4.1, §6)
pub trait JobStore: Send + Sync {
    /// Dedups by `(platform, url)` at insert time. Returns `(inserted, skipped)`.
    fn insert_urls(
        &self,
        platform: Platform,
        input_role: &str,
        urls: &[NewJobUrl],
    ) -> Result<(usize, usize), StorageError>;

    /// Rows with `scraped=false`, in insertion order, up to `limit`.
    fn list_unscraped(
        &self,
        platform: Platform,
        role: &str,
        limit: usize,
    ) -> Result<Vec<JobUrl>, StorageError>;

    /// Atomically inserts the detail (or no-ops on duplicate `url`) and flips the
    /// URL row's `scraped` flag. Returns `true` if a new detail row was inserted.
    fn mark_scraped_and_store_detail(&self, detail: &JobDetail) -> Result<bool, StorageError>;

    /// Single batched delete; returns rows removed.
    fn delete_urls(&self, urls: &[String]) -> Result<usize, StorageError>;

    /// Count of persisted job details, grouped by platform.
    fn count_scraped_by_platform(&self) -> Result<Vec<(Platform, usize)>, StorageError>;

    /// All URLs currently tracked for a platform (scraped or not), used by the
    /// harvester to pre-filter before insert.
    fn existing_urls(&self, platform: Platform) -> Result<HashSet<String>, StorageError>;

    /// Count of unscraped rows for a `(platform, role)` pair.
    fn count_unscraped(&self, platform: Platform, role: &str) -> Result<usize, StorageError>;
}

// ============================================================================
// SQLite implementation
// ============================================================================

/// SQLite-backed `JobStore`. Guarded by a `Mutex<Connection>` — batched writes
/// make connection-level serialisation sufficient (§5).
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "sqlite job store initialized");
        Ok(store)
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS job_urls (
                job_id TEXT PRIMARY KEY,
                platform TEXT NOT NULL,
                input_role TEXT NOT NULL,
                actual_role TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                scraped INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_job_urls_platform_role_scraped
                ON job_urls(platform, input_role, scraped);

            CREATE TABLE IF NOT EXISTS jobs (
                job_id TEXT PRIMARY KEY,
                platform TEXT NOT NULL,
                actual_role TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                job_description TEXT,
                skills TEXT,
                company_name TEXT,
                posted_date TEXT,
                scraped_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_platform ON jobs(platform);
            "#,
        )?;
        Ok(())
    }

}

impl JobStore for SqliteJobStore {
    fn insert_urls(
        &self,
        platform: Platform,
        input_role: &str,
        urls: &[NewJobUrl],
    ) -> Result<(usize, usize), StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut inserted = 0usize;
        let mut skipped = 0usize;

        for u in urls {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO job_urls (job_id, platform, input_role, actual_role, url, scraped)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![u.job_id, platform.as_str(), input_role, u.actual_role, u.url],
            )?;
            if changed == 1 {
                inserted += 1;
            } else {
                skipped += 1;
            }
        }

        Ok((inserted, skipped))
    }

    fn list_unscraped(
        &self,
        platform: Platform,
        role: &str,
        limit: usize,
    ) -> Result<Vec<JobUrl>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT job_id, platform, input_role, actual_role, url, scraped
             FROM job_urls WHERE platform = ?1 AND input_role = ?2 AND scraped = 0
             ORDER BY rowid LIMIT ?3",
        )?;

        let rows = stmt
            .query_map(params![platform.as_str(), role, limit as i64], |row| {
                let platform_str: String = row.get(1)?;
                Ok(JobUrl {
                    job_id: row.get(0)?,
                    platform: Platform::parse(&platform_str).unwrap_or(Platform::LinkedIn),
                    input_role: row.get(2)?,
                    actual_role: row.get(3)?,
                    url: row.get(4)?,
                    scraped: row.get::<_, i64>(5)? != 0,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(rows)
    }

    fn mark_scraped_and_store_detail(&self, detail: &JobDetail) -> Result<bool, StorageError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT job_id FROM jobs WHERE url = ?1",
                params![detail.url],
                |row| row.get(0),
            )
            .optional()?;

        let inserted = if existing.is_none() {
            tx.execute(
                "INSERT INTO jobs (job_id, platform, actual_role, url, job_description, skills, company_name, posted_date, scraped_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    detail.job_id,
                    detail.platform.as_str(),
                    detail.actual_role,
                    detail.url,
                    detail.job_description,
                    detail.skills,
                    detail.company_name,
                    detail.posted_date.map(|d| d.to_rfc3339()),
                    detail.scraped_at.to_rfc3339(),
                ],
            )?;
            true
        } else {
            false
        };

        tx.execute(
            "UPDATE job_urls SET scraped = 1 WHERE url = ?1",
            params![detail.url],
        )?;

        tx.commit()?;
        Ok(inserted)
    }

    fn delete_urls(&self, urls: &[String]) -> Result<usize, StorageError> {
        if urls.is_empty() {
            return Ok(0);
        }

        let conn = self.conn.lock().unwrap();
        let placeholders: String = urls.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!("DELETE FROM job_urls WHERE url IN ({placeholders})");
        let params: Vec<&dyn rusqlite::ToSql> =
            urls.iter().map(|s| s as &dyn rusqlite::ToSql).collect();

        let removed = conn.execute(&query, params.as_slice())?;
        Ok(removed)
    }

    fn count_scraped_by_platform(&self) -> Result<Vec<(Platform, usize)>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT platform, COUNT(*) FROM jobs GROUP BY platform")?;

        let rows = stmt
            .query_map([], |row| {
                let platform_str: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((platform_str, count as usize))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(p, count)| Platform::parse(&p).map(|p| (p, count)))
            .collect();

        Ok(rows)
    }

    fn existing_urls(&self, platform: Platform) -> Result<HashSet<String>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT url FROM job_urls WHERE platform = ?1")?;
        let urls = stmt
            .query_map(params![platform.as_str()], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(urls)
    }

    fn count_unscraped(&self, platform: Platform, role: &str) -> Result<usize, StorageError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM job_urls WHERE platform = ?1 AND input_role = ?2 AND scraped = 0",
            params![platform.as_str(), role],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

// ============================================================================
// Mock implementation (for testing)
// ============================================================================

#[derive(Default)]
struct MockState {
    urls: HashMap<String, JobUrl>, // keyed by url
    jobs: HashMap<String, JobDetail>, // keyed by url
}

/// In-memory mock `JobStore`, useful for tests that don't need a real file.
#[derive(Default)]
pub struct MockJobStore {
    state: RwLock<MockState>,
}

impl MockJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for MockJobStore {
    fn insert_urls(
        &self,
        platform: Platform,
        input_role: &str,
        urls: &[NewJobUrl],
    ) -> Result<(usize, usize), StorageError> {
        let mut state = self.state.write().unwrap();
        let mut inserted = 0usize;
        let mut skipped = 0usize;

        for u in urls {
            if state.urls.contains_key(&u.url) {
                skipped += 1;
                continue;
            }
            state.urls.insert(
                u.url.clone(),
                JobUrl {
                    job_id: u.job_id.clone(),
                    platform,
                    input_role: input_role.to_string(),
                    actual_role: u.actual_role.clone(),
                    url: u.url.clone(),
                    scraped: false,
                },
            );
            inserted += 1;
        }

        Ok((inserted, skipped))
    }

    fn list_unscraped(
        &self,
        platform: Platform,
        role: &str,
        limit: usize,
    ) -> Result<Vec<JobUrl>, StorageError> {
        let state = self.state.read().unwrap();
        Ok(state
            .urls
            .values()
            .filter(|u| u.platform == platform && u.input_role == role && !u.scraped)
            .take(limit)
            .cloned()
            .collect())
    }

    fn mark_scraped_and_store_detail(&self, detail: &JobDetail) -> Result<bool, StorageError> {
        let mut state = self.state.write().unwrap();
        let inserted = !state.jobs.contains_key(&detail.url);
        if inserted {
            state.jobs.insert(detail.url.clone(), detail.clone());
        }
        if let Some(u) = state.urls.get_mut(&detail.url) {
            u.scraped = true;
        }
        Ok(inserted)
    }

    fn delete_urls(&self, urls: &[String]) -> Result<usize, StorageError> {
        let mut state = self.state.write().unwrap();
        let mut removed = 0usize;
        for url in urls {
            if state.urls.remove(url).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn count_scraped_by_platform(&self) -> Result<Vec<(Platform, usize)>, StorageError> {
        let state = self.state.read().unwrap();
        let mut counts: HashMap<Platform, usize> = HashMap::new();
        for job in state.jobs.values() {
            *counts.entry(job.platform).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    fn existing_urls(&self, platform: Platform) -> Result<HashSet<String>, StorageError> {
        let state = self.state.read().unwrap();
        Ok(state
            .urls
            .values()
            .filter(|u| u.platform == platform)
            .map(|u| u.url.clone())
            .collect())
    }

    fn count_unscraped(&self, platform: Platform, role: &str) -> Result<usize, StorageError> {
        let state = self.state.read().unwrap();
        Ok(state
            .urls
            .values()
            .filter(|u| u.platform == platform && u.input_role == role && !u.scraped)
            .count())
    }
}
