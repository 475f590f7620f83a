use crate::ports::outbound::VulnerabilityDatabase;
use crate::scanning::domain::CveRecord;
use crate::storage::error::StoreError;
use crate::storage::schema;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Cache-aside layer over the durable CVE store.
///
/// A hit returns persisted rows without touching the network. A miss
/// queries the external database and commits the index row and the
/// record rows in one transaction, so a crash mid-write can never leave
/// an index row that reads as a false "queried, zero results".
///
/// Duplicate `(cpe, cve_id)` handling is last-write-wins: the miss path
/// clears any rows for the CPE inside the same transaction before
/// inserting, so a re-commit can never corrupt reads.
///
/// This layer does not rate-limit the external database; the orchestrator
/// that drives it owns throttling.
pub struct VulnerabilityStore {
    conn: Mutex<Connection>,
}

impl VulnerabilityStore {
    /// Open (or create) the store at a specific path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Other(format!(
                    "failed to create store directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        debug!(path = %path.display(), "vulnerability store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Other("store connection lock poisoned".to_string()))
    }

    /// Whether this CPE already has an index row (i.e. the next
    /// `get_vulnerabilities` will be a local read).
    pub fn is_cached(&self, cpe: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let row: Option<String> = conn
            .query_row(
                "SELECT last_fetched FROM cpe_index WHERE cpe_string = ?1",
                params![cpe],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    /// Retrieve vulnerabilities for a CPE, querying the external
    /// database only on a cache miss.
    ///
    /// On a miss every external failure propagates untouched - in
    /// particular `NotFound` (so the caller can invalidate the CPE) and
    /// the transient variants - and no index row is written for it.
    pub async fn get_vulnerabilities(
        &self,
        cpe: &str,
        database: &dyn VulnerabilityDatabase,
        now: DateTime<Utc>,
    ) -> Result<Vec<CveRecord>, StoreError> {
        if let Some(records) = self.cached_records(cpe)? {
            info!(cpe, count = records.len(), "cache hit");
            return Ok(records);
        }

        info!(cpe, "cache miss, querying external database");
        let records = database.search_by_cpe(cpe).await?;
        self.commit_query(cpe, &records, now)?;
        Ok(records)
    }

    /// Best-effort refresh: re-query CVEs modified in the trailing 24
    /// hours and update matching stored descriptions. Does not walk the
    /// CPE index; an approximation, not a correctness guarantee.
    pub async fn refresh_modified(
        &self,
        database: &dyn VulnerabilityDatabase,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let start = now - Duration::days(1);
        info!(%start, "checking external database for modified CVEs");
        let updates = database.search_modified_between(start, now).await?;

        let conn = self.lock()?;
        let mut updated = 0;
        for cve in &updates {
            updated += conn.execute(
                "UPDATE vulnerabilities SET description = ?1 WHERE cve_id = ?2",
                params![cve.description, cve.cve_id],
            )?;
        }
        info!(checked = updates.len(), updated, "synced modified CVEs");
        Ok(updated)
    }

    /// `Some(records)` if the CPE has an index row, else `None`.
    /// Zero records with an index row is a valid cached outcome.
    fn cached_records(&self, cpe: &str) -> Result<Option<Vec<CveRecord>>, StoreError> {
        let conn = self.lock()?;
        let indexed: Option<String> = conn
            .query_row(
                "SELECT last_fetched FROM cpe_index WHERE cpe_string = ?1",
                params![cpe],
                |row| row.get(0),
            )
            .optional()?;
        if indexed.is_none() {
            return Ok(None);
        }

        let mut stmt = conn.prepare(
            "SELECT cve_id, description, published_date FROM vulnerabilities \
             WHERE cpe_string = ?1 \
             ORDER BY published_date IS NULL, published_date DESC",
        )?;
        let records = stmt
            .query_map(params![cpe], |row| {
                let published: Option<String> = row.get(2)?;
                Ok(CveRecord {
                    cve_id: row.get(0)?,
                    description: row.get(1)?,
                    published: published.as_deref().and_then(parse_stored_timestamp),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(records))
    }

    fn commit_query(
        &self,
        cpe: &str,
        records: &[CveRecord],
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO cpe_index (cpe_string, last_fetched) VALUES (?1, ?2)",
            params![cpe, now.to_rfc3339()],
        )?;
        tx.execute(
            "DELETE FROM vulnerabilities WHERE cpe_string = ?1",
            params![cpe],
        )?;
        for record in records {
            tx.execute(
                "INSERT INTO vulnerabilities (cpe_string, cve_id, description, published_date) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    cpe,
                    record.cve_id,
                    record.description,
                    record.published.map(|d| d.to_rfc3339()),
                ],
            )?;
        }

        tx.commit()?;
        debug!(cpe, records = records.len(), "query result committed");
        Ok(())
    }
}

fn parse_stored_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
