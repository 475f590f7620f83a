use crate::storage::error::StoreError;

const SCHEMA_SQL: &str = r#"
-- Which CPEs have been queried against the external database. A row
-- here with zero matching vulnerabilities rows is a cached "queried,
-- found nothing" result.
CREATE TABLE IF NOT EXISTS cpe_index (
    cpe_string   TEXT PRIMARY KEY,
    last_fetched TEXT NOT NULL
);

-- CVE records per indexed CPE (one-to-many).
CREATE TABLE IF NOT EXISTS vulnerabilities (
    cpe_string     TEXT NOT NULL REFERENCES cpe_index(cpe_string),
    cve_id         TEXT NOT NULL,
    description    TEXT NOT NULL,
    published_date TEXT
);
CREATE INDEX IF NOT EXISTS idx_vuln_cpe ON vulnerabilities(cpe_string);
"#;

/// Create tables and run migrations. Called once at store open, never
/// from the read path.
pub fn initialize(conn: &rusqlite::Connection) -> Result<(), StoreError> {
    // WAL and foreign keys before DDL for crash safety.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA_SQL)?;

    // Migration: stores created before the published_date column gain it
    // here. Only swallow "duplicate column name"; propagate other errors.
    for stmt in &["ALTER TABLE vulnerabilities ADD COLUMN published_date TEXT"] {
        if let Err(e) = conn.execute(stmt, []) {
            let msg = e.to_string();
            if !msg.contains("duplicate column name") {
                return Err(e.into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
    }

    #[test]
    fn test_migrates_store_without_published_date() {
        let conn = Connection::open_in_memory().unwrap();
        // Simulate a store created by an older version.
        conn.execute_batch(
            "CREATE TABLE cpe_index (cpe_string TEXT PRIMARY KEY, last_fetched TEXT NOT NULL);
             CREATE TABLE vulnerabilities (
                 cpe_string TEXT NOT NULL,
                 cve_id TEXT NOT NULL,
                 description TEXT NOT NULL
             );",
        )
        .unwrap();

        initialize(&conn).unwrap();

        // The column now exists and is selectable.
        conn.query_row(
            "SELECT COUNT(published_date) FROM vulnerabilities",
            [],
            |row| row.get::<_, i64>(0),
        )
        .unwrap();
    }
}
