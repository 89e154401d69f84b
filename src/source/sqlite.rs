use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use super::{DataSource, SourceError};
use crate::records::{LicenseRecord, Snapshot, UsageRecord};

/// Reads the `licenses` and `subscription_usage` tables from a SQLite file.
/// The connection is opened read-only per load and closed when it drops;
/// no process-wide engine state.
#[derive(Debug)]
pub struct SqliteSource {
    path: PathBuf,
}

impl SqliteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> Result<Connection, SourceError> {
        if !self.path.exists() {
            return Err(SourceError::Unavailable(format!(
                "database not found: {}",
                self.path.display()
            )));
        }
        Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|e| {
            SourceError::Unavailable(format!("cannot open {}: {}", self.path.display(), e))
        })
    }
}

impl DataSource for SqliteSource {
    fn load(&self) -> Result<Snapshot, SourceError> {
        let conn = self.open()?;
        let licenses = load_licenses(&conn)?;
        let usage = load_usage(&conn)?;
        debug!(
            licenses = licenses.len(),
            usage = usage.len(),
            "loaded sqlite snapshot"
        );
        Ok(Snapshot { licenses, usage })
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }
}

fn load_licenses(conn: &Connection) -> Result<Vec<LicenseRecord>, SourceError> {
    let mut stmt = conn
        .prepare("SELECT license_id, license_name FROM licenses")
        .map_err(map_query_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(LicenseRecord {
                license_id: row.get(0)?,
                license_name: row.get(1)?,
            })
        })
        .map_err(map_query_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(map_query_err)
}

fn load_usage(conn: &Connection) -> Result<Vec<UsageRecord>, SourceError> {
    let mut stmt = conn
        .prepare("SELECT license_id, assigned_users, total_cost FROM subscription_usage")
        .map_err(map_query_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(UsageRecord {
                license_id: row.get(0)?,
                assigned_users: row.get(1)?,
                total_cost: row.get(2)?,
            })
        })
        .map_err(map_query_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(map_query_err)
}

fn map_query_err(e: rusqlite::Error) -> SourceError {
    let text = e.to_string();
    if text.contains("no such table") || text.contains("no such column") {
        SourceError::SchemaMismatch(text)
    } else {
        SourceError::Backend(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn seeded_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE licenses (license_id INTEGER, license_name TEXT);
             INSERT INTO licenses VALUES (1, 'Office'), (2, 'Teams');
             CREATE TABLE subscription_usage (license_id INTEGER, assigned_users INTEGER, total_cost REAL);
             INSERT INTO subscription_usage VALUES (1, 10, 100.0), (1, 5, 50.0), (2, 3, 30.0);",
        )
        .unwrap();
    }

    #[test]
    fn loads_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("licenses.db");
        seeded_db(&db);

        let snapshot = SqliteSource::new(&db).load().unwrap();
        assert_eq!(snapshot.licenses.len(), 2);
        assert_eq!(snapshot.usage.len(), 3);
        assert_eq!(snapshot.usage[0].assigned_users, 10);
        assert!((snapshot.usage[2].total_cost - 30.0).abs() < 1e-9);
    }

    #[test]
    fn missing_database_is_unavailable() {
        let err = SqliteSource::new("/nonexistent/licenses.db")
            .load()
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)), "{err}");
    }

    #[test]
    fn missing_table_is_a_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("licenses.db");
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch("CREATE TABLE licenses (license_id INTEGER, license_name TEXT);")
            .unwrap();
        drop(conn);

        let err = SqliteSource::new(&db).load().unwrap_err();
        assert!(matches!(err, SourceError::SchemaMismatch(_)), "{err}");
        assert!(err.to_string().contains("subscription_usage"));
    }

    #[test]
    fn missing_column_is_a_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("licenses.db");
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE licenses (license_id INTEGER, name TEXT);
             CREATE TABLE subscription_usage (license_id INTEGER, assigned_users INTEGER, total_cost REAL);",
        )
        .unwrap();
        drop(conn);

        let err = SqliteSource::new(&db).load().unwrap_err();
        assert!(matches!(err, SourceError::SchemaMismatch(_)), "{err}");
    }
}
