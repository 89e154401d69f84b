use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use super::{DataSource, SourceError};
use crate::records::{LicenseRecord, Snapshot, UsageRecord};

pub const LICENSES_FILE: &str = "licenses.csv";
pub const USAGE_FILE: &str = "subscription_usage.csv";

/// Reads the license/usage file pair from a directory.
#[derive(Debug)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DataSource for CsvSource {
    fn load(&self) -> Result<Snapshot, SourceError> {
        let lic_path = self.dir.join(LICENSES_FILE);
        let use_path = self.dir.join(USAGE_FILE);
        if !lic_path.exists() || !use_path.exists() {
            return Err(SourceError::Unavailable(format!(
                "expected {} and {} under {}",
                LICENSES_FILE,
                USAGE_FILE,
                self.dir.display()
            )));
        }

        let licenses: Vec<LicenseRecord> =
            read_table(&lic_path, &["license_id", "license_name"])?;
        let usage: Vec<UsageRecord> =
            read_table(&use_path, &["license_id", "assigned_users", "total_cost"])?;

        debug!(
            licenses = licenses.len(),
            usage = usage.len(),
            "loaded csv snapshot"
        );
        Ok(Snapshot { licenses, usage })
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.dir.display())
    }
}

/// Header check happens up front so a missing column reports as a schema
/// mismatch for the whole file rather than a per-row parse error.
fn read_table<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>, SourceError> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| SourceError::Backend(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| SourceError::Backend(e.to_string()))?
        .clone();
    for col in required {
        if !headers.iter().any(|h| h == *col) {
            return Err(SourceError::SchemaMismatch(format!(
                "{} is missing column '{}'",
                path.display(),
                col
            )));
        }
    }

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: T = record.map_err(|e| {
            SourceError::SchemaMismatch(format!("{}: {}", path.display(), e))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixtures(dir: &Path, licenses: &str, usage: &str) {
        fs::write(dir.join(LICENSES_FILE), licenses).unwrap();
        fs::write(dir.join(USAGE_FILE), usage).unwrap();
    }

    #[test]
    fn loads_the_file_pair() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(
            dir.path(),
            "license_id,license_name\n1,Office\n2,Teams\n",
            "license_id,assigned_users,total_cost\n1,10,100.0\n1,5,50.0\n2,3,30.0\n",
        );

        let snapshot = CsvSource::new(dir.path()).load().unwrap();
        assert_eq!(snapshot.licenses.len(), 2);
        assert_eq!(snapshot.usage.len(), 3);
        assert_eq!(snapshot.licenses[0].license_name, "Office");
        assert_eq!(snapshot.usage[2].assigned_users, 3);
    }

    #[test]
    fn missing_file_pair_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        // only one of the two files present
        fs::write(dir.path().join(LICENSES_FILE), "license_id,license_name\n").unwrap();

        let err = CsvSource::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)), "{err}");
    }

    #[test]
    fn missing_column_is_a_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(
            dir.path(),
            "license_id,name\n1,Office\n",
            "license_id,assigned_users,total_cost\n1,10,100.0\n",
        );

        let err = CsvSource::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, SourceError::SchemaMismatch(_)), "{err}");
        assert!(err.to_string().contains("license_name"));
    }

    #[test]
    fn unparseable_value_is_a_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(
            dir.path(),
            "license_id,license_name\n1,Office\n",
            "license_id,assigned_users,total_cost\n1,lots,100.0\n",
        );

        let err = CsvSource::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, SourceError::SchemaMismatch(_)), "{err}");
    }

    #[test]
    fn extra_columns_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_fixtures(
            dir.path(),
            "license_id,license_name,vendor\n1,Office,Microsoft\n",
            "license_id,assigned_users,total_cost,period\n1,10,100.0,2026-01\n",
        );

        let snapshot = CsvSource::new(dir.path()).load().unwrap();
        assert_eq!(snapshot.licenses.len(), 1);
        assert_eq!(snapshot.usage.len(), 1);
    }
}
