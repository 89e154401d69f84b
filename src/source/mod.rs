mod csv_file;
mod sqlite;

pub use csv_file::CsvSource;
pub use sqlite::SqliteSource;

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;

use crate::config::{DashboardConfig, SourceKind};
use crate::records::Snapshot;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing file pair or database cannot be reached at all.
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    /// The source was reachable but an expected table or column is absent,
    /// or a value does not fit the record schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
    /// Any other backend failure while reading.
    #[error("data source error: {0}")]
    Backend(String),
}

/// A handle to the two input tables. `load` returns both or fails; there
/// are no partial-result semantics.
pub trait DataSource: Send + std::fmt::Debug {
    fn load(&self) -> Result<Snapshot, SourceError>;

    /// Short label for the dashboard header, e.g. `csv:data`.
    fn describe(&self) -> String;
}

/// TTL wrapper: loads inside the window are served from the last snapshot
/// without touching the backing source. Time-based invalidation only; safe
/// for the single-consumer access pattern this app has.
#[derive(Debug)]
pub struct CachedSource {
    inner: Box<dyn DataSource>,
    ttl: Duration,
    cached: Mutex<Option<(Instant, Snapshot)>>,
}

impl CachedSource {
    pub fn new(inner: Box<dyn DataSource>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: Mutex::new(None),
        }
    }
}

impl DataSource for CachedSource {
    fn load(&self) -> Result<Snapshot, SourceError> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((fetched_at, snapshot)) = cached.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                debug!("serving snapshot from cache");
                return Ok(snapshot.clone());
            }
        }
        let snapshot = self.inner.load()?;
        *cached = Some((Instant::now(), snapshot.clone()));
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        format!("{} (ttl {}s)", self.inner.describe(), self.ttl.as_secs())
    }
}

/// Build the configured source, wrapped in the TTL cache when one is set.
pub fn build(cfg: &DashboardConfig) -> Result<Box<dyn DataSource>> {
    let inner: Box<dyn DataSource> = match cfg.source.kind {
        SourceKind::Csv => Box::new(CsvSource::new(&cfg.source.data_dir)),
        SourceKind::Sqlite => {
            let db = cfg
                .source
                .database
                .as_ref()
                .context("source.kind is sqlite but no database path is configured")?;
            Box::new(SqliteSource::new(db))
        }
    };

    let ttl = cfg.cache_ttl();
    if ttl.is_zero() {
        Ok(inner)
    } else {
        Ok(Box::new(CachedSource::new(inner, ttl)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::LicenseRecord;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct CountingSource {
        calls: Arc<AtomicU32>,
    }

    impl DataSource for CountingSource {
        fn load(&self) -> Result<Snapshot, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Snapshot {
                licenses: vec![LicenseRecord {
                    license_id: 1,
                    license_name: "Office".to_string(),
                }],
                usage: vec![],
            })
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn counting(calls: &Arc<AtomicU32>) -> Box<dyn DataSource> {
        Box::new(CountingSource {
            calls: Arc::clone(calls),
        })
    }

    #[test]
    fn cache_serves_repeated_loads_within_the_ttl() {
        let calls = Arc::new(AtomicU32::new(0));
        let cached = CachedSource::new(counting(&calls), Duration::from_secs(60));

        let first = cached.load().unwrap();
        let second = cached.load().unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_ttl_goes_to_the_backing_source_every_time() {
        let calls = Arc::new(AtomicU32::new(0));
        let cached = CachedSource::new(counting(&calls), Duration::ZERO);

        cached.load().unwrap();
        cached.load().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn build_rejects_sqlite_without_a_database_path() {
        let cfg = DashboardConfig {
            source: crate::config::SourceConfig {
                kind: SourceKind::Sqlite,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = build(&cfg).unwrap_err();
        assert!(err.to_string().contains("no database path"));
    }
}
