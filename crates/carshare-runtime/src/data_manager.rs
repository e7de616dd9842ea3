//! Cached access to the source tables.
//!
//! [`DataManager`] owns a snapshot of the five CSV tables and decides when to
//! reload it: on first use, when the snapshot is older than its TTL, after
//! [`DataManager::invalidate_cache`], or when the caller forces a refresh.
//! There is no retry and no stale fallback: a failed reload is returned to
//! the caller and the previous snapshot is dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use carshare_core::error::Result;
use carshare_core::models::SourceTables;
use carshare_data::reader::{load_sources, DataSources};

// ── TableLoader ───────────────────────────────────────────────────────────────

/// Anything that can produce a fresh set of source tables.
pub trait TableLoader {
    fn load(&self) -> Result<SourceTables>;

    /// Short description used in log lines.
    fn describe(&self) -> String {
        String::from("tables")
    }
}

impl TableLoader for DataSources {
    fn load(&self) -> Result<SourceTables> {
        load_sources(self)
    }

    fn describe(&self) -> String {
        self.dir().display().to_string()
    }
}

// ── DataManager ───────────────────────────────────────────────────────────────

/// TTL-cached wrapper around a [`TableLoader`].
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use carshare_data::reader::DataSources;
/// use carshare_runtime::data_manager::DataManager;
///
/// let mut mgr = DataManager::new(DataSources::from_dir("datasets"), Some(Duration::from_secs(300)));
/// let tables = mgr.get_tables(false)?;
/// println!("trips: {}", tables.trips.len());
/// # Ok::<(), carshare_core::error::DashboardError>(())
/// ```
pub struct DataManager<L> {
    loader: L,
    /// Maximum age of the snapshot; `None` keeps it until invalidated.
    cache_ttl: Option<Duration>,
    cache: Option<Arc<SourceTables>>,
    cache_timestamp: Option<Instant>,
    last_error: Option<String>,
}

impl<L: TableLoader> DataManager<L> {
    pub fn new(loader: L, cache_ttl: Option<Duration>) -> Self {
        Self {
            loader,
            cache_ttl,
            cache: None,
            cache_timestamp: None,
            last_error: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the source tables, reloading when the snapshot is missing,
    /// expired or `force_refresh` is set.
    pub fn get_tables(&mut self, force_refresh: bool) -> Result<Arc<SourceTables>> {
        if !force_refresh {
            if let Some(cached) = self.valid_cache() {
                tracing::debug!("returning cached source tables");
                return Ok(cached);
            }
        }

        let start = Instant::now();
        match self.loader.load() {
            Ok(tables) => {
                let tables = Arc::new(tables);
                tracing::debug!(
                    source = %self.loader.describe(),
                    rows = tables.total_rows(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "source table cache updated"
                );
                self.cache = Some(Arc::clone(&tables));
                self.cache_timestamp = Some(Instant::now());
                self.last_error = None;
                Ok(tables)
            }
            Err(e) => {
                tracing::warn!(source = %self.loader.describe(), error = %e, "loading source tables failed");
                self.invalidate_cache();
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Discard the snapshot so the next [`get_tables`](Self::get_tables) reloads.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("cache invalidated");
    }

    /// Age of the current snapshot, `None` when nothing is cached.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Message of the last failed load, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn valid_cache(&self) -> Option<Arc<SourceTables>> {
        let (cache, ts) = (self.cache.as_ref()?, self.cache_timestamp?);
        match self.cache_ttl {
            Some(ttl) if ts.elapsed() >= ttl => None,
            _ => Some(Arc::clone(cache)),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
