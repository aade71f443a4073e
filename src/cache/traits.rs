//! Core traits and types for the species cache.

use color_eyre::Result;

use crate::species::SpeciesRecord;

/// Persisted, category-partitioned table of species records.
///
/// The cache layer is the only writer; anything else holding a store should
/// only read from it.
pub trait SpeciesStore: Send + Sync {
  /// All records whose category equals `category` exactly, in insertion order.
  fn query_by_category(&self, category: &str) -> Result<Vec<SpeciesRecord>>;

  /// Delete every record of `category`, then insert `records`, atomically.
  /// Records with an existing id replace the stored row.
  fn replace_category(&self, category: &str, records: &[SpeciesRecord]) -> Result<()>;
}

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
  fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_millis(&self) -> i64 {
    chrono::Utc::now().timestamp_millis()
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// Oldest fetch time (epoch millis) among the returned records, if any
  pub fetched_at: Option<i64>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T, fetched_at: i64) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      fetched_at: Some(fetched_at),
    }
  }

  /// Create a new cache result from cached data that is still fresh.
  pub fn from_cache(data: T, fetched_at: Option<i64>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      fetched_at,
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(data: T, fetched_at: Option<i64>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      fetched_at,
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network, now written back to the store
  Network,
  /// Data from cache, still within the freshness window
  CacheFresh,
  /// Refresh failed, serving stale cached data
  Offline,
}
