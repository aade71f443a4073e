//! Cache layer that reconciles the local species store with the remote source.

use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::traits::{CacheResult, Clock, SpeciesStore, SystemClock};
use crate::error::SpeciesError;
use crate::species::{normalize_category, RemoteResponse, SpeciesRecord, SpeciesSource};

/// Seven days in milliseconds.
pub const DEFAULT_FRESHNESS_WINDOW: i64 = 7 * 24 * 60 * 60 * 1000;

/// Species cache that decides between the local store and the remote source.
///
/// Every call re-derives freshness from the clock and the store; nothing is
/// remembered between calls. Overlapping calls for one category are not
/// coalesced, each may fetch and write back, and the last write-back wins.
pub struct SpeciesCache<S: SpeciesStore, R: SpeciesSource> {
  store: Arc<S>,
  source: Arc<R>,
  clock: Arc<dyn Clock>,
  /// How long a fetched batch stays fresh
  freshness_window: Duration,
}

impl<S: SpeciesStore, R: SpeciesSource> SpeciesCache<S, R> {
  /// Create a new species cache over the given store and remote source.
  pub fn new(store: S, source: R) -> Self {
    Self {
      store: Arc::new(store),
      source: Arc::new(source),
      clock: Arc::new(SystemClock),
      freshness_window: Duration::milliseconds(DEFAULT_FRESHNESS_WINDOW),
    }
  }

  /// Set how long fetched data is considered fresh.
  pub fn with_freshness_window(mut self, window: Duration) -> Self {
    self.freshness_window = window;
    self
  }

  /// Replace the wall clock.
  pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  /// Read-only access to the underlying store.
  pub fn store(&self) -> &S {
    &self.store
  }

  /// Species for `category`, in any letter case.
  ///
  /// Serves the cached set while it is fresh, otherwise refetches and
  /// replaces it, and falls back to the stale set when the refetch fails.
  pub async fn get_species(&self, category: &str) -> Result<Vec<SpeciesRecord>, SpeciesError> {
    self.resolve(category).await.map(|result| result.data)
  }

  /// Like [`get_species`](Self::get_species), but also reports where the
  /// data came from.
  ///
  /// 1. Read the cached set for the normalized category
  /// 2. If every record is inside the freshness window, return it
  /// 3. Otherwise fetch once from the remote source
  /// 4. On success, replace the category in the store and return the new set
  /// 5. On failure, return the cached set if there is one, else the error
  pub async fn resolve(
    &self,
    category: &str,
  ) -> Result<CacheResult<Vec<SpeciesRecord>>, SpeciesError> {
    if category.is_empty() {
      return Err(SpeciesError::EmptyCategory);
    }
    let key = normalize_category(category);

    let cached = match self.store.query_by_category(&key) {
      Ok(records) => records,
      Err(e) => {
        warn!(category = %key, "failed to read species cache, treating as empty: {:#}", e);
        Vec::new()
      }
    };

    let now = self.clock.now_millis();
    if self.is_fresh(&cached, now) {
      debug!(category = %key, count = cached.len(), "serving fresh cached species");
      let fetched_at = oldest_fetch(&cached);
      return Ok(CacheResult::from_cache(cached, fetched_at));
    }

    info!(category = %key, cached = cached.len(), "species cache missing or stale, fetching");

    let failure = match self.source.fetch_category(category).await {
      Ok(RemoteResponse::Success(Some(items))) => {
        let records = dedupe_by_id(
          items
            .into_iter()
            .map(|item| item.into_record(now))
            .collect(),
        );

        match self.store.replace_category(&key, &records) {
          Ok(()) => {
            info!(category = %key, count = records.len(), "stored fetched species");
            return Ok(CacheResult::from_network(records, now));
          }
          Err(e) => {
            error!(category = %key, "failed to write species cache: {:#}", e);
            SpeciesError::Store(format!("{:#}", e))
          }
        }
      }
      Ok(RemoteResponse::Success(None)) => {
        warn!(category = %key, "species API returned an empty body");
        SpeciesError::EmptyBody
      }
      Ok(RemoteResponse::Status { code, message }) => {
        warn!(category = %key, code, "species API error: HTTP {} {}", code, message);
        SpeciesError::Status { code, message }
      }
      Err(e) => {
        warn!(category = %key, "species fetch failed: {}", e);
        SpeciesError::Remote(e)
      }
    };

    if cached.is_empty() {
      error!(category = %key, "no cached species to fall back to");
      return Err(failure);
    }

    warn!(category = %key, count = cached.len(), "falling back to stale cached species");
    let fetched_at = oldest_fetch(&cached);
    Ok(CacheResult::offline(cached, fetched_at))
  }

  /// A cached set is fresh only if it is non-empty and every record is
  /// younger than the freshness window.
  fn is_fresh(&self, cached: &[SpeciesRecord], now: i64) -> bool {
    let window = self.freshness_window.num_milliseconds();
    !cached.is_empty() && cached.iter().all(|r| r.age_millis(now) < window)
  }
}

impl<S: SpeciesStore, R: SpeciesSource> Clone for SpeciesCache<S, R> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      source: Arc::clone(&self.source),
      clock: Arc::clone(&self.clock),
      freshness_window: self.freshness_window,
    }
  }
}

fn oldest_fetch(records: &[SpeciesRecord]) -> Option<i64> {
  records.iter().map(|r| r.last_fetched).min()
}

/// Keep only the last record for each id, in the order of those last
/// occurrences. Mirrors what insert-or-replace leaves in the store.
fn dedupe_by_id(records: Vec<SpeciesRecord>) -> Vec<SpeciesRecord> {
  let last_index: HashMap<i64, usize> = records
    .iter()
    .enumerate()
    .map(|(i, r)| (r.id, i))
    .collect();

  records
    .into_iter()
    .enumerate()
    .filter(|(i, r)| last_index.get(&r.id) == Some(i))
    .map(|(_, r)| r)
    .collect()
}
