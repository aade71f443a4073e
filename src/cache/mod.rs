//! Offline-first caching of species lists.
//!
//! This module decides, per request, whether the locally persisted species
//! of a category can be served as-is, must be refreshed from the remote
//! source, or must be served stale because the refresh failed:
//! - A category is fresh only if every cached record is inside the freshness window
//! - A successful fetch replaces the whole category in one transaction
//! - Any remote failure falls back to the cached set when one exists

mod layer;
mod storage;
mod traits;

pub use layer::{SpeciesCache, DEFAULT_FRESHNESS_WINDOW};
pub use storage::SqliteStore;
pub use traits::{CacheResult, CacheSource, Clock, SpeciesStore, SystemClock};
