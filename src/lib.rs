//! Endangered species discovery backed by an offline-first local cache.

pub mod cache;
pub mod config;
pub mod discover;
pub mod error;
pub mod logging;
pub mod species;
