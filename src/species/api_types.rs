//! Serde-deserializable types matching the species API responses.
//!
//! These types are separate from domain types so that loosely-typed wire
//! data can be accepted as-is and mapped with defaults afterwards.

use serde::Deserialize;

use super::types::SpeciesRecord;

/// One item of the `GET /{category}` response array. Every field may be
/// missing or null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiSpecies {
  #[serde(default)]
  pub id: Option<i64>,
  #[serde(default)]
  pub animal_name: Option<String>,
  #[serde(default)]
  pub animal_type: Option<String>,
  #[serde(default)]
  pub biological_name: Option<String>,
  #[serde(default)]
  pub conservation_status: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub created_at: Option<String>,
  #[serde(default)]
  pub updated_at: Option<String>,
}

impl ApiSpecies {
  /// Map to a cache record stamped with `fetched_at`. A missing id becomes 0.
  pub fn into_record(self, fetched_at: i64) -> SpeciesRecord {
    SpeciesRecord {
      id: self.id.unwrap_or(0),
      name: self.animal_name,
      category: self.animal_type,
      scientific_name: self.biological_name,
      conservation_status: self.conservation_status,
      image_url: self.image_url,
      created_at: self.created_at,
      updated_at: self.updated_at,
      last_fetched: fetched_at,
    }
  }
}
