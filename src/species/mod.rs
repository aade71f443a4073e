pub mod api_types;
pub mod client;
pub mod types;

pub use api_types::ApiSpecies;
pub use client::{RemoteResponse, SpeciesClient, SpeciesSource};
pub use types::{normalize_category, SpeciesRecord};
