use crate::error::SpeciesError;
use crate::species::SpeciesRecord;

/// State of the discover view for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoverState {
  Success(Vec<SpeciesRecord>),
  /// Message ready to show to the user
  Error(String),
}

impl DiscoverState {
  /// Fold a species lookup into a view state.
  ///
  /// An empty list is shown as an error, since there is nothing to browse.
  pub fn from_result(category: &str, result: Result<Vec<SpeciesRecord>, SpeciesError>) -> Self {
    match result {
      Ok(species) if species.is_empty() => {
        DiscoverState::Error(format!("No animals found for type: {}", category))
      }
      Ok(species) => DiscoverState::Success(species),
      Err(e) => DiscoverState::Error(format!("Failed to fetch animals: {}", e)),
    }
  }

  pub fn is_error(&self) -> bool {
    matches!(self, DiscoverState::Error(_))
  }
}
