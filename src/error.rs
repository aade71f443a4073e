use thiserror::Error;

/// Failure while talking to the remote species source, below the HTTP
/// status level.
#[derive(Debug, Error)]
pub enum RemoteError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("invalid endpoint for category '{category}': {reason}")]
  Endpoint { category: String, reason: String },
  #[error("could not decode response body: {0}")]
  Decode(#[from] serde_json::Error),
}

/// Failure reported by the species cache when nothing can be served.
#[derive(Debug, Error)]
pub enum SpeciesError {
  #[error("category must not be empty")]
  EmptyCategory,
  #[error("remote call failed and no cache available: {0}")]
  Remote(#[source] RemoteError),
  #[error("remote call returned error status {code} ({message}) and no cache available")]
  Status { code: u16, message: String },
  #[error("remote call returned an empty body and no cache available")]
  EmptyBody,
  #[error("failed to write species to the local cache: {0}")]
  Store(String),
}
