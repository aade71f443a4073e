use std::future::Future;
use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::RemoteError;

use super::api_types::ApiSpecies;

/// What the remote source answered, when it answered at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteResponse {
  /// 2xx response; `None` when the body was empty or JSON null
  Success(Option<Vec<ApiSpecies>>),
  /// Non-2xx response
  Status { code: u16, message: String },
}

/// Remote source of species lists, one category per call.
pub trait SpeciesSource: Send + Sync {
  fn fetch_category(
    &self,
    category: &str,
  ) -> impl Future<Output = std::result::Result<RemoteResponse, RemoteError>> + Send;
}

/// HTTP client for the species API
#[derive(Clone)]
pub struct SpeciesClient {
  client: reqwest::Client,
  base_url: Url,
}

impl SpeciesClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = parse_base_url(&config.api.url)?;
    let timeout = Duration::from_secs(config.api.timeout_secs);

    let client = reqwest::Client::builder()
      .connect_timeout(timeout)
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }

  /// URL for a category listing: the category becomes one path segment.
  pub fn endpoint(&self, category: &str) -> std::result::Result<Url, RemoteError> {
    endpoint_for(&self.base_url, category)
  }
}

impl SpeciesSource for SpeciesClient {
  async fn fetch_category(
    &self,
    category: &str,
  ) -> std::result::Result<RemoteResponse, RemoteError> {
    let url = self.endpoint(category)?;
    debug!(%url, "fetching species");

    let response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      // The status is the answer; a failing body read must not hide it
      return Ok(status_response(status));
    }
    let body = response.text().await?;

    classify_response(status, &body)
  }
}

/// Parse a base URL so that joining keeps its full path.
fn parse_base_url(raw: &str) -> Result<Url> {
  let mut url = Url::parse(raw).map_err(|e| eyre!("Invalid API url '{}': {}", raw, e))?;
  if url.cannot_be_a_base() {
    return Err(eyre!("Invalid API url '{}': cannot be a base", raw));
  }
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}

fn endpoint_for(base: &Url, category: &str) -> std::result::Result<Url, RemoteError> {
  let mut url = base.clone();
  url
    .path_segments_mut()
    .map_err(|_| RemoteError::Endpoint {
      category: category.to_string(),
      reason: format!("{} cannot be a base url", base),
    })?
    .pop_if_empty()
    .push(category);
  Ok(url)
}

fn status_response(status: StatusCode) -> RemoteResponse {
  RemoteResponse::Status {
    code: status.as_u16(),
    message: status.canonical_reason().unwrap_or("unknown").to_string(),
  }
}

/// Turn a status and body into a response.
///
/// Non-2xx statuses are reported as-is; a 2xx body that is blank or null
/// counts as absent, anything else must decode as a species array.
fn classify_response(
  status: StatusCode,
  body: &str,
) -> std::result::Result<RemoteResponse, RemoteError> {
  if !status.is_success() {
    return Ok(status_response(status));
  }

  if body.trim().is_empty() {
    return Ok(RemoteResponse::Success(None));
  }

  let items: Option<Vec<ApiSpecies>> = serde_json::from_str(body)?;
  Ok(RemoteResponse::Success(items))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoint_appends_category() {
    let base = parse_base_url("https://api.example.org/").unwrap();
    let url = endpoint_for(&base, "mammals").unwrap();
    assert_eq!(url.as_str(), "https://api.example.org/mammals");
  }

  #[test]
  fn test_endpoint_keeps_base_path() {
    let base = parse_base_url("https://api.example.org/v1").unwrap();
    let url = endpoint_for(&base, "Birds").unwrap();
    assert_eq!(url.as_str(), "https://api.example.org/v1/Birds");
  }

  #[test]
  fn test_endpoint_encodes_category() {
    let base = parse_base_url("https://api.example.org/").unwrap();
    let url = endpoint_for(&base, "sea turtles/x").unwrap();
    assert_eq!(url.as_str(), "https://api.example.org/sea%20turtles%2Fx");
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(parse_base_url("not a url").is_err());
    assert!(parse_base_url("mailto:someone@example.org").is_err());
  }

  #[test]
  fn test_classify_error_status() {
    let response = classify_response(StatusCode::SERVICE_UNAVAILABLE, "down").unwrap();
    assert_eq!(
      response,
      RemoteResponse::Status {
        code: 503,
        message: "Service Unavailable".to_string(),
      }
    );
  }

  #[test]
  fn test_classify_absent_body() {
    assert_eq!(
      classify_response(StatusCode::OK, "  ").unwrap(),
      RemoteResponse::Success(None)
    );
    assert_eq!(
      classify_response(StatusCode::OK, "null").unwrap(),
      RemoteResponse::Success(None)
    );
  }

  #[test]
  fn test_classify_species_array() {
    let body = r#"[{"id": 1, "animal_name": "Tiger"}, {"animal_name": "Vaquita"}]"#;
    let RemoteResponse::Success(Some(items)) = classify_response(StatusCode::OK, body).unwrap()
    else {
      panic!("expected a species list");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, Some(1));
    assert_eq!(items[1].id, None);
  }

  #[test]
  fn test_classify_empty_array() {
    assert_eq!(
      classify_response(StatusCode::OK, "[]").unwrap(),
      RemoteResponse::Success(Some(Vec::new()))
    );
  }

  #[test]
  fn test_classify_garbage_is_decode_error() {
    let err = classify_response(StatusCode::OK, "<html>").unwrap_err();
    assert!(matches!(err, RemoteError::Decode(_)));
  }

  /// Serve one canned HTTP response, then close the connection.
  async fn one_shot_server(response: String) -> Config {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      if let Ok((mut socket, _)) = listener.accept().await {
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
      }
    });

    let mut config = Config::default();
    config.api.url = format!("http://{}/", addr);
    config.api.timeout_secs = 5;
    config
  }

  #[tokio::test]
  async fn test_fetch_species_list() {
    let body = r#"[{"id":1,"animal_name":"Tiger","animal_type":"Mammals"}]"#;
    let response = format!(
      "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
      body.len(),
      body
    );
    let client = SpeciesClient::new(&one_shot_server(response).await).unwrap();

    let RemoteResponse::Success(Some(items)) = client.fetch_category("mammals").await.unwrap()
    else {
      panic!("expected a species list");
    };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].animal_name.as_deref(), Some("Tiger"));
  }

  #[tokio::test]
  async fn test_error_status_survives_truncated_body() {
    // Promises more body than it sends, so reading the body would fail
    let config = one_shot_server(
      "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 1000\r\nConnection: close\r\n\r\npartial"
        .to_string(),
    )
    .await;
    let client = SpeciesClient::new(&config).unwrap();

    let response = client.fetch_category("mammals").await.unwrap();

    assert_eq!(
      response,
      RemoteResponse::Status {
        code: 500,
        message: "Internal Server Error".to_string(),
      }
    );
  }
}
