//! REST client for the e-learning backend.
//!
//! Every endpoint answers with the envelope `{ status, message, data }`.
//! [`Envelope::into_reply`] is the single place where the envelope status is
//! checked; call sites only ever see `Result<T, ApiError>`.

pub mod admin;
pub mod auth;
pub mod content;
pub mod error;
pub mod exam;
pub mod navigation;
pub mod progress;
pub mod tracker;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use error::{ApiError, ErrorKind, LogOnError};
pub use progress::{spawn_save, ProgressStore, SaveMeta};
pub use tracker::{RequestTicket, RequestTracker};

/// Envelope status that means success
pub const SUCCESS_STATUS: u16 = 200;

/// Wire envelope shared by all endpoints.
#[derive(Debug, Deserialize, Serialize)]
pub struct Envelope<T> {
  pub status: u16,
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub data: Option<T>,
}

impl Envelope<serde_json::Value> {
  pub fn into_reply(self) -> Result<Reply, ApiError> {
    if self.status != SUCCESS_STATUS {
      return Err(ApiError::from_status(self.status, self.message));
    }
    Ok(Reply {
      message: self.message,
      data: self.data.filter(|d| !d.is_null()),
    })
  }
}

/// Successful envelope with its payload not yet decoded.
#[derive(Debug)]
pub struct Reply {
  pub message: String,
  data: Option<serde_json::Value>,
}

impl Reply {
  /// Decode a payload that must be present
  pub fn data<T: DeserializeOwned>(self) -> Result<T, ApiError> {
    self.optional()?.ok_or(ApiError::MissingData)
  }

  /// Decode a payload that may be absent (`data: null`)
  pub fn optional<T: DeserializeOwned>(self) -> Result<Option<T>, ApiError> {
    self
      .data
      .map(serde_json::from_value)
      .transpose()
      .map_err(|e| ApiError::Decode(e.to_string()))
  }
}

/// Cheaply cloned client; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Arc<str>,
  token: Option<Arc<str>>,
}

impl std::fmt::Debug for ApiClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ApiClient")
      .field("base_url", &self.base_url)
      .field("authenticated", &self.token.is_some())
      .finish()
  }
}

impl ApiClient {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      http,
      base_url: base_url.trim_end_matches('/').into(),
      token: None,
    })
  }

  /// Same client, sending `Authorization: Bearer <token>`
  pub fn with_token(&self, token: &str) -> Self {
    Self {
      http: self.http.clone(),
      base_url: self.base_url.clone(),
      token: Some(token.into()),
    }
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  /// Send one request and unwrap its envelope.
  pub async fn call<B: Serialize + ?Sized>(
    &self,
    method: Method,
    path: &str,
    body: Option<&B>,
  ) -> Result<Reply, ApiError> {
    let mut request = self.http.request(method.clone(), self.url(path));
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }
    if let Some(body) = body {
      request = request.json(body);
    }

    tracing::debug!("{} {}", method, path);
    let response = request.send().await?;
    let http_status = response.status();
    let bytes = response.bytes().await?;

    match serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes) {
      Ok(envelope) => envelope.into_reply(),
      Err(_) if !http_status.is_success() => Err(ApiError::from_status(
        http_status.as_u16(),
        http_status
          .canonical_reason()
          .unwrap_or("Request failed")
          .to_string(),
      )),
      Err(e) => Err(ApiError::Decode(e.to_string())),
    }
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self.call::<()>(Method::GET, path, None).await?.data()
  }

  pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Reply, ApiError> {
    self.call(Method::POST, path, Some(body)).await
  }

  pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Reply, ApiError> {
    self.call(Method::PUT, path, Some(body)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::MockBackend;

  #[test]
  fn test_success_envelope() {
    let envelope: Envelope<serde_json::Value> =
      serde_json::from_str(r#"{"status": 200, "message": "ok", "data": [1, 2]}"#).unwrap();
    let values: Vec<i64> = envelope.into_reply().unwrap().data().unwrap();
    assert_eq!(values, vec![1, 2]);
  }

  #[test]
  fn test_error_envelope_surfaces_message() {
    let envelope: Envelope<serde_json::Value> =
      serde_json::from_str(r#"{"status": 409, "message": "Email already used", "data": null}"#)
        .unwrap();
    let err = envelope.into_reply().unwrap_err();
    assert_eq!(err.to_string(), "Email already used");
    assert_eq!(err.kind(), ErrorKind::Transient);
  }

  #[test]
  fn test_null_data() {
    let envelope: Envelope<serde_json::Value> =
      serde_json::from_str(r#"{"status": 200, "message": "", "data": null}"#).unwrap();
    let reply = envelope.into_reply().unwrap();
    assert!(matches!(reply.data::<Vec<i64>>(), Err(ApiError::MissingData)));
  }

  #[test]
  fn test_wrong_payload_shape_is_decode_error() {
    let envelope: Envelope<serde_json::Value> =
      serde_json::from_str(r#"{"status": 200, "data": "nope"}"#).unwrap();
    let reply = envelope.into_reply().unwrap();
    assert!(matches!(reply.data::<Vec<i64>>(), Err(ApiError::Decode(_))));
  }

  #[tokio::test]
  async fn test_bearer_token_is_attached() {
    let backend = MockBackend::start().await;
    let anonymous = backend.client();
    let err = anonymous.profile().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);

    let authed = anonymous.with_token(crate::testing::LEARNER_TOKEN);
    let profile = authed.profile().await.unwrap();
    assert_eq!(profile.username, "learner");
  }

  #[tokio::test]
  async fn test_non_envelope_error_body() {
    let backend = MockBackend::start().await;
    let err = backend
      .client()
      .get::<serde_json::Value>("/does/not/exist")
      .await
      .unwrap_err();
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn test_unreachable_server_is_transient() {
    let client = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let err = client.topics().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(err.kind(), ErrorKind::Transient);
  }
}
