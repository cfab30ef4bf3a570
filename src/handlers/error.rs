//! Page-level failures and how they render.

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;

use crate::api::{ApiError, ErrorKind};

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
  pub title: String,
  pub message: String,
  pub retry: Option<String>,
}

#[derive(Debug, Error)]
pub enum PageError {
  #[error(transparent)]
  Api(#[from] ApiError),

  /// Backend failure with a link to try the same page again
  #[error("{error}")]
  Retryable { error: ApiError, retry: String },

  #[error("{0}")]
  NotFound(String),

  #[error("You do not have access to this page")]
  Forbidden,

  /// Browser session missing or expired
  #[error("Please sign in again")]
  SignedOut,
}

impl PageError {
  /// Offer a retry link back to `path` for transient failures
  pub fn retry_at(self, path: impl Into<String>) -> Self {
    match self {
      Self::Api(error) if error.kind() == ErrorKind::Transient => Self::Retryable {
        error,
        retry: path.into(),
      },
      other => other,
    }
  }
}

fn render(status: StatusCode, title: &str, message: String, retry: Option<String>) -> Response {
  let template = ErrorTemplate {
    title: title.to_string(),
    message,
    retry,
  };
  (status, Html(template.render().unwrap_or_default())).into_response()
}

fn api_response(error: ApiError, retry: Option<String>) -> Response {
  match (error.kind(), error.status()) {
    (ErrorKind::Auth, Some(403)) => render(
      StatusCode::FORBIDDEN,
      "Access denied",
      error.to_string(),
      None,
    ),
    (ErrorKind::Auth, _) => Redirect::to("/login").into_response(),
    (ErrorKind::Validation, _) => render(
      StatusCode::BAD_REQUEST,
      "Something is not right",
      error.to_string(),
      None,
    ),
    _ if error.is_not_found() => render(StatusCode::NOT_FOUND, "Not found", error.to_string(), None),
    (ErrorKind::Transient, _) => {
      tracing::warn!("Backend request failed: {}", error);
      let status = match error {
        ApiError::Superseded => StatusCode::CONFLICT,
        _ => StatusCode::BAD_GATEWAY,
      };
      render(status, "Something went wrong", error.to_string(), retry)
    }
  }
}

impl IntoResponse for PageError {
  fn into_response(self) -> Response {
    match self {
      Self::Api(error) => api_response(error, None),
      Self::Retryable { error, retry } => api_response(error, Some(retry)),
      Self::NotFound(message) => render(StatusCode::NOT_FOUND, "Not found", message, None),
      Self::Forbidden => render(
        StatusCode::FORBIDDEN,
        "Access denied",
        Self::Forbidden.to_string(),
        None,
      ),
      Self::SignedOut => Redirect::to("/login").into_response(),
    }
  }
}
