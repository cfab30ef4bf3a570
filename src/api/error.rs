use thiserror::Error;

/// Failure of a call to the e-learning backend.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Rejected input (never reaches the network when caught locally)
  #[error("{0}")]
  Validation(String),

  /// Missing, expired or insufficient credentials
  #[error("{message}")]
  Unauthorized { status: u16, message: String },

  /// Envelope with a non-success status
  #[error("{message}")]
  Backend { status: u16, message: String },

  #[error("The server returned no data")]
  MissingData,

  #[error("Unexpected response from server: {0}")]
  Decode(String),

  #[error("Could not reach the server: {0}")]
  Network(#[from] reqwest::Error),

  /// A newer request for the same view replaced this one
  #[error("Request superseded by a newer one")]
  Superseded,
}

/// How a failure is surfaced to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Shown inline next to the form
  Validation,
  /// Redirect to login or access-denied page, never retried
  Auth,
  /// Dismissible message with a manual retry
  Transient,
}

impl ApiError {
  /// Map a non-success status and message to the matching variant
  pub fn from_status(status: u16, message: impl Into<String>) -> Self {
    let message = message.into();
    match status {
      401 | 403 => Self::Unauthorized { status, message },
      400 | 422 => Self::Validation(message),
      _ => Self::Backend { status, message },
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::Unauthorized { .. } => ErrorKind::Auth,
      Self::Backend { .. }
      | Self::MissingData
      | Self::Decode(_)
      | Self::Network(_)
      | Self::Superseded => ErrorKind::Transient,
    }
  }

  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Unauthorized { status, .. } | Self::Backend { status, .. } => Some(*status),
      Self::Network(e) => e.status().map(|s| s.as_u16()),
      _ => None,
    }
  }

  pub fn is_not_found(&self) -> bool {
    self.status() == Some(404)
  }
}

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
  /// Log the error at warn level and return the default
  fn log_warn_default(self, context: &str) -> T
  where
    T: Default;
}

impl<T, E: std::fmt::Display> LogOnError<T> for Result<T, E> {
  fn log_warn_default(self, context: &str) -> T
  where
    T: Default,
  {
    match self {
      Ok(v) => v,
      Err(e) => {
        tracing::warn!("{}: {}", context, e);
        T::default()
      }
    }
  }
}
