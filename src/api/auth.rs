//! Account endpoints: sign-in/up, password flows, profile.

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError};
use crate::domain::{Profile, SessionUser};

#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
  pub email: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
  pub username: String,
  pub email: String,
  pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignIn {
  pub token: String,
  pub user: SessionUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
  current_password: &'a str,
  new_password: &'a str,
}

#[derive(Debug, Serialize)]
struct ResetPasswordRequest<'a> {
  token: &'a str,
  password: &'a str,
}

impl ApiClient {
  pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, ApiError> {
    self
      .post("/users/signin", &SignInRequest { email, password })
      .await?
      .data()
  }

  /// Returns the backend's confirmation message
  pub async fn sign_up(&self, request: &SignUpRequest) -> Result<String, ApiError> {
    Ok(self.post("/users/signup", request).await?.message)
  }

  pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
    let body = serde_json::json!({ "email": email });
    Ok(self.post("/users/forgot-password", &body).await?.message)
  }

  pub async fn reset_password(&self, token: &str, password: &str) -> Result<String, ApiError> {
    let body = ResetPasswordRequest { token, password };
    Ok(self.post("/users/reset-password", &body).await?.message)
  }

  pub async fn change_password(&self, current: &str, new: &str) -> Result<String, ApiError> {
    let body = ChangePasswordRequest {
      current_password: current,
      new_password: new,
    };
    Ok(self.post("/users/change-password", &body).await?.message)
  }

  pub async fn profile(&self) -> Result<Profile, ApiError> {
    self.get("/users/profile").await
  }

  pub async fn update_profile(&self, profile: &Profile) -> Result<Profile, ApiError> {
    self.put("/users/profile", profile).await?.data()
  }
}
