//! Admin account management. Concurrent edits are last-write-wins: the
//! backend takes no version token.

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError};
use crate::domain::{Role, UserAccount};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
  pub username: String,
  pub email: String,
  pub password: String,
  pub role: Role,
}

#[derive(Debug, Serialize)]
struct StatusUpdate {
  active: bool,
}

impl ApiClient {
  pub async fn list_users(
    &self,
    role: Role,
    search: Option<&str>,
  ) -> Result<Vec<UserAccount>, ApiError> {
    let mut path = format!("/api/v1/admin/users?role={}", role.as_str());
    if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
      path.push_str("&search=");
      path.push_str(&urlencoding::encode(search));
    }
    self.get(&path).await
  }

  pub async fn create_user(&self, account: &NewAccount) -> Result<UserAccount, ApiError> {
    self.post("/api/v1/admin/users", account).await?.data()
  }

  pub async fn set_user_status(&self, user_id: i64, active: bool) -> Result<UserAccount, ApiError> {
    self
      .put(
        &format!("/api/v1/admin/users/{}/status", user_id),
        &StatusUpdate { active },
      )
      .await?
      .data()
  }
}
