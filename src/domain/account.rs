use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Learner,
  Creator,
  Approver,
  Admin,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Learner => "learner",
      Self::Creator => "creator",
      Self::Approver => "approver",
      Self::Admin => "admin",
    }
  }

  pub fn from_str(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "learner" | "learners" => Some(Self::Learner),
      "creator" | "creators" => Some(Self::Creator),
      "approver" | "approvers" => Some(Self::Approver),
      "admin" => Some(Self::Admin),
      _ => None,
    }
  }

  /// Heading used on the admin dashboards
  pub fn plural_label(&self) -> &'static str {
    match self {
      Self::Learner => "Learners",
      Self::Creator => "Creators",
      Self::Approver => "Approvers",
      Self::Admin => "Admins",
    }
  }
}

/// Signed-in user as returned by `/users/signin`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
  pub id: i64,
  pub username: String,
  #[serde(default)]
  pub email: String,
  pub role: Role,
}

impl SessionUser {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}

/// Account row on the admin dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
  pub id: i64,
  pub username: String,
  pub email: String,
  pub role: Role,
  #[serde(alias = "isActive")]
  pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub username: String,
  pub email: String,
  #[serde(default)]
  pub full_name: Option<String>,
  #[serde(default)]
  pub bio: Option<String>,
}
