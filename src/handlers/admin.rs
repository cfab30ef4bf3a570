//! Admin dashboards: account lists per role, status toggle and creation of
//! staff accounts. All pages require the admin role.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::error::PageError;
use super::NavContext;
use crate::api::admin::NewAccount;
use crate::api::ErrorKind;
use crate::auth::{AdminContext, AuthContext};
use crate::domain::{Role, UserAccount};
use crate::session::AdminSnapshot;
use crate::state::AppState;
use crate::validation::validate_new_account;

/// Roles with a dashboard, in tab order
const LISTED_ROLES: [Role; 3] = [Role::Learner, Role::Creator, Role::Approver];

pub struct RoleTab {
  pub key: &'static str,
  pub label: &'static str,
  pub active: bool,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
  pub nav: NavContext,
  pub tabs: Vec<RoleTab>,
  pub role_key: &'static str,
  pub role_label: &'static str,
  pub search: String,
  pub users: Vec<UserAccount>,
  /// Staff roles can be created from the dashboard
  pub can_create: bool,
}

#[derive(Template)]
#[template(path = "admin/confirm.html")]
pub struct ConfirmTemplate {
  pub nav: NavContext,
  pub user_id: i64,
  pub username: String,
  pub active: bool,
}

#[derive(Template)]
#[template(path = "admin/new_user.html")]
pub struct NewUserTemplate {
  pub nav: NavContext,
  pub error: Option<String>,
  pub role_key: &'static str,
  pub role_label: &'static str,
  pub username: String,
  pub email: String,
}

#[derive(Deserialize)]
pub struct UsersQuery {
  pub role: Option<String>,
  pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct RoleQuery {
  pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusQuery {
  pub active: bool,
}

#[derive(Deserialize)]
pub struct StatusForm {
  pub active: bool,
}

#[derive(Deserialize)]
pub struct NewUserForm {
  pub role: String,
  pub username: String,
  pub email: String,
  pub password: String,
  pub confirm_password: String,
}

fn listed_role(role: Option<&str>) -> Result<Role, PageError> {
  match role {
    None => Ok(Role::Learner),
    Some(key) => Role::from_str(key)
      .filter(|r| LISTED_ROLES.contains(r))
      .ok_or_else(|| PageError::NotFound(format!("No dashboard for '{}'", key))),
  }
}

fn staff_role(role: Option<&str>) -> Result<Role, PageError> {
  match role.and_then(Role::from_str) {
    Some(role @ (Role::Creator | Role::Approver)) => Ok(role),
    _ => Err(PageError::NotFound(
      "Only creator and approver accounts can be created here".to_string(),
    )),
  }
}

fn list_path(role: Role) -> String {
  format!("/admin/users?role={}", role.as_str())
}

/// GET /admin/users?role=&search= - Accounts of one role
pub async fn users_page(
  State(state): State<AppState>,
  AdminContext(auth): AdminContext,
  Query(query): Query<UsersQuery>,
) -> Result<Html<String>, PageError> {
  let role = listed_role(query.role.as_deref())?;
  let search = query
    .search
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty());

  let ticket = state
    .sessions
    .update_session(&auth.session_id, |s| s.admin_tracker.begin())
    .ok_or(PageError::SignedOut)?;
  let users = auth
    .api
    .list_users(role, search.as_deref())
    .await
    .map_err(|e| PageError::from(e).retry_at(list_path(role)))?;

  // A newer query from the same browser owns the snapshot
  let snapshot = AdminSnapshot {
    role,
    search: search.clone(),
    users: users.clone(),
  };
  state.sessions.update_session(&auth.session_id, |s| {
    if let Some(snapshot) = s.admin_tracker.accept(ticket, snapshot) {
      s.admin = Some(snapshot);
    }
  });

  let template = UsersTemplate {
    nav: NavContext::from_auth(&auth),
    tabs: LISTED_ROLES
      .iter()
      .map(|r| RoleTab {
        key: r.as_str(),
        label: r.plural_label(),
        active: *r == role,
      })
      .collect(),
    role_key: role.as_str(),
    role_label: role.plural_label(),
    search: search.unwrap_or_default(),
    users,
    can_create: role != Role::Learner,
  };
  Ok(Html(template.render().unwrap_or_default()))
}

/// GET /admin/users/{id}/confirm?active= - Ask before changing an account's status
pub async fn confirm_status(
  State(state): State<AppState>,
  AdminContext(auth): AdminContext,
  Path(user_id): Path<i64>,
  Query(query): Query<StatusQuery>,
) -> Result<Html<String>, PageError> {
  let username = state
    .sessions
    .update_session(&auth.session_id, |s| {
      s.admin
        .as_ref()
        .and_then(|a| a.users.iter().find(|u| u.id == user_id))
        .map(|u| u.username.clone())
    })
    .ok_or(PageError::SignedOut)?
    .unwrap_or_else(|| format!("user #{}", user_id));

  let template = ConfirmTemplate {
    nav: NavContext::from_auth(&auth),
    user_id,
    username,
    active: query.active,
  };
  Ok(Html(template.render().unwrap_or_default()))
}

/// POST /admin/users/{id}/status - Apply the confirmed status change
pub async fn set_status(
  State(state): State<AppState>,
  AdminContext(auth): AdminContext,
  Path(user_id): Path<i64>,
  Form(form): Form<StatusForm>,
) -> Result<Response, PageError> {
  let updated = auth.api.set_user_status(user_id, form.active).await?;
  tracing::info!(
    "Admin {} set user {} active={}",
    auth.user.username,
    updated.username,
    updated.active
  );

  // Back to the list the admin came from
  let (role, search) = state
    .sessions
    .update_session(&auth.session_id, |s| {
      let snapshot = s.admin.as_mut()?;
      if let Some(user) = snapshot.users.iter_mut().find(|u| u.id == user_id) {
        *user = updated.clone();
      }
      Some((snapshot.role, snapshot.search.clone()))
    })
    .flatten()
    .unwrap_or((updated.role, None));
  let mut target = list_path(role);
  if let Some(search) = search {
    target.push_str("&search=");
    target.push_str(&urlencoding::encode(&search));
  }
  Ok(Redirect::to(&target).into_response())
}

fn new_user_form(
  auth: &AuthContext,
  role: Role,
  error: Option<String>,
  username: String,
  email: String,
) -> Html<String> {
  let template = NewUserTemplate {
    nav: NavContext::from_auth(auth),
    error,
    role_key: role.as_str(),
    role_label: role.plural_label(),
    username,
    email,
  };
  Html(template.render().unwrap_or_default())
}

/// GET /admin/users/new?role= - Form for a creator or approver account
pub async fn new_user_page(
  AdminContext(auth): AdminContext,
  Query(query): Query<RoleQuery>,
) -> Result<Html<String>, PageError> {
  let role = staff_role(query.role.as_deref())?;
  Ok(new_user_form(&auth, role, None, String::new(), String::new()))
}

/// POST /admin/users/new
pub async fn create_user(
  AdminContext(auth): AdminContext,
  Form(form): Form<NewUserForm>,
) -> Result<Response, PageError> {
  let role = staff_role(Some(&form.role))?;
  let username = form.username.trim().to_string();
  let email = form.email.trim().to_string();

  if let Err(e) = validate_new_account(&username, &email, &form.password, &form.confirm_password) {
    return Ok(new_user_form(&auth, role, Some(e.to_string()), username, email).into_response());
  }

  let account = NewAccount {
    username: username.clone(),
    email: email.clone(),
    password: form.password,
    role,
  };
  match auth.api.create_user(&account).await {
    Ok(created) => {
      tracing::info!("Admin {} created {} {}", auth.user.username, role.as_str(), created.username);
      Ok(Redirect::to(&list_path(role)).into_response())
    }
    Err(e) if e.kind() == ErrorKind::Auth => Err(e.into()),
    Err(e) => Ok(new_user_form(&auth, role, Some(e.to_string()), username, email).into_response()),
  }
}
