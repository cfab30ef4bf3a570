//! Account pages: login, register, password flows, logout, profile.
//!
//! Forms are validated locally first; only well-formed input reaches the
//! backend, whose message is shown verbatim when it refuses.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;

use super::middleware::{AuthContext, OptionalAuth};
use crate::api::auth::SignUpRequest;
use crate::config::SESSION_COOKIE_NAME;
use crate::handlers::error::PageError;
use crate::state::AppState;
use crate::validation::{
    require, validate_email, validate_new_account, validate_password, validate_password_match,
};

#[derive(Template, Default)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub email: String,
    pub version: &'static str,
}

#[derive(Template, Default)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub username: String,
    pub email: String,
}

#[derive(Template, Default)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template, Default)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub error: Option<String>,
    pub token: String,
}

#[derive(Template, Default)]
#[template(path = "auth/change_password.html")]
pub struct ChangePasswordTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template, Default)]
#[template(path = "auth/profile.html")]
pub struct ProfileTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct EmailForm {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub bio: String,
}

fn page<T: Template>(template: T) -> Response {
    Html(template.render().unwrap_or_default()).into_response()
}

fn login_page_with(error: Option<String>, notice: Option<String>, email: String) -> Response {
    page(LoginTemplate {
        error,
        notice,
        email,
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// GET /login - Show login page, or go home when already signed in
pub async fn login_page(OptionalAuth(auth): OptionalAuth) -> Response {
    if auth.is_some() {
        return Redirect::to("/").into_response();
    }
    login_page_with(None, None, String::new())
}

/// POST /login - Sign in against the backend and start a session
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_string();
    let checked = validate_email(&email).and_then(|_| require("Password", &form.password).map(|_| ()));
    if let Err(e) = checked {
        return login_page_with(Some(e.to_string()), None, email);
    }

    let signed_in = match state.api.sign_in(&email, &form.password).await {
        Ok(signed_in) => signed_in,
        Err(e) => {
            tracing::debug!("Sign-in refused for {}: {}", email, e);
            return login_page_with(Some(e.to_string()), None, email);
        }
    };

    // Replace any session this browser already had
    if let Some(old) = jar.get(SESSION_COOKIE_NAME) {
        state.sessions.remove(old.value());
    }

    tracing::info!(
        "User {} signed in as {}",
        signed_in.user.username,
        signed_in.user.role.as_str()
    );
    let session_id = state.sessions.create(signed_in.token, signed_in.user);
    tracing::debug!("{} active sessions", state.sessions.len());
    let session_cookie = Cookie::build((SESSION_COOKIE_NAME, session_id))
        .path("/")
        .http_only(true)
        .secure(false) // Set to true in production with HTTPS
        .max_age(time::Duration::hours(state.config.session_expiry_hours))
        .build();

    (jar.add(session_cookie), Redirect::to("/")).into_response()
}

/// GET /register - Show registration page
pub async fn register_page() -> Response {
    page(RegisterTemplate::default())
}

/// POST /register - Create a learner account
pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let username = form.username.trim().to_string();
    let email = form.email.trim().to_string();
    let rejected = |error: String| {
        page(RegisterTemplate {
            error: Some(error),
            username: username.clone(),
            email: email.clone(),
        })
    };

    if let Err(e) = validate_new_account(&username, &email, &form.password, &form.confirm_password) {
        return rejected(e.to_string());
    }

    let request = SignUpRequest {
        username: username.clone(),
        email: email.clone(),
        password: form.password,
    };
    match state.api.sign_up(&request).await {
        Ok(message) => {
            tracing::info!("Registered account {}", username);
            login_page_with(None, Some(message), email.clone())
        }
        Err(e) => rejected(e.to_string()),
    }
}

/// GET /forgot-password
pub async fn forgot_password_page() -> Response {
    page(ForgotPasswordTemplate::default())
}

/// POST /forgot-password - Ask the backend to mail a reset link
pub async fn forgot_password_submit(
    State(state): State<AppState>,
    Form(form): Form<EmailForm>,
) -> Response {
    if let Err(e) = validate_email(&form.email) {
        return page(ForgotPasswordTemplate {
            error: Some(e.to_string()),
            notice: None,
        });
    }
    match state.api.forgot_password(form.email.trim()).await {
        Ok(message) => page(ForgotPasswordTemplate {
            error: None,
            notice: Some(message),
        }),
        Err(e) => page(ForgotPasswordTemplate {
            error: Some(e.to_string()),
            notice: None,
        }),
    }
}

/// GET /reset-password?token=... - Link target of the reset mail
pub async fn reset_password_page(Query(query): Query<ResetQuery>) -> Response {
    page(ResetPasswordTemplate {
        error: None,
        token: query.token,
    })
}

/// POST /reset-password
pub async fn reset_password_submit(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let checked = require("Reset token", &form.token)
        .and_then(|_| validate_password(&form.password))
        .and_then(|_| validate_password_match(&form.password, &form.confirm_password));
    if let Err(e) = checked {
        return page(ResetPasswordTemplate {
            error: Some(e.to_string()),
            token: form.token,
        });
    }
    match state.api.reset_password(form.token.trim(), &form.password).await {
        Ok(message) => login_page_with(None, Some(message), String::new()),
        Err(e) => page(ResetPasswordTemplate {
            error: Some(e.to_string()),
            token: form.token,
        }),
    }
}

/// GET /change-password
pub async fn change_password_page(_auth: AuthContext) -> Response {
    page(ChangePasswordTemplate::default())
}

/// POST /change-password
pub async fn change_password_submit(
    auth: AuthContext,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response, PageError> {
    let checked = require("Current password", &form.current_password)
        .and_then(|_| validate_password(&form.new_password))
        .and_then(|_| validate_password_match(&form.new_password, &form.confirm_password));
    if let Err(e) = checked {
        return Ok(page(ChangePasswordTemplate {
            error: Some(e.to_string()),
            notice: None,
        }));
    }

    match auth
        .api
        .change_password(&form.current_password, &form.new_password)
        .await
    {
        Ok(message) => Ok(page(ChangePasswordTemplate {
            error: None,
            notice: Some(message),
        })),
        // A wrong current password is a form error, not a sign-out
        Err(e) if e.status() != Some(401) => Ok(page(ChangePasswordTemplate {
            error: Some(e.to_string()),
            notice: None,
        })),
        Err(e) => Err(e.into()),
    }
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        state.sessions.remove(cookie.value());
    }
    (
        jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/")),
        Redirect::to("/login"),
    )
}

/// GET /profile
pub async fn profile_page(auth: AuthContext) -> Result<Response, PageError> {
    let profile = auth
        .api
        .profile()
        .await
        .map_err(|e| PageError::from(e).retry_at("/profile"))?;
    Ok(page(ProfileTemplate {
        username: profile.username,
        email: profile.email,
        full_name: profile.full_name.unwrap_or_default(),
        bio: profile.bio.unwrap_or_default(),
        ..Default::default()
    }))
}

/// POST /profile
pub async fn profile_submit(
    auth: AuthContext,
    Form(form): Form<ProfileForm>,
) -> Result<Response, PageError> {
    let mut profile = auth.api.profile().await?;
    profile.full_name = non_empty(&form.full_name);
    profile.bio = non_empty(&form.bio);

    let (saved, error, notice) = match auth.api.update_profile(&profile).await {
        Ok(saved) => (saved, None, Some("Profile saved".to_string())),
        Err(e) if e.kind() == crate::api::ErrorKind::Auth => return Err(e.into()),
        Err(e) => (profile, Some(e.to_string()), None),
    };
    Ok(page(ProfileTemplate {
        error,
        notice,
        username: saved.username,
        email: saved.email,
        full_name: saved.full_name.unwrap_or_default(),
        bio: saved.bio.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::testing::{
        signed_in_server, test_server, MockBackend, LEARNER_EMAIL, LEARNER_PASSWORD, RESET_TOKEN,
    };

    #[tokio::test]
    async fn test_protected_page_redirects_to_login() {
        let backend = MockBackend::start().await;
        let server = test_server(&backend);
        let response = server.get("/profile").await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/login");
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let backend = MockBackend::start().await;
        let server = signed_in_server(&backend, LEARNER_EMAIL, LEARNER_PASSWORD).await;
        server.get("/profile").await.assert_status_ok();

        // Already signed in: the login page sends us home
        let login = server.get("/login").await;
        assert_eq!(login.header("location"), "/");

        server.post("/logout").await.assert_status(StatusCode::SEE_OTHER);
        server.get("/profile").await.assert_status(StatusCode::SEE_OTHER);
        server.get("/login").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_wrong_password_shows_backend_message() {
        let backend = MockBackend::start().await;
        let server = test_server(&backend);
        let response = server
            .post("/login")
            .form(&[("email", LEARNER_EMAIL), ("password", "not-it-123")])
            .await;
        response.assert_status_ok();
        response.assert_text_contains("Invalid email or password");
    }

    #[tokio::test]
    async fn test_malformed_login_never_reaches_backend() {
        let backend = MockBackend::start().await;
        let server = test_server(&backend);
        let response = server
            .post("/login")
            .form(&[("email", "not-an-email"), ("password", "x")])
            .await;
        response.assert_text_contains("Enter a valid email address");
    }

    #[tokio::test]
    async fn test_register_validation_and_success() {
        let backend = MockBackend::start().await;
        let server = test_server(&backend);

        let mismatch = server
            .post("/register")
            .form(&[
                ("username", "newbie"),
                ("email", "newbie@example.com"),
                ("password", "secret123"),
                ("confirm_password", "secret124"),
            ])
            .await;
        mismatch.assert_text_contains("Passwords do not match");

        let created = server
            .post("/register")
            .form(&[
                ("username", "newbie"),
                ("email", "newbie@example.com"),
                ("password", "secret123"),
                ("confirm_password", "secret123"),
            ])
            .await;
        created.assert_text_contains("Account created");
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let backend = MockBackend::start().await;
        let server = test_server(&backend);
        server
            .get("/reset-password")
            .add_query_param("token", RESET_TOKEN)
            .await
            .assert_text_contains(RESET_TOKEN);

        let bad = server
            .post("/reset-password")
            .form(&[
                ("token", "stale"),
                ("password", "newpass123"),
                ("confirm_password", "newpass123"),
            ])
            .await;
        bad.assert_text_contains("Invalid or expired reset token");

        let good = server
            .post("/reset-password")
            .form(&[
                ("token", RESET_TOKEN),
                ("password", "newpass123"),
                ("confirm_password", "newpass123"),
            ])
            .await;
        good.assert_text_contains("Password updated");
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let backend = MockBackend::start().await;
        let server = signed_in_server(&backend, LEARNER_EMAIL, LEARNER_PASSWORD).await;
        let response = server
            .post("/change-password")
            .form(&[
                ("current_password", "guess12345"),
                ("new_password", "newpass123"),
                ("confirm_password", "newpass123"),
            ])
            .await;
        response.assert_status_ok();
        response.assert_text_contains("Current password is incorrect");
    }

    #[tokio::test]
    async fn test_profile_edit() {
        let backend = MockBackend::start().await;
        let server = signed_in_server(&backend, LEARNER_EMAIL, LEARNER_PASSWORD).await;
        let response = server
            .post("/profile")
            .form(&[("full_name", "Lee Learner"), ("bio", "Learning to sign")])
            .await;
        response.assert_text_contains("Profile saved");
        server.get("/profile").await.assert_text_contains("Learning to sign");
    }
}
