//! Authentication extractors.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::api::ApiClient;
use crate::config::SESSION_COOKIE_NAME;
use crate::domain::SessionUser;
use crate::handlers::error::PageError;
use crate::state::AppState;

/// Authenticated request context.
/// Add this as a handler parameter to require authentication.
/// Redirects to /login if not authenticated.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub session_id: String,
    pub user: SessionUser,
    /// Client that sends the session's bearer token
    pub api: ApiClient,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| Redirect::to("/login").into_response())?;

        let session_id = jar
            .get(SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .ok_or_else(|| Redirect::to("/login").into_response())?;

        let (token, user) = state
            .sessions
            .update_session(&session_id, |s| (s.token.clone(), s.user.clone()))
            .ok_or_else(|| Redirect::to("/login").into_response())?;

        Ok(AuthContext {
            session_id,
            user,
            api: state.api.with_token(&token),
        })
    }
}

/// Authenticated context of an admin.
/// Non-admins get an access-denied page.
#[derive(Clone, Debug)]
pub struct AdminContext(pub AuthContext);

impl FromRequestParts<AppState> for AdminContext {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_request_parts(parts, state).await?;
        if !auth.is_admin() {
            tracing::debug!("User {} denied admin page", auth.user.username);
            return Err(PageError::Forbidden.into_response());
        }
        Ok(AdminContext(auth))
    }
}

/// Optional authentication extractor.
/// Returns Some(AuthContext) if authenticated, None otherwise.
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match AuthContext::from_request_parts(parts, state).await {
            Ok(auth) => Ok(OptionalAuth(Some(auth))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}
