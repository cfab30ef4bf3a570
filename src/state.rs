//! Application state passed to all handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::AppConfig;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    /// Anonymous client; authenticated calls use `api.with_token(..)`
    pub api: ApiClient,

    pub sessions: SessionStore,

    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api_base_url, config.api_timeout)?;
        Ok(Self {
            api,
            sessions: SessionStore::new(config.session_expiry_hours),
            config: Arc::new(config),
        })
    }
}
