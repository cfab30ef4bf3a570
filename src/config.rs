//! Application configuration.
//!
//! Every value is resolved with priority: config.toml > environment (.env
//! is loaded first) > default.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ==================== Defaults ====================

pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 12;

// ==================== Session Configuration ====================

/// Cookie carrying the browser session id
pub const SESSION_COOKIE_NAME: &str = "sl_session";

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

// ==================== File layout ====================

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    server: Option<ServerSection>,
    backend: Option<BackendSection>,
    session: Option<SessionSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    addr: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendSection {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionSection {
    expiry_hours: Option<i64>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub server_addr: String,
    pub server_port: u16,
    /// Base URL of the e-learning REST backend
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub session_expiry_hours: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            session_expiry_hours: DEFAULT_SESSION_EXPIRY_HOURS,
        }
    }
}

impl AppConfig {
    /// Load from ./config.toml and the process environment
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::load_from(Path::new("config.toml"), |key| std::env::var(key).ok())
    }

    /// Load from an explicit file and variable lookup
    pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let file = match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                Ok(file) => {
                    tracing::info!("Using configuration from {}", path.display());
                    file
                }
                Err(e) => {
                    tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
                    ConfigFile::default()
                }
            },
            Err(_) => ConfigFile::default(),
        };
        Self::resolve(file, env)
    }

    fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let server = file.server.unwrap_or_default();
        let backend = file.backend.unwrap_or_default();
        let session = file.session.unwrap_or_default();
        let parsed = |key: &str| env(key).and_then(|v| v.trim().parse::<u64>().ok());

        let defaults = Self::default();
        Self {
            server_addr: server
                .addr
                .or_else(|| env("SERVER_ADDR"))
                .unwrap_or(defaults.server_addr),
            server_port: server
                .port
                .or_else(|| parsed("SERVER_PORT").and_then(|p: u64| u16::try_from(p).ok()))
                .unwrap_or(defaults.server_port),
            api_base_url: backend
                .url
                .or_else(|| env("API_BASE_URL"))
                .unwrap_or(defaults.api_base_url),
            api_timeout: backend
                .timeout_secs
                .or_else(|| parsed("API_TIMEOUT_SECS"))
                .map(Duration::from_secs)
                .unwrap_or(defaults.api_timeout),
            session_expiry_hours: session
                .expiry_hours
                .or_else(|| {
                    parsed("SESSION_EXPIRY_HOURS").and_then(|h: u64| i64::try_from(h).ok())
                })
                .unwrap_or(defaults.session_expiry_hours),
        }
    }

    /// Full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_addr, self.server_port)
    }
}
