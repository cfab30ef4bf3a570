use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sign_learn::config::AppConfig;
use sign_learn::handlers;
use sign_learn::state::AppState;

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sign_learn=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = AppConfig::load();
  tracing::info!(
    "Backend at {} (timeout {}s, sessions expire after {}h)",
    config.api_base_url,
    config.api_timeout.as_secs(),
    config.session_expiry_hours
  );

  let bind_addr = config.bind_addr();
  let state = AppState::new(config).expect("Failed to build the backend client");
  let app = handlers::router(state);

  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://{}", bind_addr);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
