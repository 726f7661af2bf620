//! Hospital Portal - library for app logic and testing

pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use backend::{Backend, MemoryBackend, RestBackend};
use config::AppConfig;
use error::StartupError;
use routes::AppState;

/// Configure CORS for the configured frontend origins.
/// Unparseable origins are skipped; if none remain, localhost:3000 is allowed.
pub fn configure_cors(origins: &[String]) -> CorsLayer {
    let mut allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if allowed.is_empty() {
        allowed = vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ];
    }

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState, config: &AppConfig) -> Router {
    let cors = configure_cors(&config.allowed_origins);
    tracing::info!(origins = ?config.allowed_origins, "CORS configured");

    Router::new()
        .route("/api/auth/signin", post(routes::auth::sign_in))
        .route("/api/auth/signup", post(routes::auth::sign_up))
        .route("/api/auth/signout", post(routes::auth::sign_out))
        .route("/api/auth/user", get(routes::auth::current_user))
        .route("/api/home", get(routes::directory::home))
        .route("/api/departments", get(routes::directory::list_departments))
        .route("/api/doctors", get(routes::directory::list_doctors))
        .route(
            "/api/appointments/options",
            get(routes::appointments::booking_options),
        )
        .route(
            "/api/appointments",
            post(routes::appointments::book_appointment),
        )
        .route("/api/contact/info", get(routes::contact::contact_info))
        .route("/api/contact", post(routes::contact::submit_message))
        .route(
            "/api/profile",
            get(routes::profile::get_profile).put(routes::profile::update_profile),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/ready", get(routes::health::health_ready))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Hosted backend when configured, otherwise the in-memory store.
pub fn build_backend(config: &AppConfig) -> Result<Arc<dyn Backend>, StartupError> {
    match &config.backend {
        Some(remote) => {
            tracing::info!(url = %remote.url, "using hosted backend");
            Ok(Arc::new(RestBackend::new(remote)?))
        }
        None => {
            tracing::warn!(
                seeded = config.seed_demo_data,
                "BACKEND_URL not set. Using in-memory backend; data is lost on restart."
            );
            let memory = MemoryBackend::new(config.jwt_secret.clone());
            let memory = if config.seed_demo_data {
                memory.with_demo_data()
            } else {
                memory
            };
            Ok(Arc::new(memory))
        }
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Held for the programme's lifetime; dropping them loses buffered log lines.
    let _log_guards = logging::init(&logging::LogSettings::from_config(&config));

    routes::health::init_start_time();

    let state = AppState::new(build_backend(&config)?);
    let app = create_app(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| error::ConfigError::Invalid {
            key: "HOST",
            value: config.host.clone(),
        })?;
    tracing::info!(environment = %config.environment, "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
