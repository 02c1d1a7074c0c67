mod config;
mod domain;
mod highlights;
mod models;
mod routes;
mod schema;
mod services;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use config::Config;
use services::openai::OpenAiClient;
use services::transcript::TranscriptClient;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub http: reqwest::Client,
    pub openai: OpenAiClient,
    pub transcript: TranscriptClient,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    schema::ensure_schema(&pool)
        .await
        .expect("Failed to prepare database schema");

    let state = Arc::new(AppState {
        db: pool,
        http: reqwest::Client::new(),
        openai: OpenAiClient::new(&config.openai_api_key),
        transcript: TranscriptClient::new(),
    });

    let app = routes::build_routes()
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app).await.expect("Server failed");
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
}
