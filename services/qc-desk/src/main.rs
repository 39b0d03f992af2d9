mod config;
mod state;
mod pg_store;
mod catalog_store;
mod routes_news;
mod routes_categories;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::{get, post}, Router};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env()?;

    // --- Postgres ---
    let pg_pool = PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .test_before_acquire(true)
        .connect(&cfg.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    // --- Startup health checks (fail fast) ---
    check_postgres(&pg_pool).await?;
    info!("postgres: ok");

    let categories = crate::catalog_store::load_categories(&pg_pool).await?;
    info!(categories = categories.len(), "categories loaded");

    let app_state = Arc::new(AppState::new(cfg.clone(), pg_pool, categories));

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/news", get(crate::routes_news::get_news))
        .route("/news/save", post(crate::routes_news::save_news))
        .route("/categories", get(crate::routes_categories::get_categories))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = &cfg.bind_addr;
    info!("qc-desk listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn check_postgres(pg_pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pg_pool)
        .await
        .context("Postgres ping failed")?;
    Ok(())
}
