/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "cache": "connected",
///   "pool": { "size": 3, "idle": 2 }
/// }
/// ```
///
/// Always answers 200; a failing backend shows up as `"status": "degraded"`.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use taskpixie_shared::db::pool;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,

    pub version: String,

    pub database: String,

    pub cache: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<pool::PoolStats>,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database = match &state.db {
        Some(db) => match pool::health_check(db).await {
            Ok(()) => "connected",
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                "disconnected"
            }
        },
        None => "not_configured",
    };

    let cache = match state.cache.ping().await {
        Ok(true) => "connected",
        Ok(false) => "disconnected",
        Err(e) => {
            tracing::warn!(error = %e, "Cache health check failed");
            "disconnected"
        }
    };

    let healthy = database != "disconnected" && cache == "connected";

    Ok(Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        cache: cache.to_string(),
        pool: state.db.as_ref().map(pool::pool_stats),
    }))
}
