//! # Task Pixie API Server
//!
//! Task and project management backend: users, projects with members, tasks
//! with assignees, and merged "visible to me" previews.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskpixie-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use taskpixie_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskpixie_shared::{
    auth::TokenManager,
    cache::{
        redis::{RedisCache, RedisConfig},
        Cache,
    },
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    repository::{PgProjectRepository, PgTaskRepository, PgUserRepository},
    storage::LocalFileStore,
    use_case::{ProjectUseCase, TaskUseCase, UserUseCase},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskpixie_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Task Pixie API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::new(config.database.url.clone())
    })
    .await
    .context("Failed to connect to PostgreSQL")?;

    run_migrations(&db).await.context("Failed to run migrations")?;

    let cache: Arc<dyn Cache> = Arc::new(
        RedisCache::new(RedisConfig {
            url: config.redis.url.clone(),
            command_timeout_secs: config.redis.command_timeout_secs,
        })
        .await?,
    );

    let files = Arc::new(LocalFileStore::open(config.storage.avatar_dir.clone()).await?);
    let tokens = Arc::new(TokenManager::new(
        &config.jwt.secret,
        config.access_ttl(),
        config.refresh_ttl(),
    ));

    let users = Arc::new(PgUserRepository::new(db.clone()));
    let projects = Arc::new(PgProjectRepository::new(db.clone()));
    let tasks = Arc::new(PgTaskRepository::new(db.clone()));

    let bind_address = config.bind_address();
    let state = AppState::new(
        UserUseCase::new(users, cache.clone(), files, tokens),
        ProjectUseCase::new(projects.clone()),
        TaskUseCase::new(tasks, projects),
        cache,
        config,
    )
    .with_db(db.clone());

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(db).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
