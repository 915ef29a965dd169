/// Application state and router
///
/// ```text
/// /health                          public
/// /v1/users                        register, search, profile (PUT needs JWT)
/// /v1/auth                         login, refresh (public); me, logout (JWT)
/// /v1/projects                     JWT
/// /v1/tasks                        JWT
/// /v1/avatars/:key                 public
/// ```
///
/// Every route runs behind request tracing, CORS and security headers.

use crate::{
    config::Config,
    middleware::{auth::jwt_auth_layer, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use taskpixie_shared::{
    cache::Cache,
    storage::MAX_AVATAR_BYTES,
    use_case::{ProjectUseCase, TaskUseCase, UserUseCase},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Headroom for the text fields sent next to an avatar
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserUseCase>,

    pub projects: Arc<ProjectUseCase>,

    pub tasks: Arc<TaskUseCase>,

    /// Probed by `/health`
    pub cache: Arc<dyn Cache>,

    /// Probed by `/health`; absent when running on in-memory adapters
    pub db: Option<PgPool>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        users: UserUseCase,
        projects: ProjectUseCase,
        tasks: TaskUseCase,
        cache: Arc<dyn Cache>,
        config: Config,
    ) -> Self {
        Self {
            users: Arc::new(users),
            projects: Arc::new(projects),
            tasks: Arc::new(tasks),
            cache,
            db: None,
            config: Arc::new(config),
        }
    }

    pub fn with_db(mut self, db: PgPool) -> Self {
        self.db = Some(db);
        self
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

pub fn build_router(state: AppState) -> Router {
    let auth = axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer);

    let user_routes = Router::new()
        .route("/", post(routes::users::register))
        .route("/search", get(routes::users::search_users))
        .route(
            "/:id",
            get(routes::users::get_user).merge(
                put(routes::users::update_user)
                    .layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES + MULTIPART_OVERHEAD_BYTES))
                    .layer(auth.clone()),
            ),
        );

    let auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/logout", post(routes::auth::logout))
        .route_layer(auth.clone())
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let project_routes = Router::new()
        .route(
            "/",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:id/members", get(routes::projects::get_project_members))
        .route("/:id/tasks", get(routes::projects::get_project_tasks))
        .route_layer(auth.clone());

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route_layer(auth);

    let v1_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/auth", auth_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .route("/avatars/:key", get(routes::avatars::get_avatar));

    let cors = cors_layer(&state.config);
    let security = SecurityHeadersLayer::new(state.config.api.production);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(security)
        .with_state(state)
}
