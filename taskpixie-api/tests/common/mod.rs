//! Common test utilities for the API tests
//!
//! The router is built over the in-memory adapters from
//! `taskpixie_shared::memory`, so no PostgreSQL or Redis is needed. Requests
//! are driven through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use taskpixie_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskpixie_shared::{
    auth::TokenManager,
    memory::{InMemoryCache, InMemoryFileStore, InMemoryStore},
    use_case::{ProjectUseCase, TaskUseCase, UserUseCase},
};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "Pixie$ecret1";

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

const BOUNDARY: &str = "taskpixie-test-boundary";

/// Test context containing the router and the adapters behind it
pub struct TestContext {
    pub app: Router,
    pub config: Config,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<InMemoryCache>,
    pub files: Arc<InMemoryFileStore>,
}

/// A registered user with a live session
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// A collected response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config::for_tests();
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let files = Arc::new(InMemoryFileStore::new());
        let tokens = Arc::new(TokenManager::new(
            &config.jwt.secret,
            config.access_ttl(),
            config.refresh_ttl(),
        ));

        let state = AppState::new(
            UserUseCase::new(store.clone(), cache.clone(), files.clone(), tokens),
            ProjectUseCase::new(store.clone()),
            TaskUseCase::new(store.clone(), store.clone()),
            cache.clone(),
            config.clone(),
        );

        TestContext {
            app: build_router(state),
            config,
            store,
            cache,
            files,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, auth: Option<&TestUser>) -> TestResponse {
        self.send(request(Method::GET, uri, auth, None)).await
    }

    pub async fn delete(&self, uri: &str, auth: Option<&TestUser>) -> TestResponse {
        self.send(request(Method::DELETE, uri, auth, None)).await
    }

    pub async fn post(&self, uri: &str, auth: Option<&TestUser>, body: Value) -> TestResponse {
        self.send(request(Method::POST, uri, auth, Some(body))).await
    }

    pub async fn put(&self, uri: &str, auth: Option<&TestUser>, body: Value) -> TestResponse {
        self.send(request(Method::PUT, uri, auth, Some(body))).await
    }

    /// Registers `username` and logs in
    pub async fn user(&self, username: &str) -> TestUser {
        let response = self
            .post(
                "/v1/users",
                None,
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "register {}", username);

        let session = self
            .post(
                "/v1/auth/login",
                None,
                json!({ "identity": username, "password": PASSWORD }),
            )
            .await;
        assert_eq!(session.status, StatusCode::OK, "login {}", username);
        let session = session.json();

        TestUser {
            id: session["user"]["id"].as_str().unwrap().parse().unwrap(),
            username: username.to_string(),
            access_token: session["access_token"].as_str().unwrap().to_string(),
            refresh_token: session["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_project(&self, owner: &TestUser, title: &str, members: &[Uuid]) -> Uuid {
        let response = self
            .post("/v1/projects", Some(owner), project_body(title, members))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        id_of(&response.json())
    }

    pub async fn create_task(
        &self,
        owner: &TestUser,
        title: &str,
        project_id: Option<Uuid>,
        assignees: &[Uuid],
    ) -> Uuid {
        let response = self
            .post("/v1/tasks", Some(owner), task_body(title, project_id, assignees))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        id_of(&response.json())
    }
}

pub fn request(
    method: Method,
    uri: &str,
    auth: Option<&TestUser>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = auth {
        builder = builder.header(header::AUTHORIZATION, user.bearer());
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Builds a `multipart/form-data` profile update
pub fn profile_form(
    uri: &str,
    auth: &TestUser,
    fields: &[(&str, &str)],
    avatar: Option<&[u8]>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(data) = avatar {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"avatar.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(header::AUTHORIZATION, auth.bearer())
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn project_body(title: &str, members: &[Uuid]) -> Value {
    json!({
        "title": title,
        "detail": "Project detail",
        "priority": "High",
        "status": "In Progress",
        "members_id": members,
    })
}

pub fn task_body(title: &str, project_id: Option<Uuid>, assignees: &[Uuid]) -> Value {
    json!({
        "title": title,
        "description": "Task description",
        "priority": "Urgent",
        "status": "To Do",
        "project_id": project_id,
        "due_date": "2030-06-01",
        "assigned_to_id": assignees,
    })
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"].as_str().unwrap().parse().unwrap()
}

pub fn ids(value: &Value) -> Vec<Uuid> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(id_of)
        .collect()
}
