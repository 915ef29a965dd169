/// Router-level tests for the Task Pixie API
///
/// Every request goes through the full middleware stack (tracing, CORS,
/// security headers, bearer auth) with in-memory adapters underneath.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{profile_form, project_body, request, task_body, TestContext, PASSWORD, PNG};
use serde_json::json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Health and middleware
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_backends() {
    let ctx = TestContext::new();

    let response = ctx.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "not_configured");
    assert_eq!(body["cache"], "connected");
    assert!(body.get("pool").is_none());

    assert_eq!(response.headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(response.headers.get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let ctx = TestContext::new();

    for uri in ["/v1/projects", "/v1/tasks", "/v1/auth/me"] {
        let response = ctx.get(uri, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(response.json()["error"], "unauthorized");
    }

    let malformed = ctx
        .send(
            axum::http::Request::builder()
                .uri("/v1/projects")
                .header(header::AUTHORIZATION, "Token abc")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status, StatusCode::UNAUTHORIZED);

    let garbage = ctx
        .send(
            axum::http::Request::builder()
                .uri("/v1/projects")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Users and sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_register_and_fetch_user() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    let response = ctx.get(&format!("/v1/users/{}", alice.id), None).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body["avatar_url"].is_null());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_bad_input() {
    let ctx = TestContext::new();
    ctx.user("alice").await;

    let duplicate = ctx
        .post(
            "/v1/users",
            None,
            json!({ "username": "ALICE", "email": "other@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let invalid = ctx
        .post(
            "/v1/users",
            None,
            json!({ "username": "bo", "email": "not-an-email", "password": PASSWORD }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);

    let body = invalid.json();
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "username"]);

    let weak = ctx
        .post(
            "/v1/users",
            None,
            json!({ "username": "bob", "email": "bob@example.com", "password": "alllowercase" }),
        )
        .await;
    assert_eq!(weak.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(weak.json()["details"][0]["field"], "password");
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let ctx = TestContext::new();
    ctx.user("alice").await;

    let wrong_password = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "identity": "alice", "password": "Wrong$ecret1" }),
        )
        .await;
    let unknown_user = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "identity": "nobody", "password": PASSWORD }),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json(), unknown_user.json());
}

#[tokio::test]
async fn test_login_by_email() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    let response = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "identity": "Alice@Example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["id"], alice.id.to_string());
    assert!(body["expires_in"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let ctx = TestContext::new();
    let mut alice = ctx.user("alice").await;

    let me = ctx.get("/v1/auth/me", Some(&alice)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["username"], "alice");

    // Refresh hands out a working access token
    let refreshed = ctx
        .post(
            "/v1/auth/refresh",
            None,
            json!({ "refresh_token": alice.refresh_token }),
        )
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    let old_access = std::mem::replace(
        &mut alice.access_token,
        refreshed.json()["access_token"].as_str().unwrap().to_string(),
    );
    assert_ne!(old_access, alice.access_token);
    assert_eq!(ctx.get("/v1/auth/me", Some(&alice)).await.status, StatusCode::OK);

    // An access token is not a refresh token
    let wrong_type = ctx
        .post("/v1/auth/refresh", None, json!({ "refresh_token": old_access }))
        .await;
    assert_eq!(wrong_type.status, StatusCode::UNAUTHORIZED);

    let logout = ctx
        .post(
            "/v1/auth/logout",
            Some(&alice),
            json!({ "refresh_token": alice.refresh_token }),
        )
        .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    assert_eq!(
        ctx.get("/v1/auth/me", Some(&alice)).await.status,
        StatusCode::UNAUTHORIZED
    );
    let after_logout = ctx
        .post(
            "/v1/auth/refresh",
            None,
            json!({ "refresh_token": alice.refresh_token }),
        )
        .await;
    assert_eq!(after_logout.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_body_only_revokes_access_token() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    let logout = ctx
        .send(request(Method::POST, "/v1/auth/logout", Some(&alice), None))
        .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    assert_eq!(
        ctx.get("/v1/auth/me", Some(&alice)).await.status,
        StatusCode::UNAUTHORIZED
    );

    // The refresh session is still alive
    let refreshed = ctx
        .post(
            "/v1/auth/refresh",
            None,
            json!({ "refresh_token": alice.refresh_token }),
        )
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
}

#[tokio::test]
async fn test_search_users() {
    let ctx = TestContext::new();
    for i in 1..=6 {
        ctx.user(&format!("pixie_{}", i)).await;
    }
    ctx.user("alice").await;

    let response = ctx.get("/v1/users/search?username=PIXIE", None).await;
    assert_eq!(response.status, StatusCode::OK);
    let hits = response.json();
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 5);
    assert!(hits
        .iter()
        .all(|h| h["username"].as_str().unwrap().starts_with("pixie_")));

    let missing = ctx.get("/v1/users/search", None).await;
    assert_eq!(missing.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_and_malformed_user_ids() {
    let ctx = TestContext::new();

    let unknown = ctx.get(&format!("/v1/users/{}", Uuid::new_v4()), None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.json()["error"], "not_found");

    let malformed = ctx.get("/v1/users/not-a-uuid", None).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Profile updates and avatars
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_profile_update_with_avatar() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let uri = format!("/v1/users/{}", alice.id);

    let response = ctx
        .send(profile_form(
            &uri,
            &alice,
            &[("username", "alice_b"), ("email", "alice.b@example.com")],
            Some(PNG),
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["username"], "alice_b");
    let avatar_url = body["avatar_url"].as_str().unwrap().to_string();
    assert!(avatar_url.starts_with("/v1/avatars/"));
    assert!(avatar_url.ends_with(".png"));

    let avatar = ctx.get(&avatar_url, None).await;
    assert_eq!(avatar.status, StatusCode::OK);
    assert_eq!(avatar.headers.get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(&avatar.body[..], PNG);

    // A second avatar replaces the first one in the store
    let replaced = ctx
        .send(profile_form(
            &uri,
            &alice,
            &[("username", "alice_b"), ("email", "alice.b@example.com")],
            Some(PNG),
        ))
        .await;
    assert_eq!(replaced.status, StatusCode::OK);
    assert_ne!(replaced.json()["avatar_url"], avatar_url.as_str());
    assert_eq!(ctx.files.len(), 1);
    assert_eq!(ctx.get(&avatar_url, None).await.status, StatusCode::NOT_FOUND);

    // The cached profile was invalidated
    let fetched = ctx.get(&uri, None).await.json();
    assert_eq!(fetched["username"], "alice_b");
}

#[tokio::test]
async fn test_profile_update_password_change() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    let response = ctx
        .send(profile_form(
            &format!("/v1/users/{}", alice.id),
            &alice,
            &[
                ("username", "alice"),
                ("email", "alice@example.com"),
                ("password", "N3w$ecretPass"),
            ],
            None,
        ))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let old = ctx
        .post("/v1/auth/login", None, json!({ "identity": "alice", "password": PASSWORD }))
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let new = ctx
        .post(
            "/v1/auth/login",
            None,
            json!({ "identity": "alice", "password": "N3w$ecretPass" }),
        )
        .await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn test_profile_update_rules() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;

    let someone_else = ctx
        .send(profile_form(
            &format!("/v1/users/{}", bob.id),
            &alice,
            &[("username", "bob_hacked"), ("email", "bob@example.com")],
            None,
        ))
        .await;
    assert_eq!(someone_else.status, StatusCode::FORBIDDEN);

    let taken = ctx
        .send(profile_form(
            &format!("/v1/users/{}", alice.id),
            &alice,
            &[("username", "bob"), ("email", "alice@example.com")],
            Some(PNG),
        ))
        .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);
    // The avatar uploaded for the failed update is cleaned up
    assert!(ctx.files.is_empty());

    let not_an_image = ctx
        .send(profile_form(
            &format!("/v1/users/{}", alice.id),
            &alice,
            &[("username", "alice"), ("email", "alice@example.com")],
            Some(b"GIF89a not supported"),
        ))
        .await;
    assert_eq!(not_an_image.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(not_an_image.json()["details"][0]["field"], "avatar");

    let missing_fields = ctx
        .send(profile_form(&format!("/v1/users/{}", alice.id), &alice, &[], None))
        .await;
    assert_eq!(missing_fields.status, StatusCode::UNPROCESSABLE_ENTITY);

    let unauthenticated = ctx
        .send(request(
            Method::PUT,
            &format!("/v1/users/{}", alice.id),
            None,
            Some(json!({})),
        ))
        .await;
    assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_avatar_keys_cannot_escape_store() {
    let ctx = TestContext::new();

    for key in ["..%2F..%2Fetc%2Fpasswd", "missing.png", "noext", "abc.gif"] {
        let response = ctx.get(&format!("/v1/avatars/{}", key), None).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", key);
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_project_crud() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner").await;
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;

    let created = ctx
        .post(
            "/v1/projects",
            Some(&owner),
            project_body("Launch", &[bob.id, alice.id, bob.id]),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);

    let project = created.json();
    let id = project["id"].as_str().unwrap().to_string();
    assert_eq!(project["owner_username"], "owner");
    assert_eq!(project["priority"], "High");
    assert_eq!(project["status"], "In Progress");

    let members = ctx.get(&format!("/v1/projects/{}/members", id), Some(&owner)).await;
    assert_eq!(members.status, StatusCode::OK);
    assert_eq!(
        common::ids(&members.json()),
        vec![bob.id, alice.id],
        "members keep first-seen order without duplicates"
    );

    let updated = ctx
        .put(
            &format!("/v1/projects/{}", id),
            Some(&owner),
            json!({
                "title": "Launch v2",
                "detail": "Ship it",
                "priority": "Urgent",
                "status": "Completed",
                "members_id": [alice.id],
            }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    let updated = updated.json();
    assert_eq!(updated["title"], "Launch v2");
    assert_eq!(updated["status"], "Completed");
    assert_eq!(common::ids(&updated["members"]), vec![alice.id]);

    let deleted = ctx.delete(&format!("/v1/projects/{}", id), Some(&owner)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(
        ctx.get(&format!("/v1/projects/{}", id), Some(&owner)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_only_owner_modifies_project() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner").await;
    let member = ctx.user("member").await;
    let project = ctx.create_project(&owner, "Launch", &[member.id]).await;

    let update = ctx
        .put(
            &format!("/v1/projects/{}", project),
            Some(&member),
            project_body("Hijacked", &[]),
        )
        .await;
    assert_eq!(update.status, StatusCode::FORBIDDEN);
    assert_eq!(update.json()["error"], "forbidden");

    let delete = ctx.delete(&format!("/v1/projects/{}", project), Some(&member)).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    let missing = ctx
        .put(
            &format!("/v1/projects/{}", Uuid::new_v4()),
            Some(&owner),
            project_body("Launch", &[]),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_payload_validation() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner").await;

    let short = ctx
        .post("/v1/projects", Some(&owner), project_body("ab", &[]))
        .await;
    assert_eq!(short.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(short.json()["details"][0]["field"], "title");

    let mut bad_priority = project_body("Launch", &[]);
    bad_priority["priority"] = json!("Whenever");
    let response = ctx.post("/v1/projects", Some(&owner), bad_priority).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let unknown_member = ctx
        .post(
            "/v1/projects",
            Some(&owner),
            project_body("Launch", &[Uuid::new_v4()]),
        )
        .await;
    assert_eq!(unknown_member.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_visible_projects_merge_owned_then_member() {
    let ctx = TestContext::new();
    let me = ctx.user("me").await;
    let other = ctx.user("other").await;

    let mine = ctx.create_project(&me, "Mine", &[]).await;
    let both = ctx.create_project(&me, "Mine and joined", &[me.id]).await;
    let theirs = ctx.create_project(&other, "Theirs", &[me.id]).await;
    ctx.create_project(&other, "Private", &[]).await;

    let response = ctx.get("/v1/projects", Some(&me)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(common::ids(&response.json()), vec![mine, both, theirs]);

    let previews = response.json();
    assert_eq!(previews[0]["title"], "Mine");
    assert!(previews[0].get("detail").is_none());

    let empty = ctx.user("loner").await;
    let response = ctx.get("/v1/projects", Some(&empty)).await;
    assert_eq!(response.json(), json!([]));
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_task_assignee_replacement() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner").await;
    let u1 = ctx.user("u1").await;
    let u2 = ctx.user("u2").await;
    let u3 = ctx.user("u3").await;

    let task = ctx.create_task(&owner, "Write docs", None, &[u1.id, u2.id]).await;

    let updated = ctx
        .put(
            &format!("/v1/tasks/{}", task),
            Some(&owner),
            task_body("Write docs", None, &[u3.id]),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(common::ids(&updated.json()["assignees"]), vec![u3.id]);

    assert_eq!(ctx.get("/v1/tasks", Some(&u1)).await.json(), json!([]));
    assert_eq!(ctx.get("/v1/tasks", Some(&u2)).await.json(), json!([]));
    assert_eq!(common::ids(&ctx.get("/v1/tasks", Some(&u3)).await.json()), vec![task]);
}

#[tokio::test]
async fn test_visible_tasks_and_project_names() {
    let ctx = TestContext::new();
    let me = ctx.user("me").await;
    let other = ctx.user("other").await;
    let project = ctx.create_project(&other, "Launch", &[]).await;

    let owned = ctx.create_task(&me, "Owned", None, &[me.id]).await;
    let in_project = ctx.create_task(&other, "In project", Some(project), &[me.id]).await;
    let loose = ctx.create_task(&other, "Loose", None, &[me.id]).await;
    ctx.create_task(&other, "Not mine", None, &[]).await;

    let visible = ctx.get("/v1/tasks", Some(&me)).await.json();
    assert_eq!(common::ids(&visible), vec![owned, in_project, loose]);
    assert_eq!(visible[1]["project_name"], "Launch");
    assert!(visible[2]["project_name"].is_null());
    assert_eq!(visible[0]["status"], "To Do");
}

#[tokio::test]
async fn test_task_crud_and_ownership() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner").await;
    let assignee = ctx.user("assignee").await;
    let task = ctx.create_task(&owner, "Write docs", None, &[assignee.id]).await;

    let fetched = ctx.get(&format!("/v1/tasks/{}", task), Some(&assignee)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    let fetched = fetched.json();
    assert_eq!(fetched["owner_username"], "owner");
    assert_eq!(fetched["due_date"], "2030-06-01");
    assert!(fetched["project_id"].is_null());

    let forbidden = ctx.delete(&format!("/v1/tasks/{}", task), Some(&assignee)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let deleted = ctx.delete(&format!("/v1/tasks/{}", task), Some(&owner)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = ctx.delete(&format!("/v1/tasks/{}", task), Some(&owner)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_validation() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner").await;

    let unknown_project = ctx
        .post(
            "/v1/tasks",
            Some(&owner),
            task_body("Write docs", Some(Uuid::new_v4()), &[]),
        )
        .await;
    assert_eq!(unknown_project.status, StatusCode::NOT_FOUND);

    let mut short_detail = task_body("Write docs", None, &[]);
    short_detail["detail"] = json!("no");
    let response = ctx.post("/v1/tasks", Some(&owner), short_detail).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["details"][0]["field"], "detail");

    let mut blank_detail = task_body("Write docs", None, &[]);
    blank_detail["detail"] = json!("");
    let response = ctx.post("/v1/tasks", Some(&owner), blank_detail).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.json()["detail"].is_null());

    let mut bad_date = task_body("Write docs", None, &[]);
    bad_date["due_date"] = json!("next tuesday");
    let response = ctx.post("/v1/tasks", Some(&owner), bad_date).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_project_tasks_and_detach_on_delete() {
    let ctx = TestContext::new();
    let owner = ctx.user("owner").await;
    let project = ctx.create_project(&owner, "Launch", &[]).await;

    let linked = ctx.create_task(&owner, "Linked", Some(project), &[]).await;
    ctx.create_task(&owner, "Unlinked", None, &[]).await;

    let in_project = ctx.get(&format!("/v1/projects/{}/tasks", project), Some(&owner)).await;
    assert_eq!(in_project.status, StatusCode::OK);
    assert_eq!(common::ids(&in_project.json()), vec![linked]);

    let unknown = ctx
        .get(&format!("/v1/projects/{}/tasks", Uuid::new_v4()), Some(&owner))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    ctx.delete(&format!("/v1/projects/{}", project), Some(&owner)).await;

    let task = ctx.get(&format!("/v1/tasks/{}", linked), Some(&owner)).await;
    assert_eq!(task.status, StatusCode::OK);
    assert!(task.json()["project_id"].is_null());
}

#[tokio::test]
async fn test_storage_failure_is_masked() {
    let ctx = TestContext::new();
    let me = ctx.user("me").await;
    ctx.store.set_unavailable(true);

    let response = ctx.get("/v1/projects", Some(&me)).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

    let body = response.json();
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "An internal error occurred");
}
