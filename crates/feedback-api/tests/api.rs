use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use feedback_api::{AppStateInner, router};
use feedback_core::Argon2Hasher;
use feedback_db::Database;

const SECRET: &str = "integration-test-secret";

fn app() -> Router {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let hasher = Arc::new(Argon2Hasher::with_cost(8, 1, 1).unwrap());
    let state = AppStateInner::new(db, hasher, SECRET.into(), 1).unwrap();
    router(state)
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
    send_raw(app, method, uri, token, body.map(|b| b.to_string())).await
}

/// Like `send`, but the body goes out as given, parsable or not.
async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Reply { status, headers, body }
}

fn registration(username: &str) -> Value {
    json!({
        "username": username,
        "password": "secretpw",
        "email": "c@x.com",
        "first_name": "C",
        "last_name": "R",
    })
}

/// Register and return the session token.
async fn register(app: &Router, username: &str) -> String {
    let reply = send(app, Method::POST, "/register", None, Some(registration(username))).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body["username"], username);
    reply.body["token"].as_str().unwrap().to_string()
}

async fn post_feedback(app: &Router, token: &str, username: &str, title: &str, content: &str) -> i64 {
    let reply = send(
        app,
        Method::POST,
        &format!("/users/{username}/feedback"),
        Some(token),
        Some(json!({ "title": title, "content": content })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    reply.body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn home_redirects_to_register() {
    let app = app();
    let reply = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.headers[header::LOCATION], "/register");
}

#[tokio::test]
async fn health_is_ok() {
    let app = app();
    let reply = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "ok");
}

#[tokio::test]
async fn registration_logs_the_user_in() {
    let app = app();
    let token = register(&app, "carol1").await;

    let reply = send(&app, Method::GET, "/users/carol1", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["username"], "carol1");
    assert_eq!(reply.body["email"], "c@x.com");
    assert_eq!(reply.body["feedback"], json!([]));
    assert!(reply.body.get("password").is_none());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    register(&app, "carol1").await;

    let reply = send(&app, Method::POST, "/register", None, Some(registration("carol1"))).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["fields"][0]["field"], "username");
}

#[tokio::test]
async fn invalid_registration_reports_every_field() {
    let app = app();
    let body = json!({
        "username": "abc",
        "password": "secretpw",
        "email": "nope",
        "first_name": "C",
    });

    let reply = send(&app, Method::POST, "/register", None, Some(body)).await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);

    let fields: Vec<&str> = reply.body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["username", "email", "last_name"]);
}

#[tokio::test]
async fn login_succeeds_with_the_right_password() {
    let app = app();
    register(&app, "carol1").await;

    let creds = json!({ "username": "carol1", "password": "secretpw" });
    let reply = send(&app, Method::POST, "/login", None, Some(creds)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["username"], "carol1");

    let token = reply.body["token"].as_str().unwrap();
    let profile = send(&app, Method::GET, "/users/carol1", Some(token), None).await;
    assert_eq!(profile.status, StatusCode::OK);
}

#[tokio::test]
async fn bad_credentials_do_not_reveal_which_part_failed() {
    let app = app();
    register(&app, "carol1").await;

    let wrong_password = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": "carol1", "password": "wrongpw" })),
    )
    .await;
    let unknown_user = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": "nobody1", "password": "secretpw" })),
    )
    .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert_eq!(wrong_password.body["error"], "Invalid Username/Password");
}

#[tokio::test]
async fn authenticated_users_are_redirected_from_register_and_login() {
    let app = app();
    let token = register(&app, "carol1").await;

    let reply = send(&app, Method::POST, "/register", Some(&token), Some(registration("other1"))).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.headers[header::LOCATION], "/users/carol1");

    let creds = json!({ "username": "carol1", "password": "secretpw" });
    let reply = send(&app, Method::POST, "/login", Some(&token), Some(creds)).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn profiles_are_private() {
    let app = app();
    register(&app, "carol1").await;
    let dave = register(&app, "dave2").await;

    let anonymous = send(&app, Method::GET, "/users/carol1", None, None).await;
    let other = send(&app, Method::GET, "/users/carol1", Some(&dave), None).await;
    let forged = send(&app, Method::GET, "/users/carol1", Some("not.a.jwt"), None).await;

    for reply in [anonymous, other, forged] {
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["error"], "access denied");
    }
}

#[tokio::test]
async fn only_the_owner_edits_feedback() {
    let app = app();
    let carol = register(&app, "carol1").await;
    let dave = register(&app, "dave2").await;
    let id = post_feedback(&app, &carol, "carol1", "Hi", "Hello").await;

    let uri = format!("/feedback/{id}");
    let rename = json!({ "title": "Hi2" });

    let denied = send(&app, Method::PUT, &uri, Some(&dave), Some(rename.clone())).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    let updated = send(&app, Method::PUT, &uri, Some(&carol), Some(rename)).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["title"], "Hi2");
    assert_eq!(updated.body["content"], "Hello");

    let denied = send(&app, Method::DELETE, &uri, Some(&dave), None).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
    let still_there = send(&app, Method::GET, &uri, Some(&carol), None).await;
    assert_eq!(still_there.status, StatusCode::OK);

    let deleted = send(&app, Method::DELETE, &uri, Some(&carol), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn cannot_post_feedback_for_someone_else() {
    let app = app();
    register(&app, "carol1").await;
    let dave = register(&app, "dave2").await;

    let reply = send(
        &app,
        Method::POST,
        "/users/carol1/feedback",
        Some(&dave),
        Some(json!({ "title": "Hi", "content": "Hello" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn strangers_are_denied_before_the_body_is_read() {
    let app = app();
    let carol = register(&app, "carol1").await;
    let id = post_feedback(&app, &carol, "carol1", "Hi", "Hello").await;
    let uri = format!("/feedback/{id}");

    let replies = [
        send(&app, Method::PUT, &uri, None, Some(json!({ "title": 5 }))).await,
        send(&app, Method::PUT, &uri, None, Some(json!({ "bogus": "x" }))).await,
        send(&app, Method::PUT, "/feedback/999999", None, Some(json!({ "title": 5 }))).await,
        send_raw(&app, Method::PUT, &uri, None, Some("not json".into())).await,
        send_raw(&app, Method::POST, "/users/carol1/feedback", None, Some("not json".into())).await,
        send(&app, Method::POST, "/users/carol1/feedback", None, Some(json!({ "title": [] }))).await,
    ];
    for reply in replies {
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["error"], "access denied");
    }

    let untouched = send(&app, Method::GET, &uri, Some(&carol), None).await;
    assert_eq!(untouched.body["title"], "Hi");
}

#[tokio::test]
async fn owner_gets_a_validation_error_for_a_malformed_body() {
    let app = app();
    let carol = register(&app, "carol1").await;
    let id = post_feedback(&app, &carol, "carol1", "Hi", "Hello").await;

    let update = send(&app, Method::PUT, &format!("/feedback/{id}"), Some(&carol), Some(json!({ "title": 5 }))).await;
    let create = send_raw(&app, Method::POST, "/users/carol1/feedback", Some(&carol), Some("not json".into())).await;
    let login = send_raw(&app, Method::POST, "/login", None, Some("{".into())).await;

    for reply in [update, create, login] {
        assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(reply.body["error"], "validation failed");
        assert_eq!(reply.body["fields"][0]["field"], "body");
    }
}

#[tokio::test]
async fn feedback_validation_errors() {
    let app = app();
    let carol = register(&app, "carol1").await;

    let long_title = "t".repeat(201);
    let reply = send(
        &app,
        Method::POST,
        "/users/carol1/feedback",
        Some(&carol),
        Some(json!({ "title": long_title, "content": "" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(reply.body["fields"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn missing_feedback_looks_like_someone_elses() {
    let app = app();
    let carol = register(&app, "carol1").await;
    let dave = register(&app, "dave2").await;
    let id = post_feedback(&app, &carol, "carol1", "Hi", "Hello").await;

    let foreign = send(&app, Method::GET, &format!("/feedback/{id}"), Some(&dave), None).await;
    let missing = send(&app, Method::GET, "/feedback/999999", Some(&dave), None).await;

    assert_eq!(foreign.status, missing.status);
    assert_eq!(foreign.body, missing.body);
}

#[tokio::test]
async fn logout_kills_the_token() {
    let app = app();
    let token = register(&app, "carol1").await;

    let reply = send(&app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    let profile = send(&app, Method::GET, "/users/carol1", Some(&token), None).await;
    assert_eq!(profile.status, StatusCode::UNAUTHORIZED);

    let again = send(&app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(again.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_an_account_removes_its_feedback_and_sessions() {
    let app = app();
    let carol = register(&app, "carol1").await;
    let first = post_feedback(&app, &carol, "carol1", "Hi", "Hello").await;
    let second = post_feedback(&app, &carol, "carol1", "Again", "More").await;

    let denied = send(&app, Method::DELETE, "/users/carol1", None, None).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    let reply = send(&app, Method::DELETE, "/users/carol1", Some(&carol), None).await;
    assert_eq!(reply.status, StatusCode::NO_CONTENT);

    // The old token is dead.
    let profile = send(&app, Method::GET, "/users/carol1", Some(&carol), None).await;
    assert_eq!(profile.status, StatusCode::UNAUTHORIZED);

    let creds = json!({ "username": "carol1", "password": "secretpw" });
    let login = send(&app, Method::POST, "/login", None, Some(creds)).await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);

    // A new account under the same name starts empty.
    let fresh = register(&app, "carol1").await;
    let profile = send(&app, Method::GET, "/users/carol1", Some(&fresh), None).await;
    assert_eq!(profile.body["feedback"], json!([]));
    for id in [first, second] {
        let reply = send(&app, Method::GET, &format!("/feedback/{id}"), Some(&fresh), None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }
}
