use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use quip_api::auth::{AppState, AppStateInner};
use quip_server::build_router;

fn test_app() -> (Router, AppState) {
    let db = quip_db::Database::open_in_memory().expect("in-memory db");
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".into(),
    });
    (build_router(state.clone()), state)
}

async fn post_form(
    app: &Router,
    uri: &str,
    body: &str,
    cookie: Option<&str>,
) -> axum::response::Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> axum::response::Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

fn location(res: &axum::response::Response) -> &str {
    res.headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
}

/// The session cookie pair from a Set-Cookie header, ready to send back.
fn session_cookie(res: &axum::response::Response) -> String {
    let raw = res
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap();
    assert!(raw.starts_with("quip_session="), "unexpected cookie: {raw}");
    raw.split(';').next().unwrap().to_string()
}

/// Register a fresh user and return their session cookie.
async fn register(app: &Router, username: &str, password: &str) -> String {
    let body = format!("loginType=register&username={username}&password={password}&redirectTo=/jokes");
    let res = post_form(app, "/login", &body, None).await;
    assert!(res.status().is_redirection(), "register failed: {}", res.status());
    session_cookie(&res)
}

/// Create a joke as the given session and return its id from the redirect.
async fn create_joke(app: &Router, cookie: &str) -> String {
    let res = post_form(
        app,
        "/jokes",
        "name=Road+worker&content=All+the+signs+were+there+when+I+got+home.",
        Some(cookie),
    )
    .await;
    assert!(res.status().is_redirection(), "create failed: {}", res.status());
    location(&res)
        .strip_prefix("/jokes/")
        .expect("redirect to the new joke")
        .to_string()
}

// -- Login / registration --

#[tokio::test]
async fn register_sets_session_and_redirects() {
    let (app, state) = test_app();

    let res = post_form(
        &app,
        "/login",
        "loginType=register&username=kody&password=twixrox&redirectTo=/",
        None,
    )
    .await;

    assert!(res.status().is_redirection());
    assert_eq!(location(&res), "/");
    let _cookie = session_cookie(&res);

    assert!(state.db.get_user_by_username("kody").unwrap().is_some());
}

#[tokio::test]
async fn redirect_target_outside_allow_list_falls_back_to_jokes() {
    let (app, _state) = test_app();

    let res = post_form(
        &app,
        "/login",
        "loginType=register&username=kody&password=twixrox&redirectTo=https://evil.example/phish",
        None,
    )
    .await;

    assert!(res.status().is_redirection());
    assert_eq!(location(&res), "/jokes");
}

#[tokio::test]
async fn short_username_returns_field_error_and_creates_no_user() {
    let (app, state) = test_app();

    let res = post_form(
        &app,
        "/login",
        "loginType=register&username=ab&password=twixrox",
        None,
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(
        body["fieldErrors"]["username"],
        "Usernames must be at least 3 characters long"
    );
    // Submitted values come back for the re-render
    assert_eq!(body["fields"]["username"], "ab");

    assert!(state.db.get_user_by_username("ab").unwrap().is_none());
}

#[tokio::test]
async fn short_password_returns_field_error() {
    let (app, _state) = test_app();

    let res = post_form(
        &app,
        "/login",
        "loginType=register&username=kody&password=12345",
        None,
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(
        body["fieldErrors"]["password"],
        "Passwords must be at least 6 characters long"
    );
}

#[tokio::test]
async fn duplicate_username_returns_form_error() {
    let (app, state) = test_app();
    register(&app, "kody", "twixrox").await;

    let res = post_form(
        &app,
        "/login",
        "loginType=register&username=kody&password=another1",
        None,
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    let form_error = body["formError"].as_str().unwrap();
    assert!(form_error.contains("already exists"), "got: {form_error}");

    // Still exactly one kody
    assert!(state.db.get_user_by_username("kody").unwrap().is_some());
}

#[tokio::test]
async fn login_with_wrong_credentials_returns_form_error() {
    let (app, _state) = test_app();
    register(&app, "kody", "twixrox").await;

    let res = post_form(
        &app,
        "/login",
        "loginType=login&username=kody&password=wrongpass",
        None,
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["formError"], "Username/Password combination is incorrect");
    assert_eq!(body["fields"]["username"], "kody");
}

#[tokio::test]
async fn login_success_creates_session_and_redirects() {
    let (app, _state) = test_app();
    register(&app, "kody", "twixrox").await;

    let res = post_form(
        &app,
        "/login",
        "loginType=login&username=kody&password=twixrox&redirectTo=/jokes",
        None,
    )
    .await;

    assert!(res.status().is_redirection());
    assert_eq!(location(&res), "/jokes");
    session_cookie(&res);
}

#[tokio::test]
async fn unknown_login_type_is_invalid() {
    let (app, _state) = test_app();

    let res = post_form(
        &app,
        "/login",
        "loginType=oauth&username=kody&password=twixrox",
        None,
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["formError"], "Login type invalid");
}

#[tokio::test]
async fn missing_fields_fail_as_form_error() {
    let (app, _state) = test_app();

    let res = post_form(&app, "/login", "loginType=login&username=kody", None).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["formError"], "Form not submitted correctly.");
}

#[tokio::test]
async fn login_page_echoes_redirect_param() {
    let (app, _state) = test_app();

    let res = get(&app, "/login?redirectTo=/", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["redirectTo"], "/");
}

// -- Joke detail / delete --

#[tokio::test]
async fn detail_loader_reports_owner() {
    let (app, _state) = test_app();
    let cookie = register(&app, "kody", "twixrox").await;
    let joke_id = create_joke(&app, &cookie).await;

    let res = get(&app, &format!("/jokes/{joke_id}"), Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["joke"]["name"], "Road worker");
    assert_eq!(body["isOwner"], true);

    // Anonymous visitors see the joke but are never the owner
    let res = get(&app, &format!("/jokes/{joke_id}"), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["isOwner"], false);
}

#[tokio::test]
async fn detail_loader_missing_joke_is_not_found_with_id() {
    let (app, _state) = test_app();

    let res = get(&app, "/jokes/no-such-joke-123", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = json_body(res).await;
    assert!(
        body["message"].as_str().unwrap().contains("no-such-joke-123"),
        "message should name the id: {body}"
    );
}

#[tokio::test]
async fn unsupported_method_is_bad_request_and_mutates_nothing() {
    let (app, state) = test_app();
    let cookie = register(&app, "kody", "twixrox").await;
    let joke_id = create_joke(&app, &cookie).await;

    let res = post_form(&app, &format!("/jokes/{joke_id}"), "_method=put", Some(&cookie)).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["message"], "The _method put is not supported");

    assert!(state.db.get_joke(&joke_id).unwrap().is_some());
}

#[tokio::test]
async fn delete_without_session_redirects_to_login() {
    let (app, state) = test_app();
    let cookie = register(&app, "kody", "twixrox").await;
    let joke_id = create_joke(&app, &cookie).await;

    let res = post_form(&app, &format!("/jokes/{joke_id}"), "_method=delete", None).await;

    assert!(res.status().is_redirection());
    assert!(location(&res).starts_with("/login?redirectTo="));

    assert!(state.db.get_joke(&joke_id).unwrap().is_some());
}

#[tokio::test]
async fn delete_by_non_owner_is_unauthorized_and_joke_persists() {
    let (app, state) = test_app();
    let owner = register(&app, "kody", "twixrox").await;
    let joke_id = create_joke(&app, &owner).await;

    let intruder = register(&app, "karl", "hunter2x").await;
    let res = post_form(
        &app,
        &format!("/jokes/{joke_id}"),
        "_method=delete",
        Some(&intruder),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(res).await;
    assert_eq!(body["message"], "Nice try. That's not your joke");

    assert!(state.db.get_joke(&joke_id).unwrap().is_some());
}

#[tokio::test]
async fn owner_delete_removes_joke() {
    let (app, state) = test_app();
    let cookie = register(&app, "kody", "twixrox").await;
    let joke_id = create_joke(&app, &cookie).await;

    let res = post_form(
        &app,
        &format!("/jokes/{joke_id}"),
        "_method=delete",
        Some(&cookie),
    )
    .await;

    assert!(res.status().is_redirection());
    assert_eq!(location(&res), "/jokes");
    assert!(state.db.get_joke(&joke_id).unwrap().is_none());

    // Subsequent loads answer NotFound
    let res = get(&app, &format!("/jokes/{joke_id}"), Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_missing_joke_is_not_found() {
    let (app, _state) = test_app();
    let cookie = register(&app, "kody", "twixrox").await;

    let res = post_form(&app, "/jokes/gone-already", "_method=delete", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

// -- Listing / creation --

#[tokio::test]
async fn listing_shows_recent_jokes_and_current_user() {
    let (app, _state) = test_app();
    let cookie = register(&app, "kody", "twixrox").await;
    create_joke(&app, &cookie).await;

    let res = get(&app, "/jokes", Some(&cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["jokes"][0]["name"], "Road worker");
    assert_eq!(body["user"]["username"], "kody");

    // Anonymous listing still works, just without a user
    let res = get(&app, "/jokes", None).await;
    let body = json_body(res).await;
    assert_eq!(body["jokes"].as_array().unwrap().len(), 1);
    assert!(body["user"].is_null());
}

#[tokio::test]
async fn short_joke_fields_return_errors_and_persist_nothing() {
    let (app, state) = test_app();
    let cookie = register(&app, "kody", "twixrox").await;

    let res = post_form(&app, "/jokes", "name=ab&content=too+short", Some(&cookie)).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json_body(res).await;
    assert_eq!(body["fieldErrors"]["name"], "That joke's name is too short");
    assert_eq!(body["fieldErrors"]["content"], "That joke is too short");
    assert_eq!(body["fields"]["name"], "ab");

    assert!(state.db.list_jokes(10).unwrap().is_empty());
}

#[tokio::test]
async fn create_requires_session() {
    let (app, state) = test_app();

    let res = post_form(
        &app,
        "/jokes",
        "name=Road+worker&content=All+the+signs+were+there.",
        None,
    )
    .await;

    assert!(res.status().is_redirection());
    assert!(location(&res).starts_with("/login?redirectTo="));
    assert!(state.db.list_jokes(10).unwrap().is_empty());
}

#[tokio::test]
async fn random_joke_serves_one_when_available() {
    let (app, _state) = test_app();

    let res = get(&app, "/jokes/random", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let cookie = register(&app, "kody", "twixrox").await;
    create_joke(&app, &cookie).await;

    let res = get(&app, "/jokes/random", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["name"], "Road worker");
}

// -- Logout --

#[tokio::test]
async fn logout_clears_cookie_and_redirects_home() {
    let (app, _state) = test_app();
    let cookie = register(&app, "kody", "twixrox").await;

    let res = post_form(&app, "/logout", "", Some(&cookie)).await;

    assert!(res.status().is_redirection());
    assert_eq!(location(&res), "/");
    let cleared = res
        .headers()
        .get(header::SET_COOKIE)
        .expect("cookie removal")
        .to_str()
        .unwrap();
    assert!(cleared.starts_with("quip_session="), "got: {cleared}");
    assert!(cleared.contains("Max-Age=0"), "got: {cleared}");
}

#[tokio::test]
async fn get_logout_only_redirects_home() {
    let (app, _state) = test_app();

    let res = get(&app, "/logout", None).await;
    assert!(res.status().is_redirection());
    assert_eq!(location(&res), "/");
    assert!(res.headers().get(header::SET_COOKIE).is_none());
}
