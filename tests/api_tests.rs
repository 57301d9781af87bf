use articledesk::api::AppState;
use articledesk::config::Config;
use articledesk::models::article::NewArticle;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.auth.jwt_secret = "integration-test-secret".to_string();

    let state = articledesk::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");

    (articledesk::api::router(state.clone()), state)
}

fn article(url: &str, title: &str, source: &str, published_at: &str) -> NewArticle {
    NewArticle {
        source_id: None,
        source_name: source.to_string(),
        author: Some("Jo Reporter".to_string()),
        title: title.to_string(),
        description: format!("About {title}"),
        url: url.to_string(),
        url_to_image: None,
        published_at: published_at.to_string(),
        content: format!("Full text of {title}"),
    }
}

async fn seed_articles(state: &Arc<AppState>) {
    let articles = vec![
        article(
            "https://example.com/rust-release",
            "Rust release lands",
            "Tech Daily",
            "2025-03-03T09:00:00Z",
        ),
        article(
            "https://example.com/markets",
            "Markets wobble",
            "Finance Wire",
            "2025-03-02T09:00:00Z",
        ),
        article(
            "https://example.com/weather",
            "Storm on the coast",
            "Tech Daily",
            "2025-03-01T09:00:00Z",
        ),
    ];

    state
        .store()
        .add_articles(&articles)
        .await
        .expect("Failed to seed articles");
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed_get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn register_user(app: &Router, name: &str, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({ "name": name, "email": email, "password": "s3cret-pass" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let (app, _state) = spawn_app().await;

    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_article_listing_and_pagination() {
    let (app, state) = spawn_app().await;
    seed_articles(&state).await;

    let response = app.clone().oneshot(get_request("/api/articles")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["pages"], 1);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);

    // Newest publication first
    let titles: Vec<&str> = body["articles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec!["Rust release lands", "Markets wobble", "Storm on the coast"]
    );

    let response = app
        .clone()
        .oneshot(get_request("/api/articles?page=2&limit=2"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["articles"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["pages"], 2);
    assert_eq!(body["articles"][0]["title"], "Storm on the coast");
}

#[tokio::test]
async fn test_article_search_filters() {
    let (app, state) = spawn_app().await;
    seed_articles(&state).await;

    // Term present in exactly one title
    let response = app
        .clone()
        .oneshot(get_request("/api/articles/search?q=Storm"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["articles"][0]["title"], "Storm on the coast");

    // No filters behaves exactly like the plain listing
    let search_all = json_body(
        app.clone()
            .oneshot(get_request("/api/articles/search"))
            .await
            .unwrap(),
    )
    .await;
    let list_all = json_body(
        app.clone()
            .oneshot(get_request("/api/articles"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(search_all["articles"], list_all["articles"]);

    // Source filter is a substring match combined with the date range
    let response = app
        .clone()
        .oneshot(get_request(
            "/api/articles/search?source=Tech&from=2025-03-02&to=2025-03-04",
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["articles"][0]["title"], "Rust release lands");
}

#[tokio::test]
async fn test_article_sources_and_detail() {
    let (app, state) = spawn_app().await;
    seed_articles(&state).await;

    let response = app
        .clone()
        .oneshot(get_request("/api/articles/sources"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!(["Finance Wire", "Tech Daily"]));

    let response = app
        .clone()
        .oneshot(get_request("/api/articles/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["url"], "https://example.com/rust-release");

    let response = app
        .clone()
        .oneshot(get_request("/api/articles/9999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Non-numeric id is a client error, not a storage error
    let response = app
        .clone()
        .oneshot(get_request("/api/articles/not-a-number"))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_registration_and_login() {
    let (app, state) = spawn_app().await;

    let token = register_user(&app, "Ada", "ada@example.com").await;
    assert!(!token.is_empty());

    // Duplicate email is a conflict and does not create another user
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({ "name": "Ada 2", "email": "ada@example.com", "password": "other-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(state.store().user_count().await.unwrap(), 1);

    // Missing fields are a validation error
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({ "email": "no-name@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Wrong password fails even after a successful login
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": "ada@example.com", "password": "s3cret-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user"]["name"], "Ada");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": "ada@example.com", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown email looks identical to a wrong password
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": "ghost@example.com", "password": "s3cret-pass" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let (app, _state) = spawn_app().await;
    register_user(&app, "Ada", "ada@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": "ada@example.com", "password": "s3cret-pass" }),
        ))
        .await
        .unwrap();

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login must set a session cookie")
        .to_str()
        .unwrap()
        .to_string();

    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    // The cookie alone authenticates a profile request
    let token_pair = cookie.split(';').next().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/profile")
                .header(header::COOKIE, token_pair)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Logout clears it
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_profile_requires_auth() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/auth/profile"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(authed_get("/api/auth/profile", "garbage-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = register_user(&app, "Ada", "ada@example.com").await;
    let response = app
        .clone()
        .oneshot(authed_get("/api/auth/profile", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["email"], "ada@example.com");
}

#[tokio::test]
async fn test_bookmark_crud() {
    let (app, state) = spawn_app().await;
    seed_articles(&state).await;

    let token = register_user(&app, "Ada", "ada@example.com").await;

    // Unauthenticated access is rejected
    let response = app.clone().oneshot(get_request("/api/bookmarks")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Bookmark an existing article
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookmarks")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"articleId":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let bookmark_id = body["bookmarkId"].as_i64().unwrap();

    // Bookmarking it again is a conflict, and no second row appears
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookmarks")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"articleId":1}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(authed_get("/api/bookmarks/count", &token))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["count"], 1);

    // Unknown article
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/bookmarks")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"articleId":9999}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Listing joins the article fields
    let response = app
        .clone()
        .oneshot(authed_get("/api/bookmarks", &token))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["bookmarks"][0]["title"], "Rust release lands");
    assert_eq!(body["bookmarks"][0]["articleId"], 1);

    // Another user cannot delete it
    let other_token = register_user(&app, "Bob", "bob@example.com").await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/bookmarks/{bookmark_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {other_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The owner can
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/bookmarks/{bookmark_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_get("/api/bookmarks/count", &token))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_search_history_and_preferences() {
    let (app, state) = spawn_app().await;
    seed_articles(&state).await;

    let token = register_user(&app, "Ada", "ada@example.com").await;

    // Authenticated searches are recorded; anonymous ones are not
    let response = app
        .clone()
        .oneshot(authed_get("/api/articles/search?q=Storm", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request("/api/articles/search?q=Markets"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_get("/api/search-history", &token))
        .await
        .unwrap();
    let body = json_body(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["query"], "Storm");

    // Preferences default, then round-trip
    let response = app
        .clone()
        .oneshot(authed_get("/api/preferences", &token))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["pageSize"], 10);
    assert_eq!(body["preferredSources"], serde_json::json!([]));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/preferences")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"preferredSources":["Tech Daily"],"pageSize":25}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_get("/api/preferences", &token))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["pageSize"], 25);
    assert_eq!(body["preferredSources"], serde_json::json!(["Tech Daily"]));

    // Out-of-range page size is rejected
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/preferences")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"preferredSources":[],"pageSize":0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
