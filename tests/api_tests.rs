use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use productivity::http::router;

mod common;
use common::{state_with, test_config, test_state};

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

fn json_req(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_req(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn cookie_value(set_cookie: &str) -> &str {
    let pair = set_cookie.split(';').next().unwrap();
    pair.split_once('=').unwrap().1
}

async fn create_calendar(app: &Router) -> Value {
    let (status, _, body) = send(
        app,
        json_req(
            Method::POST,
            "/items",
            json!({"item": "Calendar", "frequency": 0, "group": "Next"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_create_and_read_items() {
    let app = router(test_state());

    let created = create_calendar(&app).await;
    assert_eq!(created["id"], "1");
    assert_eq!(created["item"], "Calendar");
    assert_eq!(created["frequency"], "Key");
    assert_eq!(created["group"], "Next");
    assert_eq!(created["last_check_undo"], "0001-01-01T00:00:00");
    assert_ne!(created["last_check"], "");

    let (status, _, body) = send(&app, empty_req(Method::GET, "/items/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    let (status, _, body) = send(&app, empty_req(Method::GET, "/items")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([created]));
}

#[tokio::test]
async fn test_create_from_form_body() {
    let app = router(test_state());

    let req = Request::builder()
        .method(Method::POST)
        .uri("/items")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("item=Gym&frequency=3&group=Health"))
        .unwrap();

    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["frequency"], "Week");
    assert_eq!(body["group"], "Health");
}

#[tokio::test]
async fn test_create_errors() {
    let app = router(test_state());

    let (status, _, body) = send(
        &app,
        json_req(Method::POST, "/items", json!({"item": "Calendar", "frequency": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing data"}));

    let (status, _, body) = send(
        &app,
        json_req(
            Method::POST,
            "/items",
            json!({"item": "Calendar", "frequency": 10, "group": "Next"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Data validation error"}));

    let (status, _, _) = send(
        &app,
        json_req(
            Method::POST,
            "/items",
            json!({"item": "x".repeat(208), "frequency": 0, "group": "Next"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, json_req(Method::POST, "/items", json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing data"}));

    let (_, _, body) = send(&app, empty_req(Method::GET, "/items")).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_get_unknown_id() {
    let app = router(test_state());

    let (status, _, body) = send(&app, empty_req(Method::GET, "/items/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "ID not found"}));

    let (status, _, _) = send(&app, empty_req(Method::GET, "/items/abc")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_shifts_last_check() {
    let app = router(test_state());
    let created = create_calendar(&app).await;

    let (status, _, body) = send(
        &app,
        json_req(
            Method::PUT,
            "/items/1",
            json!({"item": "Calendar", "frequency": "2", "group": "Later"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["frequency"], "Day");
    assert_eq!(body["group"], "Later");
    assert_eq!(body["last_check_undo"], created["last_check"]);

    let (status, _, body) = send(
        &app,
        json_req(
            Method::PUT,
            "/items/1",
            json!({
                "item": "Calendar",
                "frequency": 2,
                "group": "Later",
                "last_check": "2031-02-03T04:05:06"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_check"], "2031-02-03T04:05:06");
}

#[tokio::test]
async fn test_update_errors() {
    let app = router(test_state());
    let created = create_calendar(&app).await;

    let (status, _, body) = send(
        &app,
        json_req(
            Method::PUT,
            "/items/1",
            json!({"item": "Changed", "frequency": 10, "group": "Next"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Data validation error"}));

    let (status, _, body) = send(
        &app,
        json_req(
            Method::PUT,
            "/items/1",
            json!({"item": "Changed", "frequency": 0, "group": "Next", "last_check": "soon"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid data"}));

    let (status, _, body) = send(
        &app,
        json_req(Method::PUT, "/items/1", json!({"item": "Changed"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing data"}));

    let (status, _, _) = send(
        &app,
        json_req(
            Method::PUT,
            "/items/7",
            json!({"item": "Changed", "frequency": 0, "group": "Next"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // nothing above was persisted
    let (_, _, body) = send(&app, empty_req(Method::GET, "/items/1")).await;
    assert_eq!(body, created);
}

fn raw_json_req(method: Method, uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_update_unknown_id_wins_over_bad_body() {
    let app = router(test_state());
    create_calendar(&app).await;

    let (status, _, body) = send(&app, raw_json_req(Method::PUT, "/items/999", "{not json")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "ID not found"}));

    let (status, _, body) = send(&app, raw_json_req(Method::PUT, "/items/abc", "{not json")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "ID not found"}));

    let (status, _, body) = send(&app, raw_json_req(Method::PUT, "/items/1", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing data"}));
}

#[tokio::test]
async fn test_delete_item() {
    let app = router(test_state());
    create_calendar(&app).await;

    let (status, _, body) = send(&app, empty_req(Method::DELETE, "/items/1")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _, body) = send(&app, empty_req(Method::DELETE, "/items/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "ID not found"}));
}

#[tokio::test]
async fn test_method_not_allowed_and_unknown_route() {
    let app = router(test_state());

    for (method, uri) in [
        (Method::PATCH, "/items"),
        (Method::DELETE, "/items"),
        (Method::POST, "/items/1"),
        (Method::POST, "/auth/csrf"),
        (Method::PUT, "/auth/login"),
    ] {
        let (status, _, body) = send(&app, empty_req(method, uri)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{uri}");
        assert_eq!(body, json!({"error": "Request method not allowed"}));
    }

    let (status, _, body) = send(&app, empty_req(Method::GET, "/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found"}));
}

#[tokio::test]
async fn test_csrf_cookie() {
    let app = router(test_state());

    let (status, headers, body) = send(&app, empty_req(Method::GET, "/auth/csrf")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let cookies = set_cookies(&headers);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("csrftoken="));
    assert!(cookies[0].contains("Max-Age=31449600"));
    let token = cookie_value(&cookies[0]).to_string();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

    // a well-formed token is kept
    let req = Request::builder()
        .uri("/auth/csrf")
        .header(header::COOKIE, format!("csrftoken={token}"))
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, req).await;
    assert_eq!(cookie_value(&set_cookies(&headers)[0]), token);

    // a malformed one is replaced
    let req = Request::builder()
        .uri("/auth/csrf")
        .header(header::COOKIE, "csrftoken=short")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, req).await;
    assert_ne!(cookie_value(&set_cookies(&headers)[0]), "short");
}

#[tokio::test]
async fn test_login_page_requires_login() {
    let app = router(test_state());

    let (status, _, body) = send(&app, empty_req(Method::GET, "/auth/login")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Login required"}));
}

#[tokio::test]
async fn test_login() {
    let state = test_state();
    let app = router(state.clone());

    let (status, _, body) = send(
        &app,
        json_req(Method::POST, "/auth/login", json!({"username": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing data"}));

    let (status, headers, body) = send(
        &app,
        json_req(
            Method::POST,
            "/auth/login",
            json!({"username": "alice", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Invalid login"}));
    assert!(set_cookies(&headers).is_empty());

    let (status, _, _) = send(
        &app,
        json_req(
            Method::POST,
            "/auth/login",
            json!({"username": "bob", "password": "s3cret"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=alice&password=s3cret"))
        .unwrap();
    let (status, headers, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"info": "Login success"}));

    let cookies = set_cookies(&headers);
    let session = cookies
        .iter()
        .find(|c| c.starts_with("sessionid="))
        .expect("session cookie");
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("Max-Age=1209600"));
    assert_eq!(cookie_value(session).len(), 32);
    assert!(cookies.iter().any(|c| c.starts_with("csrftoken=")));

    let pool = state.db.lock().await;
    let (sessions, last_login): (i64, Option<String>) = pool
        .conn
        .query_row(
            "SELECT (SELECT COUNT(*) FROM sessions), last_login FROM users WHERE username = 'alice'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(sessions, 1);
    assert!(last_login.is_some());
}

#[tokio::test]
async fn test_csrf_enforced_when_enabled() {
    let mut config = test_config();
    config.csrf_protect = true;
    let app = router(state_with(config));

    let payload = json!({"item": "Calendar", "frequency": 0, "group": "Next"});

    let (status, _, body) = send(&app, json_req(Method::POST, "/items", payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "CSRF verification failed"}));

    let (_, headers, _) = send(&app, empty_req(Method::GET, "/auth/csrf")).await;
    let token = cookie_value(&set_cookies(&headers)[0]).to_string();

    let mut req = json_req(Method::POST, "/items", payload.clone());
    req.headers_mut().insert(
        header::COOKIE,
        format!("csrftoken={token}").parse().unwrap(),
    );
    req.headers_mut()
        .insert("x-csrftoken", "not-the-token".parse().unwrap());
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut req = json_req(Method::POST, "/items", payload);
    req.headers_mut().insert(
        header::COOKIE,
        format!("csrftoken={token}").parse().unwrap(),
    );
    req.headers_mut()
        .insert("x-csrftoken", token.parse().unwrap());
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);

    // safe methods pass untouched
    let (status, _, _) = send(&app, empty_req(Method::GET, "/items")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_operations_are_logged() {
    let state = test_state();
    let app = router(state.clone());

    create_calendar(&app).await;
    send(
        &app,
        json_req(
            Method::PUT,
            "/items/1",
            json!({"item": "Calendar", "frequency": 0, "group": "Next"}),
        ),
    )
    .await;
    send(&app, empty_req(Method::DELETE, "/items/1")).await;

    let pool = state.db.lock().await;
    let ops: Vec<String> = productivity::db::log::load_log(&pool.conn)
        .unwrap()
        .into_iter()
        .map(|r| r.operation)
        .collect();
    assert_eq!(ops, vec!["add", "edit", "del"]);
}
