// Helpers for driving the router in handler tests

use crate::core::routes::build_router;
use crate::core::config::Config;
use crate::core::startup::{restore_state, tests::create_test_config};
use crate::core::state::AppState;
use crate::models::user::{DegreeYear, NewUser, User};
use crate::wal::wal::Wal;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
    // Keeps the WAL and static directory alive for the test
    pub dir: TempDir,
}

pub fn test_app() -> TestApp {
    test_app_with(|_| {})
}

/// Like `test_app`, with a chance to adjust the config first
pub fn test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    configure(&mut config);
    let wal = Wal::new(config.storage.wal_path.clone()).unwrap();
    let state = AppState::new(config, wal);
    restore_state(&state).unwrap();
    serve_state(state, dir)
}

/// Wrap an already prepared state in a router
pub fn serve_state(state: AppState, dir: TempDir) -> TestApp {
    let state = Arc::new(state);
    TestApp {
        router: build_router(Arc::clone(&state)),
        state,
        dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Response {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Register through the store directly, skipping the form round trip
    pub async fn seed_user(&self, userid: &str, password: &str, degree_year: DegreeYear) -> User {
        let password_hash = crate::utils::password::hash_password(password, 4).await.unwrap();
        self.state
            .users
            .create(
                NewUser {
                    username: format!("Name of {}", userid),
                    userid: userid.to_string(),
                    password_hash,
                    degree_year,
                },
                crate::utils::time::current_timestamp(),
            )
            .unwrap()
    }

    /// Log in through the form and return the `name=value` cookie pair
    pub async fn login(&self, userid: &str, password: &str) -> String {
        let response = self
            .post_form("/login", &[("userid", userid), ("password", password)], None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie_pair(&response).expect("login did not set a session cookie")
    }
}

pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// The `name=value` part of the response's Set-Cookie header
pub fn session_cookie_pair(response: &Response) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    value.split(';').next().map(|pair| pair.trim().to_string())
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
