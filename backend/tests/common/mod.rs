//! Shared fixtures for driving the router in-process.
//!
//! Each integration test file compiles this module separately, so helpers
//! unused by one file would otherwise warn.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use http_body_util::BodyExt;
use tower::ServiceExt;

use todo_backend::{
    api,
    auth::AccessGuard,
    config::Config,
    service::TaskService,
    store::{SqliteTaskStore, TaskStore},
};

pub const ADMIN: (&str, &str) = ("admin", "adminpass");
pub const USER: (&str, &str) = ("user", "userpass");

pub fn guard() -> AccessGuard {
    AccessGuard::new(&Config::default().users()).unwrap()
}

pub fn app_with_store(store: Arc<dyn TaskStore>) -> Router {
    api::app(TaskService::new(store), guard())
}

pub fn test_app() -> Router {
    app_with_store(Arc::new(SqliteTaskStore::in_memory().unwrap()))
}

pub fn basic_auth((username, password): (&str, &str)) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }
}

/// Sends one request as `credentials`. A `Some` body is sent with `content_type`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    credentials: Option<(&str, &str)>,
    body: Option<(&str, String)>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(credentials) = credentials {
        builder = builder.header(header::AUTHORIZATION, basic_auth(credentials));
    }
    let request = match body {
        Some((content_type, body)) => builder
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|value| value.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse {
        status,
        content_type,
        body,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, Method::GET, uri, Some(USER), None).await
}

pub async fn send_json(app: &Router, method: Method, uri: &str, json: serde_json::Value) -> TestResponse {
    send(app, method, uri, Some(USER), Some(("application/json", json.to_string()))).await
}
