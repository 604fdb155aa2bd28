// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use social_feed::api::{build_router, AppState};
use social_feed::auth::TokenService;
use social_feed::media::LocalMediaStore;
use social_feed::metrics::ApiMetrics;
use social_feed::models::NewPost;
use social_feed::store::{MemoryStore, SocialStore};

pub const BOUNDARY: &str = "social-feed-test-boundary";

/// Router over a fresh in-memory store and a throwaway upload directory
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub uploads: TempDir,
}

pub struct Registered {
    pub id: i32,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let uploads = tempfile::tempdir().expect("create upload dir");
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            TokenService::new("integration-secret", Duration::days(7)),
            Arc::new(LocalMediaStore::new(uploads.path(), "/uploads")),
            ApiMetrics::new().expect("metrics"),
        );
        let router = build_router(state.clone(), 1024 * 1024);
        Self { router, state, uploads }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn put_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::PUT, uri, token, Some(body))).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        token: Option<&str>,
        parts: &[Part<'_>],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(multipart_body(parts))).expect("request");
        self.send(request).await
    }

    pub async fn register(&self, name: &str) -> Registered {
        let (status, body) = self
            .post_json(
                "/auth/register",
                None,
                json!({
                    "username": name,
                    "email": format!("{}@x.com", name),
                    "password": "pw123",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {}: {}", name, body);
        Registered {
            id: body["user"]["id"].as_i64().expect("user id") as i32,
            token: body["token"].as_str().expect("token").to_string(),
        }
    }

    /// Insert a post directly, `age_minutes` in the past
    pub async fn seed_post(&self, author_id: i32, age_minutes: i64) -> i32 {
        self.state
            .store
            .create_post(NewPost {
                author_id,
                image_url: format!("/uploads/posts/seed-{}.png", age_minutes),
                caption: Some(format!("posted {} minutes ago", age_minutes)),
                created_at: Utc::now() - Duration::minutes(age_minutes),
            })
            .await
            .expect("seed post")
            .id
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// One part of a multipart form
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self { name, file_name: None, content_type: None, data: value.as_bytes() }
    }

    pub fn file(name: &'a str, file_name: &'a str, content_type: &'a str, data: &'a [u8]) -> Self {
        Self { name, file_name: Some(file_name), content_type: Some(content_type), data }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
