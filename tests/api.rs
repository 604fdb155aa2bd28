// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use common::{Part, TestApp};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

#[test_log::test(tokio::test)]
async fn register_login_and_me() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json(
            "/auth/register",
            None,
            json!({ "username": "alice", "email": "alice@x.com", "password": "pw123", "bio": "hello" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["bio"], "hello");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["token"].as_str().is_some());

    let (status, body) = app
        .post_json("/auth/login", None, json!({ "email": "alice@x.com", "password": "pw123" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app.get("/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "alice@x.com");
}

#[tokio::test]
async fn registration_and_login_failures() {
    let app = TestApp::new();
    app.register("alice").await;

    let (status, body) = app
        .post_json("/auth/register", None, json!({ "username": "alice2", "email": "alice@x.com", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already registered");

    let (status, body) = app
        .post_json("/auth/register", None, json!({ "email": "bob@x.com", "password": "pw" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields");

    let (status, body) = app
        .post_json("/auth/login", None, json!({ "email": "alice@x.com", "password": "wrong" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = app
        .post_json("/auth/login", None, json!({ "email": "nobody@x.com", "password": "pw123" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = app.post_json("/auth/login", None, json!({ "email": "alice@x.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email and password required");
}

#[tokio::test]
async fn access_gate_messages() {
    let app = TestApp::new();

    let (status, body) = app.get("/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let (status, body) = app.get("/auth/me", Some("not.a.token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");

    let (status, _) = app.post_json("/posts/1/like", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected_by_gate_and_feed() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let stale = app
        .state
        .tokens
        .issue_at(alice.id, Utc::now() - Duration::days(8))
        .unwrap();

    let (status, body) = app.get("/auth/me", Some(&stale)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");

    let (status, body) = app.get("/posts?following=true", Some(&stale)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"email\": "))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn feed_pages_are_clamped_and_newest_first() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    for age in 0..12 {
        app.seed_post(alice.id, age).await;
    }

    let (status, body) = app.get("/posts?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["offset"], 0);
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 5);
    assert_eq!(posts[0]["caption"], "posted 0 minutes ago");
    assert_eq!(posts[4]["caption"], "posted 4 minutes ago");
    assert_eq!(posts[0]["userId"], alice.id);
    assert_eq!(posts[0]["user"]["username"], "alice");
    assert_eq!(posts[0]["_count"], json!({ "likes": 0, "comments": 0 }));

    let (_, body) = app.get("/posts?limit=5&offset=10", None).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 2);

    let (_, body) = app.get("/posts?limit=500", None).await;
    assert_eq!(body["limit"], 50);
    assert_eq!(body["posts"].as_array().unwrap().len(), 12);

    let (status, body) = app.get("/posts?limit=abc&offset=-4", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["offset"], 0);
}

#[tokio::test]
async fn repeated_feed_keys_are_not_rejected() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    for age in 0..8 {
        app.seed_post(alice.id, age).await;
    }

    let (status, body) = app.get("/posts?limit=5&limit=10&offset=1&offset=9", None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["offset"], 1);
    assert_eq!(body["posts"].as_array().unwrap().len(), 5);

    let (status, body) = app.get("/posts?following=true&following=true", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required for personalized feed");

    let (status, body) = app
        .get("/posts?following=true&following=true", Some(&alice.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"], json!([]));
}

#[tokio::test]
async fn personalized_feed_requires_valid_token() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    app.seed_post(bob.id, 1).await;

    let (status, body) = app.get("/posts?following=true", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication required for personalized feed");

    let (status, body) = app.get("/posts?following=true", Some("garbage")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid or expired token");

    let (status, body) = app.get("/posts?following=true", Some(&alice.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"], json!([]));

    let (status, _) = app.post_json(&format!("/users/{}/follow", bob.id), Some(&alice.token), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/posts?following=true", Some(&alice.token)).await;
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["userId"], bob.id);
}

#[tokio::test]
async fn like_toggles_and_counts() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let post_id = app.seed_post(alice.id, 0).await;
    let uri = format!("/posts/{}/like", post_id);

    let (status, body) = app.post_json(&uri, Some(&alice.token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);

    let (_, body) = app.get(&format!("/posts/{}", post_id), None).await;
    assert_eq!(body["post"]["_count"]["likes"], 1);

    let (_, body) = app.post_json(&uri, Some(&alice.token), json!({})).await;
    assert_eq!(body["liked"], false);

    let (_, body) = app.get(&format!("/posts/{}", post_id), None).await;
    assert_eq!(body["post"]["_count"]["likes"], 0);

    let (status, body) = app.post_json("/posts/9999/like", Some(&alice.token), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");
}

#[tokio::test]
async fn comments_are_validated_and_listed_oldest_first() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let post_id = app.seed_post(alice.id, 0).await;
    let uri = format!("/posts/{}/comments", post_id);

    let (status, body) = app.post_json(&uri, Some(&alice.token), json!({ "text": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Comment text is required");

    for text in ["first", "second"] {
        let (status, body) = app.post_json(&uri, Some(&alice.token), json!({ "text": text })).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["comment"]["user"]["username"], "alice");
    }

    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<_> = body["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["first", "second"]);

    let (_, body) = app.get(&format!("/posts/{}", post_id), None).await;
    assert_eq!(body["post"]["_count"]["comments"], 2);

    let (status, _) = app.post_json("/posts/9999/comments", Some(&alice.token), json!({ "text": "hi" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn follow_lifecycle() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let follow = format!("/users/{}/follow", bob.id);
    let unfollow = format!("/users/{}/unfollow", bob.id);
    let check = format!("/users/{}/isFollowing", bob.id);

    let (_, body) = app.get(&check, Some(&alice.token)).await;
    assert_eq!(body["isFollowing"], false);

    let (status, body) = app.post_json(&follow, Some(&alice.token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["follow"]["followerId"], alice.id);
    assert_eq!(body["follow"]["followingId"], bob.id);

    let (status, body) = app.post_json(&follow, Some(&alice.token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Already following this user");

    let (_, body) = app.get(&check, Some(&alice.token)).await;
    assert_eq!(body["isFollowing"], true);

    let (_, body) = app.get(&format!("/users/{}", bob.id), None).await;
    assert_eq!(body["followers"], 1);
    assert_eq!(body["following"], 0);

    let (status, _) = app.post_json(&unfollow, Some(&alice.token), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post_json(&unfollow, Some(&alice.token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You are not following this user");

    let (status, body) = app
        .post_json(&format!("/users/{}/follow", alice.id), Some(&alice.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot follow yourself");

    let (status, body) = app.post_json("/users/9999/follow", Some(&alice.token), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn profiles_are_owner_only() {
    let app = TestApp::new();
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let (status, body) = app
        .put_json(&format!("/users/{}", bob.id), Some(&alice.token), json!({ "bio": "hijacked" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized");

    let (status, body) = app
        .post_multipart(
            &format!("/users/{}/avatar", bob.id),
            Some(&alice.token),
            &[Part::file("avatar", "me.png", "image/png", PNG_BYTES)],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized");

    let (status, body) = app
        .put_json(&format!("/users/{}", alice.id), Some(&alice.token), json!({ "username": "alicia", "bio": "new bio" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alicia");
    assert_eq!(body["user"]["bio"], "new bio");

    let (status, body) = app
        .post_multipart(
            &format!("/users/{}/avatar", alice.id),
            Some(&alice.token),
            &[Part::file("avatar", "me.png", "image/png", PNG_BYTES)],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let avatar_url = body["user"]["avatarUrl"].as_str().unwrap();
    assert!(avatar_url.starts_with("/uploads/avatars/"));
    assert!(avatar_url.ends_with(".png"));

    let (status, body) = app.get("/users/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn create_post_from_multipart_upload() {
    let app = TestApp::new();
    let alice = app.register("alice").await;

    let (status, body) = app
        .post_multipart(
            "/posts",
            Some(&alice.token),
            &[
                Part::text("caption", "sunset"),
                Part::file("image", "sunset.png", "image/png", PNG_BYTES),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["post"]["caption"], "sunset");
    assert_eq!(body["post"]["userId"], alice.id);
    let image_url = body["post"]["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/uploads/posts/"));

    let file_name = image_url.rsplit('/').next().unwrap();
    let stored = app.uploads.path().join("posts").join(file_name);
    assert_eq!(std::fs::read(stored).unwrap(), PNG_BYTES);

    let (_, body) = app.get(&format!("/posts/user/{}", alice.id), None).await;
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["imageUrl"], image_url.as_str());

    let (status, body) = app
        .post_multipart("/posts", Some(&alice.token), &[Part::text("caption", "no image")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Image is required");

    let (status, _) = app
        .post_multipart(
            "/posts",
            Some(&alice.token),
            &[Part::file("image", "anim.gif", "image/gif", b"GIF89a")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_ids_are_rejected() {
    let app = TestApp::new();

    let (status, body) = app.get("/posts/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid post id");

    let (status, body) = app.get("/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid user id");

    let (status, body) = app.get("/posts/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");
}

#[tokio::test]
async fn health_and_metrics() {
    let app = TestApp::new();
    app.register("alice").await;
    app.get("/posts", None).await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("social_feed_users_registered_total 1"));
    assert!(text.contains("social_feed_feed_requests_total{kind=\"global\"} 1"));
}
