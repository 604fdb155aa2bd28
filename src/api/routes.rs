// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::AppState;

/// All API routes with state attached. Transport layers (tracing, CORS,
/// static uploads) are added by the server.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::get_metrics))

        // Account routes
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))

        // Post routes
        .route("/posts", get(handlers::posts::get_feed).post(handlers::posts::create_post))
        .route("/posts/user/:id", get(handlers::posts::get_user_posts))
        .route("/posts/:id", get(handlers::posts::get_post))
        .route("/posts/:id/like", post(handlers::posts::toggle_like))
        .route(
            "/posts/:id/comments",
            get(handlers::posts::get_comments).post(handlers::posts::add_comment),
        )

        // Profile and social graph routes
        .route(
            "/users/:id",
            get(handlers::profiles::get_profile).put(handlers::profiles::update_profile),
        )
        .route("/users/:id/avatar", post(handlers::profiles::upload_avatar))
        .route("/users/:id/follow", post(handlers::social_graph::follow))
        .route("/users/:id/unfollow", post(handlers::social_graph::unfollow))
        .route("/users/:id/isFollowing", get(handlers::social_graph::is_following))

        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
