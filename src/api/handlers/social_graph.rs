// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::NewFollow;
use crate::store::StoreError;
use super::parse_id;

/// Follow another user
pub async fn follow(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let following_id = parse_id(&id, "user")?;
    let follower_id = caller.user_id;

    if follower_id == following_id {
        return Err(ApiError::Conflict("You cannot follow yourself".to_string()));
    }
    if state.store.find_user(following_id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    if state.store.find_follow(follower_id, following_id).await?.is_some() {
        return Err(ApiError::Conflict("Already following this user".to_string()));
    }

    let edge = NewFollow { follower_id, following_id, created_at: Utc::now() };
    let follow = match state.store.insert_follow(edge).await {
        Ok(follow) => follow,
        // A concurrent request created the edge after our check
        Err(StoreError::Conflict(_)) => state
            .store
            .find_follow(follower_id, following_id)
            .await?
            .ok_or_else(|| ApiError::Unexpected("follow edge vanished after conflict".to_string()))?,
        Err(e) => return Err(e.into()),
    };

    state.metrics.follow_changes.with_label_values(&["follow"]).inc();
    info!("User {} followed {}", follower_id, following_id);

    Ok(Json(json!({ "message": "Followed successfully", "follow": follow })))
}

/// Remove a follow edge
pub async fn unfollow(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let following_id = parse_id(&id, "user")?;
    let follower_id = caller.user_id;

    let existing = state
        .store
        .find_follow(follower_id, following_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("You are not following this user".to_string()))?;

    if !state.store.delete_follow(existing.id).await? {
        debug!("Follow edge {} was already removed", existing.id);
    }

    state.metrics.follow_changes.with_label_values(&["unfollow"]).inc();
    info!("User {} unfollowed {}", follower_id, following_id);

    Ok(Json(json!({ "message": "Unfollowed successfully" })))
}

/// Check whether the caller follows a user
pub async fn is_following(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let following_id = parse_id(&id, "user")?;
    debug!("Checking if user {} follows user {}", caller.user_id, following_id);

    let follow = state.store.find_follow(caller.user_id, following_id).await?;

    Ok(Json(json!({ "isFollowing": follow.is_some() })))
}
