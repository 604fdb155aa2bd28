// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::media::MediaKind;
use crate::models::{ProfileChanges, UserProfile, UserSummary};
use super::{parse_id, read_upload_form};

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
}

impl UpdateProfileRequest {
    fn into_changes(self) -> Result<ProfileChanges, ApiError> {
        let username = match self.username {
            Some(name) if name.trim().is_empty() => {
                return Err(ApiError::Validation("Username cannot be empty".to_string()))
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        Ok(ProfileChanges { username, bio: self.bio })
    }
}

/// Only the owner may edit a profile
fn ensure_owner(caller: AuthUser, user_id: i32) -> Result<(), ApiError> {
    if caller.user_id != user_id {
        debug!("User {} tried to modify profile {}", caller.user_id, user_id);
        return Err(ApiError::Forbidden("Not authorized".to_string()));
    }
    Ok(())
}

/// Get a profile with follower and following counts
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let user_id = parse_id(&id, "user")?;
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let counts = state.store.follow_counts(user_id).await?;

    Ok(Json(UserProfile::new(&user, counts)))
}

/// Update username and/or bio
pub async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&id, "user")?;
    ensure_owner(caller, user_id)?;
    let Json(body) = payload?;
    let changes = body.into_changes()?;

    let user = state
        .store
        .update_profile(user_id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    info!("User {} updated their profile", user_id);

    Ok(Json(json!({ "message": "Profile updated", "user": UserSummary::from(&user) })))
}

/// Replace the avatar image
pub async fn upload_avatar(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&id, "user")?;
    ensure_owner(caller, user_id)?;

    let upload = read_upload_form(multipart, "avatar")
        .await?
        .file
        .ok_or_else(|| ApiError::Validation("Avatar image is required".to_string()))?;
    let avatar_url = state.media.save(MediaKind::Avatar, upload).await?;

    let user = state
        .store
        .update_avatar(user_id, &avatar_url)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    info!("User {} uploaded a new avatar", user_id);

    Ok(Json(json!({ "message": "Avatar uploaded", "user": UserSummary::from(&user) })))
}
