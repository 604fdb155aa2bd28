// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::api::AppState;
use crate::auth::{AuthUser, MaybeBearer};
use crate::error::ApiError;
use crate::feed::{FeedEngine, FeedPage, FeedParams, FeedRequest};
use crate::media::MediaKind;
use crate::models::{NewComment, NewLike, NewPost};
use crate::store::StoreError;
use super::{parse_id, read_upload_form};

/// Get a page of the global or personalized feed
pub async fn get_feed(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
    MaybeBearer(bearer): MaybeBearer,
) -> Result<Json<FeedPage>, ApiError> {
    // Repeated keys must not reject the request
    let request = FeedRequest::from_params(&FeedParams::from_pairs(pairs));
    debug!(
        "Feed request limit: {}, offset: {}, personalized: {}",
        request.window.limit, request.window.offset, request.personalize
    );

    let engine = FeedEngine::new(state.store.as_ref(), state.tokens.as_ref());
    let page = engine.page(&request, bearer.as_deref()).await?;

    let kind = if request.personalize { "personalized" } else { "global" };
    state.metrics.feed_requests.with_label_values(&[kind]).inc();

    Ok(Json(page))
}

/// Get a single post with author and counts
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "post")?;
    let post = state
        .store
        .find_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(Json(json!({ "post": post })))
}

/// Create an image post from a multipart form
pub async fn create_post(
    State(state): State<AppState>,
    caller: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = read_upload_form(multipart, "image").await?;
    let upload = form
        .file
        .take()
        .ok_or_else(|| ApiError::Validation("Image is required".to_string()))?;

    let image_url = state.media.save(MediaKind::Post, upload).await?;
    let caption = form.text.remove("caption");

    let post = state
        .store
        .create_post(NewPost {
            author_id: caller.user_id,
            image_url,
            caption,
            created_at: Utc::now(),
        })
        .await?;
    state.metrics.posts_created.inc();
    info!("User {} created post {}", caller.user_id, post.id);

    Ok((StatusCode::CREATED, Json(json!({ "message": "Post created", "post": post }))))
}

/// Flip the caller's like on a post
pub async fn toggle_like(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_id(&id, "post")?;
    if !state.store.post_exists(post_id).await? {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let liked = match state.store.find_like(caller.user_id, post_id).await? {
        Some(existing) => {
            // false here means a concurrent toggle removed it first
            if !state.store.delete_like(existing.id).await? {
                debug!("Like {} was already removed", existing.id);
            }
            false
        }
        None => {
            let like = NewLike { user_id: caller.user_id, post_id, created_at: Utc::now() };
            match state.store.insert_like(like).await {
                Ok(_) => true,
                // A concurrent toggle inserted the same like first
                Err(StoreError::Conflict(_)) => true,
                Err(e) => return Err(e.into()),
            }
        }
    };

    let state_label = if liked { "liked" } else { "unliked" };
    state.metrics.likes_toggled.with_label_values(&[state_label]).inc();

    let message = if liked { "Post liked" } else { "Post unliked" };
    Ok(Json(json!({ "liked": liked, "message": message })))
}

/// List a post's comments, oldest first
pub async fn get_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_id(&id, "post")?;
    let comments = state.store.list_comments(post_id).await?;

    Ok(Json(json!({ "comments": comments })))
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    pub text: Option<String>,
}

/// Append a comment to a post
pub async fn add_comment(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_id(&id, "post")?;
    let Json(body) = payload?;
    let text = body
        .text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Comment text is required".to_string()))?;

    if !state.store.post_exists(post_id).await? {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let comment = state
        .store
        .create_comment(NewComment {
            user_id: caller.user_id,
            post_id,
            text,
            created_at: Utc::now(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "message": "Comment added", "comment": comment }))))
}

/// Posts by one author, newest first
pub async fn get_user_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let author_id = parse_id(&id, "user")?;
    let posts = state.store.list_posts_by_author(author_id).await?;

    Ok(Json(json!({ "posts": posts })))
}
