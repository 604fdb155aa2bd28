// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::api::AppState;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{NewUser, UserSummary};
use crate::store::StoreError;

/// Body of `POST /auth/register` as sent by the client
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

/// A registration that passed boundary validation
#[derive(Debug)]
struct Registration {
    username: String,
    email: String,
    password: String,
    avatar_url: Option<String>,
    bio: Option<String>,
}

impl RegisterRequest {
    fn validate(self) -> Result<Registration, ApiError> {
        let missing = || ApiError::Validation("Missing required fields".to_string());
        Ok(Registration {
            username: required(self.username).ok_or_else(missing)?,
            email: required(self.email).ok_or_else(missing)?,
            password: self.password.filter(|p| !p.trim().is_empty()).ok_or_else(missing)?,
            avatar_url: self.avatar_url,
            bio: self.bio,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub user: UserSummary,
    pub token: String,
}

/// Trimmed value, or `None` when absent or blank
fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Create an account and sign the caller in
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let registration = body.validate()?;

    if state.store.find_user_by_email(&registration.email).await?.is_some() {
        return Err(ApiError::Validation("Email already registered".to_string()));
    }

    let password = registration.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Unexpected(format!("password hashing task failed: {}", e)))??;

    let new_user = NewUser {
        email: registration.email,
        password_hash,
        username: registration.username,
        avatar_url: registration.avatar_url,
        bio: registration.bio,
        created_at: Utc::now(),
    };

    let user = match state.store.create_user(new_user).await {
        Ok(user) => user,
        // Lost a race with a concurrent registration for the same email
        Err(StoreError::Conflict(_)) => {
            return Err(ApiError::Validation("Email already registered".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    let token = state.tokens.issue(user.id)?;
    state.metrics.users_registered.inc();
    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: "User registered successfully",
            user: UserSummary::from(&user),
            token,
        }),
    ))
}

/// Exchange email and password for a token
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Json(body) = payload?;
    let (Some(email), Some(password)) = (
        required(body.email),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::Validation("Email and password required".to_string()));
    };

    let invalid = || ApiError::Authentication("Invalid credentials".to_string());

    let user = state.store.find_user_by_email(&email).await?.ok_or_else(invalid)?;

    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Unexpected(format!("password check task failed: {}", e)))?;
    if !valid {
        debug!("Password mismatch for user {}", user.id);
        return Err(invalid());
    }

    let token = state.tokens.issue(user.id)?;
    Ok(Json(SessionResponse {
        message: "Login successful",
        user: UserSummary::from(&user),
        token,
    }))
}

/// The caller's own profile
pub async fn me(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .store
        .find_user(caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({ "user": UserSummary::from(&user) })))
}
