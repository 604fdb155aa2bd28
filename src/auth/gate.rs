// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::error::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of `Authorization: Bearer <token>`. Any other scheme,
/// or an empty token, counts as no credential at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The verified caller of a gated endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Authentication("No token provided".to_string()))?;

        match state.tokens.verify(token) {
            Ok(claims) => {
                debug!("Authenticated user {} for {}", claims.user_id, parts.uri.path());
                Ok(AuthUser { user_id: claims.user_id })
            }
            Err(e) => {
                warn!("Rejected bearer token on {}: {}", parts.uri.path(), e);
                Err(ApiError::Authentication("Invalid or expired token".to_string()))
            }
        }
    }
}

/// Raw bearer token, if any, for endpoints where identity is optional
#[derive(Debug, Clone, Default)]
pub struct MaybeBearer(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeBearer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeBearer(bearer_token(&parts.headers).map(str::to_string)))
    }
}
