// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Feed query engine.
//!
//! Produces newest-first pages of posts, either over every author or, for a
//! verified viewer asking for it, over the authors that viewer follows.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::auth::{TokenError, TokenService};
use crate::error::ApiError;
use crate::models::PostView;
use crate::store::{AuthorFilter, PageWindow, SocialStore, StoreError};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

/// Raw query string. Values stay strings so that garbage can be defaulted
/// instead of rejected.
#[derive(Debug, Default, Deserialize)]
pub struct FeedParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub following: Option<String>,
}

impl FeedParams {
    /// Fold raw query pairs. The first value of a repeated key wins and
    /// unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "limit" => &mut params.limit,
                "offset" => &mut params.offset,
                "following" => &mut params.following,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }
}

/// Normalised feed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedRequest {
    pub window: PageWindow,
    pub personalize: bool,
}

impl FeedRequest {
    pub fn from_params(params: &FeedParams) -> Self {
        let limit = params
            .limit
            .as_deref()
            .and_then(leading_integer)
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        let offset = params
            .offset
            .as_deref()
            .and_then(leading_integer)
            .unwrap_or(0)
            .max(0);

        Self {
            window: PageWindow { limit, offset },
            personalize: params.following.as_deref() == Some("true"),
        }
    }
}

/// Parse the leading signed integer of `raw`, ignoring trailing garbage
fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Out-of-range values saturate; the caller clamps anyway
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * value)
}

/// One page of the feed, echoing the window that produced it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedPage {
    pub posts: Vec<PostView>,
    pub limit: i64,
    pub offset: i64,
}

impl FeedPage {
    fn empty(window: PageWindow) -> Self {
        Self { posts: Vec::new(), limit: window.limit, offset: window.offset }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Authentication required for personalized feed")]
    AuthenticationRequired,
    #[error("Invalid or expired token")]
    InvalidToken(#[source] TokenError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::AuthenticationRequired => ApiError::Authentication(err.to_string()),
            FeedError::InvalidToken(_) => ApiError::Forbidden(err.to_string()),
            FeedError::Store(e) => ApiError::from(e),
        }
    }
}

pub struct FeedEngine<'a> {
    store: &'a dyn SocialStore,
    tokens: &'a TokenService,
}

impl<'a> FeedEngine<'a> {
    pub fn new(store: &'a dyn SocialStore, tokens: &'a TokenService) -> Self {
        Self { store, tokens }
    }

    /// Load one page. `bearer` is only consulted for personalised requests.
    pub async fn page(&self, request: &FeedRequest, bearer: Option<&str>) -> Result<FeedPage, FeedError> {
        let window = request.window;

        if !request.personalize {
            let posts = self.store.list_posts(AuthorFilter::Everyone, window).await?;
            return Ok(FeedPage { posts, limit: window.limit, offset: window.offset });
        }

        let token = bearer.ok_or(FeedError::AuthenticationRequired)?;
        let viewer = self.tokens.verify(token).map_err(FeedError::InvalidToken)?.user_id;

        let following = self.store.following_ids(viewer).await?;
        if following.is_empty() {
            debug!("Viewer {} follows nobody, returning empty feed", viewer);
            return Ok(FeedPage::empty(window));
        }

        debug!("Loading personalized feed for viewer {} over {} authors", viewer, following.len());
        let posts = self.store.list_posts(AuthorFilter::Only(following), window).await?;
        Ok(FeedPage { posts, limit: window.limit, offset: window.offset })
    }
}
