// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Storage seam for accounts, content and the social graph.
//!
//! Handlers only see `SocialStore`. `PgStore` is the production backend;
//! `MemoryStore` enforces the same constraints in process.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    CommentView, Follow, FollowCounts, Like, NewComment, NewFollow, NewLike, NewPost, NewUser,
    PostThumbnail, PostView, ProfileChanges, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("conflict: {0}")]
    Conflict(String),
    /// A referenced row does not exist
    #[error("missing reference: {0}")]
    MissingReference(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Offset/limit window over an ordered result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub offset: i64,
}

/// Restricts which posts a feed query may return
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthorFilter {
    #[default]
    Everyone,
    Only(Vec<i32>),
}

#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Cheap connectivity probe for health checks
    async fn ping(&self) -> StoreResult<()>;

    // Credential store
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: i32) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_profile(&self, id: i32, changes: ProfileChanges) -> StoreResult<Option<User>>;
    async fn update_avatar(&self, id: i32, avatar_url: &str) -> StoreResult<Option<User>>;

    // Content store
    async fn create_post(&self, post: NewPost) -> StoreResult<PostView>;
    async fn find_post(&self, id: i32) -> StoreResult<Option<PostView>>;
    async fn post_exists(&self, id: i32) -> StoreResult<bool>;
    /// Newest first, ties by id ascending, counts computed per call
    async fn list_posts(&self, filter: AuthorFilter, window: PageWindow) -> StoreResult<Vec<PostView>>;
    async fn list_posts_by_author(&self, author_id: i32) -> StoreResult<Vec<PostThumbnail>>;
    async fn find_like(&self, user_id: i32, post_id: i32) -> StoreResult<Option<Like>>;
    async fn insert_like(&self, like: NewLike) -> StoreResult<Like>;
    /// Returns false when the like was already gone
    async fn delete_like(&self, id: i32) -> StoreResult<bool>;
    async fn create_comment(&self, comment: NewComment) -> StoreResult<CommentView>;
    /// Oldest first, ties by id ascending
    async fn list_comments(&self, post_id: i32) -> StoreResult<Vec<CommentView>>;

    // Social graph store
    async fn following_ids(&self, follower_id: i32) -> StoreResult<Vec<i32>>;
    async fn follow_counts(&self, user_id: i32) -> StoreResult<FollowCounts>;
    async fn find_follow(&self, follower_id: i32, following_id: i32) -> StoreResult<Option<Follow>>;
    async fn insert_follow(&self, follow: NewFollow) -> StoreResult<Follow>;
    /// Returns false when the edge was already gone
    async fn delete_follow(&self, id: i32) -> StoreResult<bool>;
}
