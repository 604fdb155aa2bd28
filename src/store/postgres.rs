// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use diesel::dsl::{count, count_star, exists};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::db::{Database, DbConnection};
use crate::models::{
    AuthorSummary, Comment, CommentView, EngagementCounts, Follow, FollowCounts, Like, NewComment,
    NewFollow, NewLike, NewPost, NewUser, Post, PostThumbnail, PostView, ProfileChanges, User,
};
use crate::schema::{comments, follows, likes, posts, users};
use super::{AuthorFilter, PageWindow, SocialStore, StoreError, StoreResult};

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                StoreError::MissingReference(info.message().to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// PostgreSQL-backed store
pub struct PgStore {
    db: Arc<Database>,
}

impl PgStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get a database connection from the pool
    async fn get_connection(&self) -> StoreResult<DbConnection> {
        self.db.get_connection().await.map_err(|e| {
            error!("Database connection error: {}", e);
            StoreError::Unavailable(e.to_string())
        })
    }

    /// Attach authors and engagement counts to a page of posts
    async fn with_counts(
        conn: &mut DbConnection,
        rows: Vec<(Post, AuthorSummary)>,
    ) -> StoreResult<Vec<PostView>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = rows.iter().map(|(post, _)| post.id).collect();

        let like_counts: HashMap<i32, i64> = likes::table
            .filter(likes::post_id.eq_any(&ids))
            .group_by(likes::post_id)
            .select((likes::post_id, count(likes::id)))
            .load::<(i32, i64)>(conn)
            .await?
            .into_iter()
            .collect();

        let comment_counts: HashMap<i32, i64> = comments::table
            .filter(comments::post_id.eq_any(&ids))
            .group_by(comments::post_id)
            .select((comments::post_id, count(comments::id)))
            .load::<(i32, i64)>(conn)
            .await?
            .into_iter()
            .collect();

        Ok(rows
            .into_iter()
            .map(|(post, author)| {
                let counts = EngagementCounts {
                    likes: like_counts.get(&post.id).copied().unwrap_or(0),
                    comments: comment_counts.get(&post.id).copied().unwrap_or(0),
                };
                PostView::new(post, author, counts)
            })
            .collect())
    }

    async fn load_post_view(conn: &mut DbConnection, id: i32) -> StoreResult<Option<PostView>> {
        let row = posts::table
            .inner_join(users::table)
            .filter(posts::id.eq(id))
            .select((Post::as_select(), AuthorSummary::as_select()))
            .first::<(Post, AuthorSummary)>(conn)
            .await
            .optional()?;

        match row {
            Some(row) => Ok(Self::with_counts(conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn load_comment_view(conn: &mut DbConnection, comment: Comment) -> StoreResult<CommentView> {
        let author = users::table
            .find(comment.user_id)
            .select(AuthorSummary::as_select())
            .first::<AuthorSummary>(conn)
            .await?;
        Ok(CommentView::new(comment, author))
    }
}

#[async_trait]
impl SocialStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        diesel::select(exists(users::table.select(users::id)))
            .get_result::<bool>(&mut conn)
            .await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut conn = self.get_connection().await?;
        let created = diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(created)
    }

    async fn find_user(&self, id: i32) -> StoreResult<Option<User>> {
        let mut conn = self.get_connection().await?;
        Ok(users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut conn = self.get_connection().await?;
        Ok(users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn update_profile(&self, id: i32, changes: ProfileChanges) -> StoreResult<Option<User>> {
        // An empty changeset is rejected by diesel, so just read the row back
        if changes.is_empty() {
            return self.find_user(id).await;
        }
        let mut conn = self.get_connection().await?;
        Ok(diesel::update(users::table.find(id))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?)
    }

    async fn update_avatar(&self, id: i32, avatar_url: &str) -> StoreResult<Option<User>> {
        let mut conn = self.get_connection().await?;
        Ok(diesel::update(users::table.find(id))
            .set(users::avatar_url.eq(avatar_url))
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?)
    }

    async fn create_post(&self, post: NewPost) -> StoreResult<PostView> {
        let mut conn = self.get_connection().await?;
        let created = diesel::insert_into(posts::table)
            .values(&post)
            .returning(Post::as_returning())
            .get_result(&mut conn)
            .await?;
        debug!("Inserted post {} for author {}", created.id, created.author_id);

        Self::load_post_view(&mut conn, created.id)
            .await?
            .ok_or_else(|| StoreError::Query(format!("post {} vanished after insert", created.id)))
    }

    async fn find_post(&self, id: i32) -> StoreResult<Option<PostView>> {
        let mut conn = self.get_connection().await?;
        Self::load_post_view(&mut conn, id).await
    }

    async fn post_exists(&self, id: i32) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        Ok(diesel::select(exists(posts::table.find(id)))
            .get_result::<bool>(&mut conn)
            .await?)
    }

    async fn list_posts(&self, filter: AuthorFilter, window: PageWindow) -> StoreResult<Vec<PostView>> {
        let mut conn = self.get_connection().await?;

        let mut query = posts::table
            .inner_join(users::table)
            .select((Post::as_select(), AuthorSummary::as_select()))
            .into_boxed::<Pg>();
        if let AuthorFilter::Only(author_ids) = filter {
            query = query.filter(posts::author_id.eq_any(author_ids));
        }

        let rows = query
            .order((posts::created_at.desc(), posts::id.asc()))
            .limit(window.limit)
            .offset(window.offset)
            .load::<(Post, AuthorSummary)>(&mut conn)
            .await?;

        Self::with_counts(&mut conn, rows).await
    }

    async fn list_posts_by_author(&self, author_id: i32) -> StoreResult<Vec<PostThumbnail>> {
        let mut conn = self.get_connection().await?;
        Ok(posts::table
            .filter(posts::author_id.eq(author_id))
            .order((posts::created_at.desc(), posts::id.asc()))
            .select(PostThumbnail::as_select())
            .load(&mut conn)
            .await?)
    }

    async fn find_like(&self, user_id: i32, post_id: i32) -> StoreResult<Option<Like>> {
        let mut conn = self.get_connection().await?;
        Ok(likes::table
            .filter(likes::user_id.eq(user_id))
            .filter(likes::post_id.eq(post_id))
            .select(Like::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn insert_like(&self, like: NewLike) -> StoreResult<Like> {
        let mut conn = self.get_connection().await?;
        Ok(diesel::insert_into(likes::table)
            .values(&like)
            .returning(Like::as_returning())
            .get_result(&mut conn)
            .await?)
    }

    async fn delete_like(&self, id: i32) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let deleted = diesel::delete(likes::table.find(id)).execute(&mut conn).await?;
        Ok(deleted > 0)
    }

    async fn create_comment(&self, comment: NewComment) -> StoreResult<CommentView> {
        let mut conn = self.get_connection().await?;
        let created = diesel::insert_into(comments::table)
            .values(&comment)
            .returning(Comment::as_returning())
            .get_result(&mut conn)
            .await?;
        Self::load_comment_view(&mut conn, created).await
    }

    async fn list_comments(&self, post_id: i32) -> StoreResult<Vec<CommentView>> {
        let mut conn = self.get_connection().await?;
        let rows = comments::table
            .inner_join(users::table)
            .filter(comments::post_id.eq(post_id))
            .order((comments::created_at.asc(), comments::id.asc()))
            .select((Comment::as_select(), AuthorSummary::as_select()))
            .load::<(Comment, AuthorSummary)>(&mut conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(comment, author)| CommentView::new(comment, author))
            .collect())
    }

    async fn following_ids(&self, follower_id: i32) -> StoreResult<Vec<i32>> {
        let mut conn = self.get_connection().await?;
        Ok(follows::table
            .filter(follows::follower_id.eq(follower_id))
            .select(follows::following_id)
            .load::<i32>(&mut conn)
            .await?)
    }

    async fn follow_counts(&self, user_id: i32) -> StoreResult<FollowCounts> {
        let mut conn = self.get_connection().await?;
        let followers = follows::table
            .filter(follows::following_id.eq(user_id))
            .select(count_star())
            .get_result::<i64>(&mut conn)
            .await?;
        let following = follows::table
            .filter(follows::follower_id.eq(user_id))
            .select(count_star())
            .get_result::<i64>(&mut conn)
            .await?;
        Ok(FollowCounts { followers, following })
    }

    async fn find_follow(&self, follower_id: i32, following_id: i32) -> StoreResult<Option<Follow>> {
        let mut conn = self.get_connection().await?;
        Ok(follows::table
            .filter(follows::follower_id.eq(follower_id))
            .filter(follows::following_id.eq(following_id))
            .select(Follow::as_select())
            .first(&mut conn)
            .await
            .optional()?)
    }

    async fn insert_follow(&self, follow: NewFollow) -> StoreResult<Follow> {
        let mut conn = self.get_connection().await?;
        Ok(diesel::insert_into(follows::table)
            .values(&follow)
            .returning(Follow::as_returning())
            .get_result(&mut conn)
            .await?)
    }

    async fn delete_follow(&self, id: i32) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let deleted = diesel::delete(follows::table.find(id)).execute(&mut conn).await?;
        Ok(deleted > 0)
    }
}
