// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{
    AuthorSummary, Comment, CommentView, EngagementCounts, Follow, FollowCounts, Like, NewComment,
    NewFollow, NewLike, NewPost, NewUser, Post, PostThumbnail, PostView, ProfileChanges, User,
};
use super::{AuthorFilter, PageWindow, SocialStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    likes: Vec<Like>,
    comments: Vec<Comment>,
    follows: Vec<Follow>,
    next_user_id: i32,
    next_post_id: i32,
    next_like_id: i32,
    next_comment_id: i32,
    next_follow_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

impl Tables {
    fn user(&self, id: i32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn author(&self, id: i32) -> StoreResult<AuthorSummary> {
        self.user(id)
            .map(AuthorSummary::from)
            .ok_or_else(|| StoreError::MissingReference(format!("user {}", id)))
    }

    fn counts(&self, post_id: i32) -> EngagementCounts {
        EngagementCounts {
            likes: self.likes.iter().filter(|l| l.post_id == post_id).count() as i64,
            comments: self.comments.iter().filter(|c| c.post_id == post_id).count() as i64,
        }
    }

    fn view(&self, post: &Post) -> StoreResult<PostView> {
        Ok(PostView::new(post.clone(), self.author(post.author_id)?, self.counts(post.id)))
    }

    fn require_user(&self, id: i32) -> StoreResult<()> {
        self.user(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::MissingReference(format!("user {}", id)))
    }

    fn require_post(&self, id: i32) -> StoreResult<()> {
        if self.posts.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference(format!("post {}", id)))
        }
    }
}

/// In-process store with the same constraints as the database schema
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} already exists", user.email)));
        }
        let id = next_id(&mut tables.next_user_id);
        let stored = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            username: user.username,
            avatar_url: user.avatar_url,
            bio: user.bio,
            created_at: user.created_at,
        };
        tables.users.push(stored.clone());
        Ok(stored)
    }

    async fn find_user(&self, id: i32) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_profile(&self, id: i32, changes: ProfileChanges) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        Ok(Some(user.clone()))
    }

    async fn update_avatar(&self, id: i32, avatar_url: &str) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.avatar_url = Some(avatar_url.to_string());
        Ok(Some(user.clone()))
    }

    async fn create_post(&self, post: NewPost) -> StoreResult<PostView> {
        let mut tables = self.tables.write().await;
        tables.require_user(post.author_id)?;
        let id = next_id(&mut tables.next_post_id);
        let stored = Post {
            id,
            author_id: post.author_id,
            image_url: post.image_url,
            caption: post.caption,
            created_at: post.created_at,
        };
        tables.posts.push(stored.clone());
        tables.view(&stored)
    }

    async fn find_post(&self, id: i32) -> StoreResult<Option<PostView>> {
        let tables = self.tables.read().await;
        tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.view(p))
            .transpose()
    }

    async fn post_exists(&self, id: i32) -> StoreResult<bool> {
        Ok(self.tables.read().await.posts.iter().any(|p| p.id == id))
    }

    async fn list_posts(&self, filter: AuthorFilter, window: PageWindow) -> StoreResult<Vec<PostView>> {
        let tables = self.tables.read().await;
        let mut selected: Vec<&Post> = tables
            .posts
            .iter()
            .filter(|p| match &filter {
                AuthorFilter::Everyone => true,
                AuthorFilter::Only(ids) => ids.contains(&p.author_id),
            })
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        selected
            .into_iter()
            .skip(window.offset.max(0) as usize)
            .take(window.limit.max(0) as usize)
            .map(|p| tables.view(p))
            .collect()
    }

    async fn list_posts_by_author(&self, author_id: i32) -> StoreResult<Vec<PostThumbnail>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<&Post> = tables.posts.iter().filter(|p| p.author_id == author_id).collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(posts
            .into_iter()
            .map(|p| PostThumbnail {
                id: p.id,
                image_url: p.image_url.clone(),
                caption: p.caption.clone(),
            })
            .collect())
    }

    async fn find_like(&self, user_id: i32, post_id: i32) -> StoreResult<Option<Like>> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .iter()
            .find(|l| l.user_id == user_id && l.post_id == post_id)
            .cloned())
    }

    async fn insert_like(&self, like: NewLike) -> StoreResult<Like> {
        let mut tables = self.tables.write().await;
        tables.require_user(like.user_id)?;
        tables.require_post(like.post_id)?;
        if tables
            .likes
            .iter()
            .any(|l| l.user_id == like.user_id && l.post_id == like.post_id)
        {
            return Err(StoreError::Conflict(format!(
                "user {} already likes post {}",
                like.user_id, like.post_id
            )));
        }
        let id = next_id(&mut tables.next_like_id);
        let stored = Like {
            id,
            user_id: like.user_id,
            post_id: like.post_id,
            created_at: like.created_at,
        };
        tables.likes.push(stored.clone());
        Ok(stored)
    }

    async fn delete_like(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.likes.len();
        tables.likes.retain(|l| l.id != id);
        Ok(tables.likes.len() < before)
    }

    async fn create_comment(&self, comment: NewComment) -> StoreResult<CommentView> {
        let mut tables = self.tables.write().await;
        tables.require_user(comment.user_id)?;
        tables.require_post(comment.post_id)?;
        if comment.text.trim().is_empty() {
            return Err(StoreError::Query("comment text must not be blank".to_string()));
        }
        let id = next_id(&mut tables.next_comment_id);
        let stored = Comment {
            id,
            user_id: comment.user_id,
            post_id: comment.post_id,
            text: comment.text,
            created_at: comment.created_at,
        };
        tables.comments.push(stored.clone());
        let author = tables.author(stored.user_id)?;
        Ok(CommentView::new(stored, author))
    }

    async fn list_comments(&self, post_id: i32) -> StoreResult<Vec<CommentView>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<&Comment> = tables.comments.iter().filter(|c| c.post_id == post_id).collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        comments
            .into_iter()
            .map(|c| Ok(CommentView::new(c.clone(), tables.author(c.user_id)?)))
            .collect()
    }

    async fn following_ids(&self, follower_id: i32) -> StoreResult<Vec<i32>> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .filter(|f| f.follower_id == follower_id)
            .map(|f| f.following_id)
            .collect())
    }

    async fn follow_counts(&self, user_id: i32) -> StoreResult<FollowCounts> {
        let tables = self.tables.read().await;
        let mut counts = FollowCounts::default();
        for edge in &tables.follows {
            if edge.following_id == user_id {
                counts.followers += 1;
            }
            if edge.follower_id == user_id {
                counts.following += 1;
            }
        }
        Ok(counts)
    }

    async fn find_follow(&self, follower_id: i32, following_id: i32) -> StoreResult<Option<Follow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .find(|f| f.follower_id == follower_id && f.following_id == following_id)
            .cloned())
    }

    async fn insert_follow(&self, follow: NewFollow) -> StoreResult<Follow> {
        let mut tables = self.tables.write().await;
        if follow.follower_id == follow.following_id {
            return Err(StoreError::Query("follower and following must differ".to_string()));
        }
        tables.require_user(follow.follower_id)?;
        tables.require_user(follow.following_id)?;
        if tables
            .follows
            .iter()
            .any(|f| f.follower_id == follow.follower_id && f.following_id == follow.following_id)
        {
            return Err(StoreError::Conflict(format!(
                "user {} already follows {}",
                follow.follower_id, follow.following_id
            )));
        }
        let id = next_id(&mut tables.next_follow_id);
        let stored = Follow {
            id,
            follower_id: follow.follower_id,
            following_id: follow.following_id,
            created_at: follow.created_at,
        };
        tables.follows.push(stored.clone());
        Ok(stored)
    }

    async fn delete_follow(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables.follows.retain(|f| f.id != id);
        Ok(tables.follows.len() < before)
    }
}

#[cfg(test)]
impl MemoryStore {
    async fn table_sizes(&self) -> std::collections::HashMap<&'static str, usize> {
        let tables = self.tables.read().await;
        std::collections::HashMap::from([
            ("users", tables.users.len()),
            ("posts", tables.posts.len()),
            ("likes", tables.likes.len()),
            ("comments", tables.comments.len()),
            ("follows", tables.follows.len()),
        ])
    }
}
