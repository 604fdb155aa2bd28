// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use crate::models::user::AuthorSummary;
use crate::schema::posts;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Post {
    pub id: i32,
    pub author_id: i32,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub author_id: i32,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Like and comment totals, computed when the post is read
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngagementCounts {
    pub likes: i64,
    pub comments: i64,
}

/// A post as returned by the feed and single-post endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: i32,
    #[serde(rename = "userId")]
    pub author_id: i32,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user: AuthorSummary,
    #[serde(rename = "_count")]
    pub counts: EngagementCounts,
}

impl PostView {
    pub fn new(post: Post, author: AuthorSummary, counts: EngagementCounts) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            image_url: post.image_url,
            caption: post.caption,
            created_at: post.created_at,
            user: author,
            counts,
        }
    }
}

/// Grid entry for a user's profile page
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize, PartialEq)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct PostThumbnail {
    pub id: i32,
    pub image_url: String,
    pub caption: Option<String>,
}
