// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

// Import diesel table macros
use diesel::{allow_tables_to_appear_in_same_query, joinable, table};

table! {
    users (id) {
        id -> Int4,
        email -> Varchar,
        password_hash -> Varchar,
        username -> Varchar,
        avatar_url -> Nullable<Varchar>,
        bio -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

table! {
    posts (id) {
        id -> Int4,
        author_id -> Int4,
        image_url -> Varchar,
        caption -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

table! {
    likes (id) {
        id -> Int4,
        user_id -> Int4,
        post_id -> Int4,
        created_at -> Timestamptz,
    }
}

table! {
    comments (id) {
        id -> Int4,
        user_id -> Int4,
        post_id -> Int4,
        text -> Text,
        created_at -> Timestamptz,
    }
}

// Both columns reference users, so no joinable! for follows
table! {
    follows (id) {
        id -> Int4,
        follower_id -> Int4,
        following_id -> Int4,
        created_at -> Timestamptz,
    }
}

joinable!(posts -> users (author_id));
joinable!(likes -> posts (post_id));
joinable!(comments -> users (user_id));

allow_tables_to_appear_in_same_query!(
    users,
    posts,
    likes,
    comments,
    follows,
);
