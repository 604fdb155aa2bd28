// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Per-process counters exposed at `/metrics`
#[derive(Clone)]
pub struct ApiMetrics {
    registry: Registry,
    pub users_registered: IntCounter,
    pub posts_created: IntCounter,
    pub feed_requests: IntCounterVec,
    pub likes_toggled: IntCounterVec,
    pub follow_changes: IntCounterVec,
}

impl ApiMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("social_feed".to_string()), None)?;

        let users_registered = IntCounter::new("users_registered_total", "Accounts created")?;
        let posts_created = IntCounter::new("posts_created_total", "Posts created")?;
        let feed_requests = IntCounterVec::new(
            Opts::new("feed_requests_total", "Feed pages served"),
            &["kind"],
        )?;
        let likes_toggled = IntCounterVec::new(
            Opts::new("likes_toggled_total", "Like toggles by resulting state"),
            &["state"],
        )?;
        let follow_changes = IntCounterVec::new(
            Opts::new("follow_changes_total", "Follow edge mutations"),
            &["action"],
        )?;

        registry.register(Box::new(users_registered.clone()))?;
        registry.register(Box::new(posts_created.clone()))?;
        registry.register(Box::new(feed_requests.clone()))?;
        registry.register(Box::new(likes_toggled.clone()))?;
        registry.register(Box::new(follow_changes.clone()))?;

        Ok(Self {
            registry,
            users_registered,
            posts_created,
            feed_requests,
            likes_toggled,
            follow_changes,
        })
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
