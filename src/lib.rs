pub mod config;
pub mod db;
pub mod models;
pub mod schema;
pub mod store;
pub mod auth;
pub mod feed;
pub mod media;
pub mod metrics;
pub mod error;
pub mod api;
