// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

//! Image uploads for posts and avatars.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Unsupported image format: {0}. Allowed formats are jpg, jpeg and png")]
    UnsupportedFormat(String),
    #[error("Uploaded image is empty")]
    Empty,
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Where an upload is filed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Post,
    Avatar,
}

impl MediaKind {
    fn folder(self) -> &'static str {
        match self {
            MediaKind::Post => "posts",
            MediaKind::Avatar => "avatars",
        }
    }
}

/// An image part taken from a multipart request
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Normalised extension, from the file name or else the content type
    fn extension(&self) -> Result<&'static str, MediaError> {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let candidate = match from_name {
            Some(ext) => ext,
            None => match self.content_type.as_deref() {
                Some("image/jpeg") | Some("image/jpg") => "jpg".to_string(),
                Some("image/png") => "png".to_string(),
                Some(other) => return Err(MediaError::UnsupportedFormat(other.to_string())),
                None => return Err(MediaError::UnsupportedFormat("unknown".to_string())),
            },
        };

        ALLOWED_EXTENSIONS
            .iter()
            .find(|allowed| **allowed == candidate)
            .copied()
            .ok_or(MediaError::UnsupportedFormat(candidate))
    }
}

/// Persists uploaded images and returns the reference stored on the record
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn save(&self, kind: MediaKind, upload: Upload) -> Result<String, MediaError>;
}

/// Writes uploads below a local directory that the router serves statically
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_path: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_path: impl Into<String>) -> Self {
        let public_path = public_path.into();
        Self {
            root: root.into(),
            public_path: public_path.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn save(&self, kind: MediaKind, upload: Upload) -> Result<String, MediaError> {
        if upload.bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        let extension = upload.extension()?;
        let file_name = format!("{}.{}", Uuid::new_v4(), extension);

        let dir = self.root.join(kind.folder());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &upload.bytes).await?;
        debug!("Stored {} byte upload as {}/{}", upload.bytes.len(), kind.folder(), file_name);

        Ok(format!("{}/{}/{}", self.public_path, kind.folder(), file_name))
    }
}
