// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod auth;
pub mod health;
pub mod posts;
pub mod profiles;
pub mod social_graph;

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::media::Upload;

/// Parse a numeric path id, naming the entity in the error
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ApiError::Validation(format!("Invalid {} id", entity)))
}

/// Fields of an image upload form
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub file: Option<Upload>,
    pub text: std::collections::HashMap<String, String>,
}

/// Drain a multipart body, keeping the file part named `file_field` and
/// every other part as text
pub(crate) async fn read_upload_form(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            if bytes.is_empty() && file_name.is_none() {
                continue;
            }
            form.file = Some(Upload { file_name, content_type, bytes: bytes.to_vec() });
        } else {
            form.text.insert(name, field.text().await?);
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_integers_only() {
        assert_eq!(parse_id("12", "post").unwrap(), 12);
        let err = parse_id("abc", "post").unwrap_err();
        assert_eq!(err.to_string(), "Invalid post id");
    }
}
