//! Media upload endpoints (multipart)

use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;

use super::client::NotesClient;

/// Upload response; `url` is the stored object's relative path.
#[derive(Debug, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string())
}

/// Guess the backend's media `type` parameter from the file extension.
pub(super) fn media_kind(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") | Some("mov") | Some("webm") | Some("avi") => "video",
        _ => "image",
    }
}

/// Upload a media file; returns the stored relative path.
///
/// The file is read into memory up front so the multipart form can be
/// rebuilt if the request is replayed after a token refresh.
pub async fn upload_media(client: &NotesClient, path: &Path) -> Result<UploadedMedia> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }

    let name = file_name_of(path);
    let kind = media_kind(path);
    tracing::debug!("Uploading {} ({} bytes, {})", name, bytes.len(), kind);

    let uploaded: UploadedMedia = client
        .post_multipart("/api/upload/media", || {
            Form::new()
                .part("file", Part::bytes(bytes.clone()).file_name(name.clone()))
                .text("type", kind)
        })
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;
    Ok(uploaded)
}

/// Upload a new avatar image; returns the stored relative path.
pub async fn upload_avatar(client: &NotesClient, path: &Path) -> Result<UploadedMedia> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }

    let name = file_name_of(path);
    let uploaded: UploadedMedia = client
        .post_multipart("/api/upload/avatar", || {
            Form::new().part("file", Part::bytes(bytes.clone()).file_name(name.clone()))
        })
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;
    Ok(uploaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_by_extension() {
        assert_eq!(media_kind(Path::new("a/b/clip.MP4")), "video");
        assert_eq!(media_kind(Path::new("photo.jpeg")), "image");
        assert_eq!(media_kind(Path::new("no_extension")), "image");
    }
}
