//! Note-related models

use serde::{Deserialize, Serialize};

/// Moderation status of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteStatus {
    Pending,
    Approved,
    Rejected,
    Unknown(i32),
}

impl From<i32> for NoteStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => NoteStatus::Pending,
            1 => NoteStatus::Approved,
            2 => NoteStatus::Rejected,
            other => NoteStatus::Unknown(other),
        }
    }
}

impl std::fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteStatus::Pending => write!(f, "pending"),
            NoteStatus::Approved => write!(f, "approved"),
            NoteStatus::Rejected => write!(f, "rejected"),
            NoteStatus::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// A note as returned in feed and list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub location: Option<String>,
    pub cover_url: Option<String>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub user_avatar: Option<String>,
    #[serde(default)]
    pub status: i32,
    pub view_count: Option<i64>,
    pub like_count: Option<i64>,
    pub favorite_count: Option<i64>,
    pub comment_count: Option<i64>,
    pub is_liked: Option<bool>,
    pub is_favorited: Option<bool>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl NoteSummary {
    pub fn status(&self) -> NoteStatus {
        NoteStatus::from(self.status)
    }
}

/// A note with its attached media, as returned by the detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDetail {
    #[serde(flatten)]
    pub note: NoteSummary,
    #[serde(default)]
    pub media: Vec<NoteMedia>,
}

/// A single media attachment (`type`: 0 image, 1 video)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMedia {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: Option<i32>,
    pub ordering: Option<i32>,
}

impl NoteMedia {
    pub fn is_video(&self) -> bool {
        self.media_type == Some(1)
    }
}

/// Paged note list (`content` + `totalElements` map from the backend)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePage {
    #[serde(default)]
    pub content: Vec<NoteSummary>,
    #[serde(default)]
    pub total_elements: i64,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

/// Body for note create/update requests
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRequest {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<NoteMedia>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_page_decodes_backend_shape() {
        let json = r#"{
            "content": [{
                "id": 7,
                "title": "Sunrise at Tanah Lot",
                "content": "Worth the 4am start.",
                "coverUrl": "/travel-notes/covers/7.jpg",
                "userId": 3,
                "username": "mira",
                "status": 1,
                "viewCount": 120,
                "likeCount": 14,
                "isLiked": true,
                "createTime": "2024-05-03T06:12:00"
            }],
            "totalElements": 41,
            "page": 1,
            "size": 10
        }"#;

        let page: NotePage = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_elements, 41);
        assert_eq!(page.content.len(), 1);
        let note = &page.content[0];
        assert_eq!(note.id, 7);
        assert_eq!(note.status(), NoteStatus::Approved);
        assert_eq!(note.is_liked, Some(true));
        assert_eq!(note.cover_url.as_deref(), Some("/travel-notes/covers/7.jpg"));
    }

    #[test]
    fn note_detail_flattens_media() {
        let json = r#"{
            "id": 9,
            "title": "Kyoto alleys",
            "status": 0,
            "media": [
                {"url": "/travel-notes/m/1.jpg", "type": 0, "ordering": 0},
                {"url": "/travel-notes/m/2.mp4", "type": 1, "ordering": 1}
            ]
        }"#;

        let detail: NoteDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.note.status(), NoteStatus::Pending);
        assert_eq!(detail.media.len(), 2);
        assert!(!detail.media[0].is_video());
        assert!(detail.media[1].is_video());
    }

    #[test]
    fn note_request_skips_empty_optionals() {
        let req = NoteRequest {
            title: "t".into(),
            content: "c".into(),
            location: None,
            cover_url: None,
            media: Vec::new(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("location").is_none());
        assert!(value.get("media").is_none());
    }
}
