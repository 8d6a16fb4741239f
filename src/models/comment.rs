//! Comment models

use serde::{Deserialize, Serialize};

/// A comment on a note
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub content: Option<String>,
    pub create_time: Option<String>,
}
