//! Administrative endpoints (backend enforces the admin role)

use anyhow::{Context, Result};

use super::client::NotesClient;

/// Invalidate every session of the given user.
pub async fn force_logout(client: &NotesClient, user_id: i64) -> Result<()> {
    client
        .post_empty(&format!("/api/admin/users/{}/logout", user_id), None)
        .await
        .with_context(|| format!("Failed to force-logout user {}", user_id))
}
