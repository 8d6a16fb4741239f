//! User profile endpoints

use anyhow::{Context, Result};
use serde_json::json;

use super::client::NotesClient;
use crate::media::MediaResolver;
use crate::models::{ProfileUpdate, UserProfile};

/// Fetch the signed-in user's profile.
pub async fn profile_data(client: &NotesClient) -> Result<UserProfile> {
    client
        .get("/api/users/profile")
        .await
        .context("Failed to fetch profile")
}

/// Show the signed-in user's profile (prints to stdout).
pub async fn profile(client: &NotesClient, resolver: &MediaResolver) -> Result<()> {
    let profile = profile_data(client).await?;

    println!();
    println!("Username: {}", profile.username.as_deref().unwrap_or("?"));
    println!("Email:    {}", profile.email.as_deref().unwrap_or("(none)"));
    println!("Mobile:   {}", profile.mobile.as_deref().unwrap_or("(none)"));
    if let Some(ref intro) = profile.introduction {
        if !intro.is_empty() {
            println!("About:    {}", intro);
        }
    }
    if let Some(ref avatar) = profile.avatar {
        if !avatar.is_empty() {
            let url = resolver.resolve(client, avatar).await;
            println!("Avatar:   {}", url);
        }
    }
    if let Some(ref created) = profile.create_time {
        println!("Joined:   {}", super::notes::format_time(created));
    }
    Ok(())
}

/// Update profile fields; only the provided fields change.
pub async fn update_profile(client: &NotesClient, update: &ProfileUpdate) -> Result<UserProfile> {
    let body = serde_json::to_value(update).context("Failed to encode profile update")?;
    client
        .put("/api/users/profile", &body)
        .await
        .context("Failed to update profile")
}

pub async fn change_password(client: &NotesClient, old: &str, new: &str) -> Result<()> {
    client
        .post_empty(
            "/api/users/change-password",
            Some(&json!({ "oldPassword": old, "newPassword": new })),
        )
        .await
        .context("Failed to change password")
}
