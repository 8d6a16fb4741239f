//! API client module for the travel-notes backend

mod admin;
pub mod client;
pub mod error;
mod notes;
mod refresh;
mod upload;
mod users;

pub use client::{Envelope, NotesClient};
pub use error::{ApiError, RefreshError};

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::media::MediaResolver;
use crate::models::ProfileUpdate;

/// Build an authenticated client (and media resolver) from stored config.
fn build() -> Result<(NotesClient, MediaResolver)> {
    let config = Config::load()?;
    if !config.is_logged_in() {
        bail!("Not logged in. Run 'travelnotes-cli login'.");
    }
    let resolver = MediaResolver::from_config(&config);
    Ok((NotesClient::from_config(config), resolver))
}

/// Browse the public note feed
pub async fn feed(page: usize, size: usize, search: Option<&str>) -> Result<()> {
    let (client, _) = build()?;
    notes::feed(&client, page, size, search).await
}

/// Show one note in full
pub async fn view_note(id: i64) -> Result<()> {
    let (client, resolver) = build()?;
    notes::view_note(&client, &resolver, id).await
}

/// Upload media files and publish a new note
pub async fn post_note(
    title: &str,
    content: &str,
    location: Option<&str>,
    cover: Option<&str>,
    media_files: &[PathBuf],
) -> Result<()> {
    let (client, _) = build()?;
    let note = notes::compose_note(&client, title, content, location, cover, media_files).await?;
    println!("Note #{} submitted for review.", note.id);
    Ok(())
}

/// Update fields of an existing note
pub async fn edit_note(
    id: i64,
    title: Option<&str>,
    content: Option<&str>,
    location: Option<&str>,
    cover: Option<&str>,
) -> Result<()> {
    let (client, _) = build()?;
    notes::edit_note(&client, id, title, content, location, cover).await?;
    println!("Note #{} updated.", id);
    Ok(())
}

/// Delete a note
pub async fn delete_note(id: i64) -> Result<()> {
    let (client, _) = build()?;
    notes::delete_note(&client, id).await?;
    println!("Note #{} deleted.", id);
    Ok(())
}

/// List the signed-in user's own notes
pub async fn my_notes(page: usize, size: usize) -> Result<()> {
    let (client, _) = build()?;
    notes::my_notes(&client, page, size).await
}

/// Like a note
pub async fn like(id: i64) -> Result<()> {
    let (client, _) = build()?;
    notes::like(&client, id).await?;
    println!("Liked note #{}.", id);
    Ok(())
}

/// Remove a like
pub async fn unlike(id: i64) -> Result<()> {
    let (client, _) = build()?;
    notes::unlike(&client, id).await?;
    println!("Unliked note #{}.", id);
    Ok(())
}

/// Favorite a note
pub async fn favorite(id: i64) -> Result<()> {
    let (client, _) = build()?;
    notes::favorite(&client, id).await?;
    println!("Favorited note #{}.", id);
    Ok(())
}

/// Remove a favorite
pub async fn unfavorite(id: i64) -> Result<()> {
    let (client, _) = build()?;
    notes::unfavorite(&client, id).await?;
    println!("Unfavorited note #{}.", id);
    Ok(())
}

/// List favorited notes
pub async fn favorites() -> Result<()> {
    let (client, _) = build()?;
    notes::favorites(&client).await
}

/// List comments on a note
pub async fn comments(id: i64) -> Result<()> {
    let (client, _) = build()?;
    notes::comments(&client, id).await
}

/// Comment on a note
pub async fn add_comment(id: i64, content: &str) -> Result<()> {
    let (client, _) = build()?;
    notes::add_comment(&client, id, content).await?;
    println!("Comment posted.");
    Ok(())
}

/// Show current counters for a note
pub async fn note_stats(id: i64) -> Result<()> {
    let (client, _) = build()?;
    notes::note_stats(&client, id).await
}

/// Show the signed-in user's profile
pub async fn profile() -> Result<()> {
    let (client, resolver) = build()?;
    users::profile(&client, &resolver).await
}

/// Update profile fields, optionally uploading a new avatar image first
pub async fn update_profile(
    email: Option<&str>,
    mobile: Option<&str>,
    introduction: Option<&str>,
    avatar_file: Option<&PathBuf>,
) -> Result<()> {
    let (client, _) = build()?;

    let avatar = match avatar_file {
        Some(path) => Some(upload::upload_avatar(&client, path).await?.url),
        None => None,
    };
    let update = ProfileUpdate {
        avatar,
        email: email.map(str::to_string),
        mobile: mobile.map(str::to_string),
        introduction: introduction.map(str::to_string),
    };
    users::update_profile(&client, &update).await?;
    println!("Profile updated.");
    Ok(())
}

/// Change the account password
pub async fn change_password(old: &str, new: &str) -> Result<()> {
    let (client, _) = build()?;
    users::change_password(&client, old, new).await?;
    println!("Password changed.");
    Ok(())
}

/// Upload a media file and print its stored path
pub async fn upload_media(path: &PathBuf) -> Result<()> {
    let (client, _) = build()?;
    let uploaded = upload::upload_media(&client, path).await?;
    println!("{}", uploaded.url);
    Ok(())
}

/// Force-logout all sessions of a user (admin only)
pub async fn admin_force_logout(user_id: i64) -> Result<()> {
    let (client, _) = build()?;
    admin::force_logout(&client, user_id).await?;
    println!("All sessions of user {} invalidated.", user_id);
    Ok(())
}

/// Check backend reachability
pub async fn ping() -> Result<()> {
    // Health probe works without a session
    let config = Config::load()?;
    let client = NotesClient::from_config(config);
    let reply: String = client.get("/api/ping").await?;
    println!("{} -> {}", client.base_url(), reply);
    Ok(())
}
