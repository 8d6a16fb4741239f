//! Note feed, detail, authoring and engagement endpoints

use anyhow::{Context, Result};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;

use super::client::NotesClient;
use crate::media::MediaResolver;
use crate::models::{Comment, NoteDetail, NoteMedia, NotePage, NoteRequest, NoteSummary};

/// Render a backend timestamp (ISO-8601, no offset) for display.
/// Falls back to the raw string when it doesn't parse.
pub(super) fn format_time(raw: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// One-line preview of note content for list output.
fn content_preview(content: &str) -> String {
    let text = content.trim().replace(['\r', '\n'], " ");
    if text.chars().count() > 80 {
        let cut: String = text.chars().take(77).collect();
        format!("{}...", cut)
    } else {
        text
    }
}

fn print_note_line(note: &NoteSummary) {
    println!(
        "#{}  {}",
        note.id,
        note.title.as_deref().unwrap_or("(untitled)")
    );
    println!(
        "  by {}  [{}]  {}",
        note.username.as_deref().unwrap_or("?"),
        note.status(),
        note.create_time.as_deref().map(format_time).unwrap_or_default()
    );
    if let Some(ref content) = note.content {
        let preview = content_preview(content);
        if !preview.is_empty() {
            println!("  {}", preview);
        }
    }
    println!(
        "  views {}  likes {}  favorites {}  comments {}",
        note.view_count.unwrap_or(0),
        note.like_count.unwrap_or(0),
        note.favorite_count.unwrap_or(0),
        note.comment_count.unwrap_or(0)
    );
    println!();
}

/// Fetch a page of the public feed.
pub async fn feed_data(
    client: &NotesClient,
    page: usize,
    size: usize,
    search: Option<&str>,
) -> Result<NotePage> {
    let mut query = vec![
        ("page", page.to_string()),
        ("size", size.to_string()),
    ];
    if let Some(search) = search {
        query.push(("search", search.to_string()));
    }
    client
        .get_query("/api/notes", &query)
        .await
        .context("Failed to fetch note feed")
}

/// Browse the public feed (prints to stdout).
pub async fn feed(client: &NotesClient, page: usize, size: usize, search: Option<&str>) -> Result<()> {
    let notes = feed_data(client, page, size, search).await?;

    println!("\nNotes (page {}, {} total):", page, notes.total_elements);
    println!("{:-<60}", "");

    if notes.content.is_empty() {
        println!("  (no notes found)");
        return Ok(());
    }
    for note in &notes.content {
        print_note_line(note);
    }
    Ok(())
}

/// Fetch one note with its media attachments.
pub async fn note_data(client: &NotesClient, id: i64) -> Result<NoteDetail> {
    client
        .get(&format!("/api/notes/{}", id))
        .await
        .with_context(|| format!("Failed to fetch note {}", id))
}

/// Show a note in full, with resolved media URLs (prints to stdout).
pub async fn view_note(client: &NotesClient, resolver: &MediaResolver, id: i64) -> Result<()> {
    let detail = note_data(client, id).await?;
    let note = &detail.note;

    println!();
    println!("{}", note.title.as_deref().unwrap_or("(untitled)"));
    println!("{:-<60}", "");
    println!(
        "by {}  [{}]  {}",
        note.username.as_deref().unwrap_or("?"),
        note.status(),
        note.create_time.as_deref().map(format_time).unwrap_or_default()
    );
    if let Some(ref location) = note.location {
        if !location.is_empty() {
            println!("location: {}", location);
        }
    }
    println!(
        "views {}  likes {}  favorites {}  comments {}",
        note.view_count.unwrap_or(0),
        note.like_count.unwrap_or(0),
        note.favorite_count.unwrap_or(0),
        note.comment_count.unwrap_or(0)
    );
    // Older backends omit the interaction flags on the detail payload;
    // fall back to the dedicated endpoints.
    let liked = match note.is_liked {
        Some(liked) => liked,
        None => is_liked(client, id).await.unwrap_or(false),
    };
    let favorited = match note.is_favorited {
        Some(favorited) => favorited,
        None => is_favorited(client, id).await.unwrap_or(false),
    };
    if liked {
        println!("(you liked this note)");
    }
    if favorited {
        println!("(in your favorites)");
    }

    if let Some(ref content) = note.content {
        println!();
        println!("{}", content.trim());
    }

    if !detail.media.is_empty() {
        println!();
        println!("Media:");
        let mut media = detail.media.clone();
        media.sort_by_key(|m| m.ordering.unwrap_or(0));
        for item in &media {
            let kind = if item.is_video() { "video" } else { "image" };
            let url = resolver.resolve(client, &item.url).await;
            println!("  [{}] {}", kind, url);
        }
    }
    Ok(())
}

/// Upload the given media files, then create the note referencing them.
///
/// The cover defaults to the first uploaded image when not given.
pub async fn compose_note(
    client: &NotesClient,
    title: &str,
    content: &str,
    location: Option<&str>,
    cover: Option<&str>,
    media_files: &[PathBuf],
) -> Result<NoteSummary> {
    let mut media = Vec::with_capacity(media_files.len());
    for (ordering, path) in media_files.iter().enumerate() {
        let uploaded = super::upload::upload_media(client, path).await?;
        let media_type = if super::upload::media_kind(path) == "video" {
            1
        } else {
            0
        };
        media.push(NoteMedia {
            url: uploaded.url,
            media_type: Some(media_type),
            ordering: Some(ordering as i32),
        });
    }

    let cover_url = cover.map(str::to_string).or_else(|| {
        media
            .iter()
            .find(|m| !m.is_video())
            .map(|m| m.url.clone())
    });

    let request = NoteRequest {
        title: title.to_string(),
        content: content.to_string(),
        location: location.map(str::to_string),
        cover_url,
        media,
    };
    create_note(client, &request).await
}

/// Update selected fields of a note, keeping the rest as-is.
pub async fn edit_note(
    client: &NotesClient,
    id: i64,
    title: Option<&str>,
    content: Option<&str>,
    location: Option<&str>,
    cover: Option<&str>,
) -> Result<NoteDetail> {
    let detail = note_data(client, id).await?;

    let request = NoteRequest {
        title: title
            .map(str::to_string)
            .or(detail.note.title)
            .context("Note has no title; pass --title")?,
        content: content
            .map(str::to_string)
            .or(detail.note.content)
            .context("Note has no content; pass --content")?,
        location: location.map(str::to_string).or(detail.note.location),
        cover_url: cover.map(str::to_string).or(detail.note.cover_url),
        media: detail.media,
    };
    update_note(client, id, &request).await
}

/// Create a note; returns the created note.
pub async fn create_note(client: &NotesClient, request: &NoteRequest) -> Result<NoteSummary> {
    let body = serde_json::to_value(request).context("Failed to encode note")?;
    let created: NoteSummary = client
        .post("/api/notes", &body)
        .await
        .context("Failed to create note")?;
    Ok(created)
}

/// Update an existing note; returns the updated detail.
pub async fn update_note(client: &NotesClient, id: i64, request: &NoteRequest) -> Result<NoteDetail> {
    let body = serde_json::to_value(request).context("Failed to encode note")?;
    client
        .put(&format!("/api/notes/{}", id), &body)
        .await
        .with_context(|| format!("Failed to update note {}", id))
}

pub async fn delete_note(client: &NotesClient, id: i64) -> Result<()> {
    client
        .delete_empty(&format!("/api/notes/{}", id))
        .await
        .with_context(|| format!("Failed to delete note {}", id))
}

/// List the signed-in user's own notes, any moderation status.
pub async fn my_notes(client: &NotesClient, page: usize, size: usize) -> Result<()> {
    let query = [("page", page.to_string()), ("size", size.to_string())];
    let notes: NotePage = client
        .get_query("/api/notes/users/notes", &query)
        .await
        .context("Failed to fetch your notes")?;

    println!("\nYour notes (page {}, {} total):", page, notes.total_elements);
    println!("{:-<60}", "");
    if notes.content.is_empty() {
        println!("  (no notes yet)");
        return Ok(());
    }
    for note in &notes.content {
        print_note_line(note);
    }
    Ok(())
}

// -- Engagement --

/// Whether the signed-in user has liked the note.
pub async fn is_liked(client: &NotesClient, id: i64) -> Result<bool> {
    client
        .get(&format!("/api/notes/{}/is-liked", id))
        .await
        .with_context(|| format!("Failed to check like state of note {}", id))
}

/// Whether the signed-in user has favorited the note.
pub async fn is_favorited(client: &NotesClient, id: i64) -> Result<bool> {
    client
        .get(&format!("/api/notes/{}/is-favorited", id))
        .await
        .with_context(|| format!("Failed to check favorite state of note {}", id))
}

pub async fn like(client: &NotesClient, id: i64) -> Result<()> {
    client
        .post_empty(&format!("/api/notes/{}/like", id), None)
        .await
        .with_context(|| format!("Failed to like note {}", id))
}

pub async fn unlike(client: &NotesClient, id: i64) -> Result<()> {
    client
        .delete_empty(&format!("/api/notes/{}/like", id))
        .await
        .with_context(|| format!("Failed to unlike note {}", id))
}

pub async fn favorite(client: &NotesClient, id: i64) -> Result<()> {
    client
        .post_empty(&format!("/api/notes/{}/favorite", id), None)
        .await
        .with_context(|| format!("Failed to favorite note {}", id))
}

pub async fn unfavorite(client: &NotesClient, id: i64) -> Result<()> {
    client
        .delete_empty(&format!("/api/notes/{}/favorite", id))
        .await
        .with_context(|| format!("Failed to unfavorite note {}", id))
}

/// List the signed-in user's favorited notes.
pub async fn favorites(client: &NotesClient) -> Result<()> {
    let notes: Vec<NoteSummary> = client
        .get("/api/users/favorites")
        .await
        .context("Failed to fetch favorites")?;

    println!("\nFavorites ({}):", notes.len());
    println!("{:-<60}", "");
    if notes.is_empty() {
        println!("  (no favorites yet)");
        return Ok(());
    }
    for note in &notes {
        print_note_line(note);
    }
    Ok(())
}

/// Fetch comments for a note.
pub async fn comments_data(client: &NotesClient, id: i64) -> Result<Vec<Comment>> {
    client
        .get(&format!("/api/notes/{}/comments", id))
        .await
        .with_context(|| format!("Failed to fetch comments for note {}", id))
}

/// List comments on a note (prints to stdout).
pub async fn comments(client: &NotesClient, id: i64) -> Result<()> {
    let comments = comments_data(client, id).await?;

    if comments.is_empty() {
        println!("(no comments)");
        return Ok(());
    }
    for comment in &comments {
        println!(
            "[{}] {}: {}",
            comment.create_time.as_deref().map(format_time).unwrap_or_default(),
            comment.username.as_deref().unwrap_or("?"),
            comment.content.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn add_comment(client: &NotesClient, id: i64, content: &str) -> Result<()> {
    client
        .post_empty(
            &format!("/api/notes/{}/comments", id),
            Some(&json!({ "content": content })),
        )
        .await
        .with_context(|| format!("Failed to comment on note {}", id))
}

/// Current counters for a note (views/likes/favorites/comments).
pub async fn note_stats(client: &NotesClient, id: i64) -> Result<()> {
    let stats: HashMap<String, i64> = client
        .get(&format!("/api/notes/{}/stats", id))
        .await
        .with_context(|| format!("Failed to fetch stats for note {}", id))?;

    let mut keys: Vec<_> = stats.keys().collect();
    keys.sort();
    for key in keys {
        println!("{:>12}: {}", key, stats[key]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_timestamps_render_without_the_t() {
        assert_eq!(format_time("2024-05-03T06:12:00"), "2024-05-03 06:12");
        assert_eq!(format_time("2024-05-03T06:12:00.123"), "2024-05-03 06:12");
        // Unparseable input passes through
        assert_eq!(format_time("yesterday"), "yesterday");
    }

    #[test]
    fn preview_collapses_newlines_and_truncates() {
        let long = "a".repeat(100);
        assert_eq!(content_preview(&long).chars().count(), 80);
        assert!(content_preview(&long).ends_with("..."));

        assert_eq!(content_preview("line one\nline two"), "line one line two");
    }
}
