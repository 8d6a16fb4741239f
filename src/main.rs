//! travelnotes-cli - terminal client for a travel-notes platform

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travelnotes_cli::{api, auth};

#[derive(Parser)]
#[command(name = "travelnotes-cli")]
#[command(about = "Lightweight CLI client for a travel-notes platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with username and password
    Login {
        username: String,
        password: String,
    },

    /// Create an account (signs you in directly)
    Register {
        username: String,
        password: String,
        email: String,

        /// Optional mobile number
        #[arg(short, long)]
        mobile: Option<String>,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show current session status
    Status,

    /// Browse the public note feed
    Feed {
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Notes per page
        #[arg(short, long, default_value = "10")]
        size: usize,

        /// Filter by title/content
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one note with its media and counters
    Note {
        /// Note ID (from `feed` output)
        id: i64,
    },

    /// Publish a new note
    Post {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,

        #[arg(short, long)]
        location: Option<String>,

        /// Cover image path/URL (defaults to the first uploaded image)
        #[arg(long)]
        cover: Option<String>,

        /// Media files to upload and attach, in order
        #[arg(short, long)]
        media: Vec<PathBuf>,
    },

    /// Edit fields of one of your notes
    Edit {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(long)]
        cover: Option<String>,
    },

    /// Delete one of your notes
    Delete { id: i64 },

    /// List your own notes (any review status)
    MyNotes {
        #[arg(short, long, default_value = "1")]
        page: usize,

        #[arg(short, long, default_value = "10")]
        size: usize,
    },

    /// Like a note
    Like { id: i64 },

    /// Remove your like from a note
    Unlike { id: i64 },

    /// Add a note to your favorites
    Favorite { id: i64 },

    /// Remove a note from your favorites
    Unfavorite { id: i64 },

    /// List your favorited notes
    Favorites,

    /// List comments on a note
    Comments { id: i64 },

    /// Comment on a note
    Comment { id: i64, content: String },

    /// Show live counters for a note
    Stats { id: i64 },

    /// Show your profile
    Profile,

    /// Update profile fields
    UpdateProfile {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        mobile: Option<String>,

        #[arg(long)]
        introduction: Option<String>,

        /// Avatar image file to upload
        #[arg(long)]
        avatar: Option<PathBuf>,
    },

    /// Change the account password
    ChangePassword {
        old_password: String,
        new_password: String,
    },

    /// Upload a media file and print its stored path
    Upload { file: PathBuf },

    /// Administrative operations (requires an admin account)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Check that the backend is reachable
    Ping,
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Invalidate all sessions of a user
    ForceLogout { user_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Login { username, password } => {
            auth::login(&username, &password).await?;
        }
        Commands::Register {
            username,
            password,
            email,
            mobile,
        } => {
            auth::register(&username, &password, &email, mobile.as_deref()).await?;
        }
        Commands::Logout => {
            auth::logout().await?;
        }
        Commands::Status => {
            auth::status().await?;
        }
        Commands::Feed { page, size, search } => {
            api::feed(page, size, search.as_deref()).await?;
        }
        Commands::Note { id } => {
            api::view_note(id).await?;
        }
        Commands::Post {
            title,
            content,
            location,
            cover,
            media,
        } => {
            api::post_note(
                &title,
                &content,
                location.as_deref(),
                cover.as_deref(),
                &media,
            )
            .await?;
        }
        Commands::Edit {
            id,
            title,
            content,
            location,
            cover,
        } => {
            api::edit_note(
                id,
                title.as_deref(),
                content.as_deref(),
                location.as_deref(),
                cover.as_deref(),
            )
            .await?;
        }
        Commands::Delete { id } => {
            api::delete_note(id).await?;
        }
        Commands::MyNotes { page, size } => {
            api::my_notes(page, size).await?;
        }
        Commands::Like { id } => {
            api::like(id).await?;
        }
        Commands::Unlike { id } => {
            api::unlike(id).await?;
        }
        Commands::Favorite { id } => {
            api::favorite(id).await?;
        }
        Commands::Unfavorite { id } => {
            api::unfavorite(id).await?;
        }
        Commands::Favorites => {
            api::favorites().await?;
        }
        Commands::Comments { id } => {
            api::comments(id).await?;
        }
        Commands::Comment { id, content } => {
            api::add_comment(id, &content).await?;
        }
        Commands::Stats { id } => {
            api::note_stats(id).await?;
        }
        Commands::Profile => {
            api::profile().await?;
        }
        Commands::UpdateProfile {
            email,
            mobile,
            introduction,
            avatar,
        } => {
            api::update_profile(
                email.as_deref(),
                mobile.as_deref(),
                introduction.as_deref(),
                avatar.as_ref(),
            )
            .await?;
        }
        Commands::ChangePassword {
            old_password,
            new_password,
        } => {
            api::change_password(&old_password, &new_password).await?;
        }
        Commands::Upload { file } => {
            api::upload_media(&file).await?;
        }
        Commands::Admin { command } => match command {
            AdminCommands::ForceLogout { user_id } => {
                api::admin_force_logout(user_id).await?;
            }
        },
        Commands::Ping => {
            api::ping().await?;
        }
    }

    Ok(())
}
