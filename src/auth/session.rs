//! Session flows: login, register, logout, status

use anyhow::{Context, Result};
use serde_json::json;

use crate::api::NotesClient;
use crate::config::Config;
use crate::models::{JwtResponse, USER_TYPE_ADMIN};

use super::SessionUser;

fn session_user_from(jwt: &JwtResponse, fallback_username: &str) -> Result<SessionUser> {
    let user_id = jwt.user_id.context("Server response missing userId")?;
    Ok(SessionUser {
        user_id,
        username: jwt
            .username
            .clone()
            .unwrap_or_else(|| fallback_username.to_string()),
        email: jwt.email.clone(),
        user_type: jwt.user_type,
        avatar: None,
    })
}

/// Authenticate and persist the session.
pub async fn login(username: &str, password: &str) -> Result<()> {
    let config = Config::load()?;
    let client = NotesClient::from_config(config);

    tracing::info!("Logging in as {}...", username);
    let result: Result<JwtResponse, _> = client
        .post(
            "/api/auth/login",
            &json!({ "username": username, "password": password }),
        )
        .await;

    let jwt = match result {
        Ok(jwt) => jwt,
        Err(e) => {
            // Drop whatever partial credentials may be stored
            client.clear_session();
            return Err(e).context("Login failed");
        }
    };

    let user = session_user_from(&jwt, username)?;
    client.save_session(&jwt, Some(user));
    println!("Login successful.");
    Ok(())
}

/// Create an account; the backend signs the new user in directly.
pub async fn register(
    username: &str,
    password: &str,
    email: &str,
    mobile: Option<&str>,
) -> Result<()> {
    let config = Config::load()?;
    let client = NotesClient::from_config(config);

    let mut body = json!({
        "username": username,
        "password": password,
        "email": email,
    });
    if let Some(mobile) = mobile {
        body["mobile"] = json!(mobile);
    }

    tracing::info!("Registering {}...", username);
    let jwt: JwtResponse = client
        .post("/api/auth/register", &body)
        .await
        .context("Registration failed")?;

    let user = session_user_from(&jwt, username)?;
    client.save_session(&jwt, Some(user));
    println!("Registered and logged in.");
    Ok(())
}

/// Revoke the refresh token server-side (best effort) and clear the local
/// session unconditionally.
pub async fn logout() -> Result<()> {
    let config = Config::load()?;
    let client = NotesClient::from_config(config);

    if let Some(refresh_token) = client.refresh_token() {
        if let Err(e) = client
            .post_empty("/api/auth/logout", Some(&json!({ "refreshToken": refresh_token })))
            .await
        {
            tracing::warn!("Logout request failed, continuing cleanup: {:#}", e);
        }
    }

    client.clear_session();
    println!("Logged out.");
    Ok(())
}

/// Display current session status
pub async fn status() -> Result<()> {
    let config = Config::load()?;

    println!("Server:       {}", config.server_url());

    match config.user {
        Some(ref user) => {
            let role = if user.user_type == Some(USER_TYPE_ADMIN) {
                "admin"
            } else {
                "user"
            };
            println!("Logged in as: {} ({})", user.username, role);
            if let Some(ref email) = user.email {
                println!("Email:        {}", email);
            }
        }
        None => {
            println!("Logged in as: (nobody)");
        }
    }

    match config.access_token {
        Some(ref token) if !token.is_expired() => println!("Access token: present"),
        Some(_) => println!("Access token: expired"),
        None => println!("Access token: none"),
    }
    match config.refresh_token {
        Some(_) => println!("Refresh tok:  present"),
        None => println!("Refresh tok:  none"),
    }

    if config.access_token.is_none() {
        println!("\nRun 'travelnotes-cli login' to authenticate.");
    }
    Ok(())
}
