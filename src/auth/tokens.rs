//! Token and session storage

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Stored access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    /// Unix timestamp; the backend omits expiry, so usually `None`
    pub expires_at: Option<u64>,
}

impl StoredToken {
    pub fn new(token: String, expires_in_secs: Option<u64>) -> Self {
        let expires_at = expires_in_secs.map(|secs| now_secs() + secs);
        Self { token, expires_at }
    }

    /// Considered expired when less than 5 minutes remain
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => now_secs() + 300 >= exp,
            None => false,
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Profile of the signed-in user, cached alongside the tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub email: Option<String>,
    pub user_type: Option<i32>,
    pub avatar: Option<String>,
}

/// Session store trait for different storage backends
pub trait TokenStore: Send {
    fn get_access_token(&self) -> Option<StoredToken>;
    fn set_access_token(&mut self, token: String, expires_in: Option<u64>);
    fn get_refresh_token(&self) -> Option<String>;
    fn set_refresh_token(&mut self, token: String);
    fn get_user(&self) -> Option<SessionUser>;
    fn set_user(&mut self, user: SessionUser);
    fn clear_session(&mut self);
    /// Flush the current session to durable storage
    fn persist(&self) -> Result<()>;
}

/// In-memory session store for ephemeral sessions and tests
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    access_token: Option<StoredToken>,
    refresh_token: Option<String>,
    user: Option<SessionUser>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            access_token: Some(StoredToken::new(access.to_string(), None)),
            refresh_token: Some(refresh.to_string()),
            user: None,
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_access_token(&self) -> Option<StoredToken> {
        self.access_token.clone()
    }

    fn set_access_token(&mut self, token: String, expires_in: Option<u64>) {
        self.access_token = Some(StoredToken::new(token, expires_in));
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.refresh_token.clone()
    }

    fn set_refresh_token(&mut self, token: String) {
        self.refresh_token = Some(token);
    }

    fn get_user(&self) -> Option<SessionUser> {
        self.user.clone()
    }

    fn set_user(&mut self, user: SessionUser) {
        self.user = Some(user);
    }

    fn clear_session(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.user = None;
    }

    fn persist(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_without_expiry_never_expires() {
        let token = StoredToken::new("abc".into(), None);
        assert!(!token.is_expired());
    }

    #[test]
    fn token_expiring_soon_counts_as_expired() {
        // 5 minute skew window
        let token = StoredToken::new("abc".into(), Some(60));
        assert!(token.is_expired());

        let token = StoredToken::new("abc".into(), Some(3600));
        assert!(!token.is_expired());
    }

    #[test]
    fn clear_session_removes_everything() {
        let mut store = MemoryTokenStore::with_tokens("a", "r");
        store.set_user(SessionUser {
            user_id: 1,
            username: "mira".into(),
            email: None,
            user_type: None,
            avatar: None,
        });
        store.clear_session();
        assert!(store.get_access_token().is_none());
        assert!(store.get_refresh_token().is_none());
        assert!(store.get_user().is_none());
    }
}
