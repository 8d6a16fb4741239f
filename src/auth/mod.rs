//! Authentication and session management
//!
//! Credential flows against the backend auth API, plus the token types and
//! the storage seam shared with the authenticated HTTP client.

pub mod session;
pub mod tokens;

pub use session::{login, logout, register, status};
pub use tokens::{MemoryTokenStore, SessionUser, StoredToken, TokenStore};
