//! Error taxonomy surfaced by the authenticated client

use thiserror::Error;

/// Errors surfaced to callers of the authenticated client.
///
/// `Unauthorized` means the session is gone (cleared locally); callers
/// should direct the user back to `login`. `Network` means no response was
/// received at all, which is distinct from an authorization failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not authorized -- session cleared, run 'travelnotes-cli login'")]
    Unauthorized,

    #[error("network unavailable: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Server { status: u16, body: String },

    /// Business error carried inside a 2xx response envelope
    #[error("{message} (code {code})")]
    Api { code: i64, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Outcome of a token refresh, fanned out to every queued waiter.
///
/// Cloneable so a single refresh failure can reject the whole queue with
/// the same underlying error.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
    /// The backend rejected the refresh token; the local session was cleared
    #[error("refresh token rejected")]
    Rejected,

    /// No refresh token in storage; the local session was cleared
    #[error("no refresh token stored")]
    MissingToken,

    /// Transport failure while calling the refresh endpoint; the stored
    /// session is left intact so the caller can retry later
    #[error("network unavailable during refresh: {0}")]
    Network(String),
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Rejected | RefreshError::MissingToken => ApiError::Unauthorized,
            RefreshError::Network(msg) => ApiError::Network(msg),
        }
    }
}
