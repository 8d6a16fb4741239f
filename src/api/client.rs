//! Authenticated HTTP client for the travel-notes backend
//!
//! Wraps reqwest::Client with automatic bearer-token injection and
//! transparent single-flight refresh-and-retry on HTTP 401.

use std::sync::Mutex;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::error::{ApiError, RefreshError};
use super::refresh::{RefreshTicket, TokenRefreshCoordinator};
use crate::auth::{SessionUser, TokenStore};
use crate::config::Config;
use crate::models::JwtResponse;

/// Response envelope wrapping every backend payload
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Authenticated client for the travel-notes REST API.
///
/// Callers use the plain `get`/`post`/`put`/`delete` methods and never see
/// token handling: a 401 triggers one refresh-and-replay cycle, and
/// concurrent 401s share a single refresh call through the coordinator.
pub struct NotesClient {
    http: reqwest::Client,
    base_url: String,
    store: Mutex<Box<dyn TokenStore>>,
    refresh: TokenRefreshCoordinator,
}

impl NotesClient {
    /// Build a client over the persisted config (the usual CLI path).
    pub fn from_config(config: Config) -> Self {
        let base_url = config.server_url();
        Self::with_store(base_url, Box::new(config))
    }

    /// Build a client over an explicit session store.
    pub fn with_store(base_url: impl Into<String>, store: Box<dyn TokenStore>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            store: Mutex::new(store),
            refresh: TokenRefreshCoordinator::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_session(&self) -> bool {
        self.store.lock().unwrap().get_access_token().is_some()
    }

    pub fn session_user(&self) -> Option<SessionUser> {
        self.store.lock().unwrap().get_user()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.lock().unwrap().get_refresh_token()
    }

    /// Persist a full token bundle (login/register response).
    pub fn save_session(&self, jwt: &JwtResponse, user: Option<SessionUser>) {
        let mut store = self.store.lock().unwrap();
        store.set_access_token(jwt.access_token.clone(), None);
        if let Some(ref refresh_token) = jwt.refresh_token {
            store.set_refresh_token(refresh_token.clone());
        }
        if let Some(user) = user {
            store.set_user(user);
        }
        if let Err(e) = store.persist() {
            tracing::warn!("Failed to persist session: {:#}", e);
        }
    }

    /// Drop the local session (logout, or irrecoverable refresh failure).
    pub fn clear_session(&self) {
        let mut store = self.store.lock().unwrap();
        store.clear_session();
        if let Err(e) = store.persist() {
            tracing::warn!("Failed to persist session removal: {:#}", e);
        }
    }

    // -- Request surface used by the resource modules --

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, &[], None).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, query, None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        self.request(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    /// POST where the envelope carries no payload (`data` is null).
    pub async fn post_empty(&self, path: &str, body: Option<&Value>) -> Result<(), ApiError> {
        let resp = self.execute(Method::POST, path, &[], body).await?;
        decode_empty(resp).await
    }

    pub async fn delete_empty(&self, path: &str) -> Result<(), ApiError> {
        let resp = self.execute(Method::DELETE, path, &[], None).await?;
        decode_empty(resp).await
    }

    /// Multipart POST. The form is rebuilt through the closure if the
    /// request is replayed after a token refresh.
    pub async fn post_multipart<T, F>(&self, path: &str, make_form: F) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::multipart::Form,
    {
        let resp = self.send_multipart(path, &make_form).await?;
        let resp = if resp.status() == StatusCode::UNAUTHORIZED {
            self.refresh_access_token().await?;
            let retry = self.send_multipart(path, &make_form).await?;
            if retry.status() == StatusCode::UNAUTHORIZED {
                return Err(ApiError::Unauthorized);
            }
            retry
        } else {
            resp
        };
        decode_data(resp).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let resp = self.execute(method, path, query, body).await?;
        decode_data(resp).await
    }

    /// Send a request, running the refresh-and-replay protocol on 401.
    ///
    /// Retry eligibility is structural: the initial send and the single
    /// replay are distinct calls, so a replayed request that fails with 401
    /// again errors out instead of starting another refresh cycle.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let resp = self.send_once(method.clone(), path, query, body).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        self.refresh_access_token().await?;
        tracing::debug!("Replaying {} {} after refresh", method, path);
        let retry = self.send_once(method, path, query, body).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        Ok(retry)
    }

    /// One attempt: attach the current bearer token (if any) and send.
    async fn send_once(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);

        let mut req = self.http.request(method, &url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = self.bearer_token() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        req.send().await.map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn send_multipart<F>(
        &self,
        path: &str,
        make_form: &F,
    ) -> Result<reqwest::Response, ApiError>
    where
        F: Fn() -> reqwest::multipart::Form,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {} (multipart)", url);

        let mut req = self.http.post(&url).multipart(make_form());
        if let Some(token) = self.bearer_token() {
            req = req.bearer_auth(token);
        }
        req.send().await.map_err(|e| ApiError::Network(e.to_string()))
    }

    fn bearer_token(&self) -> Option<String> {
        self.store
            .lock()
            .unwrap()
            .get_access_token()
            .map(|t| t.token)
    }

    /// Obtain a fresh access token, joining the in-flight refresh if one is
    /// already running so that exactly one refresh call serves all waiters.
    async fn refresh_access_token(&self) -> Result<String, RefreshError> {
        match self.refresh.join() {
            RefreshTicket::Leader => {
                let outcome = self.run_refresh().await;
                self.refresh.settle(outcome.clone());
                outcome
            }
            RefreshTicket::Follower(rx) => rx
                .await
                .unwrap_or_else(|_| Err(RefreshError::Network("refresh abandoned".to_string()))),
        }
    }

    /// Call the refresh endpoint and persist the outcome.
    ///
    /// A transport failure leaves the stored session intact; only a
    /// server-side rejection of the refresh token destroys it.
    async fn run_refresh(&self) -> Result<String, RefreshError> {
        let refresh_token = { self.store.lock().unwrap().get_refresh_token() };
        let refresh_token = match refresh_token {
            Some(t) => t,
            None => {
                self.clear_session();
                return Err(RefreshError::MissingToken);
            }
        };

        tracing::info!("Access token rejected, refreshing session...");
        let url = format!("{}/api/auth/refresh", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!("Refresh rejected with HTTP {}", status.as_u16());
            self.clear_session();
            return Err(RefreshError::Rejected);
        }

        let envelope: Envelope<JwtResponse> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) => {
                self.clear_session();
                return Err(RefreshError::Rejected);
            }
        };
        let jwt = match envelope {
            Envelope {
                code: 200,
                data: Some(jwt),
                ..
            } => jwt,
            Envelope { code, message, .. } => {
                tracing::warn!(
                    "Refresh rejected (code {}): {}",
                    code,
                    message.unwrap_or_default()
                );
                self.clear_session();
                return Err(RefreshError::Rejected);
            }
        };

        {
            let mut store = self.store.lock().unwrap();
            store.set_access_token(jwt.access_token.clone(), None);
            // Persist a rotated refresh token when the server sends one
            if let Some(ref rotated) = jwt.refresh_token {
                store.set_refresh_token(rotated.clone());
            }
            if let Err(e) = store.persist() {
                tracing::warn!("Failed to persist refreshed tokens: {:#}", e);
            }
        }
        tracing::info!("Session refreshed");
        Ok(jwt.access_token)
    }
}

/// Map a settled response to its envelope payload.
async fn decode_data<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let envelope: Envelope<T> = decode_envelope(resp).await?;
    match envelope {
        Envelope {
            code: 200,
            data: Some(data),
            ..
        } => Ok(data),
        Envelope { code: 200, .. } => Err(ApiError::Decode("missing data field".to_string())),
        Envelope { code, message, .. } => Err(ApiError::Api {
            code,
            message: message.unwrap_or_default(),
        }),
    }
}

/// Same as `decode_data` for endpoints whose envelope carries no payload.
async fn decode_empty(resp: reqwest::Response) -> Result<(), ApiError> {
    let envelope: Envelope<Value> = decode_envelope(resp).await?;
    match envelope.code {
        200 => Ok(()),
        code => Err(ApiError::Api {
            code,
            message: envelope.message.unwrap_or_default(),
        }),
    }
}

async fn decode_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<Envelope<T>, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Server {
            status: status.as_u16(),
            body,
        });
    }
    resp.json().await.map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn dead_endpoint() -> String {
        // Bind then drop a listener so the port is closed and connections
        // are refused immediately.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}", port)
    }

    #[tokio::test]
    async fn network_failure_during_refresh_keeps_session() {
        let store = MemoryTokenStore::with_tokens("acc", "ref");
        let client = NotesClient::with_store(dead_endpoint(), Box::new(store));

        let err = client.run_refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::Network(_)));
        // Session survives a transport failure so the caller can retry
        assert!(client.has_session());
        assert_eq!(client.refresh_token().as_deref(), Some("ref"));
    }

    #[tokio::test]
    async fn missing_refresh_token_clears_session() {
        let mut store = MemoryTokenStore::new();
        store.set_access_token("acc".to_string(), None);
        let client = NotesClient::with_store(dead_endpoint(), Box::new(store));

        let err = client.run_refresh().await.unwrap_err();
        assert!(matches!(err, RefreshError::MissingToken));
        assert!(!client.has_session());
    }

    #[tokio::test]
    async fn plain_request_failure_is_surfaced_as_network() {
        let store = MemoryTokenStore::with_tokens("acc", "ref");
        let client = NotesClient::with_store(dead_endpoint(), Box::new(store));

        let err = client.get::<Value>("/api/ping").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let client =
            NotesClient::with_store("http://example.test/", Box::new(MemoryTokenStore::new()));
        assert_eq!(client.base_url(), "http://example.test");
    }
}
