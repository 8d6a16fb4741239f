//! Media URL resolution
//!
//! Notes reference media by relative object paths. Resolution either joins
//! the configured storage base URL or asks the backend for a presigned URL,
//! and memoizes the result until it expires.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::api::NotesClient;
use crate::config::Config;

/// Nominal lifetime of resolved URLs, in seconds.
const URL_EXPIRATION_SECS: u64 = 3600;

#[derive(Debug, Clone)]
struct CachedUrl {
    url: String,
    expires_at: Instant,
}

/// Resolves relative media paths to fetchable URLs with an expiring memo.
pub struct MediaResolver {
    base_url: String,
    bucket: String,
    use_presigned: bool,
    cache: Mutex<HashMap<String, CachedUrl>>,
}

/// Returns true for storage-relative paths (as opposed to full URLs).
pub fn is_relative_path(path: &str) -> bool {
    let path = path.trim();
    if path.is_empty() {
        return false;
    }
    if path.starts_with("//") {
        return false;
    }
    if path.starts_with('/') {
        return true;
    }
    let lower = path.to_ascii_lowercase();
    !(lower.starts_with("http://") || lower.starts_with("https://"))
}

#[derive(Debug, Deserialize)]
struct PresignedUrl {
    url: String,
}

impl MediaResolver {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.media_base_url(),
            config.bucket_name.clone(),
            config.use_presigned_url,
        )
    }

    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>, use_presigned: bool) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            bucket: bucket.into(),
            use_presigned,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Normalize a relative path to `/<bucket>/...` form.
    fn clean_path(&self, path: &str) -> String {
        let mut clean = path.trim().to_string();
        if !clean.starts_with('/') {
            clean.insert(0, '/');
        }
        let bucket_prefix = format!("/{}", self.bucket);
        if !clean.starts_with(&bucket_prefix) {
            clean = format!("{}{}", bucket_prefix, clean);
        }
        clean
    }

    fn joined_url(&self, clean: &str) -> String {
        format!("{}{}", self.base_url, clean)
    }

    fn cached(&self, clean: &str) -> Option<String> {
        let cache = self.cache.lock().unwrap();
        cache.get(clean).and_then(|entry| {
            if entry.expires_at > Instant::now() {
                Some(entry.url.clone())
            } else {
                None
            }
        })
    }

    fn remember(&self, clean: String, url: String, ttl: Duration) {
        let mut cache = self.cache.lock().unwrap();
        cache.insert(
            clean,
            CachedUrl {
                url,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Resolve a media path to a full URL.
    ///
    /// Absolute URLs pass through unchanged. Resolution failures fall back
    /// to the joined base URL, so this never fails outright.
    pub async fn resolve(&self, client: &NotesClient, path: &str) -> String {
        if !is_relative_path(path) {
            return path.trim().to_string();
        }

        let clean = self.clean_path(path);
        if let Some(url) = self.cached(&clean) {
            return url;
        }

        if !self.use_presigned {
            let url = self.joined_url(&clean);
            self.remember(clean, url.clone(), Duration::from_secs(URL_EXPIRATION_SECS));
            return url;
        }

        match client
            .get_query::<PresignedUrl>("/api/upload/presigned-url", &[("path", clean.clone())])
            .await
        {
            Ok(presigned) => {
                // Cache for less than the presigned lifetime so entries
                // expire before the URL itself does.
                let ttl = Duration::from_secs(URL_EXPIRATION_SECS * 9 / 10);
                self.remember(clean, presigned.url.clone(), ttl);
                presigned.url
            }
            Err(e) => {
                tracing::warn!("Presigned URL lookup failed for {}: {:#}", clean, e);
                self.joined_url(&clean)
            }
        }
    }

    /// Resolve a batch of paths concurrently, skipping empty entries.
    pub async fn resolve_many(&self, client: &NotesClient, paths: &[String]) -> Vec<String> {
        let pending = paths
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| self.resolve(client, p));
        futures::future::join_all(pending).await
    }

    /// Drop one cached entry, or everything when `path` is None.
    pub fn clear_cache(&self, path: Option<&str>) {
        match path {
            Some(path) => {
                let clean = self.clean_path(path);
                self.cache.lock().unwrap().remove(&clean);
            }
            None => self.cache.lock().unwrap().clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;

    fn resolver() -> MediaResolver {
        MediaResolver::new("http://media.test:9000", "travel-notes", false)
    }

    fn offline_client() -> NotesClient {
        // Bind then drop a listener so the port refuses connections
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        NotesClient::with_store(
            format!("http://127.0.0.1:{}", port),
            Box::new(MemoryTokenStore::new()),
        )
    }

    #[test]
    fn relative_path_detection() {
        assert!(is_relative_path("/covers/1.jpg"));
        assert!(is_relative_path("covers/1.jpg"));
        assert!(!is_relative_path("http://host/covers/1.jpg"));
        assert!(!is_relative_path("HTTPS://host/x.png"));
        assert!(!is_relative_path("//cdn.example/x.png"));
        assert!(!is_relative_path(""));
        assert!(!is_relative_path("   "));
    }

    #[test]
    fn clean_path_prefixes_bucket_once() {
        let r = resolver();
        assert_eq!(r.clean_path("covers/1.jpg"), "/travel-notes/covers/1.jpg");
        assert_eq!(r.clean_path("/covers/1.jpg"), "/travel-notes/covers/1.jpg");
        assert_eq!(
            r.clean_path("/travel-notes/covers/1.jpg"),
            "/travel-notes/covers/1.jpg"
        );
    }

    #[tokio::test]
    async fn absolute_urls_pass_through() {
        let r = resolver();
        let client = offline_client();
        let url = r.resolve(&client, "https://cdn.example/a.jpg").await;
        assert_eq!(url, "https://cdn.example/a.jpg");
    }

    #[tokio::test]
    async fn direct_join_is_cached() {
        let r = resolver();
        let client = offline_client();

        let url = r.resolve(&client, "/covers/1.jpg").await;
        assert_eq!(url, "http://media.test:9000/travel-notes/covers/1.jpg");
        assert_eq!(r.cached("/travel-notes/covers/1.jpg"), Some(url));
    }

    #[tokio::test]
    async fn presigned_failure_falls_back_to_joined_url() {
        // Presigned lookups against an unreachable backend fall back
        let r = MediaResolver::new("http://media.test:9000", "travel-notes", true);
        let client = offline_client();

        let url = r.resolve(&client, "/covers/1.jpg").await;
        assert_eq!(url, "http://media.test:9000/travel-notes/covers/1.jpg");
    }

    #[tokio::test]
    async fn expired_entries_are_re_resolved() {
        let r = resolver();
        let client = offline_client();

        r.remember(
            "/travel-notes/covers/1.jpg".to_string(),
            "http://stale.test/old".to_string(),
            Duration::from_secs(0),
        );
        let url = r.resolve(&client, "/covers/1.jpg").await;
        assert_eq!(url, "http://media.test:9000/travel-notes/covers/1.jpg");
    }

    #[tokio::test]
    async fn clear_cache_single_and_all() {
        let r = resolver();
        let client = offline_client();

        r.resolve(&client, "/covers/1.jpg").await;
        r.resolve(&client, "/covers/2.jpg").await;

        r.clear_cache(Some("covers/1.jpg"));
        assert!(r.cached("/travel-notes/covers/1.jpg").is_none());
        assert!(r.cached("/travel-notes/covers/2.jpg").is_some());

        r.clear_cache(None);
        assert!(r.cached("/travel-notes/covers/2.jpg").is_none());
    }

    #[tokio::test]
    async fn resolve_many_skips_blank_paths() {
        let r = resolver();
        let client = offline_client();
        let urls = r
            .resolve_many(
                &client,
                &["/a.jpg".to_string(), "  ".to_string(), "/b.jpg".to_string()],
            )
            .await;
        assert_eq!(urls.len(), 2);
    }
}
