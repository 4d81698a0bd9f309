use crate::error::{LithiumError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;

/// Retrieves the raw bytes behind a URL.
///
/// Implementors handle exactly one transport. A [`FetcherRegistry`] picks the
/// implementor by URL scheme.
///
/// # Examples
///
/// ```no_run
/// use lithium_core::{Fetcher, FetcherRegistry};
/// use async_trait::async_trait;
/// use bytes::Bytes;
/// use std::sync::Arc;
///
/// struct Static;
///
/// #[async_trait]
/// impl Fetcher for Static {
///     async fn fetch(&self, _url: &str) -> lithium_core::Result<Bytes> {
///         Ok(Bytes::from_static(b"content"))
///     }
/// }
///
/// let mut registry = FetcherRegistry::new();
/// registry.register("mem", Arc::new(Static));
/// ```
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`.
    ///
    /// # Errors
    ///
    /// Any response other than a success is [`LithiumError::FetchFailure`].
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// Fetches over HTTP(S) with a shared reqwest client.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| LithiumError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(LithiumError::FetchFailure {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(|source| LithiumError::Http {
            url: url.to_string(),
            source,
        })
    }
}

/// Reads `file://` URLs from the local filesystem.
#[derive(Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl Fetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let path = url
            .strip_prefix("file://")
            .ok_or_else(|| LithiumError::InvalidUrl(url.to_string()))?;

        match tokio::fs::read(path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LithiumError::FetchFailure {
                    url: url.to_string(),
                    status: 404,
                })
            }
            Err(e) => Err(LithiumError::Io(e)),
        }
    }
}

/// Scheme name to fetch capability.
#[derive(Clone, Default)]
pub struct FetcherRegistry {
    fetchers: HashMap<String, Arc<dyn Fetcher>>,
}

impl FetcherRegistry {
    /// Creates an empty registry. Every fetch fails until a scheme is registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `http`, `https` and `file` handlers.
    pub fn with_defaults() -> Self {
        let http: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new());
        let mut registry = Self::new();
        registry.register("http", Arc::clone(&http));
        registry.register("https", http);
        registry.register("file", Arc::new(FileFetcher));
        registry
    }

    /// Registers `fetcher` for `scheme`, replacing any previous handler.
    pub fn register(&mut self, scheme: &str, fetcher: Arc<dyn Fetcher>) {
        self.fetchers.insert(scheme.to_ascii_lowercase(), fetcher);
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.fetchers.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Dispatches `url` to the fetcher registered for its scheme.
    ///
    /// # Errors
    ///
    /// - [`LithiumError::InvalidUrl`] if the URL has no `scheme://` prefix
    /// - [`LithiumError::UnsupportedScheme`] if no fetcher is registered
    /// - whatever the selected fetcher reports
    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        let scheme = scheme_of(url).ok_or_else(|| LithiumError::InvalidUrl(url.to_string()))?;
        let fetcher = self
            .fetchers
            .get(&scheme.to_ascii_lowercase())
            .ok_or_else(|| LithiumError::UnsupportedScheme {
                scheme: scheme.to_string(),
            })?;
        fetcher.fetch(url).await
    }
}

fn scheme_of(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once("://")?;
    if scheme.is_empty() {
        None
    } else {
        Some(scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_of() {
        assert_eq!(scheme_of("https://repo/x.jar"), Some("https"));
        assert_eq!(scheme_of("file:///tmp/x.jar"), Some("file"));
        assert_eq!(scheme_of("/tmp/x.jar"), None);
        assert_eq!(scheme_of("://x"), None);
    }

    #[test]
    fn test_default_schemes() {
        let registry = FetcherRegistry::with_defaults();
        assert!(registry.supports("http"));
        assert!(registry.supports("HTTPS"));
        assert!(registry.supports("file"));
        assert!(!registry.supports("ftp"));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let registry = FetcherRegistry::with_defaults();
        let err = registry.fetch("ftp://mirror/x.jar").await.unwrap_err();
        assert!(matches!(err, LithiumError::UnsupportedScheme { ref scheme } if scheme == "ftp"));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let registry = FetcherRegistry::with_defaults();
        let err = registry.fetch("not-a-url").await.unwrap_err();
        assert!(matches!(err, LithiumError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_file_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jar");
        std::fs::write(&path, b"jar bytes").unwrap();

        let registry = FetcherRegistry::with_defaults();
        let url = format!("file://{}", path.display());
        let content = registry.fetch(&url).await.unwrap();
        assert_eq!(content.as_ref(), b"jar bytes");

        let missing = format!("file://{}", dir.path().join("b.jar").display());
        let err = registry.fetch(&missing).await.unwrap_err();
        assert!(matches!(err, LithiumError::FetchFailure { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_http_fetcher_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/a/b.jar")
            .with_status(200)
            .with_body("payload")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new();
        let content = fetcher
            .fetch(&format!("{}/a/b.jar", server.url()))
            .await
            .unwrap();
        assert_eq!(content.as_ref(), b"payload");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_fetcher_non_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.jar")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new();
        let err = fetcher
            .fetch(&format!("{}/missing.jar", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, LithiumError::FetchFailure { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_custom_scheme() {
        struct Fixed;

        #[async_trait]
        impl Fetcher for Fixed {
            async fn fetch(&self, _url: &str) -> Result<Bytes> {
                Ok(Bytes::from_static(b"fixed"))
            }
        }

        let mut registry = FetcherRegistry::new();
        registry.register("mem", Arc::new(Fixed));
        let content = registry.fetch("mem://anything").await.unwrap();
        assert_eq!(content.as_ref(), b"fixed");
    }
}
