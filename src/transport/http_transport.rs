use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::config::ServerConfig;
use crate::error::ArchitectError;

const PARSED_ENDPOINT_CACHE_MAX_ENTRIES: usize = 64;

fn build_reqwest_client(config: &ServerConfig) -> Result<reqwest::Client, ArchitectError> {
    let pool_idle_timeout = if config.http_pool_idle_timeout_secs == 0 {
        None
    } else {
        Some(Duration::from_secs(config.http_pool_idle_timeout_secs))
    };

    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(config.http_pool_max_idle_per_host)
        .pool_idle_timeout(pool_idle_timeout)
        .tcp_nodelay(true)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .redirect(reqwest::redirect::Policy::none());

    if config.timeout > 0 {
        builder = builder.timeout(Duration::from_secs(config.timeout));
    }
    if !config.http_use_env_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|err| ArchitectError::Transport(format!("Failed to build HTTP client: {err}")))
}

/// HTTP client for provider streaming calls.
///
/// One pooled client is shared by every generation; each call still owns its
/// own connection and response body. There are no retries here: a failed
/// call is reported to the caller, who may start a fresh one.
pub struct HttpTransport {
    client: reqwest::Client,
    parsed_url_cache: RwLock<FxHashMap<String, Arc<url::Url>>>,
}

impl HttpTransport {
    /// Create a transport with pooling and timeouts from the given server config.
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        let client = match build_reqwest_client(config) {
            Ok(client) => client,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    "failed to build configured reqwest client, falling back to default client"
                );
                reqwest::Client::new()
            }
        };
        Self {
            client,
            parsed_url_cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Parse `url`, reusing earlier parses of the same string.
    ///
    /// Only credential-free URLs should go through this cache.
    ///
    /// # Errors
    ///
    /// Returns [`ArchitectError::InvalidRequest`] when the URL does not parse.
    pub fn parsed_url(&self, url: &str) -> Result<Arc<url::Url>, ArchitectError> {
        if let Some(cached) = self.parsed_url_cache.read().get(url) {
            return Ok(cached.clone());
        }

        let parsed = url::Url::parse(url)
            .map_err(|e| ArchitectError::InvalidRequest(format!("Invalid endpoint URL: {e}")))?;

        let mut cache = self.parsed_url_cache.write();
        if let Some(existing) = cache.get(url) {
            return Ok(existing.clone());
        }
        if cache.len() >= PARSED_ENDPOINT_CACHE_MAX_ENTRIES {
            cache.clear();
        }
        let parsed = Arc::new(parsed);
        cache.insert(url.to_string(), parsed.clone());
        Ok(parsed)
    }

    /// POST `body` and return the response once a 2xx status has arrived.
    ///
    /// The caller reads the body as a stream and owns the connection until
    /// the response is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ArchitectError::Transport`] when the request cannot be sent,
    /// or [`ArchitectError::ProviderHttp`] with the status and body text for
    /// any non-2xx response.
    pub async fn open_stream(
        &self,
        url: &url::Url,
        headers: &http::HeaderMap,
        body: bytes::Bytes,
    ) -> Result<reqwest::Response, ArchitectError> {
        let mut request = reqwest::Request::new(http::Method::POST, url.clone());
        *request.headers_mut() = headers.clone();
        *request.body_mut() = Some(reqwest::Body::from(body));

        // Gemini URLs carry the credential; keep them out of error text.
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| ArchitectError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.map_err(|err| {
            ArchitectError::Transport(format!(
                "Failed to read error body: {}",
                err.without_url()
            ))
        })?;
        tracing::warn!(
            status = status.as_u16(),
            body_len = body.len(),
            "provider rejected streaming request"
        );
        Err(ArchitectError::ProviderHttp {
            status: status.as_u16(),
            body,
        })
    }
}
