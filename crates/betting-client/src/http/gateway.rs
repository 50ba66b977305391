//! HTTP gateway for the betting mock API
//!
//! Every call returns `{status, ok, body}`. The body is the parsed JSON or an
//! empty object when the response is empty or not JSON; only transport
//! failures are reported as errors.
//!
//! One reqwest client is built lazily on first use and reused for every call
//! made through the same gateway.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use super::auth::normalize_token_header;
use crate::error::ClientError;
use crate::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Per-request options
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub json: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a query parameter only when a value is present
    pub fn query_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.query(name, v),
            _ => self,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }
}

/// Response as seen by the domain client
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    /// True iff status is 2xx
    pub ok: bool,
    /// Parsed JSON, or `{}` when the body is not JSON
    pub body: Value,
}

impl ApiResponse {
    fn from_parts(status: u16, raw: &[u8]) -> Self {
        Self {
            status,
            ok: (200..300).contains(&status),
            body: parse_body(raw),
        }
    }
}

/// Parse a response body, degrading to an empty object
pub fn parse_body(raw: &[u8]) -> Value {
    serde_json::from_slice(raw).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Gateway over a single reusable HTTP client
pub struct HttpGateway {
    base_url: String,
    timeout: Duration,
    client: OnceCell<Client>,
}

impl HttpGateway {
    /// Create a gateway for the public mock service
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a gateway with custom base URL
    pub fn with_base_url(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Create a gateway with custom base URL and per-request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: OnceCell::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the underlying client has been built yet
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    pub async fn get(&self, path: &str, opts: RequestOptions) -> Result<ApiResponse, ClientError> {
        self.send(Method::GET, path, opts).await
    }

    pub async fn post(&self, path: &str, opts: RequestOptions) -> Result<ApiResponse, ClientError> {
        self.send(Method::POST, path, opts).await
    }

    async fn client(&self) -> Result<&Client, ClientError> {
        self.client
            .get_or_try_init(|| async {
                debug!("Building HTTP client for {}", self.base_url);
                Client::builder().timeout(self.timeout).build().map_err(ClientError::ClientBuild)
            })
            .await
    }

    fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        mut opts: RequestOptions,
    ) -> Result<ApiResponse, ClientError> {
        let client = self.client().await?;
        let url = self.url(path, &opts.query)?;
        normalize_token_header(&mut opts.headers);

        debug!("{} {}", method, url);

        let mut request = client.request(method.clone(), url);
        for (name, value) in &opts.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &opts.json {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| ClientError::Transport {
            method: method.clone(),
            path: path.to_string(),
            source,
        })?;

        let status = response.status().as_u16();
        let raw = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                debug!("Failed to read body for {} {}: {}", method, path, e);
                Vec::new()
            }
        };

        let parsed = ApiResponse::from_parts(status, &raw);
        debug!("{} {} -> HTTP {}", method, path, parsed.status);
        Ok(parsed)
    }
}

impl Default for HttpGateway {
    fn default() -> Self {
        Self::new()
    }
}
