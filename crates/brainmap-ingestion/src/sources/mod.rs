//! Atlas source clients.

pub mod allen;

pub use allen::AllenClient;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use brainmap_common::{AtlasError, Result};
use reqwest::{Client, ClientBuilder};

/// Allen Brain Atlas API root.
pub const ALLEN_API_URL: &str = "https://api.brain-map.org/api/v2/";

/// Request/response seam in front of the atlas REST API.
#[async_trait]
pub trait AtlasTransport: Send + Sync {
    /// GET `path` (relative to the API root, query string included) and parse the body as JSON.
    async fn get_json(&self, path: &str) -> Result<serde_json::Value>;
}

// ── reqwest transport ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("brainmap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AtlasTransport for HttpTransport {
    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path.trim_start_matches('/'));

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AtlasError::Status { url, status: status.as_u16() });
        }

        Ok(resp.json::<serde_json::Value>().await?)
    }
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Canned responses keyed by request path. Unknown paths answer HTTP 404.
#[derive(Default)]
pub struct MockTransport {
    responses: HashMap<String, serde_json::Value>,
    failures: HashMap<String, u16>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, body: serde_json::Value) -> Self {
        self.responses.insert(path.to_string(), body);
        self
    }

    pub fn with_status(mut self, path: &str, status: u16) -> Self {
        self.failures.insert(path.to_string(), status);
        self
    }

    /// Paths requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AtlasTransport for MockTransport {
    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(path.to_string());
        }

        if let Some(&status) = self.failures.get(path) {
            return Err(AtlasError::Status { url: path.to_string(), status });
        }

        self.responses
            .get(path)
            .cloned()
            .ok_or_else(|| AtlasError::Status { url: path.to_string(), status: 404 })
    }
}
