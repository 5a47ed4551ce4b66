//! HTTP client for the simulator's external interface
//!
//! The simulator serves `GET /get/{path}`, `PATCH /set/{path}?Value=v` and
//! `GET /list/{path}` on localhost. Every request carries the comm key in the
//! `DTGCommKey` header. Responses are JSON:
//!
//! ```json
//! {"Result": "Success", "Values": {"Value": 0.5}}
//! ```
//!
//! Any `Result` other than `Success` is reported as [`SimulatorError::Rejected`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{NodeTree, SimValue, SimulatorClient, SimulatorError, SimulatorResult};

pub const COMM_KEY_HEADER: &str = "DTGCommKey";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:31270";
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Connection settings for [`HttpSimulatorClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    pub base_url: String,
    /// Comm key given inline. Takes precedence over `comm_key_path`.
    pub comm_key: Option<String>,
    /// File the simulator writes its comm key to.
    pub comm_key_path: Option<PathBuf>,
    pub timeout_ms: u64,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            comm_key: None,
            comm_key_path: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SimulatorSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_comm_key(mut self, key: impl Into<String>) -> Self {
        self.comm_key = Some(key.into());
        self
    }

    pub fn with_comm_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.comm_key_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Resolve the comm key, reading `comm_key_path` if no inline key is set.
    pub async fn resolve_comm_key(&self) -> SimulatorResult<String> {
        if let Some(key) = &self.comm_key {
            return Ok(key.trim().to_string());
        }
        match &self.comm_key_path {
            Some(path) => read_comm_key(path).await,
            None => Err(SimulatorError::NotConfigured(
                "no comm key or comm key path configured".to_string(),
            )),
        }
    }
}

/// Read the comm key the simulator writes on startup.
pub async fn read_comm_key(path: &Path) -> SimulatorResult<String> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        SimulatorError::NotConfigured(format!(
            "failed to read comm key from {}: {e}",
            path.display()
        ))
    })?;
    let key = contents.trim();
    if key.is_empty() {
        return Err(SimulatorError::NotConfigured(format!(
            "comm key file {} is empty",
            path.display()
        )));
    }
    Ok(key.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope {
    result: String,
    #[serde(default)]
    values: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// [`SimulatorClient`] over the simulator's HTTP interface.
#[derive(Debug, Clone)]
pub struct HttpSimulatorClient {
    client: Client,
    base_url: String,
    comm_key: String,
}

impl HttpSimulatorClient {
    pub fn new(
        base_url: impl Into<String>,
        comm_key: impl Into<String>,
        timeout: Duration,
    ) -> SimulatorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tswio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                SimulatorError::NotConfigured(format!("failed to create HTTP client: {e}"))
            })?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(SimulatorError::NotConfigured("empty base URL".to_string()));
        }
        Ok(Self {
            client,
            base_url,
            comm_key: comm_key.into(),
        })
    }

    pub async fn from_settings(settings: &SimulatorSettings) -> SimulatorResult<Self> {
        let comm_key = settings.resolve_comm_key().await?;
        Self::new(
            settings.base_url.clone(),
            comm_key,
            Duration::from_millis(settings.timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, action: &str, path: &str) -> RequestBuilder {
        let url = format!("{}/{action}/{}", self.base_url, path.trim_start_matches('/'));
        self.client
            .request(method, url)
            .header(COMM_KEY_HEADER, &self.comm_key)
    }

    async fn execute(&self, path: &str, request: RequestBuilder) -> SimulatorResult<Envelope> {
        let response = request
            .send()
            .await
            .map_err(|e| SimulatorError::request(path, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SimulatorError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| SimulatorError::invalid_response(path, e.to_string()))?;

        if envelope.result != "Success" {
            return Err(SimulatorError::Rejected {
                path: path.to_string(),
                message: envelope.message.unwrap_or(envelope.result),
            });
        }
        Ok(envelope)
    }
}

#[async_trait]
impl SimulatorClient for HttpSimulatorClient {
    async fn get(&self, path: &str) -> SimulatorResult<SimValue> {
        trace!(path, "simulator get");
        let envelope = self.execute(path, self.request(Method::GET, "get", path)).await?;
        // Single-valued endpoints name their value differently; take the
        // conventional key if present, else the first one.
        let value = envelope
            .values
            .get("Value")
            .or_else(|| envelope.values.values().next())
            .ok_or_else(|| SimulatorError::invalid_response(path, "response has no values"))?;
        Ok(SimValue::from_json(value))
    }

    async fn set(&self, path: &str, value: f64) -> SimulatorResult<()> {
        debug!(path, value, "simulator set");
        let request = self
            .request(Method::PATCH, "set", path)
            .query(&[("Value", value.to_string())]);
        self.execute(path, request).await?;
        Ok(())
    }

    async fn list(&self, path: &str) -> SimulatorResult<NodeTree> {
        trace!(path, "simulator list");
        let response = self
            .request(Method::GET, "list", path)
            .send()
            .await
            .map_err(|e| SimulatorError::request(path, e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SimulatorError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SimulatorError::invalid_response(path, e.to_string()))?;

        let result = body.get("Result").and_then(|r| r.as_str()).unwrap_or_default();
        if result != "Success" {
            let message = body
                .get("Message")
                .and_then(|m| m.as_str())
                .unwrap_or(result)
                .to_string();
            return Err(SimulatorError::Rejected {
                path: path.to_string(),
                message,
            });
        }
        serde_json::from_value(body).map_err(|e| SimulatorError::invalid_response(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = SimulatorSettings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(settings.comm_key.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash() -> SimulatorResult<()> {
        let client = HttpSimulatorClient::new("http://localhost:31270/", "key", Duration::from_secs(1))?;
        assert_eq!(client.base_url(), "http://localhost:31270");
        Ok(())
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let result = HttpSimulatorClient::new("", "key", Duration::from_secs(1));
        assert!(matches!(result, Err(SimulatorError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_missing_comm_key() {
        let result = SimulatorSettings::default().resolve_comm_key().await;
        assert!(matches!(result, Err(SimulatorError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_comm_key_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("CommAPIKey.txt");
        std::fs::write(&path, "abc123\n")?;
        let settings = SimulatorSettings::default().with_comm_key_path(&path);
        assert_eq!(settings.resolve_comm_key().await?, "abc123");
        Ok(())
    }

    #[tokio::test]
    async fn test_inline_comm_key_wins() -> SimulatorResult<()> {
        let settings = SimulatorSettings::default()
            .with_comm_key("inline")
            .with_comm_key_path("/nonexistent/CommAPIKey.txt");
        assert_eq!(settings.resolve_comm_key().await?, "inline");
        Ok(())
    }
}
