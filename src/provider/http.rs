//! HttpProvider - Ethereum JSON-RPC 2.0 over HTTP
//!
//! For nodes that hold unlocked accounts (hardhat, anvil). `eth_requestAccounts`
//! is answered by the node itself; there is no user prompt on this path.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::Provider;
use crate::error::ProviderError;

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::disconnected(format!("http client: {}", e)))?;
        Ok(Self { client, url: url.into(), next_id: AtomicU64::new(1) })
    }

    pub fn url(&self) -> &str { &self.url }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        tracing::debug!(id, method, url = %self.url, "json-rpc request");

        let response = self.client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::disconnected(format!("{}: {}", self.url, e)))?;
        let status = response.status();
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::internal(format!("{} returned {}: {}", self.url, status, e)))?;

        match (parsed.error, parsed.result) {
            (Some(err), _) => Err(ProviderError::new(err.code, err.message)),
            (None, Some(result)) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}
