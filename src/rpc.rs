//! JSON-RPC 2.0 over HTTP
//!
//! Shared transport for the node (contract reads, wallet requests) and the
//! indexing service, which speaks the same protocol.

use crate::error::RemoteError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

pub struct JsonRpcClient {
    url: String,
    /// reqwest::Client is internally Arc-based
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and decode its `result`
    ///
    /// A JSON-RPC error object becomes a [`RemoteError`] carrying its code.
    /// A missing or null result decodes as JSON `null`, so `Option<T>` results
    /// come back as `None`.
    pub async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, RemoteError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        log::debug!("RPC #{} -> {}", id, method);
        let response = self.http.post(&self.url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RemoteError::transport(format!(
                "{} returned HTTP {}: {}",
                method, status, text
            )));
        }

        let decoded: RpcResponse = response.json().await?;
        if let Some(err) = decoded.error {
            log::debug!("RPC #{} <- error {}: {}", id, err.code, err.message);
            return Err(RemoteError::new(err.code, err.message));
        }

        Ok(serde_json::from_value(decoded.result.unwrap_or(Value::Null))?)
    }
}
