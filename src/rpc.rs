//! JSON-RPC 2.0 plumbing
//!
//! [`RpcClient`] wraps every call in the JSON-RPC envelope, tags it with a
//! request id and unwraps the response. The actual exchange is delegated to a
//! [`Transport`], which is HTTP in production and scripted in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Executes one JSON-RPC exchange
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &RpcRequest) -> Result<RpcResponse>;
}

/// HTTP transport backed by reqwest (reqwest::Client is internally Arc-based)
#[derive(Clone, Debug)]
pub struct HttpTransport {
    url: String,
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http_client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &RpcRequest) -> Result<RpcResponse> {
        let response = self
            .http_client
            .post(&self.url)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                log::error!("   ❌ HTTP request failed: {}", e);
                Error::Transport {
                    method: request.method.clone(),
                    source: e,
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            log::error!("   ❌ HTTP error: {} for {}", status, request.method);
            return Err(Error::HttpStatus {
                method: request.method.clone(),
                status: status.as_u16(),
            });
        }

        response.json().await.map_err(|e| Error::Transport {
            method: request.method.clone(),
            source: e,
        })
    }
}

/// JSON-RPC client shared by every typed Soroban call
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self::new(Arc::new(HttpTransport::new(url)))
    }

    /// Reserve the next request id; safe under concurrent use
    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Build the request envelope for a call
    pub fn request<P: Serialize>(&self, method: &str, params: Option<&P>) -> Result<RpcRequest> {
        let params = params.map(serde_json::to_value).transpose()?;
        Ok(RpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id: self.next_request_id(),
        })
    }

    /// Call `method` and deserialize its result
    pub async fn call<P, R>(&self, method: &str, params: Option<&P>) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = self.request(method, params)?;
        log::debug!("   ➡️  {} (id {})", method, request.id);

        let response = self.transport.execute(&request).await?;

        if let Some(error) = response.error {
            log::error!("   ❌ {} returned error {}: {}", method, error.code, error.message);
            return Err(Error::Rpc {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        let result = response.result.ok_or_else(|| Error::EmptyResult {
            method: method.to_string(),
        })?;

        Ok(serde_json::from_value(result)?)
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}
