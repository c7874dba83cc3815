//! JSON-RPC transport for execution layer nodes.

use std::{
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
};

use alloy_primitives::{U64, U256};
use alloy_rpc_types_eth::{BlockNumberOrTag, Header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use crate::error::{Error, Result};

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// Cumulative difficulty of a block, decoded without the rest of the block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalDifficulty {
    total_difficulty: U256,
}

/// Request/response connection to a single execution layer node.
///
/// Implementors only provide [`Transport::request`]; the typed helpers are
/// built on top of it.
pub trait Transport: Send + Sync {
    /// Call `method` with `params` and decode the `result` field.
    ///
    /// Returns `None` if the RPC response has a null `result`.
    fn request<P, R>(
        &self,
        method: &'static str,
        params: P,
    ) -> impl Future<Output = Result<Option<R>>> + Send
    where
        P: Serialize + Send,
        R: DeserializeOwned + Send;

    /// Fetch the header of a block by number or tag.
    fn header_by_number(
        &self,
        block: BlockNumberOrTag,
    ) -> impl Future<Output = Result<Header>> + Send {
        async move {
            self.request::<_, Header>("eth_getBlockByNumber", (block, false))
                .await?
                .ok_or_else(|| Error::NotFound {
                    block: block.to_string(),
                })
        }
    }

    /// Fetch the cumulative total difficulty of a block.
    fn total_difficulty(
        &self,
        block: BlockNumberOrTag,
    ) -> impl Future<Output = Result<U256>> + Send {
        async move {
            self.request::<_, TotalDifficulty>("eth_getBlockByNumber", (block, false))
                .await?
                .map(|td| td.total_difficulty)
                .ok_or_else(|| Error::NotFound {
                    block: block.to_string(),
                })
        }
    }

    /// Fetch the number of the most recent block.
    fn block_number(&self) -> impl Future<Output = Result<u64>> + Send {
        async move {
            let number = self
                .request::<_, U64>("eth_blockNumber", ())
                .await?
                .ok_or(Error::NullResult {
                    method: "eth_blockNumber",
                })?;
            Ok(number.to())
        }
    }

    /// Fetch the node's client version string.
    fn client_version(&self) -> impl Future<Output = Result<String>> + Send {
        async move {
            self.request::<_, String>("web3_clientVersion", ())
                .await?
                .ok_or(Error::NullResult {
                    method: "web3_clientVersion",
                })
        }
    }
}

/// JSON-RPC over HTTP.
#[derive(Debug)]
pub struct HttpTransport {
    url: Url,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Set up an HTTP transport to `url`.
    ///
    /// No request is sent; connections are opened lazily by the pool.
    pub fn dial(url: Url) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Connection(format!(
                "unsupported scheme `{}` in {url}",
                url.scheme()
            )));
        }

        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url,
            http_client,
            next_id: AtomicU64::new(1),
        })
    }
}

impl Transport for HttpTransport {
    /// Serializes the request, sends it to the endpoint, and deserializes the response.
    async fn request<P, R>(&self, method: &'static str, params: P) -> Result<Option<R>>
    where
        P: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self
            .http_client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Rpc {
                code: response.status().as_u16() as i64,
                message: response.text().await.unwrap_or_default(),
            });
        }

        let rpc_response: JsonRpcResponse<R> = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(Error::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(rpc_response.result)
    }
}
