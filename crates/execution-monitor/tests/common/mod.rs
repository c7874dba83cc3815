//! In-memory execution layer node used by the integration tests.

#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use alloy_primitives::{B64, B256, U64, U256};
use execution_monitor::{
    BlockNumberOrTag, ClientType, Error, ExecutionClient, Header, Result, Transport,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

pub const GENESIS_TIMESTAMP: u64 = 1_600_000_000;
pub const BLOCK_TIME: u64 = 12;

/// Chain served by [`FakeTransport`], with call accounting.
pub struct FakeNode {
    headers: Vec<Header>,
    client_version: Option<String>,
    delay: Duration,
    failing_block: Mutex<Option<u64>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeNode {
    /// Build a chain whose block `n` has per-block difficulty `difficulties[n]`.
    pub fn new(difficulties: &[u64]) -> Self {
        let mut total = U256::ZERO;
        let headers = difficulties
            .iter()
            .enumerate()
            .map(|(number, difficulty)| {
                let number = number as u64;
                total += U256::from(*difficulty);
                Header {
                    hash: B256::with_last_byte(number as u8),
                    inner: alloy_consensus::Header {
                        number,
                        timestamp: block_timestamp(number),
                        difficulty: U256::from(*difficulty),
                        gas_used: 21_000 * number,
                        base_fee_per_gas: Some(1_000_000_000 + number),
                        mix_hash: B256::with_last_byte(0xaa),
                        nonce: B64::new(number.to_be_bytes()),
                        ..Default::default()
                    },
                    total_difficulty: Some(total),
                    size: None,
                }
            })
            .collect();

        Self {
            headers,
            client_version: Some("Geth/v1.10.23-stable/linux-amd64/go1.18.5".to_string()),
            delay: Duration::from_millis(1),
            failing_block: Mutex::new(None),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_client_version(mut self, version: Option<&str>) -> Self {
        self.client_version = version.map(str::to_string);
        self
    }

    pub fn header_mut(&mut self, number: u64) -> &mut Header {
        &mut self.headers[number as usize]
    }

    /// Make requests for `block` fail with an RPC error.
    pub fn fail_block(&self, block: Option<u64>) {
        *self.failing_block.lock().unwrap() = block;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn head(&self) -> u64 {
        self.headers.len() as u64 - 1
    }

    /// Total difficulty at the head of the chain.
    pub fn total_difficulty(&self) -> U256 {
        self.headers
            .last()
            .and_then(|header| header.total_difficulty)
            .unwrap_or_default()
    }

    fn respond(&self, method: &str, params: &Value) -> Result<Value> {
        match method {
            "eth_getBlockByNumber" => {
                let block: BlockNumberOrTag = serde_json::from_value(params[0].clone())?;
                let number = match block {
                    BlockNumberOrTag::Latest => self.head(),
                    BlockNumberOrTag::Number(number) => number,
                    other => panic!("unexpected block tag {other}"),
                };
                if *self.failing_block.lock().unwrap() == Some(number) {
                    return Err(Error::Rpc {
                        code: -32000,
                        message: format!("failed to fetch block {number}"),
                    });
                }
                match self.headers.get(number as usize) {
                    Some(header) => Ok(serde_json::to_value(header)?),
                    None => Ok(Value::Null),
                }
            }
            "eth_blockNumber" => Ok(serde_json::to_value(U64::from(self.head()))?),
            "web3_clientVersion" => Ok(serde_json::to_value(&self.client_version)?),
            _ => Err(Error::Rpc {
                code: -32601,
                message: format!("the method {method} does not exist/is not available"),
            }),
        }
    }
}

pub fn block_timestamp(number: u64) -> u64 {
    GENESIS_TIMESTAMP + number * BLOCK_TIME
}

/// Transport answering from a shared [`FakeNode`].
#[derive(Clone)]
pub struct FakeTransport(pub Arc<FakeNode>);

impl Transport for FakeTransport {
    async fn request<P, R>(&self, method: &'static str, params: P) -> Result<Option<R>>
    where
        P: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let node = &self.0;
        node.calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = node.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        node.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let params = serde_json::to_value(params);
        tokio::time::sleep(node.delay).await;
        let result = params.map_err(Error::from).and_then(|p| node.respond(method, &p));

        node.in_flight.fetch_sub(1, Ordering::SeqCst);

        match result? {
            Value::Null => Ok(None),
            value => Ok(Some(serde_json::from_value(value)?)),
        }
    }
}

/// Client with the given TTD over `node`.
pub fn client(node: &Arc<FakeNode>, ttd: U256) -> ExecutionClient<FakeTransport> {
    ExecutionClient::with_transport(
        ClientType::Geth,
        1,
        "http://fake-node:8545",
        ttd,
        FakeTransport(node.clone()),
    )
}

/// Per-block difficulties of a chain that mines `pow_blocks` blocks (genesis
/// included) with difficulty `difficulty`, followed by `pos_blocks` blocks
/// without difficulty.
pub fn merged_chain(pow_blocks: usize, pos_blocks: usize, difficulty: u64) -> Vec<u64> {
    let mut difficulties = vec![difficulty; pow_blocks];
    difficulties.resize(pow_blocks + pos_blocks, 0);
    difficulties
}
