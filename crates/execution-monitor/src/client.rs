//! Monitoring adapter for a single execution layer node.
//!
//! [`ExecutionClient`] owns the node connection behind one lock. Every
//! operation that talks to the node holds that lock for its full duration, so
//! calls on one client never overlap and the cached transition is written at
//! most once.

use std::{fmt, time::Duration};

use alloy_primitives::U256;
use alloy_rpc_types_eth::{BlockNumberOrTag, Header};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    client_type::{ClientLayer, ClientType},
    config::ClientConfig,
    deadline::{CallDeadline, CallScope, DEFAULT_CALL_TIMEOUT},
    error::{Error, Result},
    metric::{MetricName, MetricValue},
    rpc::{HttpTransport, Transport},
};

/// Callback invoked with the transition block's timestamp once it is known.
pub type TransitionHook = Box<dyn Fn(u64) + Send + Sync>;

/// Last difficulty-based block before the switch to proof of stake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub block_number: u64,
    pub block_timestamp: u64,
}

/// State guarded by the client lock.
struct Inner<T> {
    /// `None` once the client is closed.
    transport: Option<T>,
    deadline: CallDeadline,
    transition: Option<Transition>,
}

impl<T: Transport> Inner<T> {
    /// Borrow the transport together with a fresh deadline for one call.
    fn scoped(&mut self) -> Result<(&T, CallScope)> {
        let transport = self.transport.as_ref().ok_or(Error::Closed)?;
        Ok((transport, self.deadline.next()))
    }

    async fn header(&mut self, block: BlockNumberOrTag) -> Result<Header> {
        let (transport, scope) = self.scoped()?;
        scope
            .run("eth_getBlockByNumber", transport.header_by_number(block))
            .await
    }

    async fn total_difficulty(&mut self, block: BlockNumberOrTag) -> Result<U256> {
        let (transport, scope) = self.scoped()?;
        scope
            .run("eth_getBlockByNumber", transport.total_difficulty(block))
            .await
    }

    /// Walk back from `head` to the first block with non-zero difficulty.
    async fn find_transition(&mut self, head: Header) -> Result<Transition> {
        let head_number = head.inner.number;
        let mut number = head_number;
        let mut header = head;

        loop {
            if !header.inner.difficulty.is_zero() {
                return Ok(Transition {
                    block_number: number,
                    block_timestamp: header.inner.timestamp,
                });
            }

            // Genesis has been checked; there is nothing left to walk back to.
            let Some(parent) = number.checked_sub(1) else {
                return Err(Error::TransitionNotFound { head: head_number });
            };

            debug!(block = number, "Zero difficulty block, checking parent");
            number = parent;
            header = self.header(BlockNumberOrTag::Number(number)).await?;
        }
    }
}

/// Execution layer client tracked by the monitor.
pub struct ExecutionClient<T = HttpTransport> {
    client_type: ClientType,
    id: u64,
    /// Connection string as given by the caller.
    endpoint: String,
    ttd: U256,
    on_transition: Option<TransitionHook>,
    /// Parent of every call scope; cancelled by `close` without taking the lock.
    shutdown: CancellationToken,
    inner: Mutex<Inner<T>>,
}

impl ExecutionClient<HttpTransport> {
    /// Connect to the JSON-RPC endpoint at `url`.
    pub fn new(client_type: ClientType, id: u64, url: &str, ttd: U256) -> Result<Self> {
        let endpoint = Url::parse(url)
            .map_err(|e| Error::Connection(format!("invalid endpoint `{url}`: {e}")))?;
        let transport = HttpTransport::dial(endpoint)?;
        Ok(Self::with_transport(client_type, id, url, ttd, transport))
    }

    /// Connect to the client described by `config`.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::dial(config.url.clone())?;
        Ok(Self::with_transport(
            config.client_type,
            config.id,
            config.url.as_str(),
            config.ttd,
            transport,
        )
        .with_call_timeout(config.call_timeout()))
    }
}

impl<T: Transport> ExecutionClient<T> {
    /// Create a client on top of an already established transport.
    pub fn with_transport(
        client_type: ClientType,
        id: u64,
        endpoint: impl Into<String>,
        ttd: U256,
        transport: T,
    ) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            client_type,
            id,
            endpoint: endpoint.into(),
            ttd,
            on_transition: None,
            inner: Mutex::new(Inner {
                transport: Some(transport),
                deadline: CallDeadline::new(DEFAULT_CALL_TIMEOUT, shutdown.clone()),
                transition: None,
            }),
            shutdown,
        }
    }

    /// Set the deadline applied to each RPC call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.inner.get_mut().deadline = CallDeadline::new(timeout, self.shutdown.clone());
        self
    }

    /// Install a callback fired once, with the block timestamp, when the
    /// transition block is first located.
    pub fn with_transition_hook(mut self, hook: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_transition = Some(Box::new(hook));
        self
    }

    pub fn client_type(&self) -> ClientType {
        self.client_type
    }

    pub fn client_layer(&self) -> ClientLayer {
        ClientLayer::Execution
    }

    pub fn client_id(&self) -> u64 {
        self.id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn terminal_total_difficulty(&self) -> U256 {
        self.ttd
    }

    /// Return the node's `web3_clientVersion`.
    pub async fn client_version(&self) -> Result<String> {
        let mut inner = self.inner.lock().await;
        let (transport, scope) = inner.scoped()?;
        scope
            .run("web3_clientVersion", transport.client_version())
            .await
    }

    /// Return the number of the node's latest block.
    pub async fn latest_block_number(&self) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let (transport, scope) = inner.scoped()?;
        scope.run("eth_blockNumber", transport.block_number()).await
    }

    /// Return the transition block if it has already been located.
    pub async fn transition(&self) -> Option<Transition> {
        self.inner.lock().await.transition
    }

    /// Locate the transition block.
    ///
    /// Returns `None` while the latest block's total difficulty is below the
    /// TTD. Once the TTD has been reached, walks back from the head to the
    /// first block with non-zero difficulty. The result is cached: later calls
    /// return it without touching the node.
    pub async fn locate_transition_block(&self) -> Result<Option<u64>> {
        let mut inner = self.inner.lock().await;

        if let Some(transition) = inner.transition {
            return Ok(Some(transition.block_number));
        }

        let total_difficulty = inner.total_difficulty(BlockNumberOrTag::Latest).await?;
        if total_difficulty < self.ttd {
            debug!(
                id = self.id,
                total_difficulty = %total_difficulty,
                ttd = %self.ttd,
                "TTD not reached"
            );
            return Ok(None);
        }

        let head = inner.header(BlockNumberOrTag::Latest).await?;
        let transition = inner.find_transition(head).await?;
        inner.transition = Some(transition);

        info!(
            id = self.id,
            url = %self.endpoint,
            block = transition.block_number,
            timestamp = transition.block_timestamp,
            "TTD block reached"
        );

        if let Some(hook) = &self.on_transition {
            hook(transition.block_timestamp);
        }

        Ok(Some(transition.block_number))
    }

    /// Read a metric, given by name, for block `block_number`.
    pub async fn read_metric(&self, name: &str, block_number: u64) -> Result<MetricValue> {
        let metric = MetricName::parse(name)?;
        self.read_metric_kind(metric, block_number).await
    }

    /// Read `metric` for block `block_number`.
    pub async fn read_metric_kind(
        &self,
        metric: MetricName,
        block_number: u64,
    ) -> Result<MetricValue> {
        let mut inner = self.inner.lock().await;
        let header = inner.header(BlockNumberOrTag::Number(block_number)).await?;
        Ok(metric.project(&header))
    }

    /// Release the node connection.
    ///
    /// A call in flight, including a backward scan, is aborted with
    /// [`Error::Cancelled`] instead of being waited for. The located transition
    /// stays available through [`ExecutionClient::transition`] and
    /// [`ExecutionClient::locate_transition_block`].
    pub async fn close(&self) {
        self.shutdown.cancel();

        let mut inner = self.inner.lock().await;
        if inner.transport.take().is_some() {
            debug!(id = self.id, url = %self.endpoint, "Closed execution client");
        } else {
            warn!(id = self.id, url = %self.endpoint, "Execution client already closed");
        }
    }
}

impl<T> fmt::Display for ExecutionClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint)
    }
}

impl<T> fmt::Debug for ExecutionClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionClient")
            .field("client_type", &self.client_type)
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("ttd", &self.ttd)
            .finish_non_exhaustive()
    }
}
