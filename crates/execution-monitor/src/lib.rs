//! Execution monitor - tracks a single execution layer node through the
//! terminal total difficulty (TTD) transition and reads per-block metrics.
//!
//! This crate provides functionality to:
//! - Locate the transition block once the node's total difficulty reaches the TTD
//! - Read header-derived metrics (base fee, gas used, difficulty, ...) by block number
//! - Bound every JSON-RPC call with its own deadline
//! - Serialize all calls to one node behind a single lock
//!
//! ## Example
//!
//! ```ignore
//! use execution_monitor::{ClientConfig, ExecutionClient};
//!
//! let config = ClientConfig::load("client.toml")?;
//! let client = ExecutionClient::connect(&config)?
//!     .with_transition_hook(|timestamp| println!("TTD reached at {timestamp}"));
//!
//! if let Some(block) = client.locate_transition_block().await? {
//!     let gas_used = client.read_metric("gas-used", block).await?;
//!     // Export gas_used...
//! }
//! ```

pub mod client;
pub mod client_type;
pub mod config;
pub mod deadline;
pub mod error;
pub mod metric;
pub mod rpc;

// Re-export main types at crate root for convenience.
pub use client::{ExecutionClient, Transition, TransitionHook};
pub use client_type::{ClientLayer, ClientType};
pub use config::ClientConfig;
pub use deadline::{CallDeadline, CallScope, DEFAULT_CALL_TIMEOUT};
pub use error::{Error, Result};
pub use metric::{MetricName, MetricValue};
pub use rpc::{HttpTransport, Transport};

// Re-export alloy types that appear in our public API.
pub use alloy_primitives::U256;
pub use alloy_rpc_types_eth::{BlockNumberOrTag, Header};
