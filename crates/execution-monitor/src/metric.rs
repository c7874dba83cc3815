//! Per-block metrics extracted from execution layer headers.

use alloy_primitives::U256;
use alloy_rpc_types_eth::Header;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::Error;

/// Header-derived metrics a monitor can request.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive, serialize_all = "kebab-case")]
pub enum MetricName {
    /// Whether the block exists.
    BlockCount,
    BaseFee,
    GasUsed,
    Difficulty,
    MixHash,
    UnclesHash,
    Nonce,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Parse a metric name, reporting the offending value on failure.
    pub fn parse(name: &str) -> Result<Self, Error> {
        name.parse()
            .map_err(|_| Error::InvalidMetricName(name.to_string()))
    }

    /// Project this metric out of `header`.
    pub fn project(&self, header: &Header) -> MetricValue {
        let header = &header.inner;
        match self {
            Self::BlockCount => MetricValue::BlockCount(1),
            Self::BaseFee => MetricValue::BaseFee(header.base_fee_per_gas),
            Self::GasUsed => MetricValue::GasUsed(header.gas_used),
            Self::Difficulty => MetricValue::Difficulty(header.difficulty),
            Self::MixHash => MetricValue::MixHash(U256::from_be_bytes(header.mix_hash.0)),
            Self::UnclesHash => {
                MetricValue::UnclesHash(U256::from_be_bytes(header.ommers_hash.0))
            }
            Self::Nonce => MetricValue::Nonce(u64::from_be_bytes(header.nonce.0)),
        }
    }
}

/// Value of a single metric for one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricValue {
    BlockCount(u64),
    /// `None` for blocks before the fee market was introduced.
    BaseFee(Option<u64>),
    GasUsed(u64),
    Difficulty(U256),
    MixHash(U256),
    UnclesHash(U256),
    Nonce(u64),
}

impl MetricValue {
    /// Metric this value belongs to.
    pub fn name(&self) -> MetricName {
        match self {
            Self::BlockCount(_) => MetricName::BlockCount,
            Self::BaseFee(_) => MetricName::BaseFee,
            Self::GasUsed(_) => MetricName::GasUsed,
            Self::Difficulty(_) => MetricName::Difficulty,
            Self::MixHash(_) => MetricName::MixHash,
            Self::UnclesHash(_) => MetricName::UnclesHash,
            Self::Nonce(_) => MetricName::Nonce,
        }
    }
}
