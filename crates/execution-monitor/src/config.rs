//! Configuration of a monitored execution layer client.

use std::{path::Path, time::Duration};

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, de};
use url::Url;

use crate::{
    client_type::ClientType,
    deadline::DEFAULT_CALL_TIMEOUT,
    error::{Error, Result},
};

/// Description of one execution layer client to monitor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientConfig {
    /// Implementation running behind the endpoint.
    #[serde(rename = "type")]
    pub client_type: ClientType,
    /// Numeric ID of the client within the monitor.
    pub id: u64,
    /// HTTP JSON-RPC URL.
    pub url: Url,
    /// Terminal total difficulty, as a decimal or `0x`-prefixed hex string.
    #[serde(deserialize_with = "deserialize_ttd")]
    pub ttd: U256,
    /// Deadline of a single RPC call, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

fn deserialize_ttd<'de, D>(deserializer: D) -> std::result::Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    value
        .trim()
        .parse::<U256>()
        .map_err(|e| de::Error::custom(format!("invalid ttd `{value}`: {e}")))
}

/// Returns the default deadline of a single RPC call.
fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT.as_secs()
}

impl ClientConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml_edit::de::from_str(content)?;
        if config.call_timeout_secs == 0 {
            return Err(Error::Config(
                "call-timeout-secs must be greater than zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}
