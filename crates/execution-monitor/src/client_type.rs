//! Client identity: implementation and node layer.

use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumString, VariantNames};

use crate::error::Error;

/// Execution layer implementation running behind a monitored endpoint.
///
/// Parsed case-insensitively and serialized as its lowercase name.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    VariantNames,
    SerializeDisplay,
    DeserializeFromStr,
)]
#[strum(
    ascii_case_insensitive,
    serialize_all = "lowercase",
    parse_err_ty = Error,
    parse_err_fn = unsupported_client_type
)]
pub enum ClientType {
    Geth,
    Nethermind,
    Besu,
    Erigon,
    Reth,
    Ethrex,
}

fn unsupported_client_type(value: &str) -> Error {
    Error::UnsupportedClientType {
        value: value.to_string(),
        supported: ClientType::VARIANTS.join(", "),
    }
}

/// Layer of the node stack a client talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ClientLayer {
    /// Execution layer, reached over JSON-RPC.
    Execution,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("Geth".parse::<ClientType>().unwrap(), ClientType::Geth);
        assert_eq!(
            "NETHERMIND".parse::<ClientType>().unwrap(),
            ClientType::Nethermind
        );
        assert_eq!(ClientType::Besu.to_string(), "besu");
    }

    #[test]
    fn test_parse_unknown_lists_supported() {
        let err = "parity".parse::<ClientType>().unwrap_err();
        assert!(matches!(&err, Error::UnsupportedClientType { value, .. } if value == "parity"));
        assert_eq!(
            err.to_string(),
            "unsupported client type `parity`, expect one of [geth, nethermind, besu, erigon, reth, ethrex]"
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ClientType::Erigon).unwrap();
        assert_eq!(json, "\"erigon\"");
        let parsed: ClientType = serde_json::from_str("\"Reth\"").unwrap();
        assert_eq!(parsed, ClientType::Reth);

        let err = serde_json::from_str::<ClientType>("\"openethereum\"").unwrap_err();
        assert!(err.to_string().contains("expect one of [geth"));
    }
}
