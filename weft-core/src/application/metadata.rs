//! Parsing of the reserved `GetMetadata` introspection payload.

use crate::foundation::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contracts under this namespace are chaincode-runtime plumbing, not
/// application contracts.
pub const SYSTEM_NAMESPACE: &str = "org.hyperledger.fabric";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetadata {
    #[serde(default)]
    pub info: MetadataInfo,
    #[serde(default)]
    pub contracts: BTreeMap<String, ContractInfo>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transactions: Vec<TransactionInfo>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub name: String,
    #[serde(default)]
    pub tag: Vec<String>,
}

/// Parse a `GetMetadata` payload. An empty payload is a chaincode without
/// published metadata and maps to the empty default shape.
pub fn parse_metadata(payload: &[u8]) -> Result<ContractMetadata> {
    if payload.is_empty() {
        return Ok(ContractMetadata::default());
    }
    Ok(serde_json::from_slice(payload)?)
}

impl ContractMetadata {
    /// Application contracts: the system namespace and contracts without
    /// transactions are dropped.
    pub fn contract_names(&self) -> Vec<&str> {
        self.contracts
            .iter()
            .filter(|(name, contract)| name.as_str() != SYSTEM_NAMESPACE && !contract.transactions.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Transaction names across all application contracts.
    pub fn transaction_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .contracts
            .iter()
            .filter(|(name, _)| name.as_str() != SYSTEM_NAMESPACE)
            .flat_map(|(_, contract)| contract.transactions.iter().map(|tx| tx.name.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "info": { "title": "assets", "version": "1.0" },
        "contracts": {
            "AssetContract": {
                "name": "AssetContract",
                "transactions": [
                    { "name": "createAsset", "tag": ["submit"] },
                    { "name": "readAsset", "tag": ["evaluate"] }
                ]
            },
            "EmptyContract": { "name": "EmptyContract", "transactions": [] },
            "org.hyperledger.fabric": {
                "name": "org.hyperledger.fabric",
                "transactions": [ { "name": "GetMetadata" } ]
            }
        },
        "components": { "schemas": {} }
    }"#;

    #[test]
    fn system_namespace_and_empty_contracts_are_dropped() {
        let metadata = parse_metadata(SAMPLE.as_bytes()).unwrap();
        assert_eq!(metadata.info.title, "assets");
        assert_eq!(metadata.contract_names(), vec!["AssetContract"]);
        assert_eq!(metadata.transaction_names(), vec!["createAsset", "readAsset"]);
    }

    #[test]
    fn empty_payload_is_the_default_shape() {
        let metadata = parse_metadata(b"").unwrap();
        assert_eq!(metadata, ContractMetadata::default());
        assert!(metadata.contract_names().is_empty());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = parse_metadata(b"{not json").unwrap_err();
        assert!(err.to_string().contains("json"), "got {err}");
    }
}
