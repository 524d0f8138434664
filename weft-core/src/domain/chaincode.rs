use crate::foundation::{MspId, PackageId, WeftError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A chaincode definition as agreed on a channel.
///
/// For the v2 lifecycle the `sequence` is bumped on every redefinition; for
/// the v1 lifecycle the `version` string alone distinguishes definitions and
/// `sequence` stays at its default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeDefinition {
    pub name: String,
    pub version: String,
    pub sequence: i64,
    pub package_id: Option<PackageId>,
    pub endorsement_policy: EndorsementPolicy,
}

impl ChaincodeDefinition {
    pub fn label(&self) -> String {
        package_label(&self.name, &self.version)
    }
}

impl fmt::Display for ChaincodeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} (sequence {})", self.name, self.version, self.sequence)
    }
}

/// Which organizations must record approval before a definition may commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "orgs")]
pub enum EndorsementPolicy {
    /// Any single listed organization suffices.
    AnyMember(Vec<MspId>),
    /// Every listed organization must approve.
    AllMembers(Vec<MspId>),
}

impl Default for EndorsementPolicy {
    fn default() -> Self {
        EndorsementPolicy::AllMembers(Vec::new())
    }
}

impl EndorsementPolicy {
    pub fn required_orgs(&self) -> &[MspId] {
        match self {
            EndorsementPolicy::AnyMember(orgs) | EndorsementPolicy::AllMembers(orgs) => orgs,
        }
    }

    pub fn is_satisfied_by(&self, approvals: &BTreeMap<MspId, bool>) -> bool {
        let approved = |org: &MspId| approvals.get(org).copied().unwrap_or(false);
        match self {
            EndorsementPolicy::AnyMember(orgs) => orgs.iter().any(approved),
            EndorsementPolicy::AllMembers(orgs) => !orgs.is_empty() && orgs.iter().all(approved),
        }
    }
}

/// Installable chaincode package bytes, as handed out by the package store.
#[derive(Clone, Debug)]
pub struct ChaincodePackage {
    pub name: String,
    pub version: String,
    pub bytes: Vec<u8>,
}

impl ChaincodePackage {
    pub fn label(&self) -> String {
        package_label(&self.name, &self.version)
    }
}

/// Peer-local record of an installed package. Looked up, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub label: String,
    pub package_id: PackageId,
}

impl InstalledPackage {
    /// Split the `{name}_{version}` label back into its parts.
    pub fn parse_label(&self) -> Option<(&str, &str)> {
        parse_package_label(&self.label)
    }
}

/// A v1-style instantiated chaincode as reported by a channel query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantiatedChaincode {
    pub name: String,
    pub version: String,
}

pub fn package_label(name: &str, version: &str) -> String {
    format!("{}_{}", name, version)
}

pub fn parse_package_label(label: &str) -> Option<(&str, &str)> {
    label.split_once('_')
}

/// Validate a chaincode name the way peers do: non-empty, no `_` (reserved
/// as the label separator) and no whitespace.
pub fn validate_chaincode_name(name: &str) -> Result<(), WeftError> {
    if name.is_empty() {
        return Err(WeftError::Message("chaincode name must not be empty".to_string()));
    }
    if name.contains('_') || name.chars().any(char::is_whitespace) {
        return Err(WeftError::Message(format!("invalid chaincode name: {}", name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approvals(entries: &[(&str, bool)]) -> BTreeMap<MspId, bool> {
        entries.iter().map(|(org, ok)| (MspId::new(*org), *ok)).collect()
    }

    #[test]
    fn all_members_requires_every_org() {
        let policy = EndorsementPolicy::AllMembers(vec![MspId::new("Org1MSP"), MspId::new("Org2MSP")]);
        assert!(policy.is_satisfied_by(&approvals(&[("Org1MSP", true), ("Org2MSP", true)])));
        assert!(!policy.is_satisfied_by(&approvals(&[("Org1MSP", true), ("Org2MSP", false)])));
        assert!(!policy.is_satisfied_by(&approvals(&[("Org1MSP", true)])));
    }

    #[test]
    fn any_member_accepts_a_single_org() {
        let policy = EndorsementPolicy::AnyMember(vec![MspId::new("Org1MSP"), MspId::new("Org2MSP")]);
        assert!(policy.is_satisfied_by(&approvals(&[("Org2MSP", true)])));
        assert!(!policy.is_satisfied_by(&approvals(&[("Org1MSP", false)])));
    }

    #[test]
    fn empty_all_members_policy_is_never_satisfied() {
        let policy = EndorsementPolicy::AllMembers(Vec::new());
        assert!(!policy.is_satisfied_by(&approvals(&[("Org1MSP", true)])));
    }

    #[test]
    fn package_labels_round_trip() {
        let record = InstalledPackage { label: package_label("mycc", "1.0"), package_id: PackageId::new("mycc:abc") };
        assert_eq!(record.parse_label(), Some(("mycc", "1.0")));
    }

    #[test]
    fn chaincode_names_are_validated() {
        assert!(validate_chaincode_name("mycc").is_ok());
        assert!(validate_chaincode_name("").is_err());
        assert!(validate_chaincode_name("my_cc").is_err());
        assert!(validate_chaincode_name("my cc").is_err());
    }
}
