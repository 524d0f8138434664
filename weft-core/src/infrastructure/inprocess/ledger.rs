use crate::domain::chaincode::{ChaincodeDefinition, InstalledPackage, InstantiatedChaincode};
use crate::domain::proposal::ChaincodeAction;
use crate::foundation::{ChannelName, MspId, PeerName};
use crate::infrastructure::rpc::ChannelInfo;
use std::collections::{BTreeMap, BTreeSet};

/// Key under which org approvals are recorded: the exact definition tuple.
pub type ApprovalKey = (String, i64, String);

pub fn approval_key(definition: &ChaincodeDefinition) -> ApprovalKey {
    (
        definition.name.clone(),
        definition.sequence,
        definition.package_id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
    )
}

/// Ledger-side state of one channel.
pub struct ChannelState {
    pub info: ChannelInfo,
    pub committed: BTreeMap<String, ChaincodeDefinition>,
    pub approvals: BTreeMap<ApprovalKey, BTreeSet<MspId>>,
    pub instantiated: BTreeMap<String, InstantiatedChaincode>,
    pub height: u64,
}

impl ChannelState {
    pub fn new(info: ChannelInfo) -> Self {
        Self { info, committed: BTreeMap::new(), approvals: BTreeMap::new(), instantiated: BTreeMap::new(), height: 0 }
    }

    pub fn member_orgs(&self) -> BTreeSet<MspId> {
        self.info.members.iter().map(|(_, msp)| msp.clone()).collect()
    }

    pub fn approvals_for(&self, definition: &ChaincodeDefinition) -> BTreeMap<MspId, bool> {
        let approved = self.approvals.get(&approval_key(definition));
        self.member_orgs()
            .into_iter()
            .map(|org| {
                let has = approved.map(|set| set.contains(&org)).unwrap_or(false);
                (org, has)
            })
            .collect()
    }

    /// Apply a validated transaction's lifecycle effect. Invokes leave the
    /// definition state untouched.
    pub fn apply(&mut self, creator_msp: &MspId, action: &ChaincodeAction) {
        match action {
            ChaincodeAction::ApproveChaincode(def) => {
                self.approvals.entry(approval_key(def)).or_default().insert(creator_msp.clone());
            }
            ChaincodeAction::CommitChaincode(def) => {
                self.committed.insert(def.name.clone(), def.clone());
                // A committed definition is a deployed chaincode.
                self.instantiated.insert(
                    def.name.clone(),
                    InstantiatedChaincode { name: def.name.clone(), version: def.version.clone() },
                );
            }
            ChaincodeAction::InstantiateV1 { name, version, .. } | ChaincodeAction::UpgradeV1 { name, version, .. } => {
                self.instantiated
                    .insert(name.clone(), InstantiatedChaincode { name: name.clone(), version: version.clone() });
            }
            ChaincodeAction::Invoke { .. } => {}
        }
    }
}

/// Whole-network state behind one mutex: channels plus per-peer installs.
#[derive(Default)]
pub struct NetState {
    pub channels: BTreeMap<ChannelName, ChannelState>,
    pub installed: BTreeMap<PeerName, Vec<InstalledPackage>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chaincode::EndorsementPolicy;
    use crate::foundation::PackageId;

    fn info() -> ChannelInfo {
        ChannelInfo {
            name: ChannelName::new("mychannel"),
            members: vec![
                (PeerName::new("p1"), MspId::new("Org1MSP")),
                (PeerName::new("p2"), MspId::new("Org2MSP")),
            ],
            orderers: vec!["orderer".into()],
            height: 0,
        }
    }

    fn definition(sequence: i64) -> ChaincodeDefinition {
        ChaincodeDefinition {
            name: "mycc".to_string(),
            version: "1.0".to_string(),
            sequence,
            package_id: Some(PackageId::new("mycc_1.0:abc")),
            endorsement_policy: EndorsementPolicy::AllMembers(vec![MspId::new("Org1MSP"), MspId::new("Org2MSP")]),
        }
    }

    #[test]
    fn approvals_are_keyed_by_the_exact_definition() {
        let mut state = ChannelState::new(info());
        state.apply(&MspId::new("Org1MSP"), &ChaincodeAction::ApproveChaincode(definition(1)));

        let approvals = state.approvals_for(&definition(1));
        assert_eq!(approvals[&MspId::new("Org1MSP")], true);
        assert_eq!(approvals[&MspId::new("Org2MSP")], false);

        // A different sequence is a different definition.
        let other = state.approvals_for(&definition(2));
        assert_eq!(other[&MspId::new("Org1MSP")], false);
    }

    #[test]
    fn commit_records_the_definition() {
        let mut state = ChannelState::new(info());
        state.apply(&MspId::new("Org1MSP"), &ChaincodeAction::CommitChaincode(definition(1)));
        assert_eq!(state.committed["mycc"].sequence, 1);
    }

    #[test]
    fn upgrade_replaces_the_instantiated_version() {
        let mut state = ChannelState::new(info());
        let instantiate = ChaincodeAction::InstantiateV1 {
            name: "mycc".to_string(),
            version: "1.0".to_string(),
            fcn: "init".to_string(),
            args: vec![],
        };
        let upgrade = ChaincodeAction::UpgradeV1 {
            name: "mycc".to_string(),
            version: "2.0".to_string(),
            fcn: "init".to_string(),
            args: vec![],
        };
        state.apply(&MspId::new("Org1MSP"), &instantiate);
        assert_eq!(state.instantiated["mycc"].version, "1.0");
        state.apply(&MspId::new("Org1MSP"), &upgrade);
        assert_eq!(state.instantiated["mycc"].version, "2.0");
    }
}
