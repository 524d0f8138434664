use crate::application::commit::CommitEngine;
use crate::application::connection::FabricConnection;
use crate::application::metadata::{parse_metadata, ContractMetadata};
use crate::domain::chaincode::{
    package_label, validate_chaincode_name, ChaincodeDefinition, ChaincodePackage, EndorsementPolicy,
};
use crate::domain::lifecycle::{ensure_valid_transition, next_sequence, DefinitionState, LifecycleVariant};
use crate::domain::proposal::{ChaincodeAction, METADATA_FUNCTION};
use crate::foundation::{ChannelName, MspId, PackageId, PeerName, Result, WeftError};
use log::{info, warn};
use std::collections::BTreeMap;

/// Caller-facing chaincode lifecycle operations.
///
/// Each operation is an independent task driven to completion by its caller;
/// precondition queries are advisory, the peers stay authoritative. Which
/// protocol an operation speaks follows the connection's lifecycle variant.
pub struct LifecycleCoordinator<'a> {
    connection: &'a FabricConnection,
    engine: CommitEngine<'a>,
}

impl<'a> LifecycleCoordinator<'a> {
    pub fn new(connection: &'a FabricConnection) -> Self {
        Self { connection, engine: CommitEngine::new(connection) }
    }

    /// Upload a chaincode package to one peer.
    ///
    /// Re-installing the same label is tolerated on v1 networks, where the
    /// peer's complaint is logged and the existing package id returned; v2
    /// networks treat it as an error.
    pub async fn install(&self, package: &ChaincodePackage, peer: &PeerName) -> Result<PackageId> {
        validate_chaincode_name(&package.name)?;
        let handle = self.connection.get_peer(peer)?;
        let label = package.label();
        match handle.rpc.install_package(&label, &package.bytes).await {
            Ok(package_id) => {
                info!("installed {} on {} as {}", label, peer, package_id);
                Ok(package_id)
            }
            Err(WeftError::AlreadyInstalled { name, version, peer: peer_name })
                if self.connection.variant() == LifecycleVariant::V1 =>
            {
                warn!("{}@{} already installed on {}; reusing the existing package", name, version, peer_name);
                self.resolve_package_id(&label, peer).await
            }
            Err(err) => Err(err),
        }
    }

    /// Record this organization's approval of a chaincode definition (v2).
    pub async fn approve(
        &self,
        name: &str,
        version: &str,
        peers: &[PeerName],
        channel: &ChannelName,
    ) -> Result<()> {
        self.require_v2("approve")?;
        let definition = self.build_definition(name, version, peers, channel).await?;

        let (state, approvals) = self.observed_state(&definition, peers, channel).await?;
        ensure_valid_transition(state, DefinitionState::Approved)?;
        let own_org = self.connection.active_identity()?.msp_id;
        if approvals.get(&own_org).copied().unwrap_or(false) {
            return Err(WeftError::AlreadyApproved { name: name.to_string(), version: version.to_string() });
        }

        self.engine.execute(channel, ChaincodeAction::ApproveChaincode(definition), peers).await?;
        info!("approved {}@{} on {} for {}", name, version, channel, own_org);
        Ok(())
    }

    /// Commit an approved chaincode definition to the channel (v2).
    pub async fn commit(&self, name: &str, version: &str, peers: &[PeerName], channel: &ChannelName) -> Result<()> {
        self.require_v2("commit")?;
        let definition = self.build_definition(name, version, peers, channel).await?;

        let (state, approvals) = self.observed_state(&definition, peers, channel).await?;
        ensure_valid_transition(state, DefinitionState::Committed)?;
        if !definition.endorsement_policy.is_satisfied_by(&approvals) {
            return Err(WeftError::NotYetApproved { name: name.to_string(), version: version.to_string() });
        }

        self.engine.execute(channel, ChaincodeAction::CommitChaincode(definition), peers).await?;
        info!("committed {}@{} on {}", name, version, channel);
        Ok(())
    }

    /// Deploy a chaincode to a channel.
    ///
    /// On v1 networks this is the single-phase instantiate; on v2 networks it
    /// composes approve, commit and the initialization invoke.
    pub async fn instantiate(
        &self,
        name: &str,
        version: &str,
        peers: &[PeerName],
        channel: &ChannelName,
        fcn: &str,
        args: Vec<String>,
    ) -> Result<()> {
        validate_chaincode_name(name)?;
        match self.connection.variant() {
            LifecycleVariant::V1 => {
                if self.is_deployed(name, channel).await? {
                    return Err(WeftError::AlreadyInstantiated(name.to_string()));
                }
                let action = ChaincodeAction::InstantiateV1 {
                    name: name.to_string(),
                    version: version.to_string(),
                    fcn: fcn.to_string(),
                    args,
                };
                self.engine.execute(channel, action, peers).await?;
                info!("instantiated {}@{} on {}", name, version, channel);
                Ok(())
            }
            LifecycleVariant::V2 => self.deploy_v2(name, version, peers, channel, fcn, args).await,
        }
    }

    /// Upgrade a deployed chaincode to a new version.
    pub async fn upgrade(
        &self,
        name: &str,
        version: &str,
        peers: &[PeerName],
        channel: &ChannelName,
        fcn: &str,
        args: Vec<String>,
    ) -> Result<()> {
        validate_chaincode_name(name)?;
        match self.connection.variant() {
            LifecycleVariant::V1 => {
                if !self.is_deployed(name, channel).await? {
                    return Err(WeftError::NotInstantiated(name.to_string()));
                }
                let action = ChaincodeAction::UpgradeV1 {
                    name: name.to_string(),
                    version: version.to_string(),
                    fcn: fcn.to_string(),
                    args,
                };
                self.engine.execute(channel, action, peers).await?;
                info!("upgraded {} to {} on {}", name, version, channel);
                Ok(())
            }
            // The sequence bump carries the upgrade.
            LifecycleVariant::V2 => self.deploy_v2(name, version, peers, channel, fcn, args).await,
        }
    }

    /// Invoke a chaincode function and return the endorsed payload. Without
    /// an explicit function the reserved metadata query is sent.
    pub async fn invoke(
        &self,
        chaincode: &str,
        fcn: Option<&str>,
        args: Vec<String>,
        peers: &[PeerName],
        channel: &ChannelName,
    ) -> Result<Vec<u8>> {
        let (fcn, args) = match fcn {
            Some(fcn) => (fcn.to_string(), args),
            None => (METADATA_FUNCTION.to_string(), Vec::new()),
        };
        let action = ChaincodeAction::Invoke { chaincode: chaincode.to_string(), fcn, args };
        self.engine.execute(channel, action, peers).await
    }

    /// Fetch and parse a deployed chaincode's contract metadata.
    pub async fn metadata(&self, chaincode: &str, peers: &[PeerName], channel: &ChannelName) -> Result<ContractMetadata> {
        let payload = self.invoke(chaincode, None, Vec::new(), peers, channel).await?;
        parse_metadata(&payload)
    }

    async fn deploy_v2(
        &self,
        name: &str,
        version: &str,
        peers: &[PeerName],
        channel: &ChannelName,
        fcn: &str,
        args: Vec<String>,
    ) -> Result<()> {
        self.approve(name, version, peers, channel).await?;
        self.commit(name, version, peers, channel).await?;
        self.init_chaincode(name, fcn, args, peers, channel).await?;
        Ok(())
    }

    /// The post-commit initialization invoke of the v2 deploy flow. Only a
    /// committed definition may move to initialized.
    pub async fn init_chaincode(
        &self,
        chaincode: &str,
        fcn: &str,
        args: Vec<String>,
        peers: &[PeerName],
        channel: &ChannelName,
    ) -> Result<()> {
        let state = if self.is_deployed(chaincode, channel).await? {
            DefinitionState::Committed
        } else {
            DefinitionState::Uninstalled
        };
        ensure_valid_transition(state, DefinitionState::Initialized)?;
        self.invoke(chaincode, Some(fcn), args, peers, channel).await?;
        info!("initialized {} on {}", chaincode, channel);
        Ok(())
    }

    /// Observed lifecycle state of `name@version` on a channel, derived from
    /// peer queries: deployed beats approved beats installed.
    pub async fn definition_state(
        &self,
        name: &str,
        version: &str,
        peers: &[PeerName],
        channel: &ChannelName,
    ) -> Result<DefinitionState> {
        let label = package_label(name, version);
        let handle = self.connection.get_peer(first_target(peers)?)?;
        let installed = handle.rpc.query_installed().await?.iter().any(|record| record.label == label);
        if !installed {
            return Ok(DefinitionState::Uninstalled);
        }
        let definition = self.build_definition(name, version, peers, channel).await?;
        let (state, _approvals) = self.observed_state(&definition, peers, channel).await?;
        Ok(state)
    }

    /// Assemble the definition for approve/commit: package id from installed
    /// records, next sequence from the committed definition, and an
    /// every-member endorsement policy derived from channel membership.
    async fn build_definition(
        &self,
        name: &str,
        version: &str,
        peers: &[PeerName],
        channel: &ChannelName,
    ) -> Result<ChaincodeDefinition> {
        validate_chaincode_name(name)?;
        let label = package_label(name, version);
        let package_id = self.resolve_package_id(&label, first_target(peers)?).await?;

        let committed = self.connection.committed_definition(channel, name).await?;
        let sequence = next_sequence(committed.map(|def| def.sequence));

        let channel_info = self.connection.get_or_create_channel(channel).await?;
        let mut orgs: Vec<_> = channel_info.info.members.iter().map(|(_, msp)| msp.clone()).collect();
        orgs.sort();
        orgs.dedup();

        Ok(ChaincodeDefinition {
            name: name.to_string(),
            version: version.to_string(),
            sequence,
            package_id: Some(package_id),
            endorsement_policy: EndorsementPolicy::AllMembers(orgs),
        })
    }

    async fn resolve_package_id(&self, label: &str, peer: &PeerName) -> Result<PackageId> {
        let handle = self.connection.get_peer(peer)?;
        let installed = handle.rpc.query_installed().await?;
        installed
            .into_iter()
            .find(|record| record.label == label)
            .map(|record| record.package_id)
            .ok_or_else(|| {
                let (name, version) = crate::domain::chaincode::parse_package_label(label).unwrap_or((label, ""));
                WeftError::PackageNotFound { name: name.to_string(), version: version.to_string() }
            })
    }

    async fn query_approvals(
        &self,
        definition: &ChaincodeDefinition,
        peers: &[PeerName],
        channel: &ChannelName,
    ) -> Result<BTreeMap<MspId, bool>> {
        let handle = self.connection.get_peer(first_target(peers)?)?;
        handle.rpc.query_approvals(channel, definition).await
    }

    /// State of a resolved definition, plus the approvals that determined it.
    /// The definition carries a resolved package id, so installed is the
    /// floor; a deployment of the same name and version means committed.
    async fn observed_state(
        &self,
        definition: &ChaincodeDefinition,
        peers: &[PeerName],
        channel: &ChannelName,
    ) -> Result<(DefinitionState, BTreeMap<MspId, bool>)> {
        let approvals = self.query_approvals(definition, peers, channel).await?;
        let deployed = self
            .connection
            .instantiated_chaincode(channel)
            .await?
            .iter()
            .any(|cc| cc.name == definition.name && cc.version == definition.version);
        let state = if deployed {
            DefinitionState::Committed
        } else if approvals.values().any(|approved| *approved) {
            DefinitionState::Approved
        } else {
            DefinitionState::Installed
        };
        Ok((state, approvals))
    }

    async fn is_deployed(&self, name: &str, channel: &ChannelName) -> Result<bool> {
        let deployed = self.connection.instantiated_chaincode(channel).await?;
        Ok(deployed.iter().any(|cc| cc.name == name))
    }

    fn require_v2(&self, operation: &str) -> Result<()> {
        if self.connection.variant() != LifecycleVariant::V2 {
            return Err(WeftError::unsupported(operation, self.connection.variant()));
        }
        Ok(())
    }
}

fn first_target(peers: &[PeerName]) -> Result<&PeerName> {
    peers.first().ok_or_else(|| WeftError::Message("no target peers given for the proposal".to_string()))
}
