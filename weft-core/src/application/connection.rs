use crate::application::lifecycle::LifecycleCoordinator;
use crate::application::registry::{CaHandle, NodeRegistry};
use crate::domain::chaincode::{ChaincodeDefinition, InstantiatedChaincode};
use crate::domain::lifecycle::LifecycleVariant;
use crate::foundation::{ChannelName, IdentityLabel, MspId, PackageId, PeerName, Result, WeftError};
use crate::infrastructure::config::{ConnectionProfile, NetworkConfig, TimeoutConfig};
use crate::infrastructure::rpc::{ChannelInfo, NetworkBackend, OrdererHandle, PeerHandle};
use crate::infrastructure::wallet::{require_identity, Enrollment, Identity, RegistrationRequest, Wallet};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

/// One initialized channel: membership info plus the orderer serving it.
pub struct Channel {
    pub name: ChannelName,
    pub info: ChannelInfo,
    pub orderer: OrdererHandle,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("info", &self.info)
            .field("orderer", &self.orderer)
            .finish()
    }
}

/// A connection to one Fabric network.
///
/// Construct with [`FabricConnection::runtime`] for a statically described
/// network or [`FabricConnection::gateway`] for a connection-profile one, use
/// it through [`FabricConnection::lifecycle`] and the query methods, then
/// [`FabricConnection::close`] it. Channels are initialized lazily and cached
/// for the connection's lifetime.
pub struct FabricConnection {
    registry: NodeRegistry,
    variant: LifecycleVariant,
    timeouts: TimeoutConfig,
    wallet: Arc<dyn Wallet>,
    active_identity: RwLock<Option<Identity>>,
    channels: Mutex<HashMap<ChannelName, Arc<Channel>>>,
}

impl fmt::Debug for FabricConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FabricConnection")
            .field("variant", &self.variant)
            .field("timeouts", &self.timeouts)
            .field("peers", &self.registry.peer_names())
            .field("orderers", &self.registry.orderer_names())
            .finish_non_exhaustive()
    }
}

impl FabricConnection {
    /// Connect to a statically described network. Every peer, orderer and
    /// certificate authority named in the config must resolve through the
    /// backend.
    pub fn runtime(config: &NetworkConfig, backend: &dyn NetworkBackend, wallet: Arc<dyn Wallet>) -> Result<Self> {
        let mut registry = NodeRegistry::new();
        for (name, peer) in &config.peers {
            registry.add_peer(peer_handle(name, peer, backend)?);
        }
        for (name, orderer) in &config.orderers {
            registry.add_orderer(orderer_handle(name, &orderer.url, backend)?);
        }
        for (name, ca) in &config.certificate_authorities {
            registry.add_authority(ca_handle(name, &ca.url, backend)?);
        }
        info!(
            "connected to runtime network: {} peers, {} orderers, {} lifecycle",
            registry.peers().len(),
            registry.orderer_names().len(),
            LifecycleVariant::from(config.lifecycle)
        );
        Ok(Self {
            registry,
            variant: config.lifecycle.into(),
            timeouts: config.timeouts.clone(),
            wallet,
            active_identity: RwLock::new(None),
            channels: Mutex::new(HashMap::new()),
        })
    }

    /// Connect through a gateway connection profile. The given wallet label
    /// becomes the active identity; channel membership is discovered live.
    pub fn gateway(
        profile: &ConnectionProfile,
        backend: &dyn NetworkBackend,
        wallet: Arc<dyn Wallet>,
        identity: &IdentityLabel,
    ) -> Result<Self> {
        let mut registry = NodeRegistry::new();
        for (name, peer) in &profile.peers {
            registry.add_peer(peer_handle(name, peer, backend)?);
        }
        for (name, orderer) in &profile.orderers {
            registry.add_orderer(orderer_handle(name, &orderer.url, backend)?);
        }
        for (name, ca) in &profile.certificate_authorities {
            registry.add_authority(ca_handle(name, &ca.url, backend)?);
        }
        let active = require_identity(wallet.as_ref(), identity)?;
        if profile.is_platform_profile() {
            debug!("profile carries a platform network id");
        } else if profile.is_localhost_profile() {
            debug!("profile points at a localhost network");
        }
        info!(
            "connected via gateway profile as {} ({}), organization {}",
            active.label, active.msp_id, profile.client.organization
        );
        Ok(Self {
            registry,
            variant: profile.lifecycle.into(),
            timeouts: profile.timeouts.clone(),
            wallet,
            active_identity: RwLock::new(Some(active)),
            channels: Mutex::new(HashMap::new()),
        })
    }

    pub fn lifecycle(&self) -> LifecycleCoordinator<'_> {
        LifecycleCoordinator::new(self)
    }

    pub fn variant(&self) -> LifecycleVariant {
        self.variant
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn get_peer(&self, name: &PeerName) -> Result<PeerHandle> {
        self.registry.peer(name).cloned()
    }

    /// Resolve signing material for `label` from the wallet and make it the
    /// identity used for subsequent transactions.
    pub fn set_identity(&self, label: &IdentityLabel) -> Result<Identity> {
        let identity = require_identity(self.wallet.as_ref(), label)?;
        if let Ok(mut active) = self.active_identity.write() {
            *active = Some(identity.clone());
        }
        debug!("active identity set to {} ({})", identity.label, identity.msp_id);
        Ok(identity)
    }

    pub fn active_identity(&self) -> Result<Identity> {
        self.active_identity
            .read()
            .ok()
            .and_then(|active| active.clone())
            .ok_or_else(|| WeftError::IdentityNotFound("no active identity selected".to_string()))
    }

    /// Return the cached channel, or initialize it by asking each known peer
    /// for membership info in registration order. One unreachable peer never
    /// blocks initialization while another member can answer.
    pub async fn get_or_create_channel(&self, name: &ChannelName) -> Result<Arc<Channel>> {
        let mut channels = self.channels.lock().await;
        if let Some(channel) = channels.get(name) {
            return Ok(channel.clone());
        }

        let mut last_error = format!("no peers registered to ask about channel {}", name);
        for peer in self.registry.peers() {
            match peer.rpc.channel_info(name).await {
                Ok(info) => {
                    let orderer_name = info
                        .orderers
                        .first()
                        .ok_or_else(|| WeftError::OrdererNotFound(name.to_string()))?;
                    let orderer = self.registry.orderer(orderer_name)?.clone();
                    debug!(
                        "initialized channel {} via {}: {} members, height {}",
                        name,
                        peer.name,
                        info.members.len(),
                        info.height
                    );
                    let channel = Arc::new(Channel { name: name.clone(), info, orderer });
                    channels.insert(name.clone(), channel.clone());
                    return Ok(channel);
                }
                Err(err) => {
                    warn!("peer {} could not describe channel {}: {}", peer.name, name, err);
                    last_error = err.to_string();
                }
            }
        }
        Err(WeftError::ChannelDiscoveryFailed { channel: name.to_string(), last_error })
    }

    /// Installed packages on one peer, keyed by label. An access-denied
    /// answer means the identity is not a peer admin; surfaced as an empty
    /// map rather than an error, matching the admin-optional query surface.
    pub async fn installed_chaincode(&self, peer: &PeerName) -> Result<BTreeMap<String, PackageId>> {
        let handle = self.get_peer(peer)?;
        match handle.rpc.query_installed().await {
            Ok(records) => Ok(records.into_iter().map(|record| (record.label, record.package_id)).collect()),
            Err(err) if matches!(err, WeftError::AccessDenied { .. }) => {
                warn!("identity is not an admin on {}; reporting no installed chaincodes", peer);
                Ok(BTreeMap::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Chaincodes deployed on a channel, asked of the first member peer.
    pub async fn instantiated_chaincode(&self, channel: &ChannelName) -> Result<Vec<InstantiatedChaincode>> {
        let handle = self.member_peer(channel).await?;
        handle.rpc.query_instantiated(channel).await
    }

    pub async fn channels_for_peer(&self, peer: &PeerName) -> Result<Vec<ChannelName>> {
        let handle = self.get_peer(peer)?;
        let mut names = handle.rpc.query_channels().await?;
        names.sort();
        Ok(names)
    }

    pub async fn committed_definition(
        &self,
        channel: &ChannelName,
        name: &str,
    ) -> Result<Option<ChaincodeDefinition>> {
        let handle = self.member_peer(channel).await?;
        handle.rpc.query_committed(channel, name).await
    }

    /// First registered peer that is a member of `channel`.
    pub(crate) async fn member_peer(&self, channel: &ChannelName) -> Result<PeerHandle> {
        let channel = self.get_or_create_channel(channel).await?;
        for peer in self.registry.peers() {
            if channel.info.members.iter().any(|(name, _)| name == &peer.name) {
                return Ok(peer.clone());
            }
        }
        Err(WeftError::PeerNotFound(format!("no registered peer is a member of {}", channel.name)))
    }

    pub async fn enroll(
        &self,
        ca_name: &str,
        enrollment_id: &str,
        enrollment_secret: &str,
        msp_id: &MspId,
    ) -> Result<Identity> {
        let ca = self.registry.authority(ca_name)?;
        let Enrollment { certificate, private_key } = ca.rpc.enroll(enrollment_id, enrollment_secret).await?;
        let identity = Identity {
            label: IdentityLabel::new(enrollment_id),
            msp_id: msp_id.clone(),
            certificate,
            private_key,
        };
        self.wallet.put(identity.clone());
        info!("enrolled {} against {} into the wallet", enrollment_id, ca_name);
        Ok(identity)
    }

    /// Register a new enrollment id with a CA, acting as the active identity.
    pub async fn register(&self, ca_name: &str, enrollment_id: &str, affiliation: &str) -> Result<String> {
        let registrar = self.active_identity()?;
        let ca = self.registry.authority(ca_name)?;
        let request = RegistrationRequest {
            enrollment_id: enrollment_id.to_string(),
            affiliation: affiliation.to_string(),
            role: "client".to_string(),
        };
        ca.rpc.register(&request, &registrar).await
    }

    /// Drop cached channels. Event subscriptions are single-use and already
    /// torn down by the operations that opened them.
    pub async fn close(&self) {
        let mut channels = self.channels.lock().await;
        if !channels.is_empty() {
            debug!("closing connection: dropping {} cached channels", channels.len());
        }
        channels.clear();
    }
}

fn peer_handle(
    name: &str,
    config: &crate::infrastructure::config::PeerConfig,
    backend: &dyn NetworkBackend,
) -> Result<PeerHandle> {
    let peer = PeerName::new(name);
    let rpc = backend.peer_rpc(&peer).ok_or_else(|| WeftError::PeerNotFound(name.to_string()))?;
    let events = backend.event_source(&peer).ok_or_else(|| WeftError::PeerNotFound(name.to_string()))?;
    Ok(PeerHandle {
        name: peer,
        msp_id: MspId::new(config.msp_id.clone()),
        url: config.url.clone(),
        identity_label: IdentityLabel::new(config.identity_label.clone()),
        rpc,
        events,
    })
}

fn orderer_handle(name: &str, url: &str, backend: &dyn NetworkBackend) -> Result<OrdererHandle> {
    let orderer = crate::foundation::OrdererName::new(name);
    let rpc = backend.orderer_rpc(&orderer).ok_or_else(|| WeftError::OrdererNotFound(name.to_string()))?;
    Ok(OrdererHandle { name: orderer, url: url.to_string(), rpc })
}

fn ca_handle(name: &str, url: &str, backend: &dyn NetworkBackend) -> Result<CaHandle> {
    let rpc = backend.certificate_authority(name).ok_or_else(|| WeftError::CaNotFound(name.to_string()))?;
    Ok(CaHandle { name: name.to_string(), url: url.to_string(), rpc })
}
