//! Ports onto the Fabric network: peers, the ordering service, and the
//! per-transaction commit event stream. The wire protocol itself is out of
//! scope; implementations adapt these traits onto whatever transport serves
//! the deployment (the in-process simulator for the local runtime).

use crate::domain::chaincode::{ChaincodeDefinition, InstalledPackage, InstantiatedChaincode};
use crate::domain::proposal::{BroadcastStatus, CommitNotice, ProposalRequest, ProposalResponse, TransactionEnvelope};
use crate::foundation::{ChannelName, MspId, OrdererName, PackageId, PeerName, Result, TransactionId, WeftError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Channel membership as reported by a peer during initialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelInfo {
    pub name: ChannelName,
    pub members: Vec<(PeerName, MspId)>,
    pub orderers: Vec<OrdererName>,
    pub height: u64,
}

#[async_trait]
pub trait PeerRpc: Send + Sync {
    async fn process_proposal(&self, request: &ProposalRequest) -> Result<ProposalResponse>;
    async fn install_package(&self, label: &str, bytes: &[u8]) -> Result<PackageId>;
    async fn query_installed(&self) -> Result<Vec<InstalledPackage>>;
    async fn query_channels(&self) -> Result<Vec<ChannelName>>;
    async fn channel_info(&self, channel: &ChannelName) -> Result<ChannelInfo>;
    async fn query_instantiated(&self, channel: &ChannelName) -> Result<Vec<InstantiatedChaincode>>;
    async fn query_committed(&self, channel: &ChannelName, name: &str) -> Result<Option<ChaincodeDefinition>>;
    async fn query_approvals(
        &self,
        channel: &ChannelName,
        definition: &ChaincodeDefinition,
    ) -> Result<BTreeMap<MspId, bool>>;
}

#[async_trait]
pub trait OrdererRpc: Send + Sync {
    async fn broadcast(&self, envelope: TransactionEnvelope) -> Result<BroadcastStatus>;
}

#[async_trait]
pub trait CommitEventSource: Send + Sync {
    /// Register interest in one transaction's commit verdict. The returned
    /// subscription must be established before the transaction is broadcast.
    async fn subscribe(&self, transaction_id: TransactionId) -> Result<CommitSubscription>;
}

/// Single-use commit-event subscription: connect once, await one terminal
/// event, disconnect. Dropping the subscription also disconnects.
pub struct CommitSubscription {
    peer: PeerName,
    transaction_id: TransactionId,
    receiver: oneshot::Receiver<CommitNotice>,
    on_disconnect: Option<Box<dyn FnOnce() + Send>>,
}

impl CommitSubscription {
    pub fn new(
        peer: PeerName,
        transaction_id: TransactionId,
        receiver: oneshot::Receiver<CommitNotice>,
        on_disconnect: Option<Box<dyn FnOnce() + Send>>,
    ) -> Self {
        Self { peer, transaction_id, receiver, on_disconnect }
    }

    pub fn peer(&self) -> &PeerName {
        &self.peer
    }

    /// Block until the commit event fires or `timeout` elapses. The
    /// subscription is torn down on every exit path.
    pub async fn await_commit(mut self, timeout: Duration) -> Result<CommitNotice> {
        let waited = tokio::time::timeout(timeout, &mut self.receiver).await;
        let outcome = match waited {
            Err(_) => Err(WeftError::CommitTimeout {
                tx_id: self.transaction_id.to_string(),
                waited_secs: timeout.as_secs(),
            }),
            Ok(Err(_closed)) => Err(WeftError::EventStreamClosed(self.peer.to_string())),
            Ok(Ok(notice)) => Ok(notice),
        };
        self.disconnect_now();
        outcome
    }

    /// Explicit teardown, used when the operation fails before the wait.
    pub fn disconnect(mut self) {
        self.disconnect_now();
    }

    fn disconnect_now(&mut self) {
        if let Some(hook) = self.on_disconnect.take() {
            hook();
        }
    }
}

impl Drop for CommitSubscription {
    fn drop(&mut self) {
        self.disconnect_now();
    }
}

/// Handle bundle a connection needs to talk to one named peer.
#[derive(Clone)]
pub struct PeerHandle {
    pub name: PeerName,
    pub msp_id: MspId,
    pub url: String,
    pub identity_label: crate::foundation::IdentityLabel,
    pub rpc: Arc<dyn PeerRpc>,
    pub events: Arc<dyn CommitEventSource>,
}

// The trait objects have no useful rendering; show the addressing fields.
impl fmt::Debug for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerHandle")
            .field("name", &self.name)
            .field("msp_id", &self.msp_id)
            .field("url", &self.url)
            .field("identity_label", &self.identity_label)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct OrdererHandle {
    pub name: OrdererName,
    pub url: String,
    pub rpc: Arc<dyn OrdererRpc>,
}

impl fmt::Debug for OrdererHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrdererHandle").field("name", &self.name).field("url", &self.url).finish_non_exhaustive()
    }
}

/// Resolves node names to live transport handles for one deployment.
pub trait NetworkBackend: Send + Sync {
    fn peer_rpc(&self, name: &PeerName) -> Option<Arc<dyn PeerRpc>>;
    fn orderer_rpc(&self, name: &OrdererName) -> Option<Arc<dyn OrdererRpc>>;
    fn event_source(&self, peer: &PeerName) -> Option<Arc<dyn CommitEventSource>>;
    fn certificate_authority(&self, name: &str) -> Option<Arc<dyn crate::infrastructure::wallet::CertificateAuthority>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::proposal::ValidationCode;

    #[tokio::test]
    async fn await_commit_times_out_and_runs_the_teardown_hook() {
        let (_tx, rx) = oneshot::channel::<CommitNotice>();
        let (hook_tx, hook_rx) = std::sync::mpsc::channel::<()>();
        let sub = CommitSubscription::new(
            PeerName::new("p1"),
            TransactionId::new([1; 32]),
            rx,
            Some(Box::new(move || {
                let _ = hook_tx.send(());
            })),
        );
        let err = sub.await_commit(Duration::from_millis(10)).await.unwrap_err();
        assert!(matches!(err, WeftError::CommitTimeout { .. }), "got {err}");
        hook_rx.try_recv().expect("teardown hook should have run");
    }

    #[tokio::test]
    async fn await_commit_delivers_the_notice() {
        let (tx, rx) = oneshot::channel();
        let sub = CommitSubscription::new(PeerName::new("p1"), TransactionId::new([2; 32]), rx, None);
        let notice = CommitNotice {
            transaction_id: TransactionId::new([2; 32]),
            code: ValidationCode::Valid,
            block_number: 3,
        };
        tx.send(notice).unwrap();
        assert_eq!(sub.await_commit(Duration::from_secs(1)).await.unwrap(), notice);
    }

    #[tokio::test]
    async fn dropped_sender_surfaces_stream_closed() {
        let (tx, rx) = oneshot::channel::<CommitNotice>();
        drop(tx);
        let sub = CommitSubscription::new(PeerName::new("p1"), TransactionId::new([3; 32]), rx, None);
        let err = sub.await_commit(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, WeftError::EventStreamClosed(_)), "got {err}");
    }
}
