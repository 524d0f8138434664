use crate::application::connection::FabricConnection;
use crate::domain::endorsement::validate_responses;
use crate::domain::hashes::generate_transaction_id;
use crate::domain::proposal::{
    BroadcastStatus, ChaincodeAction, ProposalRequest, ProposalResult, TransactionEnvelope, ValidationCode,
};
use crate::foundation::{ChannelName, PeerName, Result, WeftError};
use crate::infrastructure::rpc::PeerHandle;
use futures_util::future::join_all;
use log::{debug, info};

/// Drives one transaction through propose, order and confirm.
///
/// Endorsement validation happens strictly before any ordering submission,
/// and the commit-event subscription is established before the broadcast so
/// a fast commit cannot slip past the listener.
pub struct CommitEngine<'a> {
    connection: &'a FabricConnection,
}

impl<'a> CommitEngine<'a> {
    pub fn new(connection: &'a FabricConnection) -> Self {
        Self { connection }
    }

    /// Run the full protocol and return the agreed endorsement payload.
    pub async fn execute(
        &self,
        channel_name: &ChannelName,
        action: ChaincodeAction,
        targets: &[PeerName],
    ) -> Result<Vec<u8>> {
        if targets.is_empty() {
            return Err(WeftError::Message("no target peers given for the proposal".to_string()));
        }
        let handles: Vec<PeerHandle> =
            targets.iter().map(|name| self.connection.get_peer(name)).collect::<Result<_>>()?;
        let channel = self.connection.get_or_create_channel(channel_name).await?;
        let identity = self.connection.active_identity()?;

        let transaction_id = generate_transaction_id(&identity.msp_id, &identity.label);
        let request = ProposalRequest {
            channel: channel_name.clone(),
            transaction_id,
            creator_msp: identity.msp_id.clone(),
            action,
        };
        info!("tx {}: proposing {} to {} peers", transaction_id, request.action.describe(), handles.len());

        let results = self.propose(&handles, &request).await;
        let payload = validate_responses(&results)?;
        let endorsements = results
            .into_iter()
            .filter_map(|result| match result {
                ProposalResult::Endorsed(response) => Some(response),
                _ => None,
            })
            .collect();

        // Listen on the first target before handing the envelope to the
        // orderer; committing can beat a late subscription.
        let subscription = handles[0].events.subscribe(transaction_id).await?;

        let envelope = TransactionEnvelope {
            channel: channel_name.clone(),
            transaction_id,
            creator_msp: request.creator_msp.clone(),
            action: request.action.clone(),
            endorsements,
        };
        let status = match channel.orderer.rpc.broadcast(envelope).await {
            Ok(status) => status,
            Err(err) => {
                subscription.disconnect();
                return Err(err);
            }
        };
        if status != BroadcastStatus::Success {
            subscription.disconnect();
            return Err(WeftError::OrderingFailed { tx_id: transaction_id.to_string(), status: status.to_string() });
        }
        debug!("tx {}: accepted by orderer {}", transaction_id, channel.orderer.name);

        let notice = subscription.await_commit(self.connection.timeouts().commit()).await?;
        if notice.code != ValidationCode::Valid {
            return Err(WeftError::CommitRejected {
                tx_id: transaction_id.to_string(),
                block_number: notice.block_number,
                code: notice.code.to_string(),
            });
        }
        info!("tx {}: committed in block {}", transaction_id, notice.block_number);
        Ok(payload)
    }

    /// Send the proposal to every target concurrently, each send bounded by
    /// the proposal timeout. Failures become positional placeholders so the
    /// validator can name the failing peer.
    async fn propose(&self, handles: &[PeerHandle], request: &ProposalRequest) -> Vec<ProposalResult> {
        let timeout = self.connection.timeouts().proposal();
        let sends = handles.iter().map(|handle| async move {
            match tokio::time::timeout(timeout, handle.rpc.process_proposal(request)).await {
                Ok(Ok(response)) => ProposalResult::Endorsed(response),
                Ok(Err(err)) => ProposalResult::Unreachable { peer: handle.name.clone(), message: err.to_string() },
                Err(_) => ProposalResult::TimedOut { peer: handle.name.clone(), waited_secs: timeout.as_secs() },
            }
        });
        join_all(sends).await
    }
}
