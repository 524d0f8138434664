use crate::domain::chaincode::ChaincodeDefinition;
use crate::foundation::{ChannelName, MspId, PeerName, TransactionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The reserved introspection function invoked when a caller supplies none.
pub const METADATA_FUNCTION: &str = "org.hyperledger.fabric:GetMetadata";

/// What a proposal asks target peers to simulate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ChaincodeAction {
    ApproveChaincode(ChaincodeDefinition),
    CommitChaincode(ChaincodeDefinition),
    InstantiateV1 { name: String, version: String, fcn: String, args: Vec<String> },
    UpgradeV1 { name: String, version: String, fcn: String, args: Vec<String> },
    Invoke { chaincode: String, fcn: String, args: Vec<String> },
}

impl ChaincodeAction {
    pub fn describe(&self) -> String {
        match self {
            ChaincodeAction::ApproveChaincode(def) => format!("approve {}", def),
            ChaincodeAction::CommitChaincode(def) => format!("commit {}", def),
            ChaincodeAction::InstantiateV1 { name, version, .. } => format!("instantiate {}@{}", name, version),
            ChaincodeAction::UpgradeV1 { name, version, .. } => format!("upgrade {}@{}", name, version),
            ChaincodeAction::Invoke { chaincode, fcn, .. } => format!("invoke {}:{}", chaincode, fcn),
        }
    }
}

/// A transaction proposal as sent to each target peer for simulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub channel: ChannelName,
    pub transaction_id: TransactionId,
    pub creator_msp: MspId,
    pub action: ChaincodeAction,
}

/// A peer's signed simulation result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub peer: PeerName,
    pub status: u16,
    pub message: String,
    pub payload: Vec<u8>,
    pub endorsement: Option<Endorsement>,
}

impl ProposalResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Endorsement {
    pub endorser_msp: MspId,
    pub signature: Vec<u8>,
}

/// Per-peer outcome of the proposal phase. Error placeholders are kept in
/// position so the validator can report the failing peer.
#[derive(Clone, Debug)]
pub enum ProposalResult {
    Endorsed(ProposalResponse),
    Unreachable { peer: PeerName, message: String },
    TimedOut { peer: PeerName, waited_secs: u64 },
}

impl ProposalResult {
    pub fn peer(&self) -> &PeerName {
        match self {
            ProposalResult::Endorsed(response) => &response.peer,
            ProposalResult::Unreachable { peer, .. } => peer,
            ProposalResult::TimedOut { peer, .. } => peer,
        }
    }
}

/// The endorsed transaction handed to the ordering service as one broadcast.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub channel: ChannelName,
    pub transaction_id: TransactionId,
    pub creator_msp: MspId,
    pub action: ChaincodeAction,
    pub endorsements: Vec<ProposalResponse>,
}

/// Status reported by the ordering service for a broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastStatus {
    Success,
    BadRequest,
    Forbidden,
    NotFound,
    ServiceUnavailable,
    InternalServerError,
}

impl fmt::Display for BroadcastStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BroadcastStatus::Success => "SUCCESS",
            BroadcastStatus::BadRequest => "BAD_REQUEST",
            BroadcastStatus::Forbidden => "FORBIDDEN",
            BroadcastStatus::NotFound => "NOT_FOUND",
            BroadcastStatus::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            BroadcastStatus::InternalServerError => "INTERNAL_SERVER_ERROR",
        };
        f.write_str(text)
    }
}

/// Ledger validation verdict delivered with the per-transaction commit event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationCode {
    Valid,
    MvccReadConflict,
    EndorsementPolicyFailure,
    BadPayload,
    InvalidOtherReason,
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValidationCode::Valid => "VALID",
            ValidationCode::MvccReadConflict => "MVCC_READ_CONFLICT",
            ValidationCode::EndorsementPolicyFailure => "ENDORSEMENT_POLICY_FAILURE",
            ValidationCode::BadPayload => "BAD_PAYLOAD",
            ValidationCode::InvalidOtherReason => "INVALID_OTHER_REASON",
        };
        f.write_str(text)
    }
}

/// One-shot notification that a transaction reached the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitNotice {
    pub transaction_id: TransactionId,
    pub code: ValidationCode,
    pub block_number: u64,
}
