use std::io;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    PeerNotFound,
    ChannelNotFound,
    OrdererNotFound,
    IdentityNotFound,
    CaNotFound,
    PackageNotFound,
    AlreadyInstalled,
    AlreadyApproved,
    NotYetApproved,
    AlreadyInstantiated,
    NotInstantiated,
    UnsupportedLifecycleOperation,
    EndorsementFailed,
    EndorsementMismatch,
    OrderingFailed,
    CommitRejected,
    CommitTimeout,
    EventStreamClosed,
    ProposalSendTimeout,
    AccessDenied,
    ChannelDiscoveryFailed,
    InvalidStateTransition,
    EnrollmentFailed,
    WalletError,
    ConfigError,
    SerializationError,
    TransportError,
    Message,
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum WeftError {
    #[error("peer not found: {0}")]
    PeerNotFound(String),

    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error("no orderer known for channel {0}")]
    OrdererNotFound(String),

    #[error("identity not found in wallet: {0}")]
    IdentityNotFound(String),

    #[error("no certificate authority registered for {0}")]
    CaNotFound(String),

    #[error("no installed package found for {name}@{version}")]
    PackageNotFound { name: String, version: String },

    #[error("chaincode {name}@{version} is already installed on {peer}")]
    AlreadyInstalled { name: String, version: String, peer: String },

    #[error("chaincode definition {name}@{version} is already approved by this organization")]
    AlreadyApproved { name: String, version: String },

    #[error("chaincode definition {name}@{version} is not yet approved by all required organizations")]
    NotYetApproved { name: String, version: String },

    #[error("chaincode {0} is already instantiated on this channel")]
    AlreadyInstantiated(String),

    #[error("chaincode {0} has no previous version instantiated on this channel")]
    NotInstantiated(String),

    #[error("operation {operation} is not supported by the {variant} lifecycle")]
    UnsupportedLifecycleOperation { operation: String, variant: String },

    #[error("peer {peer} failed to endorse the proposal: {message}")]
    EndorsementFailed { peer: String, message: String },

    #[error("endorsement payload mismatch: peer {peer} returned {actual}, expected {expected}")]
    EndorsementMismatch { peer: String, expected: String, actual: String },

    #[error("failed to broadcast transaction {tx_id} to the ordering service: status {status}")]
    OrderingFailed { tx_id: String, status: String },

    #[error("peer rejected transaction {tx_id} with code {code} in block {block_number}")]
    CommitRejected { tx_id: String, block_number: u64, code: String },

    #[error("transaction {tx_id} was not committed within {waited_secs}s")]
    CommitTimeout { tx_id: String, waited_secs: u64 },

    #[error("commit event stream from peer {0} closed before a verdict was delivered")]
    EventStreamClosed(String),

    #[error("proposal send to peer {peer} timed out after {waited_secs}s")]
    ProposalSendTimeout { peer: String, waited_secs: u64 },

    #[error("access denied for {operation}")]
    AccessDenied { operation: String },

    #[error("could not discover information for channel {channel} from known peers: {last_error}")]
    ChannelDiscoveryFailed { channel: String, last_error: String },

    #[error("invalid lifecycle state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("enrollment against {ca} failed: {details}")]
    EnrollmentFailed { ca: String, details: String },

    #[error("wallet error: {0}")]
    WalletError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("{format} serialization error: {details}")]
    SerializationError { format: String, details: String },

    #[error("transport error during {operation}: {details}")]
    TransportError { operation: String, details: String },

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, WeftError>;

impl WeftError {
    pub fn code(&self) -> ErrorCode {
        match self {
            WeftError::PeerNotFound(_) => ErrorCode::PeerNotFound,
            WeftError::ChannelNotFound(_) => ErrorCode::ChannelNotFound,
            WeftError::OrdererNotFound(_) => ErrorCode::OrdererNotFound,
            WeftError::IdentityNotFound(_) => ErrorCode::IdentityNotFound,
            WeftError::CaNotFound(_) => ErrorCode::CaNotFound,
            WeftError::PackageNotFound { .. } => ErrorCode::PackageNotFound,
            WeftError::AlreadyInstalled { .. } => ErrorCode::AlreadyInstalled,
            WeftError::AlreadyApproved { .. } => ErrorCode::AlreadyApproved,
            WeftError::NotYetApproved { .. } => ErrorCode::NotYetApproved,
            WeftError::AlreadyInstantiated(_) => ErrorCode::AlreadyInstantiated,
            WeftError::NotInstantiated(_) => ErrorCode::NotInstantiated,
            WeftError::UnsupportedLifecycleOperation { .. } => ErrorCode::UnsupportedLifecycleOperation,
            WeftError::EndorsementFailed { .. } => ErrorCode::EndorsementFailed,
            WeftError::EndorsementMismatch { .. } => ErrorCode::EndorsementMismatch,
            WeftError::OrderingFailed { .. } => ErrorCode::OrderingFailed,
            WeftError::CommitRejected { .. } => ErrorCode::CommitRejected,
            WeftError::CommitTimeout { .. } => ErrorCode::CommitTimeout,
            WeftError::EventStreamClosed(_) => ErrorCode::EventStreamClosed,
            WeftError::ProposalSendTimeout { .. } => ErrorCode::ProposalSendTimeout,
            WeftError::AccessDenied { .. } => ErrorCode::AccessDenied,
            WeftError::ChannelDiscoveryFailed { .. } => ErrorCode::ChannelDiscoveryFailed,
            WeftError::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            WeftError::EnrollmentFailed { .. } => ErrorCode::EnrollmentFailed,
            WeftError::WalletError(_) => ErrorCode::WalletError,
            WeftError::ConfigError(_) => ErrorCode::ConfigError,
            WeftError::SerializationError { .. } => ErrorCode::SerializationError,
            WeftError::TransportError { .. } => ErrorCode::TransportError,
            WeftError::Message(_) => ErrorCode::Message,
        }
    }

    pub fn context(&self) -> ErrorContext {
        ErrorContext { code: self.code(), message: self.to_string() }
    }

    pub fn endorsement_failed(peer: impl Into<String>, message: impl Into<String>) -> Self {
        WeftError::EndorsementFailed { peer: peer.into(), message: message.into() }
    }

    pub fn transport(operation: impl Into<String>, details: impl Into<String>) -> Self {
        WeftError::TransportError { operation: operation.into(), details: details.into() }
    }

    pub fn access_denied(operation: impl Into<String>) -> Self {
        WeftError::AccessDenied { operation: operation.into() }
    }

    pub fn unsupported(operation: impl Into<String>, variant: impl std::fmt::Display) -> Self {
        WeftError::UnsupportedLifecycleOperation { operation: operation.into(), variant: variant.to_string() }
    }
}

impl From<hex::FromHexError> for WeftError {
    fn from(err: hex::FromHexError) -> Self {
        WeftError::SerializationError { format: "hex".to_string(), details: err.to_string() }
    }
}

impl From<toml::de::Error> for WeftError {
    fn from(err: toml::de::Error) -> Self {
        WeftError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<io::Error> for WeftError {
    fn from(err: io::Error) -> Self {
        WeftError::ConfigError(format!("io error: {}", err))
    }
}

impl From<serde_json::Error> for WeftError {
    fn from(err: serde_json::Error) -> Self {
        WeftError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<bincode::Error> for WeftError {
    fn from(err: bincode::Error) -> Self {
        WeftError::SerializationError { format: "bincode".to_string(), details: err.to_string() }
    }
}

// NOTE: Avoid adding generic "stringly" error conversions here.
// Use structured `WeftError` variants at the call site to preserve context.
