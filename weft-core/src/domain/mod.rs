//! Domain layer: pure protocol data and logic, no I/O.

pub mod chaincode;
pub mod endorsement;
pub mod hashes;
pub mod lifecycle;
pub mod proposal;

pub use chaincode::{
    ChaincodeDefinition, ChaincodePackage, EndorsementPolicy, InstalledPackage, InstantiatedChaincode,
};
pub use lifecycle::{DefinitionState, LifecycleVariant};
pub use proposal::{
    BroadcastStatus, ChaincodeAction, CommitNotice, Endorsement, ProposalRequest, ProposalResponse,
    ProposalResult, TransactionEnvelope, ValidationCode,
};
