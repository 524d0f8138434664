//! Application layer: the connection abstraction, the chaincode lifecycle
//! coordinator, the transaction commit protocol engine, and contract
//! metadata introspection.

pub mod commit;
pub mod connection;
pub mod lifecycle;
pub mod metadata;
pub mod registry;

pub use commit::CommitEngine;
pub use connection::{Channel, FabricConnection};
pub use lifecycle::LifecycleCoordinator;
pub use metadata::{parse_metadata, ContractMetadata};
pub use registry::{CaHandle, NodeRegistry};
