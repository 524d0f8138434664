//! In-process simulated Fabric network.
//!
//! Backs the managed local-runtime variant and the integration harness: peers
//! simulate proposal execution against shared per-channel ledger state, the
//! orderer sequences endorsed envelopes into blocks and emits commit events,
//! and fault injection covers the failure paths a real network produces
//! (unreachable peers, endorsement failures, divergent payloads, ordering
//! failures, post-ordering rejection, access-denied admin queries).

mod events;
mod ledger;
mod network;

pub use events::SimEventHub;
pub use network::{SimCertificateAuthority, SimNetwork};
