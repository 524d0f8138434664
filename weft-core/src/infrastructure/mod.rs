//! Infrastructure layer: I/O seams and external integrations.

pub mod config;
pub mod inprocess;
pub mod logging;
pub mod rpc;
pub mod wallet;
