//! Foundation layer: error taxonomy, identifier newtypes, small utilities.

pub mod error;
pub mod types;
pub mod util;

pub use error::{ErrorCode, Result, WeftError};
pub use types::{
    ChannelName, Hash32, IdentityLabel, MspId, OrdererName, PackageId, PeerName, TransactionId,
};
