//! Transaction-id derivation and payload digests.

use crate::foundation::{IdentityLabel, MspId, TransactionId};
use rand::RngCore;

const TX_ID_DOMAIN: &[u8] = b"weft/tx-id/v1";

/// Derive a fresh transaction id for one proposal attempt.
///
/// Ids correlate proposal responses, the ordering submission, and the commit
/// event, so each attempt gets a new random nonce; a reused id would corrupt
/// event correlation.
pub fn generate_transaction_id(creator_msp: &MspId, identity: &IdentityLabel) -> TransactionId {
    let mut nonce = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut nonce);
    transaction_id_with_nonce(creator_msp, identity, &nonce)
}

pub fn transaction_id_with_nonce(creator_msp: &MspId, identity: &IdentityLabel, nonce: &[u8]) -> TransactionId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(TX_ID_DOMAIN);
    hasher.update(creator_msp.as_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(identity.as_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(nonce);
    TransactionId::new(*hasher.finalize().as_bytes())
}

/// Short hex digest of a payload, used in mismatch reports and logs.
pub fn payload_digest(payload: &[u8]) -> String {
    let digest = blake3::hash(payload);
    hex::encode(&digest.as_bytes()[..8])
}
