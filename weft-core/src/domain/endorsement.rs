//! Proposal response validation.
//!
//! Pure function over the collected per-peer results: the first error
//! placeholder or non-200 status fails the whole set, and all non-empty
//! payloads must agree byte-for-byte. Divergent endorsements abort rather
//! than picking one; retries, if any, belong to the caller.

use crate::domain::hashes::payload_digest;
use crate::domain::proposal::ProposalResult;
use crate::foundation::{Result, WeftError};

/// Validate a set of proposal results and return the agreed payload.
///
/// An empty payload is a legal outcome (most lifecycle operations return
/// none); an empty result set is not.
pub fn validate_responses(results: &[ProposalResult]) -> Result<Vec<u8>> {
    if results.is_empty() {
        return Err(WeftError::Message("no proposal responses received".to_string()));
    }

    let mut agreed: Option<(&ProposalResult, &[u8])> = None;
    for result in results {
        let response = match result {
            ProposalResult::Endorsed(response) => response,
            ProposalResult::Unreachable { peer, message } => {
                return Err(WeftError::endorsement_failed(peer.as_str(), message.clone()));
            }
            ProposalResult::TimedOut { peer, waited_secs } => {
                return Err(WeftError::ProposalSendTimeout { peer: peer.to_string(), waited_secs: *waited_secs });
            }
        };
        if !response.is_ok() {
            return Err(WeftError::endorsement_failed(response.peer.as_str(), response.message.clone()));
        }
        if response.payload.is_empty() {
            continue;
        }
        match agreed {
            None => agreed = Some((result, &response.payload)),
            Some((first, expected)) => {
                if expected != response.payload.as_slice() {
                    return Err(WeftError::EndorsementMismatch {
                        peer: response.peer.to_string(),
                        expected: format!("{} (from {})", payload_digest(expected), first.peer()),
                        actual: payload_digest(&response.payload),
                    });
                }
            }
        }
    }

    Ok(agreed.map(|(_, payload)| payload.to_vec()).unwrap_or_default())
}
