use crate::foundation::WeftError;
use crate::infrastructure::config::types::NetworkConfig;

/// Structural validation beyond what serde enforces: cross-references must
/// resolve and the protocol bounds must be non-zero.
pub fn validate_network_config(config: &NetworkConfig) -> Result<(), WeftError> {
    if config.timeouts.proposal_secs == 0 {
        return Err(WeftError::ConfigError("timeouts.proposal_secs must be non-zero".to_string()));
    }
    if config.timeouts.commit_secs == 0 {
        return Err(WeftError::ConfigError("timeouts.commit_secs must be non-zero".to_string()));
    }

    for (channel_name, channel) in &config.channels {
        if channel.members.is_empty() {
            return Err(WeftError::ConfigError(format!("channel {} has no member peers", channel_name)));
        }
        for member in &channel.members {
            if !config.peers.contains_key(member) {
                return Err(WeftError::ConfigError(format!(
                    "channel {} references undeclared peer {}",
                    channel_name, member
                )));
            }
        }
        for orderer in &channel.orderers {
            if !config.orderers.contains_key(orderer) {
                return Err(WeftError::ConfigError(format!(
                    "channel {} references undeclared orderer {}",
                    channel_name, orderer
                )));
            }
        }
    }

    for (peer_name, peer) in &config.peers {
        if peer.msp_id.is_empty() {
            return Err(WeftError::ConfigError(format!("peer {} has no msp_id", peer_name)));
        }
        if peer.identity_label.is_empty() {
            return Err(WeftError::ConfigError(format!("peer {} has no identity_label", peer_name)));
        }
    }

    Ok(())
}
