use crate::domain::lifecycle::LifecycleVariant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Static description of a managed local network (the runtime variant).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Which chaincode lifecycle the network speaks.
    #[serde(default)]
    pub lifecycle: LifecycleVariantConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Peers keyed by name.
    #[serde(default)]
    pub peers: BTreeMap<String, PeerConfig>,
    /// Orderers keyed by name.
    #[serde(default)]
    pub orderers: BTreeMap<String, OrdererConfig>,
    /// Certificate authorities keyed by name.
    #[serde(default)]
    pub certificate_authorities: BTreeMap<String, CaConfig>,
    /// Channels keyed by name.
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
}

/// Serde-facing wrapper so config files can say `lifecycle = "v2"`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LifecycleVariantConfig(pub LifecycleVariant);

impl From<LifecycleVariantConfig> for LifecycleVariant {
    fn from(value: LifecycleVariantConfig) -> Self {
        value.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Bound on each proposal send, in seconds.
    #[serde(default = "default_proposal_secs")]
    pub proposal_secs: u64,
    /// Bound on the commit-event wait, in seconds.
    #[serde(default = "default_commit_secs")]
    pub commit_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { proposal_secs: default_proposal_secs(), commit_secs: default_commit_secs() }
    }
}

impl TimeoutConfig {
    pub fn proposal(&self) -> Duration {
        Duration::from_secs(self.proposal_secs)
    }

    pub fn commit(&self) -> Duration {
        Duration::from_secs(self.commit_secs)
    }
}

fn default_proposal_secs() -> u64 {
    30
}

fn default_commit_secs() -> u64 {
    60
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PeerConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub msp_id: String,
    /// Wallet label of the administrative identity for this peer.
    #[serde(default)]
    pub identity_label: String,
    /// PEM of the TLS CA, or a path to it. Unused by the in-process backend.
    #[serde(default)]
    pub tls_ca: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OrdererConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub tls_ca: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CaConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub msp_id: String,
    #[serde(default)]
    pub identity_label: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Peer names that are members of this channel.
    #[serde(default)]
    pub members: Vec<String>,
    /// Orderer names serving this channel.
    #[serde(default)]
    pub orderers: Vec<String>,
}

/// A gateway connection profile: the same node sections plus the client org.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConnectionProfile {
    #[serde(default)]
    pub client: ProfileClient,
    #[serde(default)]
    pub lifecycle: LifecycleVariantConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub peers: BTreeMap<String, PeerConfig>,
    #[serde(default)]
    pub orderers: BTreeMap<String, OrdererConfig>,
    #[serde(default)]
    pub certificate_authorities: BTreeMap<String, CaConfig>,
    /// Platform marker carried by some hosted networks (`x-networkId`).
    #[serde(default, rename = "x-network-id")]
    pub network_id: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfileClient {
    #[serde(default)]
    pub organization: String,
}

impl ConnectionProfile {
    pub fn is_platform_profile(&self) -> bool {
        self.network_id.is_some()
    }

    /// True when every node URL points at localhost, in which case service
    /// discovery is translated to localhost addresses instead of enabled.
    pub fn is_localhost_profile(&self) -> bool {
        let urls = self
            .peers
            .values()
            .map(|p| p.url.as_str())
            .chain(self.orderers.values().map(|o| o.url.as_str()))
            .chain(self.certificate_authorities.values().map(|c| c.url.as_str()))
            .filter(|url| !url.is_empty());
        let mut any = false;
        for url in urls {
            any = true;
            if !is_localhost_url(url) {
                return false;
            }
        }
        any
    }
}

fn is_localhost_url(url: &str) -> bool {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host = rest.split(['/', ':']).next().unwrap_or("");
    host == "localhost" || host == "127.0.0.1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_defaults_match_the_protocol_bounds() {
        let timeouts = TimeoutConfig::default();
        assert_eq!(timeouts.proposal(), Duration::from_secs(30));
        assert_eq!(timeouts.commit(), Duration::from_secs(60));
    }

    #[test]
    fn localhost_detection_covers_schemes_and_ports() {
        let mut profile = ConnectionProfile::default();
        profile.peers.insert(
            "peer0".to_string(),
            PeerConfig { url: "grpcs://localhost:7051".to_string(), ..Default::default() },
        );
        profile.orderers.insert(
            "orderer".to_string(),
            OrdererConfig { url: "grpcs://127.0.0.1:7050".to_string(), ..Default::default() },
        );
        assert!(profile.is_localhost_profile());

        profile.peers.insert(
            "peer1".to_string(),
            PeerConfig { url: "grpcs://peer1.example.com:7051".to_string(), ..Default::default() },
        );
        assert!(!profile.is_localhost_profile());
    }

    #[test]
    fn empty_profile_is_not_localhost() {
        assert!(!ConnectionProfile::default().is_localhost_profile());
    }

    #[test]
    fn lifecycle_field_accepts_the_short_form() {
        let config: NetworkConfig = toml::from_str("lifecycle = \"v1\"").unwrap();
        assert_eq!(LifecycleVariant::from(config.lifecycle), LifecycleVariant::V1);
        let config: NetworkConfig = toml::from_str("").unwrap();
        assert_eq!(LifecycleVariant::from(config.lifecycle), LifecycleVariant::V2);
    }
}
