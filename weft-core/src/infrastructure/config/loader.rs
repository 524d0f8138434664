//! Configuration loader using Figment for layered config management.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. TOML config file
//! 3. Environment variables (WEFT_* prefix)

use crate::foundation::WeftError;
use crate::infrastructure::config::types::NetworkConfig;
use crate::infrastructure::config::validation::validate_network_config;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable prefix for config overrides.
///
/// Example: `WEFT_TIMEOUTS__COMMIT_SECS` -> `timeouts.commit_secs`
pub const ENV_PREFIX: &str = "WEFT_";

pub fn load_network_config(path: Option<&Path>) -> Result<NetworkConfig, WeftError> {
    let mut figment = Figment::from(Serialized::defaults(NetworkConfig::default()));
    if let Some(path) = path {
        debug!(path = %path.display(), "layering TOML network config");
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: NetworkConfig = figment
        .extract()
        .map_err(|err| WeftError::ConfigError(format!("failed to load network config: {}", err)))?;
    validate_network_config(&config)?;
    info!(
        peers = config.peers.len(),
        orderers = config.orderers.len(),
        channels = config.channels.len(),
        lifecycle = %crate::domain::lifecycle::LifecycleVariant::from(config.lifecycle),
        "network config loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Loading reads the process environment, so tests serialize on this.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const SAMPLE: &str = r#"
lifecycle = "v2"

[timeouts]
proposal_secs = 10
commit_secs = 20

[peers."peer0.org1.example.com"]
url = "grpcs://localhost:7051"
msp_id = "Org1MSP"
identity_label = "Admin@org1.example.com"

[orderers."orderer.example.com"]
url = "grpcs://localhost:7050"

[channels.mychannel]
members = ["peer0.org1.example.com"]
orderers = ["orderer.example.com"]
"#;

    fn write_sample() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("temp config");
        file.write_all(SAMPLE.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn toml_layer_overrides_defaults() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let file = write_sample();
        let config = load_network_config(Some(file.path())).expect("load");
        assert_eq!(config.timeouts.proposal_secs, 10);
        assert_eq!(config.timeouts.commit_secs, 20);
        assert_eq!(config.peers["peer0.org1.example.com"].msp_id, "Org1MSP");
        assert_eq!(config.channels["mychannel"].members.len(), 1);
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let config = load_network_config(None).expect("load");
        assert_eq!(config.timeouts.proposal_secs, 30);
        assert!(config.peers.is_empty());
    }

    #[test]
    fn env_layer_overrides_the_toml_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let file = write_sample();
        std::env::set_var("WEFT_TIMEOUTS__COMMIT_SECS", "99");
        let loaded = load_network_config(Some(file.path()));
        std::env::remove_var("WEFT_TIMEOUTS__COMMIT_SECS");

        let config = loaded.expect("load");
        assert_eq!(config.timeouts.commit_secs, 99, "env must beat the TOML value");
        assert_eq!(config.timeouts.proposal_secs, 10, "untouched TOML values stay");
    }

    #[test]
    fn invalid_member_reference_is_rejected() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("temp config");
        file.write_all(
            br#"
[channels.mychannel]
members = ["ghost-peer"]
orderers = []
"#,
        )
        .expect("write config");
        let err = load_network_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("ghost-peer"));
    }
}
