mod loader;
mod types;
mod validation;

pub use loader::{load_network_config, ENV_PREFIX};
pub use types::{
    CaConfig, ChannelConfig, ConnectionProfile, LifecycleVariantConfig, NetworkConfig, OrdererConfig,
    PeerConfig, ProfileClient, TimeoutConfig,
};
pub use validation::validate_network_config;
