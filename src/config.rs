use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::doc::RegistryMode;

/// configuration struct.
/// Example:
/// listen_address: "127.0.0.1:9830",
/// use_version_provider_for_docs: false
/// store: { expiration: { secs: 300, nanos: 0 } }
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    /// address and port to which the API will listen for incoming requests.
    pub listen_address: SocketAddr,
    /// build one OpenAPI document per discovered API version instead of the declared list.
    pub use_version_provider_for_docs: bool,
    /// in-memory store configuration
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), 9830)),
            use_version_provider_for_docs: false,
            store: Default::default(),
        }
    }
}

impl Config {
    pub fn registry_mode(&self) -> RegistryMode {
        if self.use_version_provider_for_docs {
            RegistryMode::Discovery
        } else {
            RegistryMode::Declared
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoreConfig {
    /// store expiration after last request
    pub expiration: Duration,
}

/// Five minutes without any request and the forecasts are regenerated.
impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            expiration: Duration::from_secs(300),
        }
    }
}
