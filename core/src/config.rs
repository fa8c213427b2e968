//! Service configuration.
//!
//! Defaults, then an optional `wishlist.toml`, then `WISHLIST_*` environment
//! variables (`WISHLIST_PID`, `WISHLIST_REST_API_KEY`, `WISHLIST_ENDPOINT`,
//! `WISHLIST_DEFAULT_LIST_NAME`, `WISHLIST_USER_AGENT_TYPE`).

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

pub const DEFAULT_LIST_NAME: &str = "My Wishlist";
pub const DEFAULT_USER_AGENT_TYPE: &str = "swymHeadlessApp";

#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct WishlistConfig {
    /// Base URL of the wishlist service, without trailing slash.
    pub endpoint: String,
    /// Partner/store identifier.
    pub pid: String,
    pub rest_api_key: String,
    pub default_list_name: String,
    pub user_agent_type: String,
}

// The REST key never reaches logs.
impl std::fmt::Debug for WishlistConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistConfig")
            .field("endpoint", &self.endpoint)
            .field("pid", &self.pid)
            .field("rest_api_key", &"<redacted>")
            .field("default_list_name", &self.default_list_name)
            .field("user_agent_type", &self.user_agent_type)
            .finish()
    }
}

impl WishlistConfig {
    pub fn new(endpoint: &str, pid: &str, rest_api_key: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            pid: pid.to_string(),
            rest_api_key: rest_api_key.to_string(),
            default_list_name: DEFAULT_LIST_NAME.to_string(),
            user_agent_type: DEFAULT_USER_AGENT_TYPE.to_string(),
        }
    }

    pub fn with_default_list_name(mut self, name: &str) -> Self {
        self.default_list_name = name.to_string();
        self
    }

    /// Load from `wishlist.toml` (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("wishlist.toml")
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("endpoint", "https://swymstore-v3free-01.swymrelay.com")?
            .set_default("default_list_name", DEFAULT_LIST_NAME)?
            .set_default("user_agent_type", DEFAULT_USER_AGENT_TYPE)?
            .add_source(File::with_name(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("WISHLIST"))
            .build()?;

        let mut loaded: WishlistConfig = config.try_deserialize()?;
        loaded.endpoint = loaded.endpoint.trim_end_matches('/').to_string();
        Ok(loaded)
    }
}
