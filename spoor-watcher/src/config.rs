//! Standard configuration module.

use serde_derive::Deserialize;
use spoor_util::{ConfigExt, crate_name};

/// `spoor-watcher` configuration.
#[derive(Deserialize, Debug)]
pub struct Config {
    /// Address for the read API to listen on, e.g. "127.0.0.1:8049".
    pub listen: String,
    /// BART API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// BART API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Seconds between ETD polls.
    #[serde(default)]
    pub poll_interval_secs: Option<u64>
}

impl ConfigExt for Config {
    fn crate_name() -> &'static str {
        crate_name!()
    }
}
