use figment::{
    Figment,
    providers::{Format, Serialized, Yaml},
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub namenode_addr: String,
    /// Directory holding chunk bytes and their digest sidecars.
    pub storage_root: String,
    /// Advertised capacity in bytes; usage is accounted against it.
    pub capacity_bytes: u64,
    pub heartbeat_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: "datanode_1".to_owned(),
            host: "127.0.0.1".to_owned(),
            port: 8001,
            namenode_addr: "127.0.0.1:8000".to_owned(),
            storage_root: "./datanode_storage/datanode_1".to_owned(),
            capacity_bytes: 1024 * 1024 * 1024,
            heartbeat_interval_ms: 10_000,
        }
    }
}

impl Config {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    let env = std::env::var("ENV").unwrap_or_else(|_| "default".to_owned());
    let config_file_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| format!("./datanode/config/{env}.yaml"));
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Yaml::file(config_file_path))
        .extract()
        .unwrap()
});
