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
    /// Fixed byte length of every non-terminal chunk.
    pub chunk_size: u64,
    /// Replicas per chunk.
    pub replication: u32,
    pub heartbeat_interval_ms: u64,
    /// Heartbeat age at which a datanode is considered dead. Must stay at
    /// least 3x the heartbeat interval.
    pub liveness_timeout_ms: u64,
    pub housekeeping_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: "namenode_1".to_owned(),
            host: "127.0.0.1".to_owned(),
            port: 8000,
            chunk_size: 1024 * 1024,
            replication: 3,
            heartbeat_interval_ms: 10_000,
            liveness_timeout_ms: 30_000,
            housekeeping_interval_ms: 5_000,
        }
    }
}

impl Config {
    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }
    pub fn housekeeping_interval(&self) -> Duration {
        Duration::from_millis(self.housekeeping_interval_ms)
    }
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be non-zero".to_owned());
        }
        if self.replication == 0 {
            return Err("replication must be non-zero".to_owned());
        }
        if self.liveness_timeout_ms < 3 * self.heartbeat_interval_ms {
            return Err(format!(
                "liveness_timeout_ms ({}) must be at least 3x heartbeat_interval_ms ({})",
                self.liveness_timeout_ms, self.heartbeat_interval_ms
            ));
        }
        Ok(())
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    let env = std::env::var("ENV").unwrap_or_else(|_| "default".to_owned());
    let config_file_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| format!("./namenode/config/{env}.yaml"));
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Yaml::file(config_file_path))
        .extract()
        .unwrap()
});
