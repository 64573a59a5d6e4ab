//! HTTP surface configuration types.

use serde::{Deserialize, Serialize};

/// Where the chat page is served and how long idle sessions live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Sessions untouched for this long are ended by the reaper.
    pub session_idle_secs: u64,
    pub reap_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8501,
            session_idle_secs: 3600,
            reap_interval_secs: 60,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
