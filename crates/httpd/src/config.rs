//! Server configuration, loaded from TOML.
//!
//! Every field has a default matching the small-board build, so an empty file
//! (or no file at all) gives a working server.

use std::{fs, net::SocketAddr, path::Path};

use httpd_hal::Timeouts;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen: SocketAddr,
    /// Filesystem prefix every request path is mapped under.
    pub content_root: String,
    /// Connection pool slots.
    pub max_connections: usize,
    /// WebSocket peer pool slots.
    pub max_peers: usize,
    pub recv_timeout_ms: u64,
    pub send_timeout_ms: u64,
    pub max_uri_len: usize,
    /// Output buffer size; bounds file chunks, script output and server frames.
    pub out_buf: usize,
    /// Poll cycles without traffic before a peer is evicted.
    pub ws_idle_limit: u32,
    /// Empty receive cycles before a silent connection is dropped.
    pub request_idle_limit: u32,
    pub script_step_limit: u32,
    /// Probed in order when a request names a directory.
    pub index_files: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 80)),
            content_root: "/html".to_string(),
            max_connections: 1,
            max_peers: 4,
            recv_timeout_ms: 100,
            send_timeout_ms: 1000,
            max_uri_len: 64,
            out_buf: 1024,
            ws_idle_limit: 600,
            request_idle_limit: 50,
            script_step_limit: 4096,
            index_files: ["index.htm", "index.html", "index.lua", "index.cgi", "index.ssi"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let txt = fs::read_to_string(path)?;
        Self::from_toml(&txt)
    }

    pub fn from_toml(txt: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(txt)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be at least 1"));
        }
        if self.max_peers == 0 {
            return Err(ConfigError::Invalid("max_peers must be at least 1"));
        }
        if self.out_buf < 4 {
            return Err(ConfigError::Invalid("out_buf must hold at least one flash word"));
        }
        if self.max_uri_len == 0 {
            return Err(ConfigError::Invalid("max_uri_len must be at least 1"));
        }
        Ok(())
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts::from_millis(self.recv_timeout_ms, self.send_timeout_ms)
    }

    /// File read size, rounded down to the flash driver's 4-byte alignment.
    pub fn chunk_size(&self) -> usize {
        self.out_buf & !3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.max_connections, 1);
        assert_eq!(cfg.content_root, "/html");
        assert_eq!(cfg.index_files[0], "index.htm");
        assert_eq!(cfg.index_files.len(), 5);
    }

    #[test]
    fn overrides() {
        let cfg = Config::from_toml(
            r#"
            listen = "127.0.0.1:8080"
            max_peers = 2
            out_buf = 1023
            "#,
        )
        .unwrap();
        assert_eq!(cfg.listen, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.max_peers, 2);
        assert_eq!(cfg.chunk_size(), 1020);
    }

    #[test]
    fn rejects_zero_pool() {
        assert!(matches!(
            Config::from_toml("max_connections = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml("max_peers = \"four\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
