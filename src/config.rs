//! Loads the JSON configuration document: the local replica's name and the
//! ordered peer list that fixes every replica's partition index.
//!
//! Grounded in `examples/original_source/src/config/config.cc`, reworked onto
//! `serde_json` and `std::net::IpAddr` instead of hand-rolled key extraction
//! and `inet_pton`/`inet_ntop`.

use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Deserialize, Debug, Clone)]
struct RawPeer {
    name: String,
    ip: String,
    port: u16,
}

#[derive(Deserialize, Debug, Clone)]
struct RawConfig {
    peers: Vec<RawPeer>,
}

/// One entry of the peer list, with its IP literal already validated and its
/// partition index fixed by its position in the configured list.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerConfig {
    pub name: String,
    pub ip: IpAddr,
    pub port: u16,
    pub partition_index: usize,
}

/// Fully resolved configuration for one replica process: its own name,
/// partition index, and the full (ordered) peer list, including itself.
#[derive(Debug, Clone)]
pub struct Config {
    pub self_name: String,
    pub partition_index: usize,
    pub peers: Vec<PeerConfig>,
}

impl Config {
    /// `N`, the cluster size, fixed by the number of configured peers.
    pub fn cluster_size(&self) -> usize {
        self.peers.len()
    }

    /// Loads and validates the configuration for `replica_name` from the
    /// JSON document at `path`. Every IP literal must parse; `replica_name`
    /// must appear exactly once in the peer list.
    pub fn load(path: &Path, replica_name: &str) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        if raw.peers.is_empty() {
            return Err(ConfigError::EmptyCluster);
        }

        let mut peers = Vec::with_capacity(raw.peers.len());
        for (partition_index, raw_peer) in raw.peers.into_iter().enumerate() {
            let ip = IpAddr::from_str(&raw_peer.ip).map_err(|_| ConfigError::InvalidIp {
                name: raw_peer.name.clone(),
                ip: raw_peer.ip.clone(),
            })?;
            peers.push(PeerConfig {
                name: raw_peer.name,
                ip,
                port: raw_peer.port,
                partition_index,
            });
        }

        let partition_index = peers
            .iter()
            .find(|p| p.name == replica_name)
            .map(|p| p.partition_index)
            .ok_or_else(|| ConfigError::UnknownReplica {
                name: replica_name.to_string(),
            })?;

        Ok(Config {
            self_name: replica_name.to_string(),
            partition_index,
            peers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(contents: &str) -> tempfile_path::TempFile {
        tempfile_path::TempFile::new(contents)
    }

    /// Tiny self-contained temp-file helper so this module doesn't need an
    /// extra dev-dependency just to write one JSON fixture to disk.
    mod tempfile_path {
        use std::fs::File;
        use std::io::Write;
        use std::path::PathBuf;
        use std::sync::atomic::{AtomicUsize, Ordering};

        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        pub struct TempFile {
            pub path: PathBuf,
        }

        impl TempFile {
            pub fn new(contents: &str) -> Self {
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                let mut path = std::env::temp_dir();
                path.push(format!("paxos-config-test-{}-{}.json", std::process::id(), n));
                let mut f = File::create(&path).unwrap();
                f.write_all(contents.as_bytes()).unwrap();
                TempFile { path }
            }
        }

        impl Drop for TempFile {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }

    const GOOD: &str = r#"{
        "peers": [
            {"name": "a", "ip": "127.0.0.1", "port": 9001},
            {"name": "b", "ip": "127.0.0.1", "port": 9002},
            {"name": "c", "ip": "127.0.0.1", "port": 9003}
        ]
    }"#;

    #[test]
    fn parses_partition_indices_in_list_order() {
        let f = write_temp(GOOD);
        let cfg = Config::load(&f.path, "b").unwrap();
        assert_eq!(cfg.partition_index, 1);
        assert_eq!(cfg.cluster_size(), 3);
        assert_eq!(cfg.peers[2].name, "c");
        assert_eq!(cfg.peers[2].partition_index, 2);
    }

    #[test]
    fn rejects_unknown_replica_name() {
        let f = write_temp(GOOD);
        assert!(matches!(
            Config::load(&f.path, "nope"),
            Err(ConfigError::UnknownReplica { .. })
        ));
    }

    #[test]
    fn rejects_bad_ip_literal() {
        let bad = r#"{"peers": [{"name": "a", "ip": "not-an-ip", "port": 1}]}"#;
        let f = write_temp(bad);
        assert!(matches!(Config::load(&f.path, "a"), Err(ConfigError::InvalidIp { .. })));
    }

    #[test]
    fn rejects_missing_file() {
        let path = Path::new("/nonexistent/paxos-config-does-not-exist.json");
        assert!(matches!(Config::load(path, "a"), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn rejects_empty_peer_list() {
        let f = write_temp(r#"{"peers": []}"#);
        assert!(matches!(Config::load(&f.path, "a"), Err(ConfigError::EmptyCluster)));
    }
}
