//! The immutable map from peer name to transport handle. Built once from
//! [`crate::config::Config`] at startup; every replica, including self, has
//! an entry.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::config::Config;

/// A lightweight handle to a peer: just enough to address it over the
/// transport. Never a handle to the peer's own `Replica` — a `Cluster`
/// addresses peers, it does not own them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerHandle {
    pub partition_index: usize,
    pub addr: SocketAddr,
}

/// Immutable cluster directory: every configured peer's address, this
/// replica's own name and partition index, and the cluster size `N`.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub self_name: String,
    pub partition_index: usize,
    peers: HashMap<String, PeerHandle>,
}

impl Cluster {
    pub fn from_config(config: &Config) -> Cluster {
        let peers = config
            .peers
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    PeerHandle {
                        partition_index: p.partition_index,
                        addr: SocketAddr::new(p.ip, p.port),
                    },
                )
            })
            .collect();
        Cluster {
            self_name: config.self_name.clone(),
            partition_index: config.partition_index,
            peers,
        }
    }

    /// `N`, the cluster size.
    pub fn size(&self) -> usize {
        self.peers.len()
    }

    pub fn peer(&self, name: &str) -> Option<&PeerHandle> {
        self.peers.get(name)
    }

    /// Every peer's name, including self — used for broadcasts.
    pub fn peer_names(&self) -> impl Iterator<Item = &str> {
        self.peers.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.peers.contains_key(name)
    }
}
