//! Error types for the two boundaries that can fail: loading configuration
//! at startup, and persisting the ledger at runtime.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal at startup: reported with a human-readable message, process exits 1.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("peer {name} has an invalid IP literal {ip:?}")]
    InvalidIp { name: String, ip: String },
    #[error("replica name {name:?} is not present in the peer list")]
    UnknownReplica { name: String },
    #[error("configuration lists no peers")]
    EmptyCluster,
}

/// Fatal at runtime: a replica that cannot durably persist its promises must
/// not continue, since doing so could violate the agreement invariant.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("failed to access ledger file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to (de)serialize ledger state: {source}")]
    Serialize {
        #[source]
        source: bincode::Error,
    },
}
