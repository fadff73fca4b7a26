// Copyright (C) 2020 Quentin M. Kniep <hello@quentinkniep.com>
// Distributed under terms of the MIT license.

//! Low-level disk persistence: `bincode`-encode a value to a file, or decode
//! one back out. `ledger.rs` builds the typed, precondition-checked Paxos
//! ledger on top of these two functions.

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::LedgerError;

/// Serializes `value` into `path`, truncating any previous contents. The
/// write completes (or fails) before this function returns, satisfying the
/// "durable before returning" requirement on every ledger setter.
pub fn store_in_disk_file<T: ?Sized + Serialize>(path: &Path, value: &T) -> Result<(), LedgerError> {
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    bincode::serialize_into(file, value).map_err(|source| LedgerError::Serialize { source })
}

/// Reads and decodes a value previously written by [`store_in_disk_file`].
/// Returns `Ok(None)` if `path` does not exist yet (first run).
pub fn load_from_disk_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, LedgerError> {
    if !path.exists() {
        return Ok(None);
    }
    let file = std::fs::File::open(path).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = bincode::deserialize_from(file).map_err(|source| LedgerError::Serialize { source })?;
    Ok(Some(value))
}
