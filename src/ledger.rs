//! The durable per-replica store: `last_tried`, `next_bal`, `prev_vote`, and
//! `decree`. Every setter persists to disk before returning, and a violated
//! monotonicity precondition is a programming error, not a runtime
//! condition — it panics rather than returning a `Result`, since a caller
//! that trips it has a logic error no retry can fix.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::protocol::{Ballot, Decree, Vote};
use crate::storage::{load_from_disk_file, store_in_disk_file};

/// The four durable Paxos variables, as written to disk.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct LedgerState {
    last_tried: Ballot,
    next_bal: Ballot,
    prev_vote: Vote,
    decree: Option<Decree>,
}

impl Default for LedgerState {
    fn default() -> Self {
        LedgerState {
            last_tried: Ballot::NONE,
            next_bal: Ballot::NONE,
            prev_vote: Vote::sentinel(),
            decree: None,
        }
    }
}

/// File-backed ledger for a single replica. Holds an in-memory mirror of
/// `LedgerState` so reads never touch disk; every setter re-serializes the
/// whole struct to `path` before returning.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    state: LedgerState,
}

impl Ledger {
    /// Opens the ledger file at `path`, loading any previously persisted
    /// state (the crash-recovery path) or starting from the all-`NONE`
    /// defaults if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Ledger, LedgerError> {
        let path = path.into();
        let state = load_from_disk_file::<LedgerState>(&path)?.unwrap_or_default();
        Ok(Ledger { path, state })
    }

    fn persist(&self) -> Result<(), LedgerError> {
        store_in_disk_file(&self.path, &self.state)
    }

    pub fn get_last_tried(&self) -> Ballot {
        self.state.last_tried
    }

    /// Requires `b >= last_tried`. Persists before returning.
    pub fn set_last_tried(&mut self, b: Ballot) -> Result<(), LedgerError> {
        assert!(
            b >= self.state.last_tried,
            "set_last_tried({:?}) would move last_tried backward from {:?}",
            b,
            self.state.last_tried
        );
        self.state.last_tried = b;
        self.persist()
    }

    pub fn get_next_bal(&self) -> Ballot {
        self.state.next_bal
    }

    /// Requires `b >= next_bal`. Persists before returning.
    pub fn set_next_bal(&mut self, b: Ballot) -> Result<(), LedgerError> {
        assert!(
            b >= self.state.next_bal,
            "set_next_bal({:?}) would move next_bal backward from {:?}",
            b,
            self.state.next_bal
        );
        self.state.next_bal = b;
        self.persist()
    }

    pub fn get_prev_vote(&self) -> Vote {
        self.state.prev_vote.clone()
    }

    /// Requires `v.ballot >= prev_vote.ballot`. Persists before returning.
    pub fn set_prev_vote(&mut self, v: Vote) -> Result<(), LedgerError> {
        assert!(
            v.ballot >= self.state.prev_vote.ballot,
            "set_prev_vote({:?}) would move prev_vote backward from {:?}",
            v,
            self.state.prev_vote
        );
        self.state.prev_vote = v;
        self.persist()
    }

    pub fn get_decree(&self) -> Option<Decree> {
        self.state.decree
    }

    /// Requires no decree is set yet, or that `d` equals the one already
    /// set — this is the safety invariant: once chosen, a decree never
    /// changes value. Persists before returning (idempotent when the
    /// decree is already `d`).
    pub fn set_decree(&mut self, d: Decree) -> Result<(), LedgerError> {
        if let Some(existing) = self.state.decree {
            assert_eq!(
                existing, d,
                "set_decree({:?}) conflicts with already-chosen decree {:?}",
                d, existing
            );
            return Ok(());
        }
        self.state.decree = Some(d);
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "paxos-ledger-test-{}-{}-{}.bin",
            std::process::id(),
            tag,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn starts_with_sentinel_defaults() {
        let path = temp_path("defaults");
        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.get_last_tried(), Ballot::NONE);
        assert_eq!(ledger.get_next_bal(), Ballot::NONE);
        assert_eq!(ledger.get_prev_vote(), Vote::sentinel());
        assert_eq!(ledger.get_decree(), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn survives_reopen() {
        let path = temp_path("reopen");
        {
            let mut ledger = Ledger::open(&path).unwrap();
            ledger.set_next_bal(Ballot(7)).unwrap();
        }
        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.get_next_bal(), Ballot(7));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    #[should_panic(expected = "backward")]
    fn rejects_decreasing_next_bal() {
        let path = temp_path("regress");
        let mut ledger = Ledger::open(&path).unwrap();
        ledger.set_next_bal(Ballot(5)).unwrap();
        let _ = ledger.set_next_bal(Ballot(4));
    }

    #[test]
    fn decree_set_is_idempotent_for_same_value() {
        let path = temp_path("idempotent");
        let mut ledger = Ledger::open(&path).unwrap();
        ledger.set_decree(Decree(42)).unwrap();
        ledger.set_decree(Decree(42)).unwrap();
        assert_eq!(ledger.get_decree(), Some(Decree(42)));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    #[should_panic(expected = "conflicts")]
    fn decree_rejects_conflicting_value() {
        let path = temp_path("conflict");
        let mut ledger = Ledger::open(&path).unwrap();
        ledger.set_decree(Decree(42)).unwrap();
        let _ = ledger.set_decree(Decree(43));
    }
}
