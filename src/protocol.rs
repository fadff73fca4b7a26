// Copyright (C) 2020 Quentin M. Kniep <hello@quentinkniep.com>
// Distributed under terms of the MIT license.

//! Contains the wire types shared by every part of the Paxos implementation:
//! ballot numbers, decrees, votes, and the six-message protocol envelope.

use serde::{Deserialize, Serialize};

/// A totally ordered ballot number. Ballot numbers are partitioned across the
/// cluster by residue class modulo the cluster size: a replica at partition
/// index `i` may only ever propose ballots `b` with `b mod n == i`. `-1` is
/// the sentinel meaning "no ballot".
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ballot(pub i64);

impl Ballot {
    pub const NONE: Ballot = Ballot(-1);

    pub fn is_none(self) -> bool {
        self.0 < 0
    }
}

/// The value under agreement. Opaque to the protocol beyond equality.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decree(pub i64);

/// A vote cast by an acceptor: the ballot it voted in and for which decree.
/// The sentinel vote (`Ballot::NONE`, no decree) means "this acceptor has
/// never voted".
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Vote {
    pub ballot: Ballot,
    pub decree: Option<Decree>,
}

impl Vote {
    pub fn sentinel() -> Self {
        Vote {
            ballot: Ballot::NONE,
            decree: None,
        }
    }
}

impl Default for Vote {
    fn default() -> Self {
        Vote::sentinel()
    }
}

/// The closed set of messages exchanged between replicas. Fields mirror the
/// wire table below; `sender` is present on every method that
/// expects a direct reply.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Message {
    /// Phase 1a: proposer asks acceptors to promise not to vote below `ballot`.
    NextBallot { ballot: Ballot, sender: String },
    /// Phase 1b: acceptor's promise, carrying its last vote (if any).
    LastVote {
        ballot: Ballot,
        vote_ballot: Ballot,
        decree: Option<Decree>,
        sender: String,
    },
    /// Phase 2a: proposer asks promisers to vote for `decree` in `ballot`.
    BeginBallot {
        ballot: Ballot,
        decree: Decree,
        sender: String,
    },
    /// Phase 2b: acceptor's vote.
    Voted {
        ballot: Ballot,
        decree: Decree,
        sender: String,
    },
    /// A decree has been chosen; broadcast to every replica so all can learn it.
    Success { decree: Decree },
    /// Rejection: the recipient has already promised a higher ballot.
    HigherBallot { ballot: Ballot },
}
