//! The Paxos replica state machine: ballot-number generation, the
//! promise/voting phases of a ballot, learning, and higher-ballot recovery.
//!
//! Dispatch is over the closed, exhaustively-matched `Message` enum from
//! `protocol.rs`, rather than a string-keyed handler lookup — a new variant
//! that nobody handles is a compile error here, not a silently ignored
//! message at runtime.

use std::collections::HashMap;

use tracing::{debug, info, trace, warn};

use crate::cluster::Cluster;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::protocol::{Ballot, Decree, Message, Vote};
use crate::transport::Transport;

/// One participant in the cluster. Owns its ledger and the cluster
/// directory it was built with; the quorum set and `has_started` flag are
/// volatile bookkeeping for whichever ballot this replica is currently
/// proposing, reset on every `initiate_ballot`.
pub struct Replica {
    cluster: Cluster,
    ledger: Ledger,
    /// During the promise phase: promiser name -> its reported last vote.
    /// Repurposed during the voting phase to track which promisers still
    /// owe a `Voted` reply (entries are removed as votes arrive).
    quorum_set: HashMap<String, Vote>,
    has_started: bool,
    /// The value this replica will propose if no promiser reports a prior
    /// vote. `None` falls back to seeding the decree with the ballot number
    /// itself, a free choice with no external meaning.
    pending_proposal: Option<Decree>,
}

impl Replica {
    pub fn new(cluster: Cluster, ledger: Ledger) -> Replica {
        Replica {
            cluster,
            ledger,
            quorum_set: HashMap::new(),
            has_started: false,
            pending_proposal: None,
        }
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// The decree this replica has learned, if any.
    pub fn decree(&self) -> Option<Decree> {
        self.ledger.get_decree()
    }

    /// The smallest ballot number `b` such that `b` belongs to this
    /// replica's residue class, `b > last_tried`, and `b > next_bal`.
    fn next_ballot_id(&self) -> Ballot {
        let n = self.cluster.size() as i64;
        let last_tried = self.ledger.get_last_tried();
        let mut b = if last_tried.is_none() {
            self.cluster.partition_index as i64 - n
        } else {
            last_tried.0
        };
        let next_bal = self.ledger.get_next_bal();
        while next_bal.0 > b {
            b += n;
        }
        b += n;
        Ballot(b)
    }

    /// Starts a new ballot: computes the next legal ballot number, resets
    /// the quorum set, and broadcasts `NextBallot` to every peer including
    /// self. `proposal` is the value to propose if this ballot reaches the
    /// voting phase with no prior vote reported by any promiser.
    pub fn initiate_ballot<T: Transport>(
        &mut self,
        transport: &T,
        proposal: Option<Decree>,
    ) -> Result<(), LedgerError> {
        let ballot = self.next_ballot_id();
        self.ledger.set_last_tried(ballot)?;
        self.quorum_set.clear();
        self.has_started = false;
        self.pending_proposal = proposal;

        info!(replica = %self.cluster.self_name, ballot = ballot.0, "initiating ballot");
        let msg = Message::NextBallot {
            ballot,
            sender: self.cluster.self_name.clone(),
        };
        transport.broadcast(&self.cluster, &msg);
        Ok(())
    }

    /// Dispatches an inbound message to the matching handler. The match is
    /// exhaustive over the closed `Message` set, so no variant can be
    /// silently dropped.
    pub fn handle_message<T: Transport>(
        &mut self,
        msg: Message,
        transport: &T,
    ) -> Result<(), LedgerError> {
        match msg {
            Message::NextBallot { ballot, sender } => self.on_next_ballot(ballot, &sender, transport),
            Message::LastVote {
                ballot,
                vote_ballot,
                decree,
                sender,
            } => self.on_last_vote(ballot, vote_ballot, decree, &sender, transport),
            Message::BeginBallot {
                ballot,
                decree,
                sender,
            } => self.on_begin_ballot(ballot, decree, &sender, transport),
            Message::Voted {
                ballot,
                decree,
                sender,
            } => self.on_voted(ballot, decree, &sender, transport),
            Message::Success { decree } => self.on_success(decree),
            Message::HigherBallot { ballot } => self.on_higher_ballot(ballot, transport),
        }
    }

    /// Acceptor role, phase 1a: promise not to vote below `ballot`, or
    /// reject with the higher ballot already promised.
    fn on_next_ballot<T: Transport>(
        &mut self,
        ballot: Ballot,
        sender: &str,
        transport: &T,
    ) -> Result<(), LedgerError> {
        let next_bal = self.ledger.get_next_bal();
        if ballot <= next_bal {
            trace!(?ballot, ?next_bal, "rejecting stale NextBallot");
            transport.send_logged(sender, &Message::HigherBallot { ballot: next_bal });
            return Ok(());
        }
        self.ledger.set_next_bal(ballot)?;
        let prev_vote = self.ledger.get_prev_vote();
        let reply = Message::LastVote {
            ballot,
            vote_ballot: prev_vote.ballot,
            decree: prev_vote.decree,
            sender: self.cluster.self_name.clone(),
        };
        transport.send_logged(sender, &reply);
        Ok(())
    }

    /// Proposer role, phase 1b: accumulate promises until a strict majority
    /// has been reached, then begin the voting phase exactly once.
    fn on_last_vote<T: Transport>(
        &mut self,
        ballot: Ballot,
        vote_ballot: Ballot,
        decree: Option<Decree>,
        sender: &str,
        transport: &T,
    ) -> Result<(), LedgerError> {
        if ballot != self.ledger.get_last_tried() || self.has_started {
            debug!(?ballot, sender, "discarding out-of-phase LastVote");
            return Ok(());
        }
        if !vote_ballot.is_none() && decree.is_none() {
            warn!(?vote_ballot, sender, "discarding malformed LastVote: non-sentinel vote with no decree");
            return Ok(());
        }
        self.quorum_set.insert(
            sender.to_string(),
            Vote {
                ballot: vote_ballot,
                decree,
            },
        );
        if self.quorum_set.len() * 2 > self.cluster.size() {
            self.begin_voting_phase(transport)?;
        }
        Ok(())
    }

    /// Triggered exactly once per ballot by the first strict majority of
    /// promises: picks the decree of the highest-numbered prior vote among
    /// promisers (or a free choice if none voted before), and asks every
    /// promiser to vote for it.
    fn begin_voting_phase<T: Transport>(&mut self, transport: &T) -> Result<(), LedgerError> {
        self.has_started = true;
        let ballot = self.ledger.get_last_tried();

        let winning_vote = self
            .quorum_set
            .values()
            .max_by_key(|v| v.ballot)
            .cloned()
            .unwrap_or_else(Vote::sentinel);

        let decree = match (winning_vote.ballot.is_none(), winning_vote.decree) {
            (false, Some(d)) => d,
            (false, None) => {
                // A non-sentinel vote with no decree is malformed and should
                // already have been filtered out in `on_last_vote`; fall back
                // to the free choice rather than let a stray one panic the
                // replica.
                warn!(
                    ballot = ballot.0,
                    "winning vote had no decree despite a non-sentinel ballot, falling back to free choice"
                );
                self.pending_proposal.unwrap_or(Decree(ballot.0))
            }
            (true, _) => self.pending_proposal.unwrap_or(Decree(ballot.0)),
        };

        info!(
            replica = %self.cluster.self_name,
            ballot = ballot.0,
            decree = decree.0,
            "quorum reached, beginning voting phase"
        );
        let msg = Message::BeginBallot {
            ballot,
            decree,
            sender: self.cluster.self_name.clone(),
        };
        for peer in self.quorum_set.keys() {
            transport.send_logged(peer, &msg);
        }
        Ok(())
    }

    /// Acceptor role, phase 2a. Votes only for the ballot it is currently
    /// promised to; a higher ballot is a discard (never promised, so voting
    /// for it would violate the promise this acceptor hasn't made yet), a
    /// lower one rejects with the current promise so the stale proposer can
    /// catch up.
    fn on_begin_ballot<T: Transport>(
        &mut self,
        ballot: Ballot,
        decree: Decree,
        sender: &str,
        transport: &T,
    ) -> Result<(), LedgerError> {
        let next_bal = self.ledger.get_next_bal();
        if ballot < next_bal {
            transport.send_logged(sender, &Message::HigherBallot { ballot: next_bal });
            return Ok(());
        }
        if ballot > next_bal {
            warn!(?ballot, ?next_bal, "discarding BeginBallot for a ballot never promised");
            return Ok(());
        }
        self.ledger.set_prev_vote(Vote {
            ballot,
            decree: Some(decree),
        })?;
        let reply = Message::Voted {
            ballot,
            decree,
            sender: self.cluster.self_name.clone(),
        };
        transport.send_logged(sender, &reply);
        Ok(())
    }

    /// Proposer role, phase 2b: once every promiser has voted, the decree
    /// is chosen.
    fn on_voted<T: Transport>(
        &mut self,
        ballot: Ballot,
        decree: Decree,
        sender: &str,
        transport: &T,
    ) -> Result<(), LedgerError> {
        if ballot != self.ledger.get_last_tried() {
            return Ok(());
        }
        self.quorum_set.remove(sender);
        if self.quorum_set.is_empty() {
            info!(replica = %self.cluster.self_name, decree = decree.0, "decree chosen");
            self.ledger.set_decree(decree)?;
            transport.broadcast(&self.cluster, &Message::Success { decree });
        }
        Ok(())
    }

    /// Learner role: adopt the chosen decree. Idempotent — a repeated
    /// `Success` with the same decree leaves the ledger unchanged.
    fn on_success(&mut self, decree: Decree) -> Result<(), LedgerError> {
        self.ledger.set_decree(decree)?;
        info!(replica = %self.cluster.self_name, decree = decree.0, "received success, decree learned");
        Ok(())
    }

    /// Proposer role: a peer has already promised a higher ballot than the
    /// one this replica just tried. Skip forward past it in one jump rather
    /// than probing one ballot at a time, and re-trigger.
    fn on_higher_ballot<T: Transport>(
        &mut self,
        ballot: Ballot,
        transport: &T,
    ) -> Result<(), LedgerError> {
        let last_tried = self.ledger.get_last_tried();
        if last_tried >= ballot {
            return Ok(());
        }
        let n = self.cluster.size() as i64;
        let mut advanced = last_tried.0;
        while advanced + n <= ballot.0 {
            advanced += n;
        }
        self.ledger.set_last_tried(Ballot(advanced))?;
        self.initiate_ballot(transport, self.pending_proposal)
    }
}
