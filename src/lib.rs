// Copyright (C) 2020 Quentin M. Kniep <hello@quentinkniep.com>
// Distributed under terms of the MIT license.

//! A single-decree Paxos replica: the durable ledger, the ballot-numbering
//! discipline, and the six-message protocol that drives a ballot from
//! initiation through a chosen decree.

pub mod cluster;
pub mod config;
pub mod error;
pub mod ledger;
pub mod protocol;
mod replica;
mod storage;
pub mod transport;

pub use cluster::Cluster;
pub use config::Config;
pub use error::{ConfigError, LedgerError};
pub use ledger::Ledger;
pub use protocol::{Ballot, Decree, Message, Vote};
pub use replica::Replica;
pub use transport::{ChannelTransport, Transport, UdpTransport};
