// Copyright (C) 2020 Quentin M. Kniep <hello@quentinkniep.com>
// Distributed under terms of the MIT license.

//! Launches a single Paxos replica: loads its configuration, binds its
//! transport, and runs the single-threaded receive/dispatch loop, reacting
//! to `SIGINT` (graceful shutdown) and `SIGTSTP` (the only external trigger
//! that starts a ballot).

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::*;
use signal_hook::consts::signal::{SIGINT, SIGTSTP};
use signal_hook::iterator::Signals;
use tracing::{error, info, warn, Level};

use paxos_replica::{Cluster, Config, Ledger, Replica, Transport, UdpTransport};

/// How long a single `recv` call blocks before the loop re-checks signals.
/// Short enough that `SIGINT`/`SIGTSTP` are acted on promptly, long enough
/// that an idle replica doesn't spin.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

fn main() {
    use tracing_subscriber::{fmt::time::ChronoLocal, FmtSubscriber};

    FmtSubscriber::builder()
        .with_timer(ChronoLocal::with_format("[%Mm %Ss]".to_string()))
        .with_max_level(Level::INFO)
        .init();

    let matches = clap_app!(paxos_replica =>
        (version: "0.1")
        (author: "Quentin M. Kniep <hello@quentinkniep.com>")
        (about: "Runs a single replica of a single-decree Paxos cluster.")
        (@arg CONFIG: +required "Path to the cluster's JSON configuration file")
        (@arg NAME: +required "This replica's name, as it appears in the configuration")
    )
    .get_matches();

    let config_path = PathBuf::from(matches.value_of("CONFIG").unwrap());
    let replica_name = matches.value_of("NAME").unwrap();

    let config = Config::load(&config_path, replica_name).unwrap_or_else(|e| {
        error!("{}", e);
        process::exit(1);
    });

    let ledger_path = format!("{}.ledger", replica_name);
    let ledger = Ledger::open(&ledger_path).unwrap_or_else(|e| {
        error!("{}", e);
        process::exit(1);
    });

    let cluster = Cluster::from_config(&config);
    let transport = UdpTransport::bind(cluster.clone()).unwrap_or_else(|e| {
        error!("failed to bind transport: {}", e);
        process::exit(1);
    });

    let mut replica = Replica::new(cluster, ledger);

    let mut signals = Signals::new([SIGINT, SIGTSTP]).unwrap_or_else(|e| {
        error!("failed to install signal handlers: {}", e);
        process::exit(1);
    });

    info!(replica = replica_name, "replica started");

    'event_loop: loop {
        for signal in signals.pending() {
            match signal {
                SIGINT => {
                    info!("SIGINT received, shutting down");
                    break 'event_loop;
                }
                SIGTSTP => {
                    info!("SIGTSTP received, initiating ballot");
                    if let Err(e) = replica.initiate_ballot(&transport, None) {
                        error!("ledger write failed, cannot continue: {}", e);
                        process::exit(1);
                    }
                }
                other => warn!(signal = other, "ignoring unexpected signal"),
            }
        }

        match transport.recv(POLL_INTERVAL) {
            Ok(msg) => {
                if let Err(e) = replica.handle_message(msg, &transport) {
                    error!("ledger write failed, cannot continue: {}", e);
                    process::exit(1);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {
                // no message within the poll interval; loop back to check signals
            }
            Err(e) => warn!("transport receive error: {}", e),
        }
    }

    process::exit(0);
}
