//! In-memory transport used by the test suite to run a small cluster of
//! replicas in one process, deterministically and without real sockets or
//! timing flakiness. Wires up a group of in-process nodes the way a real
//! UDP-based test harness would, keeping the topology-construction idea and
//! swapping the socket for an `mpsc` channel.

use std::collections::HashMap;
use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use crate::cluster::Cluster;
use crate::protocol::Message;
use crate::transport::Transport;

/// Decides whether a message from `from` to `to` should be dropped in
/// transit. Lets tests reproduce specific loss patterns (e.g. drop all of
/// one replica's `BeginBallot` messages to another).
pub type DropFilter = Arc<dyn Fn(&str, &str, &Message) -> bool + Send + Sync>;

pub struct ChannelTransport {
    self_name: String,
    senders: HashMap<String, Sender<(String, Message)>>,
    receiver: Receiver<(String, Message)>,
    drop_filter: DropFilter,
}

impl ChannelTransport {
    fn never_drop() -> DropFilter {
        Arc::new(|_from, _to, _msg| false)
    }

    pub fn set_drop_filter(&mut self, filter: DropFilter) {
        self.drop_filter = filter;
    }
}

impl Transport for ChannelTransport {
    fn send(&self, dst: &str, msg: &Message) -> io::Result<()> {
        if (self.drop_filter)(&self.self_name, dst, msg) {
            return Ok(());
        }
        let sender = self.senders.get(dst).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("unknown peer {:?}", dst))
        })?;
        sender
            .send((self.self_name.clone(), msg.clone()))
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e.to_string()))
    }

    fn recv(&self, timeout: Duration) -> io::Result<Message> {
        self.receiver
            .recv_timeout(timeout)
            .map(|(_from, msg)| msg)
            .map_err(|e| io::Error::new(io::ErrorKind::TimedOut, e.to_string()))
    }
}

/// Builds a fully connected mesh of `ChannelTransport`s, one per name in
/// `cluster`, each able to reach every other (including itself).
pub fn connected_mesh(cluster: &Cluster) -> HashMap<String, ChannelTransport> {
    let names: Vec<String> = cluster.peer_names().map(|s| s.to_string()).collect();

    let mut senders = HashMap::new();
    let mut receivers = HashMap::new();
    for name in &names {
        let (tx, rx) = std::sync::mpsc::channel();
        senders.insert(name.clone(), tx);
        receivers.insert(name.clone(), rx);
    }

    names
        .into_iter()
        .map(|name| {
            let receiver = receivers.remove(&name).unwrap();
            let transport = ChannelTransport {
                self_name: name.clone(),
                senders: senders.clone(),
                receiver,
                drop_filter: ChannelTransport::never_drop(),
            };
            (name, transport)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, PeerConfig};
    use std::net::IpAddr;
    use std::str::FromStr;

    fn three_node_cluster() -> Cluster {
        let peers = ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, name)| PeerConfig {
                name: name.to_string(),
                ip: IpAddr::from_str("127.0.0.1").unwrap(),
                port: 9000 + i as u16,
                partition_index: i,
            })
            .collect();
        Cluster::from_config(&Config {
            self_name: "a".to_string(),
            partition_index: 0,
            peers,
        })
    }

    #[test]
    fn delivers_between_named_peers() {
        let cluster = three_node_cluster();
        let mesh = connected_mesh(&cluster);
        let msg = Message::HigherBallot {
            ballot: crate::protocol::Ballot(4),
        };
        mesh["a"].send("b", &msg).unwrap();
        let received = mesh["b"].recv(Duration::from_secs(1)).unwrap();
        assert_eq!(received, msg);
    }

    #[test]
    fn drop_filter_suppresses_matching_messages() {
        let cluster = three_node_cluster();
        let mut mesh = connected_mesh(&cluster);
        mesh.get_mut("a")
            .unwrap()
            .set_drop_filter(Arc::new(|from, to, _msg| from == "a" && to == "b"));
        mesh["a"]
            .send(
                "b",
                &Message::HigherBallot {
                    ballot: crate::protocol::Ballot(1),
                },
            )
            .unwrap();
        assert!(mesh["b"].recv(Duration::from_millis(50)).is_err());
    }
}
