//! Delivers a [`Message`] to a named peer. Best-effort: may drop, duplicate,
//! or reorder arbitrarily, as any Paxos transport must tolerate. Named
//! peers are resolved through a [`Cluster`].

use std::io;
use std::time::Duration;

use tracing::warn;

use crate::cluster::Cluster;
use crate::protocol::Message;

/// Abstract delivery of Paxos messages between named peers. One instance is
/// owned by the event loop and shared by the single replica it drives; there
/// are no suspension points inside a send.
pub trait Transport {
    /// Sends `msg` to the peer named `dst`. Failure is logged by the caller
    /// and otherwise ignored: message loss is a legal Paxos outcome.
    fn send(&self, dst: &str, msg: &Message) -> io::Result<()>;

    /// Sends `msg` to `dst`, logging (not propagating) any failure. Every
    /// call site in this crate goes through this instead of `send` directly,
    /// so a dropped send is always visible in the logs even though it's
    /// never treated as an error.
    fn send_logged(&self, dst: &str, msg: &Message) {
        if let Err(e) = self.send(dst, msg) {
            warn!(dst, ?msg, error = %e, "transport send failed, message considered lost");
        }
    }

    /// Sends `msg` to every peer in the cluster, including self.
    fn broadcast(&self, cluster: &Cluster, msg: &Message) {
        for peer in cluster.peer_names() {
            self.send_logged(peer, msg);
        }
    }

    /// Blocks until the next message arrives or `timeout` elapses.
    fn recv(&self, timeout: Duration) -> io::Result<Message>;
}

pub mod udp;
pub mod channel;

pub use channel::ChannelTransport;
pub use udp::UdpTransport;
