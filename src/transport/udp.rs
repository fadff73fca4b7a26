//! Production transport: `bincode`-framed UDP datagrams to the `SocketAddr`
//! each peer name resolves to via the `Cluster`. Addresses peers by the
//! configured name, resolved through the cluster directory, rather than
//! folding a numeric node ID out of a `SocketAddr`.

use std::io;
use std::net::UdpSocket;
use std::time::Duration;

use bincode::{deserialize, serialize};
use tracing::warn;

use crate::cluster::Cluster;
use crate::protocol::Message;
use crate::transport::Transport;

const MAX_MSG_SIZE: usize = 64 * 1024;

#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    cluster: Cluster,
}

impl UdpTransport {
    /// Binds a UDP socket on the local replica's own configured address.
    pub fn bind(cluster: Cluster) -> io::Result<UdpTransport> {
        let own = cluster
            .peer(&cluster.self_name)
            .expect("self must be present in the cluster directory")
            .addr;
        let socket = UdpSocket::bind(own)?;
        Ok(UdpTransport { socket, cluster })
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }
}

impl Transport for UdpTransport {
    fn send(&self, dst: &str, msg: &Message) -> io::Result<()> {
        let peer = self.cluster.peer(dst).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("unknown peer {:?}", dst))
        })?;
        let bytes = serialize(msg)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if bytes.len() > MAX_MSG_SIZE {
            warn!(dst, len = bytes.len(), "message exceeds MAX_MSG_SIZE, dropping");
            return Ok(());
        }
        self.socket.send_to(&bytes, peer.addr).map(|_| ())
    }

    fn recv(&self, timeout: Duration) -> io::Result<Message> {
        self.socket.set_read_timeout(Some(timeout))?;
        let mut buf = [0u8; MAX_MSG_SIZE];
        let (n, _from) = self.socket.recv_from(&mut buf)?;
        deserialize(&buf[..n]).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
