use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use super::MediaTransport;
use crate::error::Result;

/// Receive buffer size; larger datagrams are truncated by the OS.
pub const MAX_DATAGRAM_SIZE: usize = 8192;

/// UDP endpoint receiving RTP for one track.
///
/// With a receive timeout set, [`receive`](MediaTransport::receive)
/// returns `Ok(None)` on expiry so the receive loop can check its stop
/// flag. Without one it blocks until a datagram arrives.
pub struct UdpMediaTransport {
    socket: Option<UdpSocket>,
    local_addr: SocketAddr,
}

impl UdpMediaTransport {
    /// Bind `host:port` for RTP receipt.
    pub fn bind(host: &str, port: u16, receive_timeout: Option<Duration>) -> Result<Self> {
        let socket = UdpSocket::bind((host, port))?;
        socket.set_read_timeout(receive_timeout)?;
        let local_addr = socket.local_addr()?;
        tracing::debug!(%local_addr, "RTP socket bound");
        Ok(Self {
            socket: Some(socket),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl MediaTransport for UdpMediaTransport {
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "RTP socket closed"))?;

        match socket.recv_from(buf) {
            Ok((len, _peer)) => Ok(Some(len)),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            tracing::debug!(local_addr = %self.local_addr, "RTP socket closed");
        }
        Ok(())
    }
}
