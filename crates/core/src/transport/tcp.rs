use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::ControlTransport;
use crate::error::Result;

/// Largest reply accepted in one read.
pub const MAX_RESPONSE_SIZE: usize = 8192;

/// TCP control channel to an RTSP server.
///
/// Each [`read`](ControlTransport::read) returns whatever a single
/// `read(2)` delivers, up to [`MAX_RESPONSE_SIZE`] bytes. Replies split
/// across several TCP segments are not reassembled.
pub struct TcpControlTransport {
    stream: Option<TcpStream>,
    buffer: Vec<u8>,
}

impl TcpControlTransport {
    /// Connect to `host:port`, trying each resolved address in turn.
    pub fn connect(
        host: &str,
        port: u16,
        connect_timeout: Option<Duration>,
        read_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut last_error = None;

        for addr in (host, port).to_socket_addrs()? {
            let attempt = match connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_read_timeout(read_timeout)?;
                    stream.set_nodelay(true)?;
                    tracing::info!(%addr, "control channel connected");
                    return Ok(Self::from_stream(stream));
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "host did not resolve"))
            .into())
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
            buffer: vec![0u8; MAX_RESPONSE_SIZE],
        }
    }

    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "control channel closed"))
    }
}

impl ControlTransport for TcpControlTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream()?;
        stream.write_all(bytes)?;
        stream.flush()?;
        Ok(())
    }

    fn read(&mut self) -> Result<Vec<u8>> {
        let stream = self.stream.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "control channel closed")
        })?;

        let count = stream.read(&mut self.buffer)?;
        if count == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by server",
            )
            .into());
        }
        Ok(self.buffer[..count].to_vec())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => return Err(e.into()),
            }
            tracing::info!("control channel closed");
        }
        Ok(())
    }
}
