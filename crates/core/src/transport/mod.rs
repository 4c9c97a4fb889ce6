//! Network transport layer for RTSP signaling and RTP media receipt.
//!
//! RTSP uses a split transport model:
//!
//! - **TCP** ([`tcp`]): carries RTSP request/response signaling. The
//!   engine sees it through [`ControlTransport`].
//!
//! - **UDP** ([`udp`]): carries RTP media packets. One socket per track,
//!   seen through [`MediaTransport`].
//!
//! Both traits exist so the protocol logic can be driven by scripted
//! transports in tests.

pub mod tcp;
pub mod udp;

use crate::error::Result;

pub use tcp::TcpControlTransport;
pub use udp::UdpMediaTransport;

/// Reliable, ordered byte channel carrying RTSP messages.
pub trait ControlTransport {
    /// Send one complete request in a single write.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read one chunk, treated by the engine as one complete reply.
    fn read(&mut self) -> Result<Vec<u8>>;

    fn close(&mut self) -> Result<()>;
}

impl<T: ControlTransport + ?Sized> ControlTransport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn read(&mut self) -> Result<Vec<u8>> {
        (**self).read()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Unreliable datagram endpoint bound for one track.
pub trait MediaTransport: Send {
    /// Block for the next datagram and copy it into `buf`.
    ///
    /// Returns `Ok(None)` when a configured receive timeout elapsed with
    /// nothing to read.
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>>;

    fn close(&mut self) -> Result<()>;
}
