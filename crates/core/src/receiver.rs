//! Per-track RTP receive loop.
//!
//! Each set-up track gets its own thread reading datagrams from a
//! [`MediaTransport`], decoding them as RTP and handing them to a
//! [`PacketSink`]. The loop checks a shared `stop` flag between
//! receives, so shutdown latency is bounded by the transport's receive
//! timeout. Without a timeout the thread only notices the flag after the
//! next datagram arrives; a handle built with
//! [`waking`](ReceiverHandle::waking) sends that datagram itself.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::error::RtspError;
use crate::media::{ByteOrder, PacketSink, RtpPacket};
use crate::protocol::MediaKind;
use crate::transport::MediaTransport;
use crate::transport::udp::MAX_DATAGRAM_SIZE;

/// Handle to a running receive loop.
pub struct ReceiverHandle {
    track: MediaKind,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<ReceiverStats>>,
    wake: Option<SocketAddr>,
}

/// Counters reported when a receive loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub packets: u64,
    pub bytes: u64,
    /// Datagrams that failed to decode as RTP.
    pub discarded: u64,
}

impl ReceiverHandle {
    pub fn track(&self) -> MediaKind {
        self.track
    }

    /// On [`stop`](Self::stop), send an empty datagram to `addr`, the
    /// local endpoint the loop receives on, so a blocking receive returns.
    pub fn waking(mut self, addr: SocketAddr) -> Self {
        self.wake = Some(loopback_if_unspecified(addr));
        self
    }

    /// Ask the loop to exit after its current receive returns.
    pub fn stop(&self) {
        if self.stop.swap(true, Ordering::SeqCst) || self.is_finished() {
            return;
        }
        if let Some(addr) = self.wake
            && let Err(e) = send_wake(addr)
        {
            tracing::debug!(track = %self.track, %addr, error = %e, "wake datagram failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signal the loop and wait for it to exit.
    pub fn join(mut self) -> ReceiverStats {
        self.stop();
        self.wait()
    }

    fn wait(&mut self) -> ReceiverStats {
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                tracing::error!(track = %self.track, "receiver thread panicked");
                ReceiverStats::default()
            }
            None => ReceiverStats::default(),
        }
    }
}

impl Drop for ReceiverHandle {
    fn drop(&mut self) {
        self.stop();
        self.wait();
    }
}

/// Start receiving `track` from `transport` on a new thread.
pub fn spawn<M>(
    track: MediaKind,
    transport: M,
    sink: Box<dyn PacketSink>,
    byte_order: ByteOrder,
) -> ReceiverHandle
where
    M: MediaTransport + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();

    let thread = thread::spawn(move || receive_loop(track, transport, sink, byte_order, flag));

    ReceiverHandle {
        track,
        stop,
        thread: Some(thread),
        wake: None,
    }
}

fn loopback_if_unspecified(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => (Ipv4Addr::LOCALHOST, addr.port()).into(),
        IpAddr::V6(ip) if ip.is_unspecified() => (Ipv6Addr::LOCALHOST, addr.port()).into(),
        _ => addr,
    }
}

fn send_wake(addr: SocketAddr) -> std::io::Result<()> {
    let local: SocketAddr = match addr {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    UdpSocket::bind(local)?.send_to(&[], addr).map(drop)
}

fn receive_loop<M: MediaTransport>(
    track: MediaKind,
    mut transport: M,
    mut sink: Box<dyn PacketSink>,
    byte_order: ByteOrder,
    stop: Arc<AtomicBool>,
) -> ReceiverStats {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut stats = ReceiverStats::default();

    tracing::info!(%track, "receiver started");

    while !stop.load(Ordering::SeqCst) {
        let len = match transport.receive(&mut buf) {
            Ok(Some(_)) if stop.load(Ordering::SeqCst) => break,
            Ok(Some(len)) => len,
            Ok(None) => continue,
            Err(RtspError::Io(e)) => {
                if !stop.load(Ordering::SeqCst) {
                    tracing::error!(%track, error = %e, "media receive failed");
                }
                break;
            }
            Err(e) => {
                tracing::error!(%track, error = %e, "media receive failed");
                break;
            }
        };

        match RtpPacket::decode_with(&buf[..len], byte_order) {
            Ok(packet) => {
                tracing::trace!(
                    %track,
                    seq = packet.sequence,
                    ts = packet.timestamp,
                    pt = packet.payload_type,
                    len = packet.payload.len(),
                    "rtp"
                );
                stats.packets += 1;
                stats.bytes += packet.payload.len() as u64;
                sink.on_packet(&packet);
            }
            Err(e) => {
                stats.discarded += 1;
                tracing::warn!(%track, len, error = %e, "discarding datagram");
            }
        }
    }

    sink.on_stop();
    if let Err(e) = transport.close() {
        tracing::debug!(%track, error = %e, "media transport close failed");
    }
    tracing::info!(
        %track,
        packets = stats.packets,
        discarded = stats.discarded,
        "receiver stopped"
    );
    stats
}
