//! RTP media decoding and delivery.
//!
//! Each negotiated track gets its own UDP endpoint and receive loop
//! ([`crate::receiver`]). Every datagram is split by [`rtp::RtpPacket`]
//! into header fields and a payload span, then handed to a [`PacketSink`].
//!
//! ## RTP overview (RFC 3550)
//!
//! - **Sequence number** (16-bit, wrapping): for reordering and loss detection.
//! - **Timestamp** (32-bit): media clock, typically 90 kHz for video.
//! - **SSRC** (32-bit): identifies the sender.
//! - **CSRC list**: upstream sources mixed into this packet.
//! - **Marker bit**: set on the last packet of an access unit (frame).
//!
//! Payloads are passed through untouched: no depacketization, jitter
//! buffering or loss recovery happens here.

pub mod rtp;

use std::sync::Arc;

use parking_lot::Mutex;

pub use rtp::{ByteOrder, RtpHeader, RtpPacket};

/// Consumer of decoded packets for one track.
///
/// Called on the track's receive thread, once per valid datagram, in
/// arrival order. Spans borrow the receive buffer and are only valid for
/// the duration of the call.
pub trait PacketSink: Send {
    fn on_packet(&mut self, packet: &RtpPacket<'_>);

    /// Called once when the receive loop exits.
    fn on_stop(&mut self) {}
}

/// Lets the caller keep a handle on a sink that runs on a receive thread.
impl<S: PacketSink> PacketSink for Arc<Mutex<S>> {
    fn on_packet(&mut self, packet: &RtpPacket<'_>) {
        self.lock().on_packet(packet);
    }

    fn on_stop(&mut self) {
        self.lock().on_stop();
    }
}

impl PacketSink for Box<dyn PacketSink> {
    fn on_packet(&mut self, packet: &RtpPacket<'_>) {
        (**self).on_packet(packet);
    }

    fn on_stop(&mut self) {
        (**self).on_stop();
    }
}
