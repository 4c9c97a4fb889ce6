use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use rtsp::media::{PacketSink, RtpPacket};
use rtsp::protocol::MediaKind;

/// Writes payload bytes to `<track>.bin` and raw header bytes to
/// `<track>.hdr`, back to back.
pub struct FileSink {
    track: MediaKind,
    payload: BufWriter<File>,
    header: BufWriter<File>,
}

impl FileSink {
    pub fn create(dir: &Path, track: MediaKind) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let payload = File::create(dir.join(format!("{}.bin", track)))?;
        let header = File::create(dir.join(format!("{}.hdr", track)))?;
        Ok(Self {
            track,
            payload: BufWriter::new(payload),
            header: BufWriter::new(header),
        })
    }

    fn write(&mut self, packet: &RtpPacket<'_>) -> io::Result<()> {
        self.header.write_all(packet.header)?;
        self.payload.write_all(packet.payload)
    }
}

impl PacketSink for FileSink {
    fn on_packet(&mut self, packet: &RtpPacket<'_>) {
        if let Err(e) = self.write(packet) {
            tracing::error!(track = %self.track, error = %e, "write failed");
        }
    }

    fn on_stop(&mut self) {
        if let Err(e) = self.header.flush().and_then(|()| self.payload.flush()) {
            tracing::error!(track = %self.track, error = %e, "flush failed");
        }
    }
}

/// Counts packets and logs a summary line every `interval` packets.
pub struct CountingSink {
    track: MediaKind,
    interval: u64,
    packets: u64,
    bytes: u64,
    last_sequence: Option<u16>,
    lost: u64,
    started: Instant,
}

impl CountingSink {
    pub fn new(track: MediaKind, interval: u64) -> Self {
        Self {
            track,
            interval: interval.max(1),
            packets: 0,
            bytes: 0,
            last_sequence: None,
            lost: 0,
            started: Instant::now(),
        }
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }

    pub fn lost(&self) -> u64 {
        self.lost
    }
}

impl PacketSink for CountingSink {
    fn on_packet(&mut self, packet: &RtpPacket<'_>) {
        if let Some(last) = self.last_sequence {
            let gap = packet.sequence.wrapping_sub(last);
            // Small forward jumps are loss; anything else is reordering.
            if (2..0x8000).contains(&gap) {
                self.lost += u64::from(gap - 1);
            }
        }
        self.last_sequence = Some(packet.sequence);
        self.packets += 1;
        self.bytes += packet.payload.len() as u64;

        if self.packets % self.interval == 0 {
            tracing::info!(
                track = %self.track,
                packets = self.packets,
                bytes = self.bytes,
                lost = self.lost,
                "receiving"
            );
        }
    }

    fn on_stop(&mut self) {
        tracing::info!(
            track = %self.track,
            packets = self.packets,
            bytes = self.bytes,
            lost = self.lost,
            elapsed = ?self.started.elapsed(),
            "track finished"
        );
    }
}

/// Fans each packet out to several sinks.
pub struct Tee(pub Vec<Box<dyn PacketSink>>);

impl PacketSink for Tee {
    fn on_packet(&mut self, packet: &RtpPacket<'_>) {
        for sink in &mut self.0 {
            sink.on_packet(packet);
        }
    }

    fn on_stop(&mut self) {
        for sink in &mut self.0 {
            sink.on_stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtsp::media::RtpHeader;

    fn datagram(seq: u16, payload: &[u8]) -> Vec<u8> {
        let mut header = RtpHeader::new(96, 1);
        header.sequence = seq;
        let mut d = header.write();
        d.extend_from_slice(payload);
        d
    }

    #[test]
    fn counting_detects_gaps() {
        let mut sink = CountingSink::new(MediaKind::Video, 100);
        for seq in [65534u16, 65535, 0, 3, 2] {
            let d = datagram(seq, b"xy");
            sink.on_packet(&RtpPacket::decode(&d).unwrap());
        }
        assert_eq!(sink.packets(), 5);
        assert_eq!(sink.lost(), 2);
    }

    #[test]
    fn file_sink_splits_header_and_payload() {
        let dir = std::env::temp_dir().join(format!("rtsp-play-sink-{}", std::process::id()));
        let mut sink = FileSink::create(&dir, MediaKind::Audio).unwrap();
        for seq in 1..=2u16 {
            let d = datagram(seq, &[seq as u8; 3]);
            sink.on_packet(&RtpPacket::decode(&d).unwrap());
        }
        sink.on_stop();

        let payload = std::fs::read(dir.join("audio.bin")).unwrap();
        let header = std::fs::read(dir.join("audio.hdr")).unwrap();
        assert_eq!(payload, vec![1, 1, 1, 2, 2, 2]);
        assert_eq!(header.len(), 24);
        assert_eq!(&header[2..4], &[0, 1]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
