use crate::error::{DecodeErrorKind, Result, RtspError};

/// Size of the fixed RTP header (RFC 3550 §5.1).
pub const RTP_HEADER_SIZE: usize = 12;

/// Byte order of multi-byte header fields.
///
/// RTP is big-endian on the wire. [`Little`](Self::Little) exists only for
/// peers known to emit little-endian fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Network,
    Little,
}

impl ByteOrder {
    fn u16(self, b: [u8; 2]) -> u16 {
        match self {
            Self::Network => u16::from_be_bytes(b),
            Self::Little => u16::from_le_bytes(b),
        }
    }

    fn u32(self, b: [u8; 4]) -> u32 {
        match self {
            Self::Network => u32::from_be_bytes(b),
            Self::Little => u32::from_le_bytes(b),
        }
    }

    fn u16_bytes(self, v: u16) -> [u8; 2] {
        match self {
            Self::Network => v.to_be_bytes(),
            Self::Little => v.to_le_bytes(),
        }
    }

    fn u32_bytes(self, v: u32) -> [u8; 4] {
        match self {
            Self::Network => v.to_be_bytes(),
            Self::Little => v.to_le_bytes(),
        }
    }

    fn read_u16(self, buf: &[u8], at: usize) -> u16 {
        self.u16([buf[at], buf[at + 1]])
    }

    fn read_u32(self, buf: &[u8], at: usize) -> u32 {
        self.u32([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }
}

/// One decoded RTP datagram (RFC 3550 §5.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             SSRC                              |
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// |                  CSRC list (0..15 × 32 bits)                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      defined by profile       |            length             |
/// |                  header extension (length × 32 bits)          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    payload ...    | padding ... | pad count   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// `header` and `payload` borrow from the receive buffer; padding is never
/// part of `payload`. The payload is not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket<'a> {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub marker: bool,
    /// 7-bit payload type (RFC 3551).
    pub payload_type: u8,
    pub sequence: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    /// At most 15 ids, in wire order.
    pub csrc: Vec<u32>,
    /// Bytes `[0, offset)`: fixed header, CSRC list and extension block.
    pub header: &'a [u8],
    /// Bytes `[offset, len - padding)`.
    pub payload: &'a [u8],
}

impl<'a> RtpPacket<'a> {
    /// Decode with network byte order.
    pub fn decode(buf: &'a [u8]) -> Result<Self> {
        Self::decode_with(buf, ByteOrder::Network)
    }

    /// Split a datagram into header fields, header span and payload span.
    ///
    /// Fails with [`RtspError::Decode`] when the datagram is shorter than
    /// the fixed header, or when the CSRC list, extension block or padding
    /// run past its end.
    pub fn decode_with(buf: &'a [u8], order: ByteOrder) -> Result<Self> {
        let len = buf.len();
        if len < RTP_HEADER_SIZE {
            return Err(RtspError::decode(DecodeErrorKind::TooShort(len)));
        }

        let version = buf[0] >> 6;
        let padding = buf[0] & 0x20 != 0;
        let extension = buf[0] & 0x10 != 0;
        let csrc_count = buf[0] & 0x0f;

        let mut offset = RTP_HEADER_SIZE + 4 * csrc_count as usize;
        if offset > len {
            return Err(RtspError::decode(DecodeErrorKind::CsrcOverflow {
                count: csrc_count,
                len,
            }));
        }

        // RFC 3550 §5.3.1: 16-bit profile id, 16-bit length in 32-bit words.
        if extension {
            if offset + 4 > len {
                return Err(RtspError::decode(DecodeErrorKind::ExtensionOverflow {
                    offset: offset + 4,
                    len,
                }));
            }
            let words = order.read_u16(buf, offset + 2) as usize;
            offset += 4 + 4 * words;
            if offset > len {
                return Err(RtspError::decode(DecodeErrorKind::ExtensionOverflow {
                    offset,
                    len,
                }));
            }
        }

        let marker = buf[1] & 0x80 != 0;
        let payload_type = buf[1] & 0x7f;

        let sequence = order.read_u16(buf, 2);
        let timestamp = order.read_u32(buf, 4);
        let ssrc = order.read_u32(buf, 8);

        let csrc = (0..csrc_count as usize)
            .map(|i| order.read_u32(buf, RTP_HEADER_SIZE + 4 * i))
            .collect();

        let pad = if padding { buf[len - 1] as usize } else { 0 };
        if offset + pad > len {
            return Err(RtspError::decode(DecodeErrorKind::PaddingOverflow {
                offset,
                padding: pad,
                len,
            }));
        }

        Ok(RtpPacket {
            version,
            padding,
            extension,
            marker,
            payload_type,
            sequence,
            timestamp,
            ssrc,
            csrc,
            header: &buf[..offset],
            payload: &buf[offset..len - pad],
        })
    }
}

/// RTP header writer (RFC 3550 §5.1), the encode half of [`RtpPacket`].
///
/// Builds the fixed header plus CSRC list. Header extensions and padding
/// are left to the caller.
#[derive(Debug, Clone, Default)]
pub struct RtpHeader {
    pub marker: bool,
    /// RTP payload type (7-bit, RFC 3551).
    pub pt: u8,
    pub sequence: u16,
    pub timestamp: u32,
    /// Synchronization source identifier (RFC 3550 §8.1).
    pub ssrc: u32,
    /// Contributing sources; anything past 15 is dropped.
    pub csrc: Vec<u32>,
    pub padding: bool,
    pub extension: bool,
}

impl RtpHeader {
    pub fn new(pt: u8, ssrc: u32) -> Self {
        Self {
            pt,
            ssrc,
            ..Self::default()
        }
    }

    /// Serialize the header in network byte order.
    pub fn write(&self) -> Vec<u8> {
        self.write_with(ByteOrder::Network)
    }

    pub fn write_with(&self, order: ByteOrder) -> Vec<u8> {
        let csrc = &self.csrc[..self.csrc.len().min(15)];

        let first_byte: u8 = (2 << 6)
            | ((self.padding as u8) << 5)
            | ((self.extension as u8) << 4)
            | csrc.len() as u8;
        let second_byte: u8 = ((self.marker as u8) << 7) | (self.pt & 0x7f);

        let mut header = Vec::with_capacity(RTP_HEADER_SIZE + 4 * csrc.len());
        header.push(first_byte);
        header.push(second_byte);
        header.extend_from_slice(&order.u16_bytes(self.sequence));
        header.extend_from_slice(&order.u32_bytes(self.timestamp));
        header.extend_from_slice(&order.u32_bytes(self.ssrc));
        for id in csrc {
            header.extend_from_slice(&order.u32_bytes(*id));
        }
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(header: &RtpHeader, payload: &[u8]) -> Vec<u8> {
        let mut buf = header.write();
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn decode_plain_packet() {
        let header = RtpHeader {
            sequence: 28169,
            timestamp: 981_552_495,
            ..RtpHeader::new(96, 0xAABBCCDD)
        };
        let payload = [0x65, 0x88, 0x84, 0x00, 0x21];
        let buf = packet(&header, &payload);

        let p = RtpPacket::decode(&buf).unwrap();
        assert_eq!(p.version, 2);
        assert!(!p.padding);
        assert!(!p.extension);
        assert!(!p.marker);
        assert_eq!(p.payload_type, 96);
        assert_eq!(p.sequence, 28169);
        assert_eq!(p.timestamp, 981_552_495);
        assert_eq!(p.ssrc, 0xAABBCCDD);
        assert!(p.csrc.is_empty());
        assert_eq!(p.header.len(), RTP_HEADER_SIZE);
        assert_eq!(p.payload, &payload);
    }

    #[test]
    fn fields_are_big_endian() {
        let mut buf = vec![0x80, 0x60, 0x01, 0x02, 0x00, 0x00, 0x00, 0x03];
        buf.extend_from_slice(&[0x12, 0x34, 0x56, 0x78]);
        let p = RtpPacket::decode(&buf).unwrap();
        assert_eq!(p.sequence, 0x0102);
        assert_eq!(p.timestamp, 3);
        assert_eq!(p.ssrc, 0x1234_5678);
    }

    #[test]
    fn little_endian_when_configured() {
        let header = RtpHeader {
            sequence: 0x0102,
            timestamp: 0x0A0B_0C0D,
            ..RtpHeader::new(0, 0x1122_3344)
        };
        let buf = header.write_with(ByteOrder::Little);
        assert_eq!(&buf[2..4], &[0x02, 0x01]);

        let p = RtpPacket::decode_with(&buf, ByteOrder::Little).unwrap();
        assert_eq!(p.sequence, 0x0102);
        assert_eq!(p.timestamp, 0x0A0B_0C0D);
        assert_eq!(p.ssrc, 0x1122_3344);
    }

    #[test]
    fn marker_and_payload_type() {
        let header = RtpHeader {
            marker: true,
            ..RtpHeader::new(127, 1)
        };
        let buf = packet(&header, &[]);
        let p = RtpPacket::decode(&buf).unwrap();
        assert!(p.marker);
        assert_eq!(p.payload_type, 127);
        assert!(p.payload.is_empty());
    }

    #[test]
    fn padding_is_excluded() {
        let payload = [1u8, 2, 3, 4, 5, 6];
        let plain = packet(&RtpHeader::new(96, 7), &payload);
        let unpadded = RtpPacket::decode(&plain).unwrap().payload.len();

        let header = RtpHeader {
            padding: true,
            ..RtpHeader::new(96, 7)
        };
        let mut buf = packet(&header, &payload);
        buf.extend_from_slice(&[0xEE, 0xEE, 3]);

        let p = RtpPacket::decode(&buf).unwrap();
        assert!(p.padding);
        assert_eq!(p.payload, &payload);
        assert_eq!(p.payload.len(), unpadded);
        assert!(!p.payload.contains(&0xEE));
    }

    #[test]
    fn padding_shortens_payload_by_count() {
        let header = RtpHeader {
            padding: true,
            ..RtpHeader::new(96, 7)
        };
        let buf = packet(&header, &[9, 9, 9, 9, 9, 9, 9, 4]);
        let p = RtpPacket::decode(&buf).unwrap();
        assert_eq!(p.payload, &[9, 9, 9, 9]);
    }

    #[test]
    fn csrc_list_in_order() {
        let header = RtpHeader {
            csrc: vec![0x0000_0001, 0xDEAD_BEEF, 0x0000_0003],
            ..RtpHeader::new(8, 99)
        };
        let buf = packet(&header, b"pcma");
        let p = RtpPacket::decode(&buf).unwrap();
        assert_eq!(p.csrc, vec![0x0000_0001, 0xDEAD_BEEF, 0x0000_0003]);
        assert_eq!(p.header.len(), RTP_HEADER_SIZE + 12);
        assert_eq!(p.payload, b"pcma");
    }

    #[test]
    fn extension_block_belongs_to_header() {
        let header = RtpHeader {
            extension: true,
            ..RtpHeader::new(96, 5)
        };
        let mut buf = header.write();
        // profile 0xBEDE, 2 words of extension data
        buf.extend_from_slice(&[0xBE, 0xDE, 0x00, 0x02]);
        buf.extend_from_slice(&[0u8; 8]);
        buf.extend_from_slice(b"payload");

        let p = RtpPacket::decode(&buf).unwrap();
        assert!(p.extension);
        assert_eq!(p.header.len(), RTP_HEADER_SIZE + 4 + 8);
        assert_eq!(p.payload, b"payload");
    }

    #[test]
    fn too_short() {
        let err = RtpPacket::decode(&[0x80; 10]).unwrap_err();
        assert!(matches!(
            err,
            RtspError::Decode {
                kind: DecodeErrorKind::TooShort(10)
            }
        ));
    }

    #[test]
    fn csrc_count_past_end() {
        let mut buf = RtpHeader::new(96, 1).write();
        buf[0] |= 0x0f;
        buf.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            RtpPacket::decode(&buf).unwrap_err(),
            RtspError::Decode {
                kind: DecodeErrorKind::CsrcOverflow { count: 15, .. }
            }
        ));
    }

    #[test]
    fn extension_length_past_end() {
        let header = RtpHeader {
            extension: true,
            ..RtpHeader::new(96, 5)
        };
        let mut buf = header.write();
        buf.extend_from_slice(&[0xBE, 0xDE, 0x00, 0x10, 0, 0, 0, 0]);
        assert!(matches!(
            RtpPacket::decode(&buf).unwrap_err(),
            RtspError::Decode {
                kind: DecodeErrorKind::ExtensionOverflow { .. }
            }
        ));

        let mut truncated = header.write();
        truncated.extend_from_slice(&[0xBE, 0xDE]);
        assert!(RtpPacket::decode(&truncated).is_err());
    }

    #[test]
    fn padding_count_past_end() {
        let header = RtpHeader {
            padding: true,
            ..RtpHeader::new(96, 5)
        };
        let buf = packet(&header, &[0, 0, 200]);
        assert!(matches!(
            RtpPacket::decode(&buf).unwrap_err(),
            RtspError::Decode {
                kind: DecodeErrorKind::PaddingOverflow { padding: 200, .. }
            }
        ));
    }

    #[test]
    fn header_writer_caps_csrc_at_15() {
        let header = RtpHeader {
            csrc: (0..20).collect(),
            ..RtpHeader::new(96, 5)
        };
        let buf = header.write();
        assert_eq!(buf[0] & 0x0f, 15);
        assert_eq!(buf.len(), RTP_HEADER_SIZE + 60);
    }
}
