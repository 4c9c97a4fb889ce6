use std::net::IpAddr;

/// Client transport request for SETUP (RFC 2326 §12.39).
///
/// ## Wire format example
///
/// ```text
/// Client → Server:
///   Transport: RTP/AVP;unicast;client_port=8000-8001
///
/// Server → Client:
///   Transport: RTP/AVP;unicast;source=172.30.1.60;client_port=8000-8001;server_port=6970-6971
/// ```
///
/// Only `RTP/AVP` over UDP unicast is requested; RTCP would go to
/// `client_rtp_port + 1` but is never bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportHeader {
    pub client_rtp_port: u16,
    pub client_rtcp_port: u16,
}

impl TransportHeader {
    /// Request the port pair `(port, port + 1)`.
    pub fn unicast(client_rtp_port: u16) -> Self {
        TransportHeader {
            client_rtp_port,
            client_rtcp_port: client_rtp_port.wrapping_add(1),
        }
    }

    /// `Transport` header value for the SETUP request.
    ///
    /// ```
    /// use rtsp::session::TransportHeader;
    ///
    /// assert_eq!(
    ///     TransportHeader::unicast(6970).to_header_value(),
    ///     "RTP/AVP;unicast;client_port=6970-6971"
    /// );
    /// ```
    pub fn to_header_value(&self) -> String {
        format!(
            "RTP/AVP;unicast;client_port={}-{}",
            self.client_rtp_port, self.client_rtcp_port
        )
    }
}

/// Transport parameters echoed by the server in a SETUP reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportInfo {
    pub client_ports: Option<(u16, u16)>,
    pub server_ports: Option<(u16, u16)>,
    /// Address the server sends from, if announced.
    pub source: Option<IpAddr>,
    pub ssrc: Option<u32>,
}

impl TransportInfo {
    /// Parse the reply's `Transport` header. Unknown parameters are ignored.
    ///
    /// ```
    /// use rtsp::session::TransportInfo;
    ///
    /// let info = TransportInfo::parse(
    ///     "RTP/AVP;unicast;destination=81.181.140.217;source=172.30.1.60;\
    ///      client_port=6970-6971;server_port=6970-6971",
    /// );
    /// assert_eq!(info.server_ports, Some((6970, 6971)));
    /// assert_eq!(info.source, Some("172.30.1.60".parse().unwrap()));
    /// ```
    pub fn parse(header: &str) -> Self {
        let mut info = TransportInfo::default();

        for part in header.split(';') {
            let part = part.trim();
            if let Some(ports) = part.strip_prefix("client_port=") {
                info.client_ports = parse_port_range(ports);
            } else if let Some(ports) = part.strip_prefix("server_port=") {
                info.server_ports = parse_port_range(ports);
            } else if let Some(source) = part.strip_prefix("source=") {
                info.source = source.trim().parse().ok();
            } else if let Some(ssrc) = part.strip_prefix("ssrc=") {
                info.ssrc = u32::from_str_radix(ssrc.trim(), 16).ok();
            }
        }
        info
    }
}

/// `RTP-RTCP` or a single `RTP` port (RTCP implied as +1).
fn parse_port_range(ports: &str) -> Option<(u16, u16)> {
    match ports.split_once('-') {
        Some((rtp, rtcp)) => Some((rtp.trim().parse().ok()?, rtcp.trim().parse().ok()?)),
        None => {
            let rtp: u16 = ports.trim().parse().ok()?;
            Some((rtp, rtp.checked_add(1)?))
        }
    }
}
