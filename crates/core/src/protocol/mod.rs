//! RTSP protocol implementation (RFC 2326), client side.
//!
//! This module handles the text-based RTSP signaling protocol: building
//! requests, parsing replies, reading SDP and target URIs.
//!
//! ## RTSP message format (RFC 2326 §4)
//!
//! ```text
//! DESCRIBE rtsp://server/stream RTSP/1.0\r\n
//! CSeq: 2\r\n
//! Accept: application/sdp\r\n
//! \r\n
//! ```
//!
//! ## Supported methods
//!
//! | Method | RFC section | Purpose |
//! |--------|-------------|---------|
//! | OPTIONS | §10.1 | Capability discovery |
//! | DESCRIBE | §10.2 | Retrieve SDP session description |
//! | ANNOUNCE | §10.3 | Post a session description |
//! | SETUP | §10.4 | Negotiate transport (UDP ports) |
//! | PLAY | §10.5 | Start media delivery |
//! | PAUSE | §10.6 | Suspend media delivery |
//! | TEARDOWN | §10.7 | Destroy session |
//! | GET_PARAMETER | §10.8 | Keepalive / parameter query |
//! | SET_PARAMETER | §10.9 | Set a session parameter |
//! | REDIRECT | §10.10 | Point the peer at another server |
//! | RECORD | §10.11 | Start recording |

pub mod request;
pub mod response;
pub mod sdp;
pub mod uri;

pub use request::RtspRequest;
pub use response::RtspResponse;
pub use sdp::{MediaKind, SessionDescription};
pub use uri::RtspUri;

/// Protocol tag used on request and status lines.
pub const RTSP_VERSION: &str = "RTSP/1.0";

/// Port implied by an `rtsp://` URI without an explicit port (RFC 2326 §3.2).
pub const DEFAULT_RTSP_PORT: u16 = 554;

/// RTSP request methods recognized by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Options,
    Describe,
    Setup,
    Play,
    Pause,
    Teardown,
    SetParameter,
    GetParameter,
    Announce,
    Record,
    Redirect,
}

impl Method {
    /// Method token as written on the request line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Options => "OPTIONS",
            Self::Describe => "DESCRIBE",
            Self::Setup => "SETUP",
            Self::Play => "PLAY",
            Self::Pause => "PAUSE",
            Self::Teardown => "TEARDOWN",
            Self::SetParameter => "SET_PARAMETER",
            Self::GetParameter => "GET_PARAMETER",
            Self::Announce => "ANNOUNCE",
            Self::Record => "RECORD",
            Self::Redirect => "REDIRECT",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
