//! Error types for the RTSP client library.

use std::fmt;

use crate::session::SessionState;

/// Errors that can occur in the RTSP client library.
///
/// Variants map to specific failure modes across the stack:
///
/// - **Transport**: [`Io`](Self::Io): connect/read/write/bind failures.
/// - **Framing**: [`Framing`](Self::Framing): malformed RTSP replies.
/// - **Authentication**: [`Auth`](Self::Auth): challenge could not be answered.
/// - **Media**: [`Decode`](Self::Decode): malformed RTP datagrams.
/// - **Session**: [`State`](Self::State): command issued in the wrong state.
/// - **Orchestration**: [`InvalidUri`](Self::InvalidUri),
///   [`Rejected`](Self::Rejected).
#[derive(Debug, thiserror::Error)]
pub enum RtspError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server reply could not be parsed (RFC 2326 §7).
    #[error("RTSP framing error: {kind}")]
    Framing { kind: FramingErrorKind },

    /// A 401 challenge could not be answered.
    #[error("authentication error: {kind}")]
    Auth { kind: AuthErrorKind },

    /// An RTP datagram is inconsistent with its own header (RFC 3550 §5.1).
    #[error("RTP decode error: {kind}")]
    Decode { kind: DecodeErrorKind },

    /// The command is not permitted in the session's current state.
    /// Rejected before any I/O takes place.
    #[error("{method} not allowed in state {state:?}")]
    State {
        method: &'static str,
        state: SessionState,
    },

    /// The target is not an `rtsp://host[:port]/path` identifier.
    #[error("invalid RTSP URI: {0}")]
    InvalidUri(String),

    /// The server answered with a non-2xx status.
    #[error("{method} rejected: {status} {reason}")]
    Rejected {
        method: &'static str,
        status: u16,
        reason: String,
    },
}

/// Specific kind of RTSP reply framing failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramingErrorKind {
    /// The transport delivered no text.
    EmptyResponse,
    /// First line is not `RTSP/1.0 <3-digit code> <reason>`.
    InvalidStatusLine(String),
    /// A header line did not have the `Name: value` shape.
    InvalidHeader(String),
    /// A successful SETUP reply carried no `Session` header.
    MissingSession,
}

impl fmt::Display for FramingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyResponse => write!(f, "empty response"),
            Self::InvalidStatusLine(line) => write!(f, "invalid status line: {line:?}"),
            Self::InvalidHeader(line) => write!(f, "invalid header: {line:?}"),
            Self::MissingSession => write!(f, "SETUP reply without Session header"),
        }
    }
}

/// Specific kind of authentication failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// 401 reply without a `WWW-Authenticate` header.
    MissingChallenge,
    /// Challenge names a scheme other than Basic or Digest.
    UnsupportedScheme(String),
    /// Digest challenge without a realm or nonce.
    MalformedChallenge(String),
    /// Digest challenge demands `qop` (and therefore `cnonce`/`nc`).
    UnsupportedDigestParameters,
    /// A challenge arrived but no username/password was configured.
    MissingCredentials,
    /// The server answered 401 again after the authenticated retry.
    Rejected,
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChallenge => write!(f, "missing challenge"),
            Self::UnsupportedScheme(scheme) => {
                write!(f, "unsupported authentication scheme: {scheme}")
            }
            Self::MalformedChallenge(challenge) => write!(f, "malformed challenge: {challenge}"),
            Self::UnsupportedDigestParameters => write!(f, "unsupported digest parameters"),
            Self::MissingCredentials => write!(f, "server requires credentials"),
            Self::Rejected => write!(f, "credentials rejected"),
        }
    }
}

/// Specific kind of RTP decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Fewer than 12 bytes.
    TooShort(usize),
    /// CSRC list runs past the end of the datagram.
    CsrcOverflow { count: u8, len: usize },
    /// Header extension runs past the end of the datagram.
    ExtensionOverflow { offset: usize, len: usize },
    /// Header plus padding is longer than the datagram.
    PaddingOverflow { offset: usize, padding: usize, len: usize },
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort(len) => write!(f, "packet too short ({len} bytes)"),
            Self::CsrcOverflow { count, len } => {
                write!(f, "{count} CSRC ids do not fit in {len} bytes")
            }
            Self::ExtensionOverflow { offset, len } => {
                write!(f, "header extension ends at {offset}, packet is {len} bytes")
            }
            Self::PaddingOverflow {
                offset,
                padding,
                len,
            } => write!(
                f,
                "header ({offset}) plus padding ({padding}) exceed packet length {len}"
            ),
        }
    }
}

impl RtspError {
    pub(crate) fn framing(kind: FramingErrorKind) -> Self {
        Self::Framing { kind }
    }

    pub(crate) fn auth(kind: AuthErrorKind) -> Self {
        Self::Auth { kind }
    }

    pub(crate) fn decode(kind: DecodeErrorKind) -> Self {
        Self::Decode { kind }
    }
}

/// Convenience alias for `Result<T, RtspError>`.
pub type Result<T> = std::result::Result<T, RtspError>;
