//! Client-side RTSP session state (RFC 2326 §3, §12.37, Appendix A.1).
//!
//! A [`ControlSession`] is one explicit value owned by the orchestrator and
//! passed to every [`ControlEngine`](crate::client::ControlEngine) call. It
//! tracks:
//!
//! - The target URI every request is built from.
//! - The CSeq counter (strictly increasing, never reused across commands).
//! - The server-assigned session ID, known after the first successful SETUP.
//! - The playback state.
//!
//! ## Session lifecycle
//!
//! ```text
//! attach        Idle       -> Connected
//! DESCRIBE      Connected  -> Described
//! SETUP         Described  -> MediaSetup   (once per track)
//! PLAY          MediaSetup -> Playing
//! PAUSE         Playing    -> Paused
//! PLAY          Paused     -> Playing
//! TEARDOWN      *          -> TornDown     (whatever the reply)
//! close         TornDown   -> Idle
//! ```

pub mod transport;

use crate::auth::AuthChallenge;
use crate::error::{Result, RtspError};
use crate::protocol::{Method, RtspUri, SessionDescription};

pub use transport::{TransportHeader, TransportInfo};

/// Default session timeout in seconds (RFC 2326 §12.37).
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 60;

/// RTSP client session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No control channel.
    Idle,
    /// Control channel open, nothing negotiated.
    Connected,
    /// DESCRIBE succeeded; tracks are known.
    Described,
    /// At least one SETUP succeeded; a session ID is assigned.
    MediaSetup,
    /// Media is being delivered.
    Playing,
    /// Delivery suspended; can resume via PLAY.
    Paused,
    /// TEARDOWN sent.
    TornDown,
}

impl SessionState {
    /// Whether `method` may be issued in this state.
    pub fn permits(&self, method: Method) -> bool {
        use SessionState::*;

        match method {
            Method::Options => !matches!(self, Idle | TornDown),
            Method::Describe => matches!(self, Connected | Described),
            Method::Setup => matches!(self, Described | MediaSetup),
            Method::Play => matches!(self, MediaSetup | Playing | Paused),
            Method::Pause => matches!(self, Playing),
            Method::Teardown => !matches!(self, Idle | TornDown),
            Method::SetParameter
            | Method::GetParameter
            | Method::Announce
            | Method::Record
            | Method::Redirect => matches!(self, MediaSetup | Playing | Paused),
        }
    }
}

/// Negotiation state of one RTSP session, seen from the client.
#[derive(Debug, Clone)]
pub struct ControlSession {
    uri: RtspUri,
    cseq: u32,
    session_id: Option<String>,
    timeout_secs: u64,
    state: SessionState,
    description: Option<SessionDescription>,
    /// Challenge answered successfully; reused on every later request.
    pub(crate) challenge: Option<AuthChallenge>,
}

impl ControlSession {
    pub fn new(uri: RtspUri) -> Self {
        ControlSession {
            uri,
            cseq: 0,
            session_id: None,
            timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            state: SessionState::Idle,
            description: None,
            challenge: None,
        }
    }

    pub fn uri(&self) -> &RtspUri {
        &self.uri
    }

    /// Request target for commands on the whole presentation.
    pub fn target(&self) -> String {
        self.uri.target()
    }

    /// Request target for one track's SETUP.
    ///
    /// Absolute control URLs are used as-is; `*` means the presentation
    /// itself; anything else is appended to the presentation path.
    pub fn track_target(&self, control: &str) -> String {
        let control = control.trim();
        if control
            .get(..7)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("rtsp://"))
        {
            return control.to_string();
        }
        if control.is_empty() || control == "*" {
            return self.target();
        }
        format!(
            "{}/{}",
            self.target().trim_end_matches('/'),
            control.trim_start_matches('/')
        )
    }

    /// Last CSeq issued (0 before the first request).
    pub fn cseq(&self) -> u32 {
        self.cseq
    }

    /// Allocate the CSeq for a new command.
    pub(crate) fn next_cseq(&mut self) -> u32 {
        self.cseq += 1;
        self.cseq
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Store the server's `Session` header value.
    ///
    /// Handles timeout suffix: `"359;timeout=60"` -> id `"359"`, timeout 60.
    pub(crate) fn set_session(&mut self, header: &str) {
        let mut parts = header.split(';');
        let id = parts.next().unwrap_or(header).trim().to_string();
        let timeout = parts
            .filter_map(|p| p.trim().strip_prefix("timeout="))
            .find_map(|t| t.trim().parse().ok());

        if let Some(timeout) = timeout {
            self.timeout_secs = timeout;
        }
        tracing::debug!(session_id = %id, timeout_secs = self.timeout_secs, "session assigned");
        self.session_id = Some(id);
    }

    /// Seconds of silence the server tolerates before expiring the session.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Transition to a new state.
    pub(crate) fn set_state(&mut self, state: SessionState) {
        tracing::debug!(old_state = ?self.state, new_state = ?state, "state transition");
        self.state = state;
    }

    /// Session description from the last successful DESCRIBE.
    pub fn description(&self) -> Option<&SessionDescription> {
        self.description.as_ref()
    }

    pub(crate) fn set_description(&mut self, description: SessionDescription) {
        self.description = Some(description);
    }

    /// Reject `method` before any I/O if the current state forbids it.
    pub(crate) fn check(&self, method: Method) -> Result<()> {
        let permitted = self.state.permits(method)
            && (method != Method::Play || self.session_id.is_some());

        if permitted {
            Ok(())
        } else {
            tracing::warn!(%method, state = ?self.state, "command rejected by session state");
            Err(RtspError::State {
                method: method.as_str(),
                state: self.state,
            })
        }
    }

    /// Forget everything negotiated; used when the control channel closes.
    pub(crate) fn reset(&mut self) {
        self.session_id = None;
        self.description = None;
        self.challenge = None;
        self.timeout_secs = DEFAULT_SESSION_TIMEOUT_SECS;
        self.set_state(SessionState::Idle);
    }
}
