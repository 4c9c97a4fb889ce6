//! RTSP request/response engine.
//!
//! [`ControlEngine`] turns commands into requests, sends each as one write
//! on a [`ControlTransport`], reads one chunk back as the complete reply,
//! and drives the [`ControlSession`] state machine.
//!
//! Commands are strictly sequential: the engine borrows the session
//! mutably for the whole exchange, so two commands can never be in flight
//! on the same session.
//!
//! ## Authentication
//!
//! A `401` reply is answered once: the challenge is turned into an
//! `Authorization` header and the same request is sent again with the
//! same CSeq. A second `401` is an [`AuthErrorKind::Rejected`] error.
//! An accepted challenge is remembered and answered up front on every
//! later request of the session.

use crate::auth::{AuthChallenge, Credentials};
use crate::error::{AuthErrorKind, FramingErrorKind, Result, RtspError};
use crate::protocol::{Method, RtspRequest, RtspResponse, SessionDescription};
use crate::session::{ControlSession, SessionState, TransportHeader};
use crate::transport::ControlTransport;

/// Client identification string sent with every request (RFC 2326 §12.41).
pub const USER_AGENT: &str = concat!("rtsp-rs/", env!("CARGO_PKG_VERSION"));

/// Builds, sends and interprets RTSP commands for one control channel.
pub struct ControlEngine<T> {
    transport: T,
    credentials: Option<Credentials>,
    user_agent: String,
}

impl<T: ControlTransport> ControlEngine<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            credentials: None,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Credentials used to answer `401` challenges.
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Bind `session` to this engine's open channel: `Idle -> Connected`.
    pub fn attach(&self, session: &mut ControlSession) -> Result<()> {
        if session.state() != SessionState::Idle {
            return Err(RtspError::State {
                method: "CONNECT",
                state: session.state(),
            });
        }
        session.set_state(SessionState::Connected);
        Ok(())
    }

    /// Close the control channel and return `session` to `Idle`.
    pub fn close(&mut self, session: &mut ControlSession) -> Result<()> {
        let result = self.transport.close();
        session.reset();
        result
    }

    /// OPTIONS (RFC 2326 §10.1). No state change.
    pub fn options(&mut self, session: &mut ControlSession) -> Result<RtspResponse> {
        session.check(Method::Options)?;
        let uri = session.target();
        let request = self.request(session, Method::Options, uri);
        self.execute(session, request)
    }

    /// DESCRIBE (RFC 2326 §10.2).
    ///
    /// On 2xx the body becomes the session's [`SessionDescription`] and the
    /// session moves to `Described`. Other replies are returned unchanged.
    pub fn describe(&mut self, session: &mut ControlSession) -> Result<RtspResponse> {
        session.check(Method::Describe)?;
        let uri = session.target();
        let request = self
            .request(session, Method::Describe, uri)
            .add_header("Accept", "application/sdp");

        let response = self.execute(session, request)?;
        if response.is_success() {
            let description = SessionDescription::new(&response.body);
            tracing::info!(
                video = description.has_video(),
                audio = description.has_audio(),
                "session described"
            );
            session.set_description(description);
            session.set_state(SessionState::Described);
        }
        Ok(response)
    }

    /// SETUP (RFC 2326 §10.4) for the track whose SDP control is `control`,
    /// requesting unicast delivery to `client_port` / `client_port + 1`.
    ///
    /// On 2xx the server's session ID is captured and the session moves to
    /// `MediaSetup`.
    pub fn setup(
        &mut self,
        session: &mut ControlSession,
        control: &str,
        client_port: u16,
    ) -> Result<RtspResponse> {
        session.check(Method::Setup)?;
        let transport = TransportHeader::unicast(client_port);
        let uri = session.track_target(control);
        let request = self
            .request(session, Method::Setup, uri)
            .add_header("Transport", &transport.to_header_value());

        let response = self.execute(session, request)?;
        if response.is_success() {
            match response.get_header("Session") {
                Some(header) => session.set_session(header),
                None if session.session_id().is_some() => {}
                None => return Err(RtspError::framing(FramingErrorKind::MissingSession)),
            }
            tracing::info!(
                control,
                client_port,
                session_id = session.session_id().unwrap_or_default(),
                "track set up"
            );
            session.set_state(SessionState::MediaSetup);
        }
        Ok(response)
    }

    /// PLAY (RFC 2326 §10.5). Requires a session ID.
    pub fn play(&mut self, session: &mut ControlSession) -> Result<RtspResponse> {
        session.check(Method::Play)?;
        let uri = session.target();
        let request = self.request(session, Method::Play, uri);

        let response = self.execute(session, request)?;
        if response.is_success() {
            session.set_state(SessionState::Playing);
        }
        Ok(response)
    }

    /// PAUSE (RFC 2326 §10.6).
    pub fn pause(&mut self, session: &mut ControlSession) -> Result<RtspResponse> {
        session.check(Method::Pause)?;
        let uri = session.target();
        let request = self.request(session, Method::Pause, uri);

        let response = self.execute(session, request)?;
        if response.is_success() {
            session.set_state(SessionState::Paused);
        }
        Ok(response)
    }

    /// TEARDOWN (RFC 2326 §10.7).
    ///
    /// The session moves to `TornDown` whatever the outcome, including a
    /// transport error, which is still returned.
    pub fn teardown(&mut self, session: &mut ControlSession) -> Result<RtspResponse> {
        session.check(Method::Teardown)?;
        let uri = session.target();
        let request = self.request(session, Method::Teardown, uri);

        let result = self.execute(session, request);
        session.set_state(SessionState::TornDown);
        result
    }

    /// SET_PARAMETER (RFC 2326 §10.9) with a `name: value` body.
    pub fn set_parameter(
        &mut self,
        session: &mut ControlSession,
        name: &str,
        value: &str,
    ) -> Result<RtspResponse> {
        session.check(Method::SetParameter)?;
        let uri = session.target();
        let request = self
            .request(session, Method::SetParameter, uri)
            .with_body("text/parameters", format!("{}: {}\r\n", name, value));
        self.execute(session, request)
    }

    /// GET_PARAMETER (RFC 2326 §10.8). An empty `name` sends no body,
    /// which servers treat as a keepalive.
    pub fn get_parameter(
        &mut self,
        session: &mut ControlSession,
        name: &str,
    ) -> Result<RtspResponse> {
        session.check(Method::GetParameter)?;
        let uri = session.target();
        let mut request = self.request(session, Method::GetParameter, uri);
        if !name.is_empty() {
            request = request.with_body("text/parameters", format!("{}\r\n", name));
        }
        self.execute(session, request)
    }

    /// ANNOUNCE (RFC 2326 §10.3) with an SDP body.
    pub fn announce(&mut self, session: &mut ControlSession, sdp: &str) -> Result<RtspResponse> {
        session.check(Method::Announce)?;
        let uri = session.target();
        let request = self
            .request(session, Method::Announce, uri)
            .with_body("application/sdp", sdp.to_string());
        self.execute(session, request)
    }

    /// RECORD (RFC 2326 §10.11).
    pub fn record(&mut self, session: &mut ControlSession) -> Result<RtspResponse> {
        session.check(Method::Record)?;
        let uri = session.target();
        let request = self.request(session, Method::Record, uri);
        self.execute(session, request)
    }

    /// REDIRECT (RFC 2326 §10.10) to `location`, optionally at a
    /// `clock=` range.
    pub fn redirect(
        &mut self,
        session: &mut ControlSession,
        location: &str,
        range: Option<&str>,
    ) -> Result<RtspResponse> {
        session.check(Method::Redirect)?;
        let uri = session.target();
        let mut request = self
            .request(session, Method::Redirect, uri)
            .add_header("Location", location);
        if let Some(range) = range {
            request = request.add_header("Range", &format!("clock={}", range));
        }
        self.execute(session, request)
    }

    /// Fresh request with a new CSeq and the session-wide headers.
    fn request(&self, session: &mut ControlSession, method: Method, uri: String) -> RtspRequest {
        let cseq = session.next_cseq();
        let mut request = RtspRequest::new(method, &uri)
            .add_header("CSeq", &cseq.to_string())
            .add_header("User-Agent", &self.user_agent);

        if let Some(id) = session.session_id() {
            request = request.add_header("Session", id);
        }

        if let (Some(challenge), Some(credentials)) = (&session.challenge, &self.credentials) {
            let authorization = credentials.authorization(challenge, method, &uri);
            request = request.add_header("Authorization", &authorization);
        }

        request
    }

    /// Send `request`, answering at most one `401` challenge.
    fn execute(
        &mut self,
        session: &mut ControlSession,
        request: RtspRequest,
    ) -> Result<RtspResponse> {
        let response = self.send(&request)?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        let challenge = AuthChallenge::from_response(&response)?;
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| RtspError::auth(AuthErrorKind::MissingCredentials))?;

        tracing::info!(
            method = %request.method,
            scheme = ?challenge.scheme,
            realm = challenge.realm.as_deref().unwrap_or_default(),
            "answering authentication challenge"
        );

        // Same CSeq: this is a re-send of the same command.
        let authorization = credentials.authorization(&challenge, request.method, &request.uri);
        let retry = request.set_header("Authorization", &authorization);

        let response = self.send(&retry)?;
        if response.is_unauthorized() {
            session.challenge = None;
            tracing::warn!(method = %retry.method, "credentials rejected");
            return Err(RtspError::auth(AuthErrorKind::Rejected));
        }

        session.challenge = Some(challenge);
        Ok(response)
    }

    /// One write, one read.
    fn send(&mut self, request: &RtspRequest) -> Result<RtspResponse> {
        let text = request.serialize();
        tracing::debug!(method = %request.method, uri = %request.uri, cseq = ?request.cseq(), "request");
        tracing::trace!("{}", text);

        self.transport.write(text.as_bytes())?;
        let raw = self.transport.read()?;
        let response = RtspResponse::parse(&String::from_utf8_lossy(&raw))?;

        tracing::debug!(
            status = response.status_code,
            reason = %response.status_text,
            cseq = ?response.cseq(),
            "response"
        );
        if response.cseq().is_some() && response.cseq() != request.cseq() {
            tracing::warn!(
                sent = ?request.cseq(),
                received = ?response.cseq(),
                "CSeq mismatch"
            );
        }
        Ok(response)
    }
}
