//! RTSP authentication (RFC 2326 §12.5, RFC 2617).
//!
//! A server that needs credentials answers `401 Unauthorized` with a
//! `WWW-Authenticate` challenge. The client answers by repeating the
//! request with an `Authorization` header:
//!
//! ```text
//! S→C  WWW-Authenticate: Digest realm="cam", nonce="b2f1c0"
//! C→S  Authorization: Digest username="admin", realm="cam", nonce="b2f1c0",
//!          uri="rtsp://cam/live", response="<md5 hex>"
//! ```
//!
//! Two schemes are supported: [`basic`] and the legacy (no `qop`) form of
//! [`digest`].

pub mod basic;
pub mod digest;

use crate::error::{AuthErrorKind, Result, RtspError};
use crate::protocol::{Method, RtspResponse};

const WWW_AUTHENTICATE: &str = "WWW-Authenticate";

/// Authentication scheme named by a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Basic,
    Digest,
}

/// A server challenge, consumed right away to produce a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub scheme: AuthScheme,
    pub realm: Option<String>,
    pub nonce: Option<String>,
    /// Opaque value to echo back verbatim (RFC 2617 §3.2.1).
    pub opaque: Option<String>,
}

impl AuthChallenge {
    /// Parse a single `WWW-Authenticate` header value.
    pub fn parse(header: &str) -> Result<Self> {
        let header = header.trim();
        let (scheme, params) = header
            .split_once(char::is_whitespace)
            .unwrap_or((header, ""));

        if scheme.eq_ignore_ascii_case("Basic") {
            return Ok(AuthChallenge {
                scheme: AuthScheme::Basic,
                realm: param(params, "realm"),
                nonce: None,
                opaque: None,
            });
        }

        if !scheme.eq_ignore_ascii_case("Digest") {
            return Err(RtspError::auth(AuthErrorKind::UnsupportedScheme(
                scheme.to_string(),
            )));
        }

        if param(params, "qop").is_some() {
            return Err(RtspError::auth(AuthErrorKind::UnsupportedDigestParameters));
        }
        if let Some(algorithm) = param(params, "algorithm")
            && !algorithm.eq_ignore_ascii_case("MD5")
        {
            return Err(RtspError::auth(AuthErrorKind::UnsupportedDigestParameters));
        }

        let realm = param(params, "realm");
        let nonce = param(params, "nonce");
        if realm.is_none() || nonce.is_none() {
            return Err(RtspError::auth(AuthErrorKind::MalformedChallenge(
                header.to_string(),
            )));
        }

        Ok(AuthChallenge {
            scheme: AuthScheme::Digest,
            realm,
            nonce,
            opaque: param(params, "opaque"),
        })
    }

    /// Pick the challenge to answer from a 401 reply.
    ///
    /// Servers may offer several schemes in separate headers; Digest is
    /// preferred over Basic.
    pub fn from_response(response: &RtspResponse) -> Result<Self> {
        let mut offered = response
            .headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(WWW_AUTHENTICATE))
            .map(|(_, value)| AuthChallenge::parse(value))
            .peekable();

        if offered.peek().is_none() {
            return Err(RtspError::auth(AuthErrorKind::MissingChallenge));
        }

        let mut first_error = None;
        let mut basic = None;
        for challenge in offered {
            match challenge {
                Ok(c) if c.scheme == AuthScheme::Digest => return Ok(c),
                Ok(c) => basic = basic.or(Some(c)),
                Err(e) => first_error = first_error.or(Some(e)),
            }
        }

        match (basic, first_error) {
            (Some(basic), _) => Ok(basic),
            (None, Some(e)) => Err(e),
            (None, None) => Err(RtspError::auth(AuthErrorKind::MissingChallenge)),
        }
    }
}

/// Username and password used to answer challenges.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// `Authorization` header value answering `challenge` for one request.
    ///
    /// Digest responses bind the method and URI, so the value must be
    /// recomputed for every request.
    pub fn authorization(&self, challenge: &AuthChallenge, method: Method, uri: &str) -> String {
        match challenge.scheme {
            AuthScheme::Basic => basic::encode(&self.username, &self.password),
            AuthScheme::Digest => digest::encode(
                &self.username,
                &self.password,
                challenge.realm.as_deref().unwrap_or_default(),
                challenge.nonce.as_deref().unwrap_or_default(),
                challenge.opaque.as_deref(),
                uri,
                method.as_str(),
            ),
        }
    }
}

/// Value of `name` in a `k=v, k="v"` parameter list.
fn param(params: &str, name: &str) -> Option<String> {
    split_params(params)
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Split a challenge parameter list, honoring commas inside quotes.
fn split_params(params: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut rest = params.trim();

    while !rest.is_empty() {
        let Some(eq) = rest.find('=') else { break };
        let key = rest[..eq].trim().trim_start_matches(',').trim().to_string();
        let after = rest[eq + 1..].trim_start();

        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match after.find(',') {
                Some(end) => (after[..end].trim(), &after[end..]),
                None => (after.trim(), ""),
            }
        };

        out.push((key, value.to_string()));
        rest = remainder.trim_start().trim_start_matches(',').trim_start();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_digest_challenge() {
        let c = AuthChallenge::parse(r#"Digest realm="x", nonce="y""#).unwrap();
        assert_eq!(c.scheme, AuthScheme::Digest);
        assert_eq!(c.realm.as_deref(), Some("x"));
        assert_eq!(c.nonce.as_deref(), Some("y"));
        assert_eq!(c.opaque, None);
    }

    #[test]
    fn quoted_values_may_contain_commas() {
        let c = AuthChallenge::parse(
            r#"Digest realm="IP Camera(a,b)", nonce="0c6a", stale=FALSE, opaque="zz""#,
        )
        .unwrap();
        assert_eq!(c.realm.as_deref(), Some("IP Camera(a,b)"));
        assert_eq!(c.nonce.as_deref(), Some("0c6a"));
        assert_eq!(c.opaque.as_deref(), Some("zz"));
    }

    #[test]
    fn parse_basic_challenge() {
        let c = AuthChallenge::parse(r#"Basic realm="cam""#).unwrap();
        assert_eq!(c.scheme, AuthScheme::Basic);
        assert_eq!(c.realm.as_deref(), Some("cam"));
    }

    #[test]
    fn unknown_scheme() {
        let err = AuthChallenge::parse("Negotiate abc").unwrap_err();
        assert!(matches!(
            err,
            RtspError::Auth {
                kind: AuthErrorKind::UnsupportedScheme(ref s)
            } if s == "Negotiate"
        ));
    }

    #[test]
    fn qop_is_unsupported() {
        let err = AuthChallenge::parse(r#"Digest realm="x", nonce="y", qop="auth""#).unwrap_err();
        assert!(matches!(
            err,
            RtspError::Auth {
                kind: AuthErrorKind::UnsupportedDigestParameters
            }
        ));
    }

    #[test]
    fn digest_without_nonce() {
        assert!(matches!(
            AuthChallenge::parse(r#"Digest realm="x""#).unwrap_err(),
            RtspError::Auth {
                kind: AuthErrorKind::MalformedChallenge(_)
            }
        ));
    }

    #[test]
    fn digest_preferred_over_basic() {
        let resp = RtspResponse::parse(
            "RTSP/1.0 401 Unauthorized\r\n\
             CSeq: 1\r\n\
             WWW-Authenticate: Basic realm=\"cam\"\r\n\
             WWW-Authenticate: Digest realm=\"cam\", nonce=\"n1\"\r\n\r\n",
        )
        .unwrap();
        let c = AuthChallenge::from_response(&resp).unwrap();
        assert_eq!(c.scheme, AuthScheme::Digest);
    }

    #[test]
    fn missing_challenge_header() {
        let resp = RtspResponse::parse("RTSP/1.0 401 Unauthorized\r\nCSeq: 1\r\n\r\n").unwrap();
        assert!(matches!(
            AuthChallenge::from_response(&resp).unwrap_err(),
            RtspError::Auth {
                kind: AuthErrorKind::MissingChallenge
            }
        ));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("admin", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
