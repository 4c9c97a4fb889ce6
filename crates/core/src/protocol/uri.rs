use crate::error::{Result, RtspError};

use super::DEFAULT_RTSP_PORT;

const SCHEME: &str = "rtsp";

/// A parsed `rtsp://[user:pass@]host[:port]/path` target (RFC 2326 §3.2).
///
/// The scheme is matched case-insensitively. A missing port means
/// [`DEFAULT_RTSP_PORT`]; a missing path means `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtspUri {
    pub host: String,
    pub port: u16,
    /// Always starts with `/`.
    pub path: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl RtspUri {
    /// Parse a target identifier.
    ///
    /// ## Examples
    ///
    /// ```
    /// use rtsp::protocol::RtspUri;
    ///
    /// let uri = RtspUri::parse("RTSP://cam.local/live/main").unwrap();
    /// assert_eq!(uri.host, "cam.local");
    /// assert_eq!(uri.port, 554);
    /// assert_eq!(uri.path, "/live/main");
    ///
    /// assert!(RtspUri::parse("http://cam.local/live").is_err());
    /// ```
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = || RtspError::InvalidUri(uri.to_string());

        let (scheme, rest) = uri.trim().split_once("://").ok_or_else(invalid)?;
        if !scheme.eq_ignore_ascii_case(SCHEME) {
            return Err(invalid());
        }

        let (authority, path) = match rest.find('/') {
            Some(slash) => (&rest[..slash], &rest[slash..]),
            None => (rest, "/"),
        };

        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => (Some(userinfo), host_port),
            None => (None, authority),
        };

        // IPv6 literals are bracketed: [::1]:8554
        let (host, port) = match host_port.strip_prefix('[') {
            Some(bracketed) => {
                let (host, after) = bracketed.split_once(']').ok_or_else(invalid)?;
                match after.strip_prefix(':') {
                    Some(port) => (host, port.parse::<u16>().map_err(|_| invalid())?),
                    None if after.is_empty() => (host, DEFAULT_RTSP_PORT),
                    None => return Err(invalid()),
                }
            }
            None => match host_port.split_once(':') {
                Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
                None => (host_port, DEFAULT_RTSP_PORT),
            },
        };
        if host.is_empty() {
            return Err(invalid());
        }

        let (username, password) = match userinfo {
            Some(info) => match info.split_once(':') {
                Some((user, pass)) => (Some(user.to_string()), Some(pass.to_string())),
                None => (Some(info.to_string()), None),
            },
            None => (None, None),
        };

        Ok(RtspUri {
            host: host.to_string(),
            port,
            path: path.to_string(),
            username,
            password,
        })
    }

    /// `rtsp://host:port` with no path and no credentials.
    pub fn base(&self) -> String {
        if self.host.contains(':') {
            format!("{SCHEME}://[{}]:{}", self.host, self.port)
        } else {
            format!("{SCHEME}://{}:{}", self.host, self.port)
        }
    }

    /// Full request target: base plus path.
    pub fn target(&self) -> String {
        format!("{}{}", self.base(), self.path)
    }
}

impl std::fmt::Display for RtspUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.target())
    }
}
