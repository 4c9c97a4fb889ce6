use crate::error::{FramingErrorKind, Result, RtspError};

use super::RTSP_VERSION;

/// A parsed RTSP reply (RFC 2326 §7).
///
/// ```text
/// RTSP/1.0 200 OK\r\n
/// CSeq: 1\r\n
/// Content-Type: application/sdp\r\n
/// Content-Length: 142\r\n
/// \r\n
/// v=0\r\n...
/// ```
///
/// The whole reply is expected in one chunk: status line, headers, blank
/// line, then every remaining line is body. `Content-Length` is not used
/// to delimit the body.
#[derive(Debug, Clone)]
pub struct RtspResponse {
    pub status_code: u16,
    pub status_text: String,
    /// Headers in arrival order. Lookups return the last occurrence.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RtspResponse {
    /// Parse a complete reply.
    ///
    /// Returns [`RtspError::Framing`] when the first line is not a status
    /// line or a header line has no `Name: value` shape.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut lines = raw.lines();

        let status_line = lines
            .next()
            .filter(|line| !line.trim().is_empty())
            .ok_or(RtspError::framing(FramingErrorKind::EmptyResponse))?;

        let (status_code, status_text) = parse_status_line(status_line)?;

        let mut headers = Vec::new();
        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }

            let (name, value) = line
                .split_once(':')
                .filter(|(name, _)| !name.trim().is_empty())
                .ok_or_else(|| {
                    RtspError::framing(FramingErrorKind::InvalidHeader(line.to_string()))
                })?;

            headers.push((name.trim().to_string(), value.trim().to_string()));
        }

        let mut body = String::new();
        for line in lines {
            body.push_str(line);
            body.push_str("\r\n");
        }

        Ok(RtspResponse {
            status_code,
            status_text,
            headers,
            body,
        })
    }

    /// Look up a header value by name (case-insensitive, per RFC 2326 §4.2).
    /// When a header repeats, the last value wins.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// 401 Unauthorized (RFC 2326 §7.1.1).
    pub fn is_unauthorized(&self) -> bool {
        self.status_code == 401
    }

    pub fn cseq(&self) -> Option<u32> {
        self.get_header("CSeq").and_then(|v| v.trim().parse().ok())
    }

    /// Methods listed in the `Public` header of an OPTIONS reply
    /// (RFC 2326 §12.28).
    pub fn public_methods(&self) -> Vec<&str> {
        self.get_header("Public")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// `RTSP/1.0 SP 3DIGIT SP Reason-Phrase`
fn parse_status_line(line: &str) -> Result<(u16, String)> {
    let invalid = || RtspError::framing(FramingErrorKind::InvalidStatusLine(line.to_string()));

    let rest = line.strip_prefix(RTSP_VERSION).ok_or_else(invalid)?;
    if !rest.starts_with(char::is_whitespace) {
        return Err(invalid());
    }

    let mut parts = rest.trim_start().splitn(2, char::is_whitespace);
    let code = parts
        .next()
        .filter(|c| c.len() == 3 && c.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(invalid)?;
    let reason = parts
        .next()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(invalid)?;

    let code = code.parse().map_err(|_| invalid())?;
    Ok((code, reason.to_string()))
}
