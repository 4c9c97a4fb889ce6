use super::{Method, RTSP_VERSION};

/// An outgoing RTSP request (RFC 2326 §6).
///
/// Serializes to the standard text format:
///
/// ```text
/// Method SP Request-URI SP RTSP-Version CRLF
/// *(Header: Value CRLF)
/// CRLF
/// [body]
/// ```
///
/// Built by chaining [`add_header`](Self::add_header) and
/// [`with_body`](Self::with_body), then [`serialize`](Self::serialize).
/// Headers are written in insertion order; some servers are sensitive to it.
#[must_use]
#[derive(Debug, Clone)]
pub struct RtspRequest {
    pub method: Method,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RtspRequest {
    pub fn new(method: Method, uri: &str) -> Self {
        RtspRequest {
            method,
            uri: uri.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Replace the value of an existing header, or append it.
    pub fn set_header(mut self, name: &str, value: &str) -> Self {
        match self
            .headers
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
        self
    }

    /// Attach a body with its `Content-Type`. `Content-Length` is added
    /// automatically by [`serialize`](Self::serialize) (RFC 2326 §12.14).
    pub fn with_body(mut self, content_type: &str, body: String) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        self.body = Some(body);
        self
    }

    /// Look up a header value by name (case-insensitive, per RFC 2326 §4.2).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The CSeq this request was numbered with (RFC 2326 §12.17).
    pub fn cseq(&self) -> Option<u32> {
        self.get_header("CSeq").and_then(|v| v.trim().parse().ok())
    }

    /// Serialize to the RTSP text wire format, ready for a single write.
    pub fn serialize(&self) -> String {
        let mut request = format!("{} {} {}\r\n", self.method, self.uri, RTSP_VERSION);

        for (name, value) in &self.headers {
            request.push_str(&format!("{}: {}\r\n", name, value));
        }

        if let Some(body) = &self.body {
            request.push_str(&format!("Content-Length: {}\r\n", body.len()));
            request.push_str("\r\n");
            request.push_str(body);
        } else {
            request.push_str("\r\n");
        }
        request
    }
}
