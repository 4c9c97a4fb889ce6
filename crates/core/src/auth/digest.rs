//! Digest authentication, RFC 2069 form (RFC 2617 §3.2.2 without `qop`).
//!
//! ```text
//! HA1      = MD5(username ":" realm ":" password)
//! HA2      = MD5(method ":" uri)
//! response = MD5(HA1 ":" nonce ":" HA2)
//! ```
//!
//! All hashes are rendered as lowercase hex before being fed to the next.

use md5::{Digest, Md5};

/// Lowercase hex MD5 of `input`.
///
/// ```
/// use rtsp::auth::digest::md5_hex;
///
/// assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
/// assert_eq!(md5_hex("abc"), "900150983cd24fb0d6963f7d28e17f72");
/// ```
pub fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Digest `response` value for one request.
pub fn response(
    username: &str,
    password: &str,
    realm: &str,
    nonce: &str,
    uri: &str,
    method: &str,
) -> String {
    let ha1 = md5_hex(&[username, realm, password].join(":"));
    let ha2 = md5_hex(&[method, uri].join(":"));
    md5_hex(&[ha1.as_str(), nonce, ha2.as_str()].join(":"))
}

/// Full `Authorization` header value.
pub fn encode(
    username: &str,
    password: &str,
    realm: &str,
    nonce: &str,
    opaque: Option<&str>,
    uri: &str,
    method: &str,
) -> String {
    let hash = response(username, password, realm, nonce, uri, method);
    let mut header = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\"",
        username, realm, nonce, uri, hash
    );
    if let Some(opaque) = opaque {
        header.push_str(&format!(", opaque=\"{}\"", opaque));
    }
    header
}
