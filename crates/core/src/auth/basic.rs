//! Basic authentication (RFC 2617 §2).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// `Basic base64(username ":" password)`, standard alphabet with padding.
pub fn encode(username: &str, password: &str) -> String {
    let token = format!("{}:{}", username, password);
    format!("Basic {}", STANDARD.encode(token.as_bytes()))
}
