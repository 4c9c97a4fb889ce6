//! SDP (Session Description Protocol) track discovery (RFC 4566 / RFC 8866).
//!
//! Only the parts needed to issue SETUP are read from a DESCRIBE body:
//!
//! ```text
//! v=0
//! o=- 1468039952094900 1 IN IP4 172.30.1.60
//! s=RTSP/RTP stream
//! a=control:*                      ← session-level control (ignored)
//! m=video 0 RTP/AVP 96             ← media section marker
//! a=rtpmap:96 H264/90000
//! a=control:track1                 ← track control suffix for SETUP
//! ```
//!
//! Codecs, bitrates and timing are not interpreted.

const CONTROL_MARKER: &str = "a=control:";

/// Kind of media section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// `m=` line prefix for this kind, including the trailing space.
    fn marker(&self) -> &'static str {
        match self {
            Self::Audio => "m=audio ",
            Self::Video => "m=video ",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session description returned by a successful DESCRIBE.
///
/// Rebuilt from scratch on every DESCRIBE, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDescription {
    raw: String,
}

impl SessionDescription {
    pub fn new(body: &str) -> Self {
        Self {
            raw: body.to_string(),
        }
    }

    pub fn has_media(&self, kind: MediaKind) -> bool {
        self.raw.contains(kind.marker())
    }

    pub fn has_audio(&self) -> bool {
        self.has_media(MediaKind::Audio)
    }

    pub fn has_video(&self) -> bool {
        self.has_media(MediaKind::Video)
    }

    /// Control suffix of the first `kind` section.
    ///
    /// Finds the `m=` marker, then the nearest `a=control:` after it, and
    /// returns the text up to the next line break. `None` when either
    /// marker is absent.
    pub fn track_control(&self, kind: MediaKind) -> Option<&str> {
        let section = self.raw.find(kind.marker())?;
        let control = section + self.raw[section..].find(CONTROL_MARKER)? + CONTROL_MARKER.len();

        let rest = &self.raw[control..];
        let end = rest.find('\n').unwrap_or(rest.len());
        Some(rest[..end].trim_end_matches('\r'))
    }

    /// Media kinds present, video first.
    pub fn media_kinds(&self) -> Vec<MediaKind> {
        [MediaKind::Video, MediaKind::Audio]
            .into_iter()
            .filter(|kind| self.has_media(*kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAMERA_SDP: &str = "v=0\r\n\
                              o=- 1468039952094900 1 IN IP4 172.30.1.60\r\n\
                              s=RTSP/RTP stream from a VMFD encoder\r\n\
                              t=0 0\r\n\
                              a=control:*\r\n\
                              m=video 0 RTP/AVP 96\r\n\
                              c=IN IP4 0.0.0.0\r\n\
                              a=rtpmap:96 H264/90000\r\n\
                              a=control:track1\r\n";

    #[test]
    fn video_track_found() {
        let sdp = SessionDescription::new(CAMERA_SDP);
        assert!(sdp.has_video());
        assert_eq!(sdp.track_control(MediaKind::Video), Some("track1"));
    }

    #[test]
    fn session_level_control_is_skipped() {
        let sdp = SessionDescription::new(CAMERA_SDP);
        assert_ne!(sdp.track_control(MediaKind::Video), Some("*"));
    }

    #[test]
    fn audio_absent() {
        let sdp = SessionDescription::new(CAMERA_SDP);
        assert!(!sdp.has_audio());
        assert_eq!(sdp.track_control(MediaKind::Audio), None);
        assert_eq!(sdp.media_kinds(), vec![MediaKind::Video]);
    }

    #[test]
    fn audio_and_video_sections() {
        let sdp = SessionDescription::new(
            "v=0\r\n\
             m=video 0 RTP/AVP 96\r\n\
             a=control:trackID=0\r\n\
             m=audio 0 RTP/AVP 0\r\n\
             a=rtpmap:0 PCMU/8000\r\n\
             a=control:trackID=1\r\n",
        );
        assert_eq!(sdp.track_control(MediaKind::Video), Some("trackID=0"));
        assert_eq!(sdp.track_control(MediaKind::Audio), Some("trackID=1"));
        assert_eq!(sdp.media_kinds(), vec![MediaKind::Video, MediaKind::Audio]);
    }

    #[test]
    fn media_without_control() {
        let sdp = SessionDescription::new("v=0\r\nm=audio 0 RTP/AVP 8\r\n");
        assert!(sdp.has_audio());
        assert_eq!(sdp.track_control(MediaKind::Audio), None);
    }

    #[test]
    fn bare_newlines_and_unterminated_last_line() {
        let sdp = SessionDescription::new("m=video 0 RTP/AVP 96\na=control:rtsp://h/s/v");
        assert_eq!(sdp.track_control(MediaKind::Video), Some("rtsp://h/s/v"));
    }
}
