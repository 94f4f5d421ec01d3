//! Seam between the playback adapter and whatever decodes adaptive streams

use std::fmt;
use std::sync::mpsc::Sender;

/// Options handed to every new session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Start playing without a user gesture
    pub autoplay: bool,
    /// 0.0 - 1.0, zero means muted
    pub volume: f32,
    pub user_agent: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            autoplay: true,
            volume: 0.0,
            user_agent: format!("teevo/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Could not reach or keep reading the stream
    Transport,
    /// Stream was reachable but could not be decoded
    Media,
    Unknown,
}

impl FaultKind {
    /// Text shown inside the video surface
    pub fn message(&self) -> &'static str {
        match self {
            FaultKind::Transport => "Network error: could not load the stream.",
            FaultKind::Media => "Media error: the stream could not be decoded.",
            FaultKind::Unknown => "An unrecoverable error occurred while playing the stream.",
        }
    }
}

/// Unrecoverable playback failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackFault {
    pub kind: FaultKind,
    pub detail: String,
}

impl PlaybackFault {
    pub fn new(kind: FaultKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for PlaybackFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.detail)
    }
}

/// Messages from an engine session
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Stream opened and a decoder is ready
    Attached,
    Playing,
    /// Session is ready but waits for `resume`
    AutoplayBlocked,
    /// A problem the engine worked around by itself
    Recovered(String),
    Fatal(PlaybackFault),
    /// No engine is available in this build
    Unavailable(String),
}

/// Packets in a row that may fail to decode before the stream is given up
pub const MAX_DECODE_FAILURES: u32 = 60;

/// What to do about a packet that failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeVerdict {
    /// First failure since the last good frame; worth a `Recovered` event
    Skip,
    /// Still failing, keep quiet and carry on
    SkipQuietly,
    /// Nothing decodes any more
    GiveUp,
}

/// Counts decode failures since the last frame that came out whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeFailures {
    consecutive: u32,
    limit: u32,
}

impl DecodeFailures {
    pub fn new(limit: u32) -> Self {
        Self {
            consecutive: 0,
            limit: limit.max(1),
        }
    }

    pub fn record_failure(&mut self) -> DecodeVerdict {
        self.consecutive = self.consecutive.saturating_add(1);
        if self.consecutive >= self.limit {
            DecodeVerdict::GiveUp
        } else if self.consecutive == 1 {
            DecodeVerdict::Skip
        } else {
            DecodeVerdict::SkipQuietly
        }
    }

    pub fn record_frame(&mut self) {
        self.consecutive = 0;
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

impl Default for DecodeFailures {
    fn default() -> Self {
        Self::new(MAX_DECODE_FAILURES)
    }
}

/// Decoded video frame for rendering
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>, // RGB24 data
}

/// A running playback of one source. Dropping the session must release it.
pub trait EngineSession {
    fn resume(&mut self);
    fn stop(&mut self);
    /// Latest frame not yet handed out
    fn take_frame(&self) -> Option<DecodedFrame>;
}

pub trait AdaptiveEngine {
    /// Start playing `locator`; progress is reported through `events`
    fn start(
        &mut self,
        locator: &str,
        options: &SessionOptions,
        events: Sender<EngineEvent>,
    ) -> Box<dyn EngineSession>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_failures_give_up_at_limit() {
        let mut failures = DecodeFailures::new(3);
        assert_eq!(failures.record_failure(), DecodeVerdict::Skip);
        assert_eq!(failures.record_failure(), DecodeVerdict::SkipQuietly);
        assert_eq!(failures.record_failure(), DecodeVerdict::GiveUp);
        assert_eq!(failures.consecutive(), 3);
    }

    #[test]
    fn test_decoded_frame_resets_failures() {
        let mut failures = DecodeFailures::new(3);
        failures.record_failure();
        failures.record_failure();
        failures.record_frame();
        assert_eq!(failures.consecutive(), 0);

        // A fresh run of failures is reported again and gets the full allowance
        assert_eq!(failures.record_failure(), DecodeVerdict::Skip);
        assert_eq!(failures.record_failure(), DecodeVerdict::SkipQuietly);
        assert_eq!(failures.record_failure(), DecodeVerdict::GiveUp);
    }

    #[test]
    fn test_decode_failures_limit_of_one() {
        let mut failures = DecodeFailures::new(0);
        assert_eq!(failures.record_failure(), DecodeVerdict::GiveUp);
        assert_eq!(DecodeFailures::default(), DecodeFailures::new(MAX_DECODE_FAILURES));
    }
}
