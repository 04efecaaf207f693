//! Read-only view of the call session for the presentation layer.
//!
//! A `CallSnapshot` is published after every processed event. The derived
//! accessors reproduce the render conditions of the phone screen: which of
//! the two screens is shown, the status banner, and whether the timer and the
//! speaking indicator are visible.

use crate::CallStatus;
use serde::{Deserialize, Serialize};

/// Which of the two screens the presentation layer should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    /// Ringing screen with accept and decline buttons.
    Incoming,
    /// In-call screen with mute, keypad, speaker and hang-up controls.
    InCall,
}

/// Text shown in the status bar at the top of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBanner {
    Ringing,
    Connecting,
    InCall,
}

impl StatusBanner {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ringing => "Incoming call...",
            Self::Connecting => "Connecting...",
            Self::InCall => "On call",
        }
    }
}

/// Copy of every observable field of the call session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub status: CallStatus,
    pub answered: bool,
    pub speaking: bool,
    pub duration_seconds: u64,
    pub muted: bool,
    pub speaker_on: bool,
    pub keypad_open: bool,
    /// Whether a voice session handle is currently held.
    pub has_session: bool,
}

impl CallSnapshot {
    /// The value a freshly mounted call session starts with.
    pub fn initial() -> Self {
        Self {
            status: CallStatus::Incoming,
            answered: false,
            speaking: false,
            duration_seconds: 0,
            muted: false,
            speaker_on: true,
            keypad_open: false,
            has_session: false,
        }
    }

    pub fn screen(&self) -> Screen {
        if self.accept_offered() {
            Screen::Incoming
        } else {
            Screen::InCall
        }
    }

    pub fn banner(&self) -> StatusBanner {
        if self.shows_duration() {
            StatusBanner::InCall
        } else if self.status == CallStatus::Incoming {
            StatusBanner::Ringing
        } else {
            StatusBanner::Connecting
        }
    }

    /// Accept is only offered while ringing and not yet answered.
    pub fn accept_offered(&self) -> bool {
        self.status == CallStatus::Incoming && !self.answered
    }

    pub fn shows_duration(&self) -> bool {
        self.status == CallStatus::Connected && self.answered
    }

    pub fn shows_speaking_indicator(&self) -> bool {
        self.speaking && self.status == CallStatus::Connected
    }

    pub fn duration_label(&self) -> String {
        format_duration(self.duration_seconds)
    }
}

impl Default for CallSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// Formats elapsed seconds as zero-padded `MM:SS`.
///
/// Minutes are not wrapped into hours.
pub fn format_duration(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_pads_minutes_and_seconds() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(9), "00:09");
        assert_eq!(format_duration(65), "01:05");
        assert_eq!(format_duration(3725), "62:05");
    }

    #[test]
    fn initial_snapshot_shows_ringing_screen() {
        let snap = CallSnapshot::initial();
        assert_eq!(snap.screen(), Screen::Incoming);
        assert_eq!(snap.banner(), StatusBanner::Ringing);
        assert!(snap.accept_offered());
        assert!(!snap.shows_duration());
        assert!(snap.speaker_on);
    }

    #[test]
    fn connecting_snapshot_shows_in_call_screen() {
        let snap = CallSnapshot {
            status: CallStatus::Connecting,
            answered: true,
            ..CallSnapshot::initial()
        };
        assert_eq!(snap.screen(), Screen::InCall);
        assert_eq!(snap.banner(), StatusBanner::Connecting);
        assert!(!snap.accept_offered());
    }

    #[test]
    fn speaking_indicator_requires_connection() {
        let connecting = CallSnapshot {
            status: CallStatus::Connecting,
            answered: true,
            speaking: true,
            ..CallSnapshot::initial()
        };
        assert!(!connecting.shows_speaking_indicator());

        let connected = CallSnapshot {
            status: CallStatus::Connected,
            ..connecting
        };
        assert!(connected.shows_speaking_indicator());
        assert_eq!(connected.banner(), StatusBanner::InCall);
    }
}
