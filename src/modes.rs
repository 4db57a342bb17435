//! Capture modes supported by the device family.
//!
//! The tables enumerate every (width, height, frame-rate) triple the color
//! and depth sensors can deliver. Configuration-time validation resets an
//! unsupported triple to the stream's default; start-time validation fails
//! hard instead.

use std::fmt;

/// A requested (width, height, frame-rate) capture mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamMode {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl StreamMode {
    pub const fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@{}", self.width, self.height, self.fps)
    }
}

const fn m(width: u32, height: u32, fps: u32) -> StreamMode {
    StreamMode::new(width, height, fps)
}

/// Modes the color sensor can deliver.
pub const COLOR_MODES: &[StreamMode] = &[
    m(1920, 1080, 6), m(1920, 1080, 15), m(1920, 1080, 30),
    m(1280, 720, 6), m(1280, 720, 15), m(1280, 720, 30),
    m(960, 540, 6), m(960, 540, 15), m(960, 540, 30), m(960, 540, 60),
    m(848, 480, 6), m(848, 480, 15), m(848, 480, 30), m(848, 480, 60),
    m(640, 480, 6), m(640, 480, 15), m(640, 480, 30), m(640, 480, 60),
    m(640, 360, 6), m(640, 360, 15), m(640, 360, 30), m(640, 360, 60),
    m(424, 240, 6), m(424, 240, 15), m(424, 240, 30), m(424, 240, 60),
    m(320, 240, 6), m(320, 240, 30), m(320, 240, 60),
    m(320, 180, 6), m(320, 180, 30), m(320, 180, 60),
];

/// Modes the depth sensor can deliver.
pub const DEPTH_MODES: &[StreamMode] = &[
    m(1280, 720, 6), m(1280, 720, 15), m(1280, 720, 30),
    m(848, 480, 6), m(848, 480, 15), m(848, 480, 30), m(848, 480, 60), m(848, 480, 90),
    m(640, 480, 6), m(640, 480, 15), m(640, 480, 30), m(640, 480, 60), m(640, 480, 90),
    m(640, 360, 6), m(640, 360, 15), m(640, 360, 30), m(640, 360, 60), m(640, 360, 90),
    m(480, 270, 6), m(480, 270, 15), m(480, 270, 30), m(480, 270, 60), m(480, 270, 90),
    m(424, 240, 6), m(424, 240, 15), m(424, 240, 30), m(424, 240, 60), m(424, 240, 90),
];

/// Fallback applied when an invalid color mode is configured.
pub const DEFAULT_COLOR_MODE: StreamMode = m(1280, 720, 30);

/// Fallback applied when an invalid depth mode is configured.
pub const DEFAULT_DEPTH_MODE: StreamMode = m(640, 480, 30);

/// Whether `mode` is a member of the given table.
pub fn is_valid_mode(modes: &[StreamMode], mode: StreamMode) -> bool {
    modes.iter().any(|m| *m == mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_modes_are_valid() {
        assert!(is_valid_mode(COLOR_MODES, m(1280, 720, 30)));
        assert!(is_valid_mode(COLOR_MODES, m(320, 180, 60)));
        assert!(is_valid_mode(DEPTH_MODES, m(640, 480, 30)));
        assert!(is_valid_mode(DEPTH_MODES, m(848, 480, 90)));
    }

    #[test]
    fn unknown_modes_are_rejected() {
        assert!(!is_valid_mode(COLOR_MODES, m(999, 999, 999)));
        // Valid geometry at an unsupported rate
        assert!(!is_valid_mode(COLOR_MODES, m(1280, 720, 60)));
        // Depth-only mode is not a color mode
        assert!(!is_valid_mode(COLOR_MODES, m(480, 270, 30)));
        assert!(!is_valid_mode(DEPTH_MODES, m(1920, 1080, 30)));
        assert!(!is_valid_mode(DEPTH_MODES, m(640, 480, 0)));
    }

    #[test]
    fn defaults_are_members_of_their_tables() {
        assert!(is_valid_mode(COLOR_MODES, DEFAULT_COLOR_MODE));
        assert!(is_valid_mode(DEPTH_MODES, DEFAULT_DEPTH_MODE));
    }
}
