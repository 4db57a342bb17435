//! Output format negotiation.

use crate::device::CameraSdk;
use crate::session::DeviceSession;
use crate::Result;

/// Bytes per packed RGB pixel.
pub const RGB_PIXEL_SIZE: usize = 3;

/// The negotiated output format of the source.
///
/// Computed once per start cycle from the first live frame set. The combined
/// buffer stacks the color image on top of a depth visualization of equal
/// size, so `height` is exactly twice the color frame's reported height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedFormat {
    pub width: u32,
    pub height: u32,
    /// Declared frame rate numerator. Always 30, regardless of the
    /// configured rate.
    pub fps_n: u32,
    pub fps_d: u32,
    /// Size in bytes of one combined RGB buffer.
    pub frame_size: usize,
}

/// Pull one frame set purely to measure the device's actual color geometry
/// and derive the published output format from it.
///
/// The device may adjust the requested geometry internally, so the format is
/// read from a live frame rather than from the configuration. The measured
/// frame set is discarded; the first delivered buffer comes from a fresh
/// pull.
pub fn negotiate<S: CameraSdk>(session: &mut DeviceSession<S>) -> Result<NegotiatedFormat> {
    let frames = session.pull()?;

    let width = frames.color.width;
    // Top half: color. Bottom half: encoded depth.
    let height = frames.color.height * 2;

    let format = NegotiatedFormat {
        width,
        height,
        fps_n: 30,
        fps_d: 1,
        frame_size: width as usize * height as usize * RGB_PIXEL_SIZE,
    };
    log::debug!(
        "negotiated output format {}x{} RGB @ {}/{}, {} bytes/frame",
        format.width,
        format.height,
        format.fps_n,
        format.fps_d,
        format.frame_size
    );
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Alignment, SourceConfig};
    use crate::mock::MockSdk;
    use crate::modes::StreamMode;

    #[test]
    fn height_is_twice_the_reported_color_height() {
        let mut sdk = MockSdk::new();
        let config = SourceConfig {
            color: StreamMode::new(848, 480, 30),
            depth: StreamMode::new(848, 480, 30),
            align: Alignment::None,
            preset_file: None,
        };
        let mut session = DeviceSession::start(&mut sdk, &config).unwrap();
        let format = negotiate(&mut session).unwrap();

        assert_eq!(format.width, 848);
        assert_eq!(format.height, 960);
        assert_eq!(format.frame_size, 848 * 960 * 3);
        assert_eq!((format.fps_n, format.fps_d), (30, 1));
    }

    #[test]
    fn declared_rate_stays_fixed_for_other_configured_rates() {
        let mut sdk = MockSdk::new();
        let config = SourceConfig {
            color: StreamMode::new(640, 480, 60),
            depth: StreamMode::new(640, 480, 60),
            align: Alignment::None,
            preset_file: None,
        };
        let mut session = DeviceSession::start(&mut sdk, &config).unwrap();
        let format = negotiate(&mut session).unwrap();
        assert_eq!((format.fps_n, format.fps_d), (30, 1));
    }
}
