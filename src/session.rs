//! Lifecycle of one continuous acquisition from a single device.

use crate::config::{Alignment, SourceConfig};
use crate::device::{AlignProcessor, CameraSdk, Features, FrameSet, FrameStream, StreamKind};
use crate::modes::{self, COLOR_MODES, DEPTH_MODES};
use crate::{Result, SourceError};

/// A started acquisition plus its optional alignment processor.
///
/// Only a fully successful [`DeviceSession::start`] constructs one; an error
/// anywhere in the start sequence leaves nothing running. Dropping the
/// session stops acquisition.
pub struct DeviceSession<S: CameraSdk> {
    stream: S::Stream,
    aligner: Option<S::Aligner>,
}

impl<S: CameraSdk> std::fmt::Debug for DeviceSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("aligned", &self.aligner.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: CameraSdk> DeviceSession<S> {
    /// Validate the configuration, select the first enumerated device, apply
    /// the optional tuning preset, and start continuous acquisition.
    pub fn start(sdk: &mut S, config: &SourceConfig) -> Result<Self> {
        if !modes::is_valid_mode(COLOR_MODES, config.color) {
            return Err(SourceError::InvalidMode {
                kind: StreamKind::Color,
                mode: config.color,
            });
        }
        if !modes::is_valid_mode(DEPTH_MODES, config.depth) {
            return Err(SourceError::InvalidMode {
                kind: StreamKind::Depth,
                mode: config.depth,
            });
        }

        let devices = sdk.enumerate()?;
        let Some(device) = devices.first() else {
            return Err(SourceError::DeviceNotFound);
        };
        log::info!("using device '{}' (serial {})", device.name, device.serial);

        if let Some(path) = config.preset_path() {
            if !device.features.contains(Features::ADVANCED_MODE) {
                return Err(SourceError::UnsupportedDevice(device.name.clone()));
            }
            if !sdk.advanced_mode_enabled(device)? {
                sdk.set_advanced_mode(device, true)?;
                log::debug!("advanced mode enabled on '{}'", device.name);
            }
            // The file may be absent or unreadable; acquisition then proceeds
            // with the device's existing tuning.
            match std::fs::read_to_string(path) {
                Ok(json) => {
                    sdk.load_preset(device, &json)?;
                    log::info!("loaded preset {}", path.display());
                }
                Err(e) => {
                    log::warn!("could not read preset file {}: {}", path.display(), e);
                }
            }
        }

        let aligner = match config.align {
            Alignment::None => None,
            Alignment::Color => Some(sdk.create_aligner(StreamKind::Color)?),
            Alignment::Depth => Some(sdk.create_aligner(StreamKind::Depth)?),
        };

        let stream = sdk.start_capture(device, config.color, config.depth)?;
        log::info!(
            "capture started: color {} depth {} align {:?}",
            config.color,
            config.depth,
            config.align
        );

        Ok(Self { stream, aligner })
    }

    /// Pull the next synchronized frame set, aligned if configured.
    ///
    /// Blocks until the device delivers one.
    pub fn pull(&mut self) -> Result<FrameSet> {
        let frames = self.stream.wait_for_frames()?;
        Ok(match &self.aligner {
            Some(aligner) => aligner.process(frames),
            None => frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FailOn, MockSdk};
    use crate::modes::StreamMode;
    use std::path::PathBuf;

    fn valid_config() -> SourceConfig {
        SourceConfig {
            color: StreamMode::new(640, 480, 30),
            depth: StreamMode::new(640, 480, 30),
            align: Alignment::None,
            preset_file: None,
        }
    }

    #[test]
    fn invalid_mode_fails_before_any_sdk_call() {
        let mut sdk = MockSdk::new();
        let config = SourceConfig {
            depth: StreamMode::new(999, 999, 999),
            ..valid_config()
        };
        let err = DeviceSession::start(&mut sdk, &config).unwrap_err();
        assert!(matches!(
            err,
            SourceError::InvalidMode {
                kind: StreamKind::Depth,
                ..
            }
        ));
        assert!(sdk.calls.is_empty());
    }

    #[test]
    fn zero_height_is_invalid_at_start() {
        let mut sdk = MockSdk::new();
        let config = SourceConfig {
            color: StreamMode::new(1280, 0, 30),
            ..valid_config()
        };
        let err = DeviceSession::start(&mut sdk, &config).unwrap_err();
        assert!(matches!(
            err,
            SourceError::InvalidMode {
                kind: StreamKind::Color,
                ..
            }
        ));
    }

    #[test]
    fn no_devices_fails_with_device_not_found() {
        let mut sdk = MockSdk::new().without_devices();
        let err = DeviceSession::start(&mut sdk, &valid_config()).unwrap_err();
        assert!(matches!(err, SourceError::DeviceNotFound));
        // Enumeration is the only SDK call made.
        assert_eq!(sdk.calls, vec!["enumerate"]);
    }

    #[test]
    fn preset_requires_advanced_mode_support() {
        let mut sdk = MockSdk::new().with_plain_device();
        let config = SourceConfig {
            preset_file: Some(PathBuf::from("/tmp/whatever.json")),
            ..valid_config()
        };
        let err = DeviceSession::start(&mut sdk, &config).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedDevice(_)));
    }

    #[test]
    fn missing_preset_file_is_a_warning_not_an_error() {
        let mut sdk = MockSdk::new();
        let config = SourceConfig {
            preset_file: Some(PathBuf::from("/nonexistent/preset.json")),
            ..valid_config()
        };
        let mut session = DeviceSession::start(&mut sdk, &config).unwrap();
        assert!(sdk.loaded_presets.is_empty());
        // Advanced mode was still enabled for the attempt.
        assert!(sdk.calls.contains(&"set_advanced_mode"));
        // Streaming works without the preset.
        let frames = session.pull().unwrap();
        assert_eq!(frames.color.width, 640);
    }

    #[test]
    fn readable_preset_is_loaded() {
        let path = std::env::temp_dir().join("realsense-mux-preset-test.json");
        std::fs::write(&path, "{\"param\":1}").unwrap();

        let mut sdk = MockSdk::new();
        let config = SourceConfig {
            preset_file: Some(path.clone()),
            ..valid_config()
        };
        let _session = DeviceSession::start(&mut sdk, &config).unwrap();
        assert_eq!(sdk.loaded_presets, vec!["{\"param\":1}".to_owned()]);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn sdk_failure_during_start_aborts() {
        let mut sdk = MockSdk::new().failing(FailOn::StartCapture);
        let err = DeviceSession::start(&mut sdk, &valid_config()).unwrap_err();
        assert!(matches!(err, SourceError::Sdk { op: "start_capture", .. }));
    }

    #[test]
    fn aligner_is_only_built_when_requested() {
        let mut sdk = MockSdk::new();
        let _session = DeviceSession::start(&mut sdk, &valid_config()).unwrap();
        assert!(!sdk.calls.contains(&"create_aligner"));

        let mut sdk = MockSdk::new();
        let config = SourceConfig {
            align: Alignment::Color,
            ..valid_config()
        };
        let _session = DeviceSession::start(&mut sdk, &config).unwrap();
        assert!(sdk.calls.contains(&"create_aligner"));
    }

    #[test]
    fn pull_aligns_depth_onto_color_geometry() {
        let mut sdk = MockSdk::new();
        let config = SourceConfig {
            color: StreamMode::new(640, 480, 30),
            depth: StreamMode::new(424, 240, 30),
            align: Alignment::Color,
            preset_file: None,
        };
        let mut session = DeviceSession::start(&mut sdk, &config).unwrap();
        let frames = session.pull().unwrap();
        assert_eq!((frames.depth.width, frames.depth.height), (640, 480));
        assert_eq!(frames.depth.data.len(), 640 * 480);
    }
}
