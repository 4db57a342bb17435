//! The camera SDK capability boundary.
//!
//! Everything the capture core needs from the vendor SDK is expressed here as
//! traits plus plain frame/identity types. The core never talks to hardware
//! directly; production code wraps the vendor SDK behind [`CameraSdk`] and
//! tests use the [`crate::mock`] backend.

use crate::modes::StreamMode;
use crate::Result;
use std::fmt;

/// Identity and capabilities of an enumerated depth camera.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Human-readable model string.
    pub name: String,
    pub serial: String,
    pub features: Features,
}

bitflags::bitflags! {
    /// Capability bitmap reported per device.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u32 {
        const COLOR         = 1 << 0;
        const DEPTH         = 1 << 1;
        /// Inertial streams exist on some models; not consumed by this element.
        const IMU           = 1 << 2;
        /// Device accepts JSON tuning presets via advanced configuration mode.
        const ADVANCED_MODE = 1 << 3;
    }
}

/// Which sensor a stream or an alignment target refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Color,
    Depth,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color => write!(f, "color"),
            Self::Depth => write!(f, "depth"),
        }
    }
}

/// One RGB8 color image.
#[derive(Debug, Clone)]
pub struct ColorFrame {
    pub width: u32,
    pub height: u32,
    /// Packed RGB, row-major, 3 bytes per pixel.
    pub data: Vec<u8>,
}

/// One Z16 depth image.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub width: u32,
    pub height: u32,
    /// One 16-bit sample per pixel, row-major.
    pub data: Vec<u16>,
}

/// A time-synchronized color + depth bundle as delivered by the device.
#[derive(Debug, Clone)]
pub struct FrameSet {
    pub color: ColorFrame,
    pub depth: DepthFrame,
}

/// The camera SDK as consumed by the capture core.
///
/// One handle covers device discovery, tuning, and stream startup. All
/// failures are reported as [`crate::SourceError::Sdk`] naming the failing
/// operation.
pub trait CameraSdk {
    type Stream: FrameStream;
    type Aligner: AlignProcessor;

    /// List connected devices.
    fn enumerate(&mut self) -> Result<Vec<DeviceInfo>>;

    /// Whether advanced configuration mode is currently enabled.
    fn advanced_mode_enabled(&mut self, device: &DeviceInfo) -> Result<bool>;

    /// Toggle advanced configuration mode.
    fn set_advanced_mode(&mut self, device: &DeviceInfo, enable: bool) -> Result<()>;

    /// Apply a JSON tuning preset. Requires advanced mode.
    fn load_preset(&mut self, device: &DeviceInfo, json: &str) -> Result<()>;

    /// Configure both streams on `device` and begin continuous acquisition.
    fn start_capture(
        &mut self,
        device: &DeviceInfo,
        color: StreamMode,
        depth: StreamMode,
    ) -> Result<Self::Stream>;

    /// Build a processor that reprojects frame sets onto `target`'s viewpoint.
    fn create_aligner(&mut self, target: StreamKind) -> Result<Self::Aligner>;
}

/// A started continuous acquisition. Dropping the stream stops it.
pub trait FrameStream {
    /// Block until the device delivers the next synchronized frame set.
    ///
    /// There is no timeout; a stalled device blocks the caller until the
    /// host's cancellation signal takes effect on the *next* call.
    fn wait_for_frames(&mut self) -> Result<FrameSet>;
}

/// Spatial reprojection of a frame set onto one sensor's viewpoint.
pub trait AlignProcessor {
    fn process(&self, frames: FrameSet) -> FrameSet;
}
