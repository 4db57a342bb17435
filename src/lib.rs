//! # realsense-mux - depth camera capture source for media pipelines
//!
//! Bridges a RealSense-family depth camera into a media pipeline. The source
//! pulls synchronized color + depth frame sets from the camera SDK, optionally
//! aligns the two streams onto one sensor's viewpoint, and multiplexes each
//! set into a single RGB buffer: raw color pixels in the upper half, a visual
//! encoding of the depth image in the lower half. Buffers carry
//! pipeline-clock timestamps and strictly increasing offsets.
//!
//! The camera SDK and the host pipeline are consumed through traits
//! ([`CameraSdk`], [`PipelineHost`]); the [`mock`] module provides a complete
//! hardware-free backend.
//!
//! ## Quick Start
//! ```
//! use realsense_mux::mock::{MockHost, MockSdk};
//! use realsense_mux::{Flow, RealsenseSrc};
//!
//! let mut src = RealsenseSrc::new(MockSdk::new(), MockHost::new());
//! src.start().unwrap();
//! match src.create().unwrap() {
//!     Flow::Buffer(buf) => println!("got {} bytes at pts {:?}", buf.data.len(), buf.pts),
//!     Flow::Flushing => println!("cancelled"),
//! }
//! src.stop();
//! ```

pub mod caps;
pub mod config;
pub mod device;
pub mod error;
pub mod mock;
pub mod modes;
pub mod mux;
pub mod session;
pub mod source;

pub use caps::NegotiatedFormat;
pub use config::{Alignment, SourceConfig};
pub use device::{CameraSdk, DeviceInfo, Features, FrameSet, StreamKind};
pub use error::SourceError;
pub use modes::StreamMode;
pub use session::DeviceSession;
pub use source::{Flow, OutputBuffer, PipelineHost, RealsenseSrc};

/// Result type alias for capture source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
