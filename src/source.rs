//! The capture source element: lifecycle state machine and per-request
//! buffer production.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::caps::{self, NegotiatedFormat};
use crate::config::{Alignment, SourceConfig};
use crate::device::CameraSdk;
use crate::mux;
use crate::session::DeviceSession;
use crate::{Result, SourceError};

/// Host pipeline services consumed by the source.
///
/// Covers the clock, the buffer pool, and caps publication; everything else
/// about the host framework stays outside the element.
pub trait PipelineHost {
    /// Current pipeline clock time.
    fn clock_time(&self) -> Duration;

    /// The pipeline's base time. Buffer timestamps are offsets from it.
    fn base_time(&self) -> Duration;

    /// Allocate a zeroed writable buffer of exactly `size` bytes.
    fn acquire_buffer(&mut self, size: usize) -> Result<Vec<u8>>;

    /// Publish the negotiated output format and allocation size downstream.
    fn publish_caps(&mut self, format: &NegotiatedFormat);
}

/// One multiplexed output frame. Ownership moves to the caller.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    pub data: Vec<u8>,
    /// Presentation timestamp relative to the pipeline base time.
    pub pts: Duration,
    /// Decode timestamp; equal to `pts` for this source.
    pub dts: Duration,
    /// Strictly increasing across buffers.
    pub offset: u64,
}

/// Outcome of one successful [`RealsenseSrc::create`] call.
#[derive(Debug)]
pub enum Flow {
    /// A filled buffer ready for downstream.
    Buffer(OutputBuffer),
    /// A cancellation was latched; no buffer was produced.
    Flushing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No live session.
    Idle,
    /// Session live, output format not yet published.
    Negotiating,
    /// Producing buffers on demand.
    Streaming,
}

/// Live capture source bridging a depth camera into the host pipeline.
///
/// The host calls [`start`](Self::start), then [`create`](Self::create)
/// repeatedly (serialized, never concurrently with itself), then
/// [`stop`](Self::stop). [`unlock`](Self::unlock) and
/// [`unlock_stop`](Self::unlock_stop) latch and clear the cooperative
/// cancellation flag and may be called from any thread.
pub struct RealsenseSrc<S: CameraSdk, H: PipelineHost> {
    sdk: S,
    host: H,
    config: SourceConfig,
    state: State,
    session: Option<DeviceSession<S>>,
    format: Option<NegotiatedFormat>,
    stop_requested: AtomicBool,
    frame_count: u64,
    next_offset: u64,
}

impl<S: CameraSdk, H: PipelineHost> RealsenseSrc<S, H> {
    /// New idle source with the default configuration.
    pub fn new(sdk: S, host: H) -> Self {
        Self::with_config(sdk, host, SourceConfig::default())
    }

    /// New idle source with an explicit configuration.
    ///
    /// The configuration is taken as-is; unsupported modes surface as hard
    /// errors at [`start`](Self::start).
    pub fn with_config(sdk: S, host: H, config: SourceConfig) -> Self {
        Self {
            sdk,
            host,
            config,
            state: State::Idle,
            session: None,
            format: None,
            stop_requested: AtomicBool::new(false),
            frame_count: 0,
            next_offset: 0,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// The wrapped SDK handle.
    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    /// The wrapped host handle.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The output format negotiated by the last successful start, if any.
    pub fn negotiated_format(&self) -> Option<&NegotiatedFormat> {
        self.format.as_ref()
    }

    /// Buffers produced since the last start.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_streaming(&self) -> bool {
        self.state == State::Streaming
    }

    fn update_config(&mut self, apply: impl FnOnce(&mut SourceConfig)) {
        if self.state != State::Idle {
            log::warn!("configuration is frozen while a session is live, ignoring change");
            return;
        }
        apply(&mut self.config);
        self.config.sanitize();
    }

    pub fn set_color_width(&mut self, width: u32) {
        self.update_config(|c| c.color.width = width);
    }

    pub fn set_color_height(&mut self, height: u32) {
        self.update_config(|c| c.color.height = height);
    }

    pub fn set_color_fps(&mut self, fps: u32) {
        self.update_config(|c| c.color.fps = fps);
    }

    pub fn set_depth_width(&mut self, width: u32) {
        self.update_config(|c| c.depth.width = width);
    }

    pub fn set_depth_height(&mut self, height: u32) {
        self.update_config(|c| c.depth.height = height);
    }

    pub fn set_depth_fps(&mut self, fps: u32) {
        self.update_config(|c| c.depth.fps = fps);
    }

    pub fn set_align(&mut self, align: Alignment) {
        self.update_config(|c| c.align = align);
    }

    pub fn set_preset_file(&mut self, path: Option<PathBuf>) {
        self.update_config(|c| c.preset_file = path);
    }

    /// Start acquisition and negotiate the output format.
    ///
    /// On error nothing is left running and a later `start` may retry.
    pub fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            log::warn!("start requested while already streaming, restarting");
            self.stop();
        }

        // Any previously negotiated format is stale.
        self.format = None;
        self.frame_count = 0;

        let mut session = DeviceSession::start(&mut self.sdk, &self.config)?;
        self.state = State::Negotiating;

        match caps::negotiate(&mut session) {
            Ok(format) => {
                self.host.publish_caps(&format);
                self.format = Some(format);
                self.session = Some(session);
                self.state = State::Streaming;
                Ok(())
            }
            Err(e) => {
                // Dropping the session stops acquisition.
                self.state = State::Idle;
                Err(e)
            }
        }
    }

    /// Stop acquisition and release the device. Safe to call when idle.
    pub fn stop(&mut self) {
        if self.session.take().is_some() {
            log::info!("capture stopped after {} frames", self.frame_count);
        }
        self.format = None;
        self.frame_count = 0;
        self.state = State::Idle;
    }

    /// Latch a cancellation request.
    ///
    /// The next `create` call returns [`Flow::Flushing`] until
    /// [`unlock_stop`](Self::unlock_stop) clears the request. A call already
    /// blocked on the device is not interrupted.
    pub fn unlock(&self) {
        log::trace!("unlock");
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Clear a previously latched cancellation request.
    pub fn unlock_stop(&self) {
        log::trace!("unlock_stop");
        self.stop_requested.store(false, Ordering::SeqCst);
    }

    /// Produce the next multiplexed buffer.
    ///
    /// Blocks on the device until a frame set is available. SDK failures
    /// abort the call; allocation failures abort the call but leave the
    /// session intact for the next one.
    pub fn create(&mut self) -> Result<Flow> {
        if self.state != State::Streaming {
            return Err(SourceError::NotStreaming);
        }
        let format = self.format.ok_or(SourceError::NotStreaming)?;
        let session = self.session.as_mut().ok_or(SourceError::NotStreaming)?;

        if self.stop_requested.load(Ordering::SeqCst) {
            return Ok(Flow::Flushing);
        }

        let frames = session.pull()?;
        log::trace!("received frame set from device");

        // The pull may have blocked across an unlock; re-check before doing
        // any buffer work.
        if self.stop_requested.load(Ordering::SeqCst) {
            return Ok(Flow::Flushing);
        }

        let clock_time = self.host.clock_time();

        let mut data = self.host.acquire_buffer(format.frame_size)?;
        debug_assert_eq!(data.len(), format.frame_size);
        mux::fill_buffer(&mut data, &frames);

        let pts = clock_time.saturating_sub(self.host.base_time());
        let buffer = OutputBuffer {
            data,
            pts,
            dts: pts,
            offset: self.next_offset,
        };
        self.next_offset += 1;
        self.frame_count += 1;
        log::trace!("created buffer offset={} pts={:?}", buffer.offset, buffer.pts);

        Ok(Flow::Buffer(buffer))
    }
}
