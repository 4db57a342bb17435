//! Mock SDK backend and host for exercising the source without hardware.
//!
//! [`MockSdk`] scripts the capability boundary (device list, failure
//! injection, advanced-mode state), [`MockStream`] paces deterministic
//! synthetic frame sets through a bounded channel the way a real SDK's
//! delivery thread would, and [`MockHost`] provides a monotonic clock plus
//! plain heap buffers.

use crate::caps::NegotiatedFormat;
use crate::device::{
    AlignProcessor, CameraSdk, ColorFrame, DepthFrame, DeviceInfo, Features, FrameSet,
    FrameStream, StreamKind,
};
use crate::modes::StreamMode;
use crate::source::PipelineHost;
use crate::{Result, SourceError};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Which SDK operation a [`MockSdk`] should fail with an injected error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Enumerate,
    AdvancedMode,
    LoadPreset,
    StartCapture,
    CreateAligner,
    /// The stream starts but every pull fails.
    WaitForFrames,
}

/// Scripted camera SDK.
pub struct MockSdk {
    devices: Vec<DeviceInfo>,
    advanced_mode: bool,
    fail_on: Option<FailOn>,
    frame_limit: Option<u64>,
    /// Preset payloads applied via `load_preset`, for assertions.
    pub loaded_presets: Vec<String>,
    /// Names of every SDK operation invoked, in order.
    pub calls: Vec<&'static str>,
}

impl Default for MockSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSdk {
    /// A mock with one fully featured device connected.
    pub fn new() -> Self {
        Self {
            devices: vec![DeviceInfo {
                name: "Mock RealSense D435I".to_owned(),
                serial: "834612070000".to_owned(),
                features: Features::COLOR
                    | Features::DEPTH
                    | Features::IMU
                    | Features::ADVANCED_MODE,
            }],
            advanced_mode: false,
            fail_on: None,
            frame_limit: None,
            loaded_presets: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// No devices connected.
    pub fn without_devices(mut self) -> Self {
        self.devices.clear();
        self
    }

    /// One device that lacks advanced configuration mode.
    pub fn with_plain_device(mut self) -> Self {
        self.devices = vec![DeviceInfo {
            name: "Mock RealSense D415".to_owned(),
            serial: "822512060000".to_owned(),
            features: Features::COLOR | Features::DEPTH,
        }];
        self
    }

    /// Fail the given operation with an injected SDK error.
    pub fn failing(mut self, op: FailOn) -> Self {
        self.fail_on = Some(op);
        self
    }

    /// Streams stop delivering after `limit` frame sets, as a stalled or
    /// disconnected device would.
    pub fn frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    fn injected(&self, op: FailOn, name: &'static str, args: String) -> Result<()> {
        if self.fail_on == Some(op) {
            return Err(SourceError::sdk(name, args, "injected failure"));
        }
        Ok(())
    }
}

impl CameraSdk for MockSdk {
    type Stream = MockStream;
    type Aligner = MockAligner;

    fn enumerate(&mut self) -> Result<Vec<DeviceInfo>> {
        self.calls.push("enumerate");
        self.injected(FailOn::Enumerate, "enumerate", String::new())?;
        Ok(self.devices.clone())
    }

    fn advanced_mode_enabled(&mut self, device: &DeviceInfo) -> Result<bool> {
        self.calls.push("advanced_mode_enabled");
        self.injected(FailOn::AdvancedMode, "advanced_mode_enabled", device.serial.clone())?;
        Ok(self.advanced_mode)
    }

    fn set_advanced_mode(&mut self, device: &DeviceInfo, enable: bool) -> Result<()> {
        self.calls.push("set_advanced_mode");
        self.injected(
            FailOn::AdvancedMode,
            "set_advanced_mode",
            format!("{}, {}", device.serial, enable),
        )?;
        self.advanced_mode = enable;
        Ok(())
    }

    fn load_preset(&mut self, device: &DeviceInfo, json: &str) -> Result<()> {
        self.calls.push("load_preset");
        self.injected(FailOn::LoadPreset, "load_preset", device.serial.clone())?;
        self.loaded_presets.push(json.to_owned());
        Ok(())
    }

    fn start_capture(
        &mut self,
        device: &DeviceInfo,
        color: StreamMode,
        depth: StreamMode,
    ) -> Result<MockStream> {
        self.calls.push("start_capture");
        self.injected(
            FailOn::StartCapture,
            "start_capture",
            format!("{}, color {}, depth {}", device.serial, color, depth),
        )?;
        if self.fail_on == Some(FailOn::WaitForFrames) {
            return Ok(MockStream::stopped());
        }
        MockStream::start(color, depth, self.frame_limit)
    }

    fn create_aligner(&mut self, target: StreamKind) -> Result<MockAligner> {
        self.calls.push("create_aligner");
        self.injected(FailOn::CreateAligner, "create_aligner", target.to_string())?;
        Ok(MockAligner::new(target))
    }
}

/// Continuous mock acquisition.
///
/// A producer thread paces synthetic frame sets into a bounded channel at
/// the configured color rate; [`FrameStream::wait_for_frames`] blocks on the
/// channel like a real SDK pull would. Dropping the stream stops the thread.
pub struct MockStream {
    receiver: Receiver<FrameSet>,
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl MockStream {
    fn start(color: StreamMode, depth: StreamMode, limit: Option<u64>) -> Result<MockStream> {
        let (sender, receiver) = crossbeam_channel::bounded(8);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();

        let thread = std::thread::Builder::new()
            .name("mock-capture".into())
            .spawn(move || {
                frame_producer_loop(color, depth, limit, &sender, &stop_clone);
            })
            .map_err(|e| {
                SourceError::sdk(
                    "start_capture",
                    format!("color {}, depth {}", color, depth),
                    format!("failed to spawn producer thread: {}", e),
                )
            })?;

        Ok(MockStream {
            receiver,
            stop_flag,
            thread: Some(thread),
        })
    }

    /// A stream whose producer is already gone; every pull fails.
    fn stopped() -> MockStream {
        let (_, receiver) = crossbeam_channel::bounded(1);
        MockStream {
            receiver,
            stop_flag: Arc::new(AtomicBool::new(true)),
            thread: None,
        }
    }

    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl FrameStream for MockStream {
    fn wait_for_frames(&mut self) -> Result<FrameSet> {
        self.receiver
            .recv()
            .map_err(|_| SourceError::sdk("wait_for_frames", "", "stream stopped delivering"))
    }
}

fn frame_producer_loop(
    color: StreamMode,
    depth: StreamMode,
    limit: Option<u64>,
    sender: &Sender<FrameSet>,
    stop_flag: &AtomicBool,
) {
    let interval = Duration::from_secs(1) / color.fps.max(1);
    let mut produced: u64 = 0;

    log::debug!("mock frame producer started ({} fps)", color.fps);

    while !stop_flag.load(Ordering::Relaxed) {
        if limit.is_some_and(|l| produced >= l) {
            log::debug!("mock frame producer reached its limit of {} frames", produced);
            break;
        }

        let frames = synthesize_frame_set(color, depth);
        match sender.send_timeout(frames, interval) {
            Ok(()) => produced += 1,
            // Consumer lagging; drop the frame set like a real device would.
            Err(crossbeam_channel::SendTimeoutError::Timeout(_)) => continue,
            Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => break,
        }
        std::thread::sleep(interval);
    }

    log::debug!("mock frame producer stopped");
}

/// Deterministic RGB ramp, independent of time, so tests can predict exact
/// buffer contents.
pub fn synthesize_color(mode: StreamMode) -> ColorFrame {
    let mut data = Vec::with_capacity((mode.width * mode.height * 3) as usize);
    for y in 0..mode.height {
        for x in 0..mode.width {
            data.push((x & 0xFF) as u8);
            data.push((y & 0xFF) as u8);
            data.push(((x ^ y) & 0xFF) as u8);
        }
    }
    ColorFrame {
        width: mode.width,
        height: mode.height,
        data,
    }
}

/// Row-major depth ramp wrapping at 4096 so both encodable and saturated
/// samples appear.
pub fn synthesize_depth(mode: StreamMode) -> DepthFrame {
    let data = (0..mode.width * mode.height)
        .map(|i| (i % 4096) as u16)
        .collect();
    DepthFrame {
        width: mode.width,
        height: mode.height,
        data,
    }
}

fn synthesize_frame_set(color: StreamMode, depth: StreamMode) -> FrameSet {
    FrameSet {
        color: synthesize_color(color),
        depth: synthesize_depth(depth),
    }
}

/// Nearest-neighbor reprojection of the off-target stream onto the target
/// stream's pixel grid.
pub struct MockAligner {
    target: StreamKind,
}

impl MockAligner {
    pub fn new(target: StreamKind) -> Self {
        Self { target }
    }
}

impl AlignProcessor for MockAligner {
    fn process(&self, frames: FrameSet) -> FrameSet {
        match self.target {
            StreamKind::Color => {
                let (width, height) = (frames.color.width, frames.color.height);
                let depth = resample_depth(&frames.depth, width, height);
                FrameSet {
                    color: frames.color,
                    depth,
                }
            }
            StreamKind::Depth => {
                let (width, height) = (frames.depth.width, frames.depth.height);
                let color = resample_color(&frames.color, width, height);
                FrameSet {
                    color,
                    depth: frames.depth,
                }
            }
        }
    }
}

fn resample_depth(src: &DepthFrame, width: u32, height: u32) -> DepthFrame {
    if src.width == width && src.height == height {
        return src.clone();
    }
    let mut data = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        let sy = y * src.height / height;
        for x in 0..width {
            let sx = x * src.width / width;
            data.push(src.data[(sy * src.width + sx) as usize]);
        }
    }
    DepthFrame {
        width,
        height,
        data,
    }
}

fn resample_color(src: &ColorFrame, width: u32, height: u32) -> ColorFrame {
    if src.width == width && src.height == height {
        return src.clone();
    }
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        let sy = y * src.height / height;
        for x in 0..width {
            let sx = x * src.width / width;
            let i = ((sy * src.width + sx) * 3) as usize;
            data.extend_from_slice(&src.data[i..i + 3]);
        }
    }
    ColorFrame {
        width,
        height,
        data,
    }
}

/// Host-side test double: monotonic clock, plain heap buffers, and a record
/// of every published format.
pub struct MockHost {
    epoch: Instant,
    base: Duration,
    fail_allocation: bool,
    fail_map: bool,
    pub published: Vec<NegotiatedFormat>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            base: Duration::ZERO,
            fail_allocation: false,
            fail_map: false,
            published: Vec::new(),
        }
    }

    /// Every buffer allocation fails.
    pub fn failing_allocation(mut self) -> Self {
        self.fail_allocation = true;
        self
    }

    /// Buffers allocate but cannot be mapped for writing.
    pub fn failing_map(mut self) -> Self {
        self.fail_map = true;
        self
    }
}

impl PipelineHost for MockHost {
    fn clock_time(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn base_time(&self) -> Duration {
        self.base
    }

    fn acquire_buffer(&mut self, size: usize) -> Result<Vec<u8>> {
        if self.fail_allocation {
            return Err(SourceError::Allocation(size));
        }
        if self.fail_map {
            return Err(SourceError::BufferMap);
        }
        Ok(vec![0u8; size])
    }

    fn publish_caps(&mut self, format: &NegotiatedFormat) {
        self.published.push(*format);
    }
}
