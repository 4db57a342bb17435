//! Configuration surface of the capture source.

use crate::modes::{self, StreamMode, COLOR_MODES, DEPTH_MODES};
use std::path::{Path, PathBuf};

/// Alignment between the color and depth sensors.
///
/// Selects whether frame sets are spatially reprojected onto the color or
/// depth sensor's viewpoint before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// Deliver both streams in their native geometry.
    None,
    /// Reproject the depth image onto the color sensor's viewpoint.
    #[default]
    Color,
    /// Reproject the color image onto the depth sensor's viewpoint.
    Depth,
}

/// Stream geometry, alignment, and tuning configuration.
///
/// Mutable through the element's property setters until acquisition starts;
/// a live session freezes it.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub color: StreamMode,
    pub depth: StreamMode,
    pub align: Alignment,
    /// Optional JSON preset applied at start. `None` or an empty path means
    /// the device keeps its default tuning.
    pub preset_file: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            color: modes::DEFAULT_COLOR_MODE,
            depth: modes::DEFAULT_DEPTH_MODE,
            align: Alignment::default(),
            preset_file: None,
        }
    }
}

impl SourceConfig {
    /// Revalidate both stream modes after a property change.
    ///
    /// A stream whose triple is fully positive but absent from its mode table
    /// is reset to the stream's default with a warning. Start-time validation
    /// fails hard instead of resetting.
    pub fn sanitize(&mut self) {
        let c = self.color;
        if c.width > 0 && c.height > 0 && c.fps > 0 && !modes::is_valid_mode(COLOR_MODES, c) {
            log::warn!(
                "invalid color mode {}, reverting to default {}",
                c,
                modes::DEFAULT_COLOR_MODE
            );
            self.color = modes::DEFAULT_COLOR_MODE;
        }
        let d = self.depth;
        if d.width > 0 && d.height > 0 && d.fps > 0 && !modes::is_valid_mode(DEPTH_MODES, d) {
            log::warn!(
                "invalid depth mode {}, reverting to default {}",
                d,
                modes::DEFAULT_DEPTH_MODE
            );
            self.depth = modes::DEFAULT_DEPTH_MODE;
        }
    }

    /// The preset path, if configured and non-empty.
    pub(crate) fn preset_path(&self) -> Option<&Path> {
        self.preset_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}
