use crate::device::StreamKind;
use crate::modes::StreamMode;

/// Errors surfaced by the capture source.
///
/// Every SDK-level failure is converted to [`SourceError::Sdk`] at the
/// capability boundary, carrying the failing operation's name and arguments.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no depth camera devices found")]
    DeviceNotFound,

    #[error("device '{0}' does not support advanced configuration mode")]
    UnsupportedDevice(String),

    #[error("invalid {kind} mode: {mode}")]
    InvalidMode { kind: StreamKind, mode: StreamMode },

    #[error("camera SDK error calling {op}({args}): {message}")]
    Sdk {
        op: &'static str,
        args: String,
        message: String,
    },

    #[error("failed to allocate {0} byte output buffer")]
    Allocation(usize),

    #[error("failed to map output buffer for writing")]
    BufferMap,

    #[error("source is not streaming")]
    NotStreaming,
}

impl SourceError {
    /// Wrap an SDK-level failure with the failing operation's identity.
    pub fn sdk(op: &'static str, args: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sdk {
            op,
            args: args.into(),
            message: message.into(),
        }
    }
}
