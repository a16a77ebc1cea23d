use crate::sink::DeviceError;

/// Result alias that carries the custom [`VisualiserError`] type.
pub type Result<T> = std::result::Result<T, VisualiserError>;

/// Common error type for the core crate.
///
/// Lifecycle misuse surfaces synchronously through these variants. Per-frame
/// data problems (wrong band count, non-finite amplitudes) are never errors:
/// they are conformed away when a [`crate::SpectrumFrame`] is built.
#[derive(Debug, thiserror::Error)]
pub enum VisualiserError {
    /// The pattern name passed to `start` matched no registered variant.
    #[error("unknown pattern: {name}")]
    UnknownPattern { name: String },
    /// The named pattern exists but was given the wrong number of arguments.
    #[error("pattern {pattern} expects {expected} arguments, got {actual}")]
    InvalidArity {
        pattern: String,
        expected: usize,
        actual: usize,
    },
    /// `start` was called while a render loop is still alive.
    #[error("a visualization is already running")]
    AlreadyRunning,
    /// A control call that requires a running loop arrived while idle.
    #[error("no visualization is running")]
    NotRunning,
    /// The pixel sink reported a failure.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}
