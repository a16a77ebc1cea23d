use std::sync::{Arc, Mutex};

use crate::pattern::Rgb;

/// Failure reported by a [`PixelSink`]. Classification is the driver's call:
/// transient errors are retried on the next tick, persistent errors stop the
/// render loop.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeviceError {
    #[error("transient device error: {0}")]
    Transient(String),
    #[error("persistent device error: {0}")]
    Persistent(String),
}

impl DeviceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DeviceError::Transient(_))
    }
}

/// Abstraction over the physical output surface.
///
/// The render loop calls `push` once per tick with a buffer whose length
/// equals the pixel count configured at start time. The implementation owns
/// transmission to the hardware; the engine only cares about the result.
pub trait PixelSink: Send {
    fn push(&mut self, pixels: &[Rgb]) -> Result<(), DeviceError>;
}

/// Sink that records what was pushed, shared with the owner through a handle.
/// Used by the demo application and by tests; doubles as a reference for real
/// driver implementations.
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemorySinkState>>,
}

#[derive(Debug, Default)]
struct MemorySinkState {
    last_buffer: Vec<Rgb>,
    pushes: u64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for observing pushes after the sink itself has been moved into
    /// the render loop.
    pub fn handle(&self) -> MemorySinkHandle {
        MemorySinkHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl PixelSink for MemorySink {
    fn push(&mut self, pixels: &[Rgb]) -> Result<(), DeviceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| DeviceError::Persistent("sink state poisoned".into()))?;
        state.last_buffer.clear();
        state.last_buffer.extend_from_slice(pixels);
        state.pushes += 1;
        Ok(())
    }
}

/// Read side of a [`MemorySink`].
#[derive(Debug, Clone)]
pub struct MemorySinkHandle {
    state: Arc<Mutex<MemorySinkState>>,
}

impl MemorySinkHandle {
    pub fn last_buffer(&self) -> Vec<Rgb> {
        self.state
            .lock()
            .map(|state| state.last_buffer.clone())
            .unwrap_or_default()
    }

    pub fn pushes(&self) -> u64 {
        self.state.lock().map(|state| state.pushes).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_the_last_buffer() {
        let mut sink = MemorySink::new();
        let handle = sink.handle();

        sink.push(&[Rgb::new(1, 2, 3)]).unwrap();
        sink.push(&[Rgb::new(9, 9, 9), Rgb::new(0, 0, 0)]).unwrap();

        assert_eq!(handle.pushes(), 2);
        let buffer = handle.last_buffer();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer[0], Rgb::new(9, 9, 9));
    }

    #[test]
    fn transient_classification() {
        assert!(DeviceError::Transient("busy".into()).is_transient());
        assert!(!DeviceError::Persistent("unplugged".into()).is_transient());
    }
}
