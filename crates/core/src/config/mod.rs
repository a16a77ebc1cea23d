use serde::{Deserialize, Serialize};

/// Top-level configuration for the rendering engine.
///
/// Captured once when a [`crate::Controller`] is constructed and fixed for its
/// lifetime; there is deliberately no persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of frequency bands every published spectrum frame is conformed
    /// to. Producer input of any other length is truncated or zero-padded.
    pub band_count: usize,
    /// Window, in seconds, over which the render loop averages its measured
    /// frame rate.
    pub fps_window_seconds: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            band_count: 256,
            fps_window_seconds: 20.0,
        }
    }
}
