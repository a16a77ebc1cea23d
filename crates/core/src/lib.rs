//! Core library for the LED Visualiser application.
//!
//! The crate implements the visualization controller and pattern-rendering
//! engine: an external producer pushes audio-analysis frames through the
//! [`Controller`], a background [`render`] loop picks up the latest frame at
//! its own cadence, the active [`pattern`] turns it into a pixel buffer, and
//! a [`sink::PixelSink`] transmits that buffer to the output device. Audio
//! capture and spectral analysis live in the external process that drives
//! the controller.

pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod pattern;
pub mod render;
pub mod sink;
pub mod spectrum;

pub use channel::ParameterChannel;
pub use config::EngineConfig;
pub use controller::{Controller, SinkFactory};
pub use error::{Result, VisualiserError};
pub use pattern::{build_pattern, variants, Pattern, Rgb};
pub use render::{RenderLoopHandle, RenderTiming};
pub use sink::{DeviceError, MemorySink, MemorySinkHandle, PixelSink};
pub use spectrum::{SpectrumFrame, NO_ALARM};
