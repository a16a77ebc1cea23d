//! The background render loop: a dedicated thread that ties the parameter
//! channel, the active pattern and the pixel sink together at a fixed tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::channel::ParameterChannel;
use crate::pattern::{Pattern, Rgb};
use crate::sink::{DeviceError, PixelSink};
use crate::SpectrumFrame;

/// Timing parameters for one render loop.
#[derive(Debug, Clone, Copy)]
pub struct RenderTiming {
    pub frame_rate_hz: f32,
    pub fps_window_seconds: f32,
}

impl RenderTiming {
    /// The frame rate the loop actually runs at. Non-positive or non-finite
    /// requested rates fall back to 30 Hz rather than producing a
    /// degenerate interval.
    pub fn effective_frame_rate(&self) -> f32 {
        if self.frame_rate_hz.is_finite() && self.frame_rate_hz > 0.0 {
            self.frame_rate_hz
        } else {
            30.0
        }
    }

    /// Target sleep between ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.effective_frame_rate())
    }
}

/// Clears the alive flag when the render thread exits, whether the loop
/// returned normally or unwound out of a panicking pattern or sink.
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct LoopShared {
    last_error: Mutex<Option<DeviceError>>,
    measured_fps: Mutex<f32>,
}

/// Handle to a spawned render loop.
///
/// Shutdown is cooperative: [`request_stop`](Self::request_stop) raises a
/// flag the loop polls once per tick, so [`join`](Self::join) returns within
/// one frame interval plus one device push.
pub struct RenderLoopHandle {
    cancel: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    shared: Arc<LoopShared>,
    thread: Option<JoinHandle<()>>,
}

impl RenderLoopHandle {
    /// Spawns the render thread and returns its handle.
    pub fn spawn(
        mut pattern: Box<dyn Pattern>,
        channel: Arc<ParameterChannel>,
        mut sink: Box<dyn PixelSink>,
        pixel_count: usize,
        band_count: usize,
        timing: RenderTiming,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));
        let shared = Arc::new(LoopShared {
            last_error: Mutex::new(None),
            // Seeded with the effective rate until the first window completes.
            measured_fps: Mutex::new(timing.effective_frame_rate()),
        });

        let thread = {
            let cancel = Arc::clone(&cancel);
            let alive = Arc::clone(&alive);
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let _alive = AliveGuard(alive);
                run_loop(
                    pattern.as_mut(),
                    &channel,
                    sink.as_mut(),
                    pixel_count,
                    band_count,
                    timing,
                    &cancel,
                    &shared,
                );
            })
        };

        Self {
            cancel,
            alive,
            shared,
            thread: Some(thread),
        }
    }

    /// Raises the cancellation flag without waiting for the loop to exit.
    pub fn request_stop(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// True while the render thread is still ticking. Turns false within one
    /// frame interval of a stop request or a persistent device failure.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// The device error that stopped the loop, if one did.
    pub fn last_error(&self) -> Option<DeviceError> {
        self.shared
            .last_error
            .lock()
            .map(|error| error.clone())
            .unwrap_or(None)
    }

    /// Frame rate averaged over the configured measurement window.
    pub fn measured_fps(&self) -> f32 {
        self.shared
            .measured_fps
            .lock()
            .map(|fps| *fps)
            .unwrap_or(0.0)
    }

    /// Waits for the render thread to finish. Callers raise the cancellation
    /// flag first, which bounds the wait to roughly one frame interval.
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for RenderLoopHandle {
    fn drop(&mut self) {
        self.request_stop();
        self.join();
    }
}

impl std::fmt::Debug for RenderLoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoopHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[allow(clippy::too_many_arguments)]
fn run_loop(
    pattern: &mut dyn Pattern,
    channel: &ParameterChannel,
    sink: &mut dyn PixelSink,
    pixel_count: usize,
    band_count: usize,
    timing: RenderTiming,
    cancel: &AtomicBool,
    shared: &LoopShared,
) {
    let interval = timing.frame_interval();
    let mut buffer = vec![Rgb::BLACK; pixel_count];
    // Until the producer publishes, render the defined silent frame.
    let mut latest: Arc<SpectrumFrame> = Arc::new(SpectrumFrame::silent(band_count));

    let mut elapsed = 0.0_f32;
    let mut last_tick = Instant::now();
    let mut next_tick = last_tick + interval;
    let mut frames_in_window = 0u32;
    let mut window_start = last_tick;

    tracing::debug!(pixel_count, band_count, ?interval, "render loop started");

    loop {
        if cancel.load(Ordering::Acquire) {
            tracing::debug!("render loop observed stop request");
            break;
        }

        // Latest-wins: keep the previous frame when nothing new arrived.
        if let Some(frame) = channel.read_latest() {
            latest = frame;
        }

        pattern.render(elapsed, &latest, &mut buffer);

        match sink.push(&buffer) {
            Ok(()) => {}
            Err(error) if error.is_transient() => {
                tracing::warn!(%error, "pixel sink push failed, retrying next tick");
            }
            Err(error) => {
                tracing::error!(%error, "pixel sink failed persistently, stopping");
                if let Ok(mut slot) = shared.last_error.lock() {
                    *slot = Some(error);
                }
                break;
            }
        }

        let now = Instant::now();
        elapsed += now.duration_since(last_tick).as_secs_f32();
        last_tick = now;

        frames_in_window += 1;
        let window = now.duration_since(window_start).as_secs_f32();
        if window >= timing.fps_window_seconds && window > 0.0 {
            if let Ok(mut fps) = shared.measured_fps.lock() {
                *fps = frames_in_window as f32 / window;
            }
            frames_in_window = 0;
            window_start = now;
        }

        if next_tick > now {
            thread::sleep(next_tick - now);
        }
        next_tick += interval;
        // If rendering fell behind, resynchronise instead of bursting.
        let now = Instant::now();
        if next_tick < now {
            next_tick = now;
        }
    }
}
