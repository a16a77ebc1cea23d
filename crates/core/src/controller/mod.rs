//! Caller-facing lifecycle manager: start/stop/is_active/set_parameters.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::channel::ParameterChannel;
use crate::config::EngineConfig;
use crate::pattern;
use crate::render::{RenderLoopHandle, RenderTiming};
use crate::sink::{DeviceError, PixelSink};
use crate::{Result, SpectrumFrame, VisualiserError};

/// Builds the pixel sink for a given pixel count when a visualization
/// starts. Separating construction from the controller keeps hardware
/// bring-up outside the engine.
pub type SinkFactory =
    Box<dyn Fn(usize) -> std::result::Result<Box<dyn PixelSink>, DeviceError> + Send + Sync>;

// Upper bound on the pixel count accepted at start time. Keeps a bogus
// geometry argument from requesting an unallocatable buffer; exact in f32.
const MAX_PIXEL_COUNT: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running,
    Stopping,
}

struct Inner {
    state: State,
    render: Option<RenderLoopHandle>,
    channel: Option<Arc<ParameterChannel>>,
    last_error: Option<DeviceError>,
}

/// Owns at most one render loop and serialises lifecycle transitions, so
/// every operation is safe to call from any thread.
///
/// The state machine is `Idle -> Running -> Stopping -> Idle`. A loop that
/// dies on its own (persistent device failure) shows up as
/// `is_active() == false` and is reaped by the next `start` or `stop`.
pub struct Controller {
    config: EngineConfig,
    sink_factory: SinkFactory,
    inner: Mutex<Inner>,
    idle: Condvar,
}

impl Controller {
    pub fn new(config: EngineConfig, sink_factory: SinkFactory) -> Self {
        Self {
            config,
            sink_factory,
            inner: Mutex::new(Inner {
                state: State::Idle,
                render: None,
                channel: None,
                last_error: None,
            }),
            idle: Condvar::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Names of the pattern variants `start` accepts.
    pub fn variants(&self) -> Vec<&'static str> {
        pattern::variants()
    }

    /// Starts the named pattern with its positional arguments.
    ///
    /// Every pattern takes `frame_rate_hz` and `pixel_count` as its first
    /// two arguments; the rest are variant-specific (see the pattern types).
    /// Fails with [`VisualiserError::AlreadyRunning`] while a loop is alive,
    /// and with [`VisualiserError::UnknownPattern`] or
    /// [`VisualiserError::InvalidArity`] for a bad name or argument count.
    pub fn start(&self, pattern_name: &str, args: &[f32]) -> Result<()> {
        let mut inner = self.lock();
        match inner.state {
            State::Stopping => return Err(VisualiserError::AlreadyRunning),
            State::Running => {
                let alive = inner
                    .render
                    .as_ref()
                    .map(RenderLoopHandle::is_alive)
                    .unwrap_or(false);
                if alive {
                    return Err(VisualiserError::AlreadyRunning);
                }
                Self::reap(&mut inner);
            }
            State::Idle => {}
        }

        let pattern = pattern::build_pattern(pattern_name, args)?;
        // Arity validation succeeded, so the two common arguments exist.
        let frame_rate_hz = args[0];
        let pixel_count = if args[1].is_finite() {
            args[1].round().clamp(1.0, MAX_PIXEL_COUNT as f32) as usize
        } else {
            1
        };

        let sink = (self.sink_factory)(pixel_count)?;
        let channel = Arc::new(ParameterChannel::new());
        let timing = RenderTiming {
            frame_rate_hz,
            fps_window_seconds: self.config.fps_window_seconds,
        };
        let render = RenderLoopHandle::spawn(
            pattern,
            Arc::clone(&channel),
            sink,
            pixel_count,
            self.config.band_count,
            timing,
        );

        tracing::info!(pattern = pattern_name, pixel_count, frame_rate_hz, "visualization started");
        inner.render = Some(render);
        inner.channel = Some(channel);
        inner.last_error = None;
        inner.state = State::Running;
        Ok(())
    }

    /// Publishes the newest audio-analysis data. Non-blocking: the frame is
    /// conformed to the configured band count and swapped into the channel;
    /// the render loop picks it up on its next tick.
    pub fn set_parameters(&self, alarm_factor: f32, bands: &[f32]) -> Result<()> {
        let channel = {
            let inner = self.lock();
            if inner.state != State::Running {
                return Err(VisualiserError::NotRunning);
            }
            inner.channel.clone().ok_or(VisualiserError::NotRunning)?
        };
        channel.publish(SpectrumFrame::new(alarm_factor, bands, self.config.band_count));
        Ok(())
    }

    /// True while a render loop is running and has not self-terminated.
    /// Loop death is reflected within one frame interval.
    pub fn is_active(&self) -> bool {
        let inner = self.lock();
        inner.state == State::Running
            && inner
                .render
                .as_ref()
                .map(RenderLoopHandle::is_alive)
                .unwrap_or(false)
    }

    /// The device error that stopped the most recent loop, if any.
    pub fn last_error(&self) -> Option<DeviceError> {
        let inner = self.lock();
        inner
            .render
            .as_ref()
            .and_then(RenderLoopHandle::last_error)
            .or_else(|| inner.last_error.clone())
    }

    /// Frame rate the current loop measured over its averaging window, or
    /// 0.0 while idle.
    pub fn measured_fps(&self) -> f32 {
        self.lock()
            .render
            .as_ref()
            .map(RenderLoopHandle::measured_fps)
            .unwrap_or(0.0)
    }

    /// Stops the running visualization and waits for the loop to exit and
    /// release the sink. No-op when idle. The wait is bounded by one frame
    /// interval plus one device push, because cancellation is polled every
    /// tick.
    pub fn stop(&self) {
        let render = {
            let mut inner = self.lock();
            // Another thread mid-stop: wait for it to finish so this call
            // also returns with the loop fully gone, without disturbing the
            // state machine.
            while inner.state == State::Stopping {
                inner = self.wait_while_stopping(inner);
            }
            if inner.state == State::Idle {
                return;
            }
            inner.state = State::Stopping;
            inner.channel = None;
            inner.render.take()
        };

        // Join outside the lock so is_active()/set_parameters callers are
        // never blocked on the render thread's exit.
        let error = render.map(|mut render| {
            render.request_stop();
            render.join();
            render.last_error()
        });

        let mut inner = self.lock();
        if let Some(error) = error {
            inner.last_error = error;
        }
        // Only the thread that initiated this Stopping may complete it;
        // start() rejects while Stopping, so the state cannot have moved.
        if inner.state == State::Stopping {
            inner.state = State::Idle;
        }
        self.idle.notify_all();
        tracing::info!("visualization stopped");
    }

    fn reap(inner: &mut Inner) {
        if let Some(mut render) = inner.render.take() {
            render.request_stop();
            render.join();
            inner.last_error = render.last_error();
        }
        inner.channel = None;
        inner.state = State::Idle;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn wait_while_stopping<'a>(&self, guard: MutexGuard<'a, Inner>) -> MutexGuard<'a, Inner> {
        self.idle
            .wait(guard)
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("config", &self.config)
            .field("active", &self.is_active())
            .finish()
    }
}
