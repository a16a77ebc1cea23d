use std::io::Write;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use led_visualiser_core::{
    pattern, Controller, DeviceError, EngineConfig, MemorySink, PixelSink, Rgb, SinkFactory,
};
use tracing_subscriber::EnvFilter;

const BANDS: usize = 256;

fn main() -> led_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pattern,
            frame_rate,
            pixels,
            speed,
            duration,
            quiet,
        } => run_pattern(&pattern, frame_rate, pixels, speed, duration, quiet),
        Commands::Patterns => {
            for name in pattern::variants() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

/// Drives the controller the way the real audio-analysis producer would:
/// synthetic sine-sweep spectrum frames pushed at ~30 Hz.
fn run_pattern(
    name: &str,
    frame_rate: f32,
    pixels: usize,
    speed: f32,
    duration: f32,
    quiet: bool,
) -> led_visualiser_core::Result<()> {
    tracing::info!(pattern = name, frame_rate, pixels, duration, "starting demo producer");

    let factory: SinkFactory = if quiet {
        Box::new(|_| Ok(Box::new(MemorySink::new())))
    } else {
        Box::new(|_| Ok(Box::new(TerminalSink::new())))
    };
    let controller = Controller::new(EngineConfig::default(), factory);

    let mut args = vec![frame_rate, pixels as f32];
    if pattern::arity_of(name).unwrap_or(2) > 2 {
        args.push(speed);
    }
    controller.start(name, &args)?;

    let started = Instant::now();
    let mut bands = [0.0_f32; BANDS];
    while started.elapsed().as_secs_f32() < duration {
        if !controller.is_active() {
            tracing::error!(error = ?controller.last_error(), "render loop died");
            break;
        }
        let t = started.elapsed().as_secs_f32();
        for (i, band) in bands.iter_mut().enumerate() {
            *band = 0.8
                * 0.5
                * (1.0 + (4.0 * t).sin())
                * 0.5
                * (1.0 + (-4.0 * t + 0.2 * i as f32 * 200.0).sin());
        }
        controller.set_parameters(-1.0, &bands)?;
        std::thread::sleep(Duration::from_secs_f32(1.0 / 30.0));
    }

    let fps = controller.measured_fps();
    controller.stop();
    if !quiet {
        println!();
    }
    tracing::info!(fps, "demo finished");
    Ok(())
}

/// Renders the pixel buffer as one line of truecolor blocks, redrawn in
/// place. Stands in for a real LED transport during development.
struct TerminalSink {
    stdout: std::io::Stdout,
    line: String,
}

impl TerminalSink {
    fn new() -> Self {
        Self {
            stdout: std::io::stdout(),
            line: String::new(),
        }
    }
}

impl PixelSink for TerminalSink {
    fn push(&mut self, pixels: &[Rgb]) -> Result<(), DeviceError> {
        self.line.clear();
        self.line.push('\r');
        for pixel in pixels {
            self.line
                .push_str(&format!("\x1b[38;2;{};{};{}m\u{2588}", pixel.r, pixel.g, pixel.b));
        }
        self.line.push_str("\x1b[0m");
        self.stdout
            .write_all(self.line.as_bytes())
            .and_then(|_| self.stdout.flush())
            .map_err(|error| DeviceError::Transient(error.to_string()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-reactive LED pattern engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a pattern with a synthetic spectrum producer.
    Run {
        /// Pattern variant to start (see `patterns`).
        pattern: String,
        /// Render loop target frame rate in Hz.
        #[arg(long, default_value_t = 30.0)]
        frame_rate: f32,
        /// Number of output pixels.
        #[arg(long, default_value_t = 60)]
        pixels: usize,
        /// Variant-specific speed argument, where the pattern takes one.
        #[arg(long, default_value_t = 20.0)]
        speed: f32,
        /// How long to run, in seconds.
        #[arg(long, default_value_t = 10.0)]
        duration: f32,
        /// Drop frames into a memory sink instead of drawing to the terminal.
        #[arg(long)]
        quiet: bool,
    },
    /// List the registered pattern variants.
    Patterns,
}
