//! Pattern algorithms: pure functions from (elapsed time, spectrum frame,
//! static configuration) to a pixel buffer.
//!
//! Patterns are selected by name at start time through [`build_pattern`].
//! Every variant takes `frame_rate_hz` and `pixel_count` as its first two
//! positional arguments; the remaining arguments are variant-specific and
//! documented on each type.

mod bars;
mod circle;
mod snowy_circle;

pub use bars::Bars;
pub use circle::Circle;
pub use snowy_circle::SnowyCircle;

use palette::{FromColor, Hsv, Srgb};

use crate::{Result, SpectrumFrame, VisualiserError};

/// One output cell: three 8-bit color channels in RGB order, the unit a
/// [`crate::PixelSink`] consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts an HSV color (hue in degrees, saturation and value in
    /// `[0, 1]`) to 8-bit RGB.
    pub fn from_hsv(hue_degrees: f32, saturation: f32, value: f32) -> Self {
        let srgb = Srgb::from_color(Hsv::new(hue_degrees, saturation, value));
        Self::from_float(srgb.red, srgb.green, srgb.blue)
    }

    /// Quantises float channels in `[0, 1]` to 8 bits, clamping first.
    pub fn from_float(r: f32, g: f32, b: f32) -> Self {
        let quantise = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self {
            r: quantise(r),
            g: quantise(g),
            b: quantise(b),
        }
    }

    /// Scales all channels by `factor` in `[0, 1]`.
    pub fn scaled(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |channel: u8| (channel as f32 * factor).round() as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
        }
    }
}

/// The polymorphic pattern contract.
///
/// `render` must be deterministic given the elapsed time, the frame and the
/// pattern's own prior internal state; wall-clock time is always injected by
/// the caller so tests can drive synthetic time. Internal animation state is
/// exclusively owned by the render loop driving the pattern.
pub trait Pattern: Send {
    /// Fills `buffer` (one entry per output cell) for the given instant.
    fn render(&mut self, elapsed_seconds: f32, frame: &SpectrumFrame, buffer: &mut [Rgb]);
}

/// Samples a band vector at a fractional `position` in `[0, 1]` with linear
/// interpolation between neighboring bands.
fn sample_band(bands: &[f32], position: f32) -> f32 {
    if bands.is_empty() {
        return 0.0;
    }
    let last = (bands.len() - 1) as f32;
    let scaled = position.clamp(0.0, 1.0) * last;
    let low = scaled.floor() as usize;
    let high = scaled.ceil() as usize;
    let fraction = scaled - low as f32;
    bands[low] * (1.0 - fraction) + bands[high] * fraction
}

struct VariantSpec {
    name: &'static str,
    arity: usize,
    build: fn(&[f32]) -> Box<dyn Pattern>,
}

const VARIANTS: &[VariantSpec] = &[
    VariantSpec {
        name: "Circle",
        arity: 3,
        build: |args| Box::new(Circle::new(args[2])),
    },
    VariantSpec {
        name: "SnowyCircle",
        arity: 3,
        build: |args| Box::new(SnowyCircle::new(args[2])),
    },
    VariantSpec {
        name: "Bars",
        arity: 2,
        build: |_| Box::new(Bars::new()),
    },
];

/// Names of all registered pattern variants.
pub fn variants() -> Vec<&'static str> {
    VARIANTS.iter().map(|spec| spec.name).collect()
}

/// Declared positional-argument count for `name`, if it is registered.
pub fn arity_of(name: &str) -> Option<usize> {
    VARIANTS
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| spec.arity)
}

/// Constructs the named pattern from its positional start arguments.
///
/// The argument count is validated against the variant's declared arity
/// before construction, so an unknown name or a wrong count is a start-time
/// error and never a runtime panic.
pub fn build_pattern(name: &str, args: &[f32]) -> Result<Box<dyn Pattern>> {
    let spec = VARIANTS
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| VisualiserError::UnknownPattern {
            name: name.to_string(),
        })?;

    if args.len() != spec.arity {
        return Err(VisualiserError::InvalidArity {
            pattern: name.to_string(),
            expected: spec.arity,
            actual: args.len(),
        });
    }

    Ok((spec.build)(args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::NO_ALARM;

    #[test]
    fn registry_lists_all_variants() {
        let names = variants();
        assert!(names.contains(&"Circle"));
        assert!(names.contains(&"SnowyCircle"));
        assert!(names.contains(&"Bars"));
    }

    #[test]
    fn unknown_pattern_is_a_start_time_error() {
        let err = build_pattern("Nope", &[30.0, 60.0, 1.0]).err().unwrap();
        assert!(matches!(err, VisualiserError::UnknownPattern { .. }));
    }

    #[test]
    fn wrong_argument_count_is_rejected() {
        let err = build_pattern("Circle", &[30.0, 60.0]).err().unwrap();
        match err {
            VisualiserError::InvalidArity {
                expected, actual, ..
            } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn every_variant_renders_the_requested_buffer_length() {
        let frame = SpectrumFrame::silent(32);
        for (name, args) in [
            ("Circle", &[30.0, 40.0, 20.0][..]),
            ("SnowyCircle", &[30.0, 40.0, 1.0][..]),
            ("Bars", &[30.0, 40.0][..]),
        ] {
            let mut pattern = build_pattern(name, args).unwrap();
            let mut buffer = vec![Rgb::BLACK; 40];
            pattern.render(0.5, &frame, &mut buffer);
            assert_eq!(buffer.len(), 40, "{name} changed the buffer length");
        }
    }

    #[test]
    fn rendering_is_deterministic_for_identical_inputs() {
        let frame = SpectrumFrame::new(NO_ALARM, &[0.3; 32], 32);
        let mut first = build_pattern("Circle", &[30.0, 40.0, 20.0]).unwrap();
        let mut second = build_pattern("Circle", &[30.0, 40.0, 20.0]).unwrap();

        let mut buffer_a = vec![Rgb::BLACK; 40];
        let mut buffer_b = vec![Rgb::BLACK; 40];
        for step in 0..10 {
            let elapsed = step as f32 / 30.0;
            first.render(elapsed, &frame, &mut buffer_a);
            second.render(elapsed, &frame, &mut buffer_b);
            assert_eq!(buffer_a, buffer_b, "diverged at step {step}");
        }
    }

    #[test]
    fn golden_silent_frame_output_is_reproducible() {
        // The all-zero, no-alarm frame at a fixed elapsed time must always
        // produce the same pixels.
        let frame = SpectrumFrame::silent(256);
        let mut pattern = build_pattern("Bars", &[30.0, 8.0]).unwrap();
        let mut buffer = vec![Rgb::BLACK; 8];
        pattern.render(1.0, &frame, &mut buffer);
        assert!(buffer.iter().all(|&pixel| pixel == Rgb::BLACK));

        let mut again = build_pattern("Bars", &[30.0, 8.0]).unwrap();
        let mut buffer_again = vec![Rgb::BLACK; 8];
        again.render(1.0, &frame, &mut buffer_again);
        assert_eq!(buffer, buffer_again);
    }

    #[test]
    fn hsv_conversion_hits_primary_colors() {
        assert_eq!(Rgb::from_hsv(0.0, 1.0, 1.0), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::from_hsv(120.0, 1.0, 1.0), Rgb::new(0, 255, 0));
        assert_eq!(Rgb::from_hsv(240.0, 1.0, 1.0), Rgb::new(0, 0, 255));
    }

    #[test]
    fn scaling_darkens_channels() {
        let pixel = Rgb::new(200, 100, 50).scaled(0.5);
        assert_eq!(pixel, Rgb::new(100, 50, 25));
    }
}
