use crate::pattern::{Pattern, Rgb};
use crate::SpectrumFrame;

/// Direct spectrum display: the smoothed band vector resampled onto the
/// strip, low frequencies first.
///
/// Positional start arguments: `(frame_rate_hz, pixel_count)`.
///
/// Hue runs from red at the low end to blue at the high end; each pixel's
/// brightness is its band amplitude, so silence renders black. An active
/// alarm paints the whole strip red.
#[derive(Default)]
pub struct Bars;

impl Bars {
    pub fn new() -> Self {
        Self
    }
}

impl Pattern for Bars {
    fn render(&mut self, _elapsed_seconds: f32, frame: &SpectrumFrame, buffer: &mut [Rgb]) {
        if let Some(level) = frame.alarm() {
            buffer.fill(Rgb::from_float(level, 0.0, 0.0));
            return;
        }

        let smooth = frame.smoothed_bands();
        let count = buffer.len().max(1) as f32;
        for (index, pixel) in buffer.iter_mut().enumerate() {
            let along = index as f32 / count;
            let band = super::sample_band(&smooth, along);
            *pixel = Rgb::from_hsv(along * 300.0, 1.0, band);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::NO_ALARM;

    #[test]
    fn silence_renders_black() {
        let mut bars = Bars::new();
        let frame = SpectrumFrame::silent(64);
        let mut buffer = vec![Rgb::new(5, 5, 5); 16];
        bars.render(0.0, &frame, &mut buffer);
        assert!(buffer.iter().all(|pixel| *pixel == Rgb::BLACK));
    }

    #[test]
    fn energy_in_low_bands_lights_the_low_end() {
        let mut bands = vec![0.0; 64];
        for value in bands.iter_mut().take(8) {
            *value = 1.0;
        }
        let frame = SpectrumFrame::new(NO_ALARM, &bands, 64);
        let mut bars = Bars::new();
        let mut buffer = vec![Rgb::BLACK; 16];
        bars.render(0.0, &frame, &mut buffer);

        assert_ne!(buffer[0], Rgb::BLACK);
        assert_eq!(buffer[15], Rgb::BLACK);
    }

    #[test]
    fn output_ignores_elapsed_time() {
        let frame = SpectrumFrame::new(NO_ALARM, &[0.5; 64], 64);
        let mut bars = Bars::new();
        let mut early = vec![Rgb::BLACK; 16];
        let mut late = vec![Rgb::BLACK; 16];
        bars.render(0.0, &frame, &mut early);
        bars.render(100.0, &frame, &mut late);
        assert_eq!(early, late);
    }
}
