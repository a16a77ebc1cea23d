use crate::pattern::{Pattern, Rgb};
use crate::SpectrumFrame;

const SATURATION: f32 = 0.6;
const VALUE: f32 = 0.7;

/// Rotating ring whose hue drifts with accumulated spectrum intensity.
///
/// Positional start arguments: `(frame_rate_hz, pixel_count, swirl_speed)`.
/// `swirl_speed` scales how fast the ring rotates; `20.0` gives roughly
/// 0.4 revolutions per second.
///
/// The pixels are laid out as a closed ring. The spectrum is mirrored around
/// the ring's top so low bands sit at the top and high bands meet at the
/// bottom, and each pixel's brightness follows its band amplitude. An active
/// alarm overrides the palette with pure red scaled by the alarm level.
pub struct Circle {
    swirl_speed: f32,
    total_intensity: f32,
}

impl Circle {
    pub fn new(swirl_speed: f32) -> Self {
        Self {
            swirl_speed,
            total_intensity: 0.0,
        }
    }
}

impl Pattern for Circle {
    fn render(&mut self, elapsed_seconds: f32, frame: &SpectrumFrame, buffer: &mut [Rgb]) {
        self.total_intensity += frame.intensity();

        if let Some(level) = frame.alarm() {
            buffer.fill(Rgb::from_float(level, 0.0, 0.0));
            return;
        }

        let smooth = frame.smoothed_bands();
        let rotation = elapsed_seconds * self.swirl_speed * 0.02 + self.total_intensity * 0.005;
        let top_hue = (elapsed_seconds * 0.15 - self.total_intensity * 0.05) * 36.0;
        let bot_hue = (elapsed_seconds * 0.25 + self.total_intensity * 0.05) * 7.2;

        let count = buffer.len().max(1) as f32;
        for (index, pixel) in buffer.iter_mut().enumerate() {
            let around = (index as f32 / count + rotation).rem_euclid(1.0);
            // Distance from the ring's top, mirrored on both sides.
            let mirrored = (2.0 * around - 1.0).abs();
            let band = super::sample_band(&smooth, mirrored);
            let hue = top_hue + (bot_hue - top_hue) * mirrored;
            // A faint baseline keeps the ring visible through silence.
            *pixel = Rgb::from_hsv(hue, SATURATION, VALUE * (0.2 + 0.8 * band));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::NO_ALARM;

    #[test]
    fn alarm_turns_the_whole_ring_red() {
        let mut circle = Circle::new(20.0);
        let frame = SpectrumFrame::new(0.5, &[1.0; 16], 16);
        let mut buffer = vec![Rgb::BLACK; 12];
        circle.render(1.0, &frame, &mut buffer);
        for pixel in buffer {
            assert_eq!(pixel.g, 0);
            assert_eq!(pixel.b, 0);
            assert_eq!(pixel.r, 128);
        }
    }

    #[test]
    fn silence_still_produces_a_dim_ring() {
        let mut circle = Circle::new(20.0);
        let frame = SpectrumFrame::silent(16);
        let mut buffer = vec![Rgb::BLACK; 12];
        circle.render(0.0, &frame, &mut buffer);
        assert!(buffer.iter().any(|pixel| *pixel != Rgb::BLACK));
    }

    #[test]
    fn louder_bands_render_brighter_pixels() {
        let quiet_frame = SpectrumFrame::new(NO_ALARM, &[0.1; 16], 16);
        let loud_frame = SpectrumFrame::new(NO_ALARM, &[0.9; 16], 16);

        let mut quiet = Circle::new(0.0);
        let mut loud = Circle::new(0.0);
        let mut quiet_buffer = vec![Rgb::BLACK; 8];
        let mut loud_buffer = vec![Rgb::BLACK; 8];
        quiet.render(0.0, &quiet_frame, &mut quiet_buffer);
        loud.render(0.0, &loud_frame, &mut loud_buffer);

        let brightness = |buffer: &[Rgb]| -> u32 {
            buffer
                .iter()
                .map(|p| p.r as u32 + p.g as u32 + p.b as u32)
                .sum()
        };
        assert!(brightness(&loud_buffer) > brightness(&quiet_buffer));
    }
}
