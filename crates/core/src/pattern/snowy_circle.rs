use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::pattern::{Pattern, Rgb};
use crate::SpectrumFrame;

const PARTICLE_SPAWN_Z: f32 = 2.0;
// Fixed seed so particle layouts, and therefore rendered buffers, are
// reproducible across runs.
const LAYOUT_SEED: u64 = 0x536e_6f77;

/// Drifting particle field over a dim blue backdrop, like snow in torchlight.
///
/// Positional start arguments: `(frame_rate_hz, pixel_count, fall_speed)`.
/// `fall_speed` scales how fast particles drift through their depth range;
/// `1.0` is a calm snowfall.
///
/// Spectrum intensity brightens the backdrop, so the snow twinkles against
/// the music. An active alarm overrides everything with red.
pub struct SnowyCircle {
    fall_speed: f32,
    particles: Vec<Particle>,
}

struct Particle {
    position: f32,
    start_z: f32,
    speed: f32,
}

impl SnowyCircle {
    pub fn new(fall_speed: f32) -> Self {
        Self {
            fall_speed,
            particles: Vec::new(),
        }
    }

    fn seed_particles(&mut self, pixel_count: usize) {
        let mut rng = StdRng::seed_from_u64(LAYOUT_SEED);
        let count = (pixel_count / 3).max(1);
        self.particles = (0..count)
            .map(|_| Particle {
                position: rng.gen::<f32>(),
                start_z: rng.gen::<f32>() * PARTICLE_SPAWN_Z,
                speed: 0.3 * (rng.gen::<f32>() * 0.75 + 0.3),
            })
            .collect();
    }
}

impl Pattern for SnowyCircle {
    fn render(&mut self, elapsed_seconds: f32, frame: &SpectrumFrame, buffer: &mut [Rgb]) {
        if let Some(level) = frame.alarm() {
            buffer.fill(Rgb::from_float(level, 0.0, 0.0));
            return;
        }

        if self.particles.len() != (buffer.len() / 3).max(1) {
            self.seed_particles(buffer.len());
        }

        // Cold, dim backdrop that breathes with the spectrum.
        let backdrop = Rgb::from_hsv(220.0, 0.8, 0.1 + 0.25 * frame.intensity());
        buffer.fill(backdrop);
        if buffer.is_empty() {
            return;
        }

        let count = buffer.len();
        for particle in &self.particles {
            // Depth is a pure function of elapsed time, wrapping at spawn
            // depth; nearer particles are brighter.
            let depth = (particle.start_z + elapsed_seconds * particle.speed * self.fall_speed)
                .rem_euclid(PARTICLE_SPAWN_Z);
            let brightness = 1.0 - depth / PARTICLE_SPAWN_Z;
            let index = ((particle.position * count as f32) as usize).min(count - 1);

            let flake = Rgb::from_float(brightness, brightness, brightness);
            let current = buffer[index];
            // Additive blend, saturating per channel.
            buffer[index] = Rgb::new(
                current.r.saturating_add(flake.r),
                current.g.saturating_add(flake.g),
                current.b.saturating_add(flake.b),
            );
        }
    }
}
