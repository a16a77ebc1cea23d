//! Spectrum frames: the unit of data handed from the producer to the engine.

/// Alarm sentinel: any factor below zero means "no alarm".
pub const NO_ALARM: f32 = -1.0;

// Gaussian kernel with sigma 1.5, truncated at 4 sigma. One half of the
// symmetric kernel, centre value first; within 1% of scipy's version.
const GAUSS: [f32; 7] = [
    0.2659615202676218,
    0.2129653370149015,
    0.10934004978399577,
    0.035993977675458706,
    0.007597324015864964,
    0.001028185997527405,
    8.92201505099236e-5,
];

/// One audio-analysis snapshot: a fixed-length vector of per-band amplitudes
/// plus a scalar alarm level. Immutable after construction.
///
/// Construction is where malformed producer input is conformed: band vectors
/// of the wrong length are truncated or zero-padded, non-finite amplitudes
/// become zero and everything is clamped to `[0, 1]`. The engine therefore
/// never sees a frame it cannot render.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    bands: Vec<f32>,
    alarm_factor: f32,
}

impl SpectrumFrame {
    /// Builds a frame conformed to `band_count` bands.
    pub fn new(alarm_factor: f32, bands: &[f32], band_count: usize) -> Self {
        let mut conformed = Vec::with_capacity(band_count);
        for index in 0..band_count {
            let raw = bands.get(index).copied().unwrap_or(0.0);
            let value = if raw.is_finite() { raw } else { 0.0 };
            conformed.push(value.clamp(0.0, 1.0));
        }
        let alarm_factor = if alarm_factor.is_finite() {
            alarm_factor.min(1.0)
        } else {
            NO_ALARM
        };
        Self {
            bands: conformed,
            alarm_factor,
        }
    }

    /// The defined "no data yet" frame: all-zero bands, no alarm.
    pub fn silent(band_count: usize) -> Self {
        Self {
            bands: vec![0.0; band_count],
            alarm_factor: NO_ALARM,
        }
    }

    pub fn bands(&self) -> &[f32] {
        &self.bands
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Returns the alarm level when one is active.
    pub fn alarm(&self) -> Option<f32> {
        (self.alarm_factor >= 0.0).then_some(self.alarm_factor)
    }

    /// Mean band amplitude, overridden by the alarm level while an alarm is
    /// active so alarms dominate the visuals regardless of spectrum content.
    pub fn intensity(&self) -> f32 {
        if let Some(level) = self.alarm() {
            return level;
        }
        if self.bands.is_empty() {
            return 0.0;
        }
        self.bands.iter().sum::<f32>() / self.bands.len() as f32
    }

    /// Gaussian-smoothed copy of the band vector, clamping at the edges.
    /// Raw FFT bands flicker too much to drive pixels directly.
    pub fn smoothed_bands(&self) -> Vec<f32> {
        if self.bands.is_empty() {
            return Vec::new();
        }
        let truncate = GAUSS.len() as i32 - 1;
        let last = self.bands.len() - 1;
        (0..self.bands.len())
            .map(|i| {
                let mut sum = 0.0;
                for neighbor in -truncate..=truncate {
                    let index = (i as i32 + neighbor).clamp(0, last as i32) as usize;
                    sum += GAUSS[neighbor.unsigned_abs() as usize] * self.bands[index];
                }
                sum
            })
            .collect()
    }
}
