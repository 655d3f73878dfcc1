//! Feature extraction
//!
//! Per-frame acoustic features: short-term energy, zero-crossing rate, an
//! autocorrelation pitch estimate gated by the zero-crossing rate, FFT-based
//! spectral stability against the previous frame, and a voicing decision
//! against an adaptive noise floor.

use std::{f32::consts::PI, sync::Arc};
use rustfft::{num_complex::Complex, Fft, Length};

/// Lowest fundamental frequency searched, in Hz.
pub const MIN_PITCH_HZ: f32 = 75.0;

/// Highest fundamental frequency searched, in Hz.
pub const MAX_PITCH_HZ: f32 = 500.0;

/// Minimum normalized autocorrelation peak for a frame to count as periodic.
const VOICING_THRESHOLD: f32 = 0.45;

/// Frames whose zero-crossing rate exceeds this are treated as noise.
const MAX_VOICED_ZCR: f32 = 0.3;

/// Absolute amplitude at or above which a sample counts as clipped.
pub const CLIP_LEVEL: f32 = 0.999;

/// Smoothing factor of the noise floor moving average.
const NOISE_FLOOR_ALPHA: f32 = 0.95;

/// Lower bound of the noise floor (mean squared amplitude).
pub const MIN_NOISE_FLOOR: f32 = 1e-7;

/// Upper bound of the noise floor (mean squared amplitude).
pub const MAX_NOISE_FLOOR: f32 = 1e-2;

/// Acoustic features of one analysis frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Features {
    /// Estimated fundamental frequency, `None` when no periodic component was found.
    pub pitch_hz: Option<f32>,
    /// Mean squared sample amplitude.
    pub energy: f32,
    /// Similarity of this frame's spectrum to the previous one, in `[0, 1]`.
    pub spectral_stability: f32,
    /// Energy above the noise floor and a pitch was found.
    pub voiced: bool,
    /// Sign changes per sample pair, in `[0, 1]`.
    pub zero_crossing_rate: f32,
    /// Fraction of samples at full-scale amplitude.
    pub clipped_fraction: f32,
    /// Noise floor in effect when this frame was analyzed.
    pub noise_floor: f32,
}

/// Exponential moving average of the energy of unvoiced frames.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NoiseFloor {
    level: f32,
}

impl NoiseFloor {
    /// Start at the lowest allowed level.
    pub fn new() -> Self {
        NoiseFloor {
            level: MIN_NOISE_FLOOR,
        }
    }

    /// Current floor.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Fold the energy of an unvoiced frame into the estimate.
    pub fn update(&mut self, energy: f32) {
        let next = NOISE_FLOOR_ALPHA * self.level + (1.0 - NOISE_FLOOR_ALPHA) * energy;
        self.level = next.clamp(MIN_NOISE_FLOOR, MAX_NOISE_FLOOR);
    }
}

impl Default for NoiseFloor {
    fn default() -> Self {
        Self::new()
    }
}

/// Stateful per-session feature extractor.
pub struct FeatureExtractor {
    sample_rate: f32,
    frame_size: usize,
    min_lag: usize,
    max_lag: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    centered: Vec<f32>,
    autocorrelation: Vec<f32>,
    spectrum: Vec<f32>,
    previous_spectrum: Vec<f32>,
    has_previous: bool,
    noise_floor: NoiseFloor,
}

impl FeatureExtractor {
    /// Create an extractor for frames of `frame_size` samples.
    ///
    /// `fft` must be a forward transform of length `frame_size`, and the frame
    /// must span the shortest pitch lag plus three samples.
    pub fn new(sample_rate: f32, frame_size: usize, fft: Arc<dyn Fft<f32>>) -> Self {
        debug_assert_eq!(fft.len(), frame_size);
        debug_assert!(frame_size >= min_frame_for_pitch(sample_rate));

        let min_lag = min_pitch_lag(sample_rate);
        let max_lag = ((sample_rate / MIN_PITCH_HZ).ceil() as usize)
            .min(frame_size - 2)
            .max(min_lag);
        let bins = frame_size / 2 + 1;

        FeatureExtractor {
            sample_rate,
            frame_size,
            min_lag,
            max_lag,
            window: hann_window(frame_size),
            fft,
            fft_buffer: vec![Complex { re: 0.0, im: 0.0 }; frame_size],
            centered: vec![0.0; frame_size],
            autocorrelation: vec![0.0; max_lag + 2],
            spectrum: vec![0.0; bins],
            previous_spectrum: vec![0.0; bins],
            has_previous: false,
            noise_floor: NoiseFloor::new(),
        }
    }

    /// Current noise floor estimate.
    pub fn noise_floor(&self) -> f32 {
        self.noise_floor.level()
    }

    /// Analyze one frame of exactly `frame_size` samples.
    pub fn extract(&mut self, frame: &[f32]) -> Features {
        debug_assert_eq!(frame.len(), self.frame_size);

        let energy = mean_square(frame);
        let zero_crossing_rate = zero_crossing_rate(frame);
        let clipped_fraction = frame.iter().filter(|s| s.abs() >= CLIP_LEVEL).count() as f32
            / frame.len() as f32;

        let pitch_hz = if zero_crossing_rate <= MAX_VOICED_ZCR {
            self.estimate_pitch(frame)
        } else {
            None
        };
        let spectral_stability = self.spectral_stability(frame);

        let noise_floor = self.noise_floor.level();
        let voiced = energy > noise_floor && pitch_hz.is_some();
        if !voiced {
            self.noise_floor.update(energy);
        }

        Features {
            pitch_hz,
            energy,
            spectral_stability,
            voiced,
            zero_crossing_rate,
            clipped_fraction,
            noise_floor,
        }
    }

    /// Forget the previous spectrum and the noise floor.
    pub fn reset(&mut self) {
        self.has_previous = false;
        self.noise_floor = NoiseFloor::new();
    }

    /// Strongest normalized autocorrelation peak in the pitch lag range,
    /// refined by parabolic interpolation.
    fn estimate_pitch(&mut self, frame: &[f32]) -> Option<f32> {
        let n = frame.len();
        let mean = frame.iter().sum::<f32>() / n as f32;
        for (c, &s) in self.centered.iter_mut().zip(frame) {
            *c = s - mean;
        }

        let r0: f32 = self.centered.iter().map(|c| c * c).sum();
        if r0 <= f32::EPSILON {
            return None;
        }

        for lag in (self.min_lag - 1)..=(self.max_lag + 1) {
            let acc: f32 = self.centered[..n - lag]
                .iter()
                .zip(&self.centered[lag..])
                .map(|(a, b)| a * b)
                .sum();
            self.autocorrelation[lag] = acc / r0;
        }

        let acf = &self.autocorrelation;
        let mut best: Option<(usize, f32)> = None;
        for lag in self.min_lag..=self.max_lag {
            let r = acf[lag];
            let is_peak = r > acf[lag - 1] && r >= acf[lag + 1];
            if is_peak && best.is_none_or(|(_, b)| r > b) {
                best = Some((lag, r));
            }
        }

        let (lag, peak) = best?;
        if peak < VOICING_THRESHOLD {
            return None;
        }

        let (a, b, c) = (acf[lag - 1], peak, acf[lag + 1]);
        let denom = a - 2.0 * b + c;
        let shift = if denom.abs() > f32::EPSILON {
            (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
        } else {
            0.0
        };
        Some(self.sample_rate / (lag as f32 + shift))
    }

    /// One minus the total-variation distance between this frame's normalized
    /// magnitude spectrum and the previous one.
    fn spectral_stability(&mut self, frame: &[f32]) -> f32 {
        for ((slot, &s), &w) in self.fft_buffer.iter_mut().zip(frame).zip(&self.window) {
            slot.re = s * w;
            slot.im = 0.0;
        }
        self.fft.process(&mut self.fft_buffer);

        let mut total = 0.0;
        for (mag, c) in self.spectrum.iter_mut().zip(&self.fft_buffer) {
            *mag = (c.re * c.re + c.im * c.im).sqrt();
            total += *mag;
        }

        if total <= 1e-12 {
            self.has_previous = false;
            return 0.0;
        }
        self.spectrum.iter_mut().for_each(|m| *m /= total);

        let stability = if self.has_previous {
            let flux: f32 = self
                .spectrum
                .iter()
                .zip(&self.previous_spectrum)
                .map(|(a, b)| (a - b).abs())
                .sum();
            (1.0 - 0.5 * flux).clamp(0.0, 1.0)
        } else {
            1.0
        };

        std::mem::swap(&mut self.spectrum, &mut self.previous_spectrum);
        self.has_previous = true;
        stability
    }
}

/// Mean squared amplitude of `samples`.
pub fn mean_square(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64) as f32
}

/// Shortest autocorrelation lag searched for pitch at `sample_rate`.
pub(crate) fn min_pitch_lag(sample_rate: f32) -> usize {
    ((sample_rate / MAX_PITCH_HZ).floor() as usize).max(2)
}

/// Shortest frame that leaves room for the lag search around the
/// shortest pitch lag.
pub(crate) fn min_frame_for_pitch(sample_rate: f32) -> usize {
    min_pitch_lag(sample_rate) + 3
}

/// Rate of sign changes, normalized by the number of adjacent pairs.
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / (size as f32 - 1.0)).cos())
        .collect()
}
