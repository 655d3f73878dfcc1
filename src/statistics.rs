//! Running statistics
//!
//! Per-session accumulators over all frames fed so far.

use crate::{
    classifier::FrameClass,
    features::Features,
};

/// Welford accumulator for mean and variance.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RunningStat {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStat {
    /// Add one observation.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Number of observations.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean of the observations, `0.0` when empty.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance, `0.0` with fewer than two observations.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Frame counters and feature accumulators of one session.
///
/// `frame_count == voiced_frame_count + lost_frame_count` always holds; the
/// feature accumulators only see voiced frames.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct RunningStatistics {
    /// Frames classified so far.
    pub frame_count: u64,
    /// Frames classified as voiced.
    pub voiced_frame_count: u64,
    /// Frames classified as lost.
    pub lost_frame_count: u64,
    /// Pitch of voiced frames, in Hz.
    pub pitch: RunningStat,
    /// Energy of voiced frames.
    pub energy: RunningStat,
    /// Spectral stability of voiced frames.
    pub spectral_stability: RunningStat,
}

impl RunningStatistics {
    /// Record a classified frame.
    pub fn record(&mut self, features: &Features, class: FrameClass) {
        self.frame_count += 1;
        match (class, features.pitch_hz) {
            (FrameClass::Voiced, Some(pitch)) => {
                self.voiced_frame_count += 1;
                self.pitch.push(pitch as f64);
                self.energy.push(features.energy as f64);
                self.spectral_stability
                    .push(features.spectral_stability as f64);
            }
            _ => self.lost_frame_count += 1,
        }
    }
}
