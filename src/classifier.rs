//! Frame quality classifier
//!
//! Decides whether an analyzed frame carries usable voice.

use crate::features::Features;

/// Default maximum fraction of full-scale samples before a frame counts as clipped.
pub const DEFAULT_CLIPPING_THRESHOLD: f32 = 0.01;

/// Default factor a frame's energy must exceed the noise floor by.
pub const DEFAULT_NOISE_FLOOR_MARGIN: f32 = 2.0;

/// Why a frame was not analyzed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LostReason {
    /// Too many samples at full-scale amplitude.
    Clipping,
    /// Energy not sufficiently above the noise floor.
    LowEnergy,
    /// No periodic component found.
    Unvoiced,
}

/// Outcome of classifying one frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FrameClass {
    /// Usable vocal signal.
    Voiced,
    /// Silence, noise or clipping.
    Lost(LostReason),
}

/// Thresholds applied by [`classify`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Thresholds {
    /// Maximum tolerated fraction of clipped samples.
    pub clipping: f32,
    /// Multiple of the noise floor a voiced frame's energy must reach.
    pub noise_floor_margin: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            clipping: DEFAULT_CLIPPING_THRESHOLD,
            noise_floor_margin: DEFAULT_NOISE_FLOOR_MARGIN,
        }
    }
}

/// Classify a frame from its features.
pub fn classify(features: &Features, thresholds: &Thresholds) -> FrameClass {
    if features.clipped_fraction > thresholds.clipping {
        FrameClass::Lost(LostReason::Clipping)
    } else if features.energy < features.noise_floor * thresholds.noise_floor_margin {
        FrameClass::Lost(LostReason::LowEnergy)
    } else if features.pitch_hz.is_none() || !features.voiced {
        FrameClass::Lost(LostReason::Unvoiced)
    } else {
        FrameClass::Voiced
    }
}
