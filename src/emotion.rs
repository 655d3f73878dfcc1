//! Emotion model
//!
//! Maps accumulated session statistics onto a probability distribution over
//! five emotions. Each emotion's weight is a fixed linear combination of four
//! normalized prosodic cues; weights are biased by the prior and normalized.

use std::fmt::Display;

use crate::{statistics::RunningStatistics, voice::VoiceError};

/// Number of emotions in the taxonomy.
pub const NUM_EMOTIONS: usize = 5;

/// Tolerance on the sum of a probability distribution.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// Emotions in the same order as `EMOTION_WEIGHTS` and the fields of
/// [`EmotionProbabilities`].
pub const EMOTIONS: [Emotion; NUM_EMOTIONS] = [
    Emotion::Neutrality,
    Emotion::Happiness,
    Emotion::Sadness,
    Emotion::Anger,
    Emotion::Fear,
];

/// Pitch range mapped onto the pitch level cue, in Hz.
const PITCH_LEVEL_RANGE: (f64, f64) = (80.0, 400.0);

/// Coefficient of variation of pitch that saturates the variability cue.
const FULL_PITCH_VARIATION: f64 = 0.25;

/// Energy range mapped onto the loudness cue, in dB relative to full scale.
const LOUDNESS_RANGE_DB: (f64, f64) = (-50.0, 0.0);

/// (bias, pitch level, pitch variability, loudness, instability)
const EMOTION_WEIGHTS: [[f64; 5]; NUM_EMOTIONS] = [
    [1.90, 0.0, -1.2, 0.0, -0.4],
    [0.10, 0.5, 0.3, 0.4, 0.0],
    [1.80, -0.3, -0.2, -1.2, 0.0],
    [0.05, 0.0, 0.6, 0.7, 0.3],
    [0.05, 0.6, 0.6, 0.0, 0.5],
];

/// The fixed emotion taxonomy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Emotion {
    /// Calm, unmarked speech.
    Neutrality,
    /// Happy or cheerful speech.
    Happiness,
    /// Sad or subdued speech.
    Sadness,
    /// Angry speech.
    Anger,
    /// Fearful or anxious speech.
    Fear,
}

impl Emotion {
    /// Label used in result maps, e.g. `"emotion-neutral"`.
    pub const fn label(self) -> &'static str {
        match self {
            Emotion::Neutrality => "emotion-neutral",
            Emotion::Happiness => "emotion-happy",
            Emotion::Sadness => "emotion-sad",
            Emotion::Anger => "emotion-angry",
            Emotion::Fear => "emotion-fear",
        }
    }
}

impl Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Probability of each emotion.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EmotionProbabilities {
    /// Probability of neutrality.
    pub neutrality: f64,
    /// Probability of happiness.
    pub happiness: f64,
    /// Probability of sadness.
    pub sadness: f64,
    /// Probability of anger.
    pub anger: f64,
    /// Probability of fear.
    pub fear: f64,
}

impl EmotionProbabilities {
    /// Equal probability for every emotion.
    pub const fn uniform() -> Self {
        let p = 0.2;
        EmotionProbabilities {
            neutrality: p,
            happiness: p,
            sadness: p,
            anger: p,
            fear: p,
        }
    }

    /// All mass on neutrality.
    pub const fn neutral() -> Self {
        EmotionProbabilities {
            neutrality: 1.0,
            happiness: 0.0,
            sadness: 0.0,
            anger: 0.0,
            fear: 0.0,
        }
    }

    /// Build from values in [`EMOTIONS`] order.
    pub const fn from_array(p: [f64; NUM_EMOTIONS]) -> Self {
        EmotionProbabilities {
            neutrality: p[0],
            happiness: p[1],
            sadness: p[2],
            anger: p[3],
            fear: p[4],
        }
    }

    /// Values in [`EMOTIONS`] order.
    pub const fn to_array(&self) -> [f64; NUM_EMOTIONS] {
        [
            self.neutrality,
            self.happiness,
            self.sadness,
            self.anger,
            self.fear,
        ]
    }

    /// Probability of one emotion.
    pub const fn get(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Neutrality => self.neutrality,
            Emotion::Happiness => self.happiness,
            Emotion::Sadness => self.sadness,
            Emotion::Anger => self.anger,
            Emotion::Fear => self.fear,
        }
    }

    /// Sum of all five values.
    pub fn sum(&self) -> f64 {
        self.to_array().iter().sum()
    }

    /// Check that every value is finite and non-negative and that they sum to 1.
    ///
    /// Returns `Err(VoiceError::InvalidDistribution)` otherwise.
    pub fn validate(&self) -> Result<(), VoiceError> {
        let sum = self.sum();
        let entries_ok = self.to_array().iter().all(|p| p.is_finite() && *p >= 0.0);
        if !entries_ok || !sum.is_finite() || (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
            return Err(VoiceError::InvalidDistribution { sum });
        }
        Ok(())
    }

    /// The most probable emotion; ties resolve to the earlier one in [`EMOTIONS`].
    pub fn dominant(&self) -> Emotion {
        let p = self.to_array();
        let mut best = 0;
        for (i, &v) in p.iter().enumerate().skip(1) {
            if v > p[best] {
                best = i;
            }
        }
        EMOTIONS[best]
    }

    /// `(label, probability)` pairs in [`EMOTIONS`] order.
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        EMOTIONS.into_iter().map(move |e| (e.label(), self.get(e)))
    }
}

impl Default for EmotionProbabilities {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Normalized prosodic cues, each in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Cues {
    /// Mean pitch within the speaking range.
    pub pitch_level: f64,
    /// Relative spread of pitch.
    pub pitch_variability: f64,
    /// Mean energy on a decibel scale.
    pub loudness: f64,
    /// One minus mean spectral stability.
    pub instability: f64,
}

impl Cues {
    /// Derive the cues from voiced-frame statistics.
    ///
    /// Returns `None` when no voiced frame has been seen.
    pub fn from_statistics(stats: &RunningStatistics) -> Option<Self> {
        if stats.voiced_frame_count == 0 || stats.pitch.count() == 0 {
            return None;
        }

        let mean_pitch = stats.pitch.mean();
        let (lo, hi) = PITCH_LEVEL_RANGE;
        let pitch_level = ((mean_pitch - lo) / (hi - lo)).clamp(0.0, 1.0);

        let variation = if mean_pitch > 0.0 {
            stats.pitch.std_dev() / mean_pitch
        } else {
            0.0
        };
        let pitch_variability = (variation / FULL_PITCH_VARIATION).clamp(0.0, 1.0);

        let db = 10.0 * stats.energy.mean().max(1e-12).log10();
        let (db_lo, db_hi) = LOUDNESS_RANGE_DB;
        let loudness = ((db - db_lo) / (db_hi - db_lo)).clamp(0.0, 1.0);

        let instability = (1.0 - stats.spectral_stability.mean()).clamp(0.0, 1.0);

        Some(Cues {
            pitch_level,
            pitch_variability,
            loudness,
            instability,
        })
    }
}

/// Score accumulated statistics into a distribution biased by `prior`.
///
/// With no voiced frames the result is [`EmotionProbabilities::neutral`].
pub fn score(stats: &RunningStatistics, prior: &EmotionProbabilities) -> EmotionProbabilities {
    let Some(cues) = Cues::from_statistics(stats) else {
        return EmotionProbabilities::neutral();
    };
    let x = [
        1.0,
        cues.pitch_level,
        cues.pitch_variability,
        cues.loudness,
        cues.instability,
    ];

    let prior = prior.to_array();
    let mut weights = [0.0; NUM_EMOTIONS];
    for (i, w) in weights.iter_mut().enumerate() {
        let linear: f64 = EMOTION_WEIGHTS[i].iter().zip(&x).map(|(c, v)| c * v).sum();
        *w = linear.max(0.0) * prior[i];
    }

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return EmotionProbabilities::neutral();
    }
    weights.iter_mut().for_each(|w| *w /= total);
    EmotionProbabilities::from_array(weights)
}
