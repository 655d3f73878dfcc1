//! Voice
//!
//! A streaming analysis session. Samples pushed with [`Voice::fill`] are cut
//! into frames, analyzed and classified as they arrive; [`Voice::extract`]
//! turns the accumulated statistics into a [`Quality`] report and an
//! [`EmotionProbabilities`] distribution.

use std::sync::Arc;

use log::{debug, trace};
use rustfft::{Fft, FftPlanner};
use thiserror::Error;

use crate::{
    classifier::{
        classify, Thresholds, DEFAULT_CLIPPING_THRESHOLD, DEFAULT_NOISE_FLOOR_MARGIN,
    },
    emotion::{self, EmotionProbabilities},
    features::{self, FeatureExtractor},
    report::{Quality, DEFAULT_MIN_VOICED_FRAMES},
    samples::Samples,
    segmenter::Segmenter,
    statistics::RunningStatistics,
};

/// Default analysis frame length, in seconds.
const DEFAULT_FRAME_SECONDS: f64 = 0.040;

/// Shortest frame the pitch tracker can work with.
const MIN_FRAME_SIZE: usize = 32;

/// Longest accepted frame, in samples.
const MAX_FRAME_SIZE: usize = 1 << 20;

/// Highest accepted sample rate, in Hz.
const MAX_SAMPLE_RATE: f64 = 768_000.0;

/// Largest accepted `buffer_length`, the range of a C `int`.
const MAX_BUFFER_LENGTH: usize = i32::MAX as usize;

/// Errors returned by voice sessions.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// A construction or call argument is out of range.
    #[error("invalid parameter `{arg}`: {msg}")]
    InvalidParameter {
        /// The name of the offending argument.
        arg: &'static str,
        /// A description of the accepted range.
        msg: String,
    },

    /// A probability distribution does not sum to one or has invalid entries.
    #[error("probabilities must be non-negative and sum to 1, got sum {sum}")]
    InvalidDistribution {
        /// The sum of the rejected distribution.
        sum: f64,
    },

    /// Two sessions cannot be filled together.
    #[error("mismatched sessions: {0}")]
    MismatchedSessions(String),

    /// The session was destroyed.
    #[error("voice used after destroy")]
    UseAfterDestroy,

    /// Audio could not be decoded into samples.
    #[error("decode failure: {0}")]
    DecodeFailure(String),
}

/// Lifecycle of a [`Voice`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Freshly created or reset; nothing filled yet.
    Created,
    /// Samples have been filled since the last extraction.
    Filling,
    /// The latest statistics have been extracted.
    Extracted,
    /// Destroyed; every further operation fails.
    Destroyed,
}

/// Builder for a [`Voice`].
#[derive(Debug, Clone)]
pub struct VoiceBuilder {
    sample_rate: f64,
    buffer_length: usize,
    frame_size: Option<usize>,
    hop_size: Option<usize>,
    min_voiced_frames: u64,
    clipping_threshold: f32,
    noise_floor_margin: f32,
    prior: EmotionProbabilities,
}

impl VoiceBuilder {
    /// Start with default parameters:
    /// sample_rate = 16_000, buffer_length = 0,
    /// 40 ms frames with a 20 ms hop, min_voiced_frames = 5,
    /// clipping_threshold = 0.01, noise_floor_margin = 2.0, uniform prior.
    pub fn new() -> Self {
        VoiceBuilder {
            sample_rate: 16_000.0,
            buffer_length: 0,
            frame_size: None,
            hop_size: None,
            min_voiced_frames: DEFAULT_MIN_VOICED_FRAMES,
            clipping_threshold: DEFAULT_CLIPPING_THRESHOLD,
            noise_floor_margin: DEFAULT_NOISE_FLOOR_MARGIN,
            prior: EmotionProbabilities::uniform(),
        }
    }

    /// Set the sample rate in Hz.
    pub fn sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = rate;
        self
    }

    /// Set the expected total number of samples. Informational only.
    pub fn buffer_length(mut self, length: usize) -> Self {
        self.buffer_length = length;
        self
    }

    /// Override the frame length in samples.
    pub fn frame_size(mut self, size: usize) -> Self {
        self.frame_size = Some(size);
        self
    }

    /// Override the hop between frames in samples. Defaults to half a frame.
    pub fn hop_size(mut self, size: usize) -> Self {
        self.hop_size = Some(size);
        self
    }

    /// Set how many voiced frames make a result valid.
    pub fn min_voiced_frames(mut self, n: u64) -> Self {
        self.min_voiced_frames = n;
        self
    }

    /// Set the tolerated fraction of clipped samples per frame.
    pub fn clipping_threshold(mut self, fraction: f32) -> Self {
        self.clipping_threshold = fraction;
        self
    }

    /// Set the multiple of the noise floor a voiced frame must reach.
    pub fn noise_floor_margin(mut self, margin: f32) -> Self {
        self.noise_floor_margin = margin;
        self
    }

    /// Set the prior emotion probabilities.
    pub fn prior(mut self, prior: EmotionProbabilities) -> Self {
        self.prior = prior;
        self
    }

    /// Finalize and create the Voice.
    pub fn build(self) -> Result<Voice, VoiceError> {
        self.build_with(&mut FftPlanner::new())
    }

    /// Finalize using plans from a shared planner.
    pub(crate) fn build_with(self, planner: &mut FftPlanner<f32>) -> Result<Voice, VoiceError> {
        if !self.sample_rate.is_finite()
            || self.sample_rate <= 0.0
            || self.sample_rate > MAX_SAMPLE_RATE
        {
            return Err(VoiceError::InvalidParameter {
                arg: "sample_rate",
                msg: format!(
                    "must be in (0, {MAX_SAMPLE_RATE}] Hz, got {}",
                    self.sample_rate
                ),
            });
        }
        if self.buffer_length > MAX_BUFFER_LENGTH {
            return Err(VoiceError::InvalidParameter {
                arg: "buffer_length",
                msg: format!("must not exceed {MAX_BUFFER_LENGTH}"),
            });
        }

        let frame_size = self
            .frame_size
            .unwrap_or_else(|| (self.sample_rate * DEFAULT_FRAME_SECONDS).round() as usize);
        let min_frame =
            MIN_FRAME_SIZE.max(features::min_frame_for_pitch(self.sample_rate as f32));
        if !(min_frame..=MAX_FRAME_SIZE).contains(&frame_size) {
            return Err(VoiceError::InvalidParameter {
                arg: "frame_size",
                msg: format!(
                    "must be in {min_frame}..={MAX_FRAME_SIZE} samples at {} Hz, got {frame_size}",
                    self.sample_rate
                ),
            });
        }
        let hop_size = self.hop_size.unwrap_or((frame_size / 2).max(1));
        if hop_size == 0 || hop_size > frame_size {
            return Err(VoiceError::InvalidParameter {
                arg: "hop_size",
                msg: format!("must be in 1..={frame_size}, got {hop_size}"),
            });
        }

        if self.min_voiced_frames == 0 {
            return Err(VoiceError::InvalidParameter {
                arg: "min_voiced_frames",
                msg: "must be >= 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.clipping_threshold) {
            return Err(VoiceError::InvalidParameter {
                arg: "clipping_threshold",
                msg: "must be a fraction in 0.0..=1.0".to_string(),
            });
        }
        if !self.noise_floor_margin.is_finite() || self.noise_floor_margin < 1.0 {
            return Err(VoiceError::InvalidParameter {
                arg: "noise_floor_margin",
                msg: "must be a finite factor >= 1.0".to_string(),
            });
        }
        self.prior.validate()?;

        let fft: Arc<dyn Fft<f32>> = planner.plan_fft_forward(frame_size);
        debug!(
            "voice created: {} Hz, buffer_length {}, frame {} / hop {} samples",
            self.sample_rate, self.buffer_length, frame_size, hop_size
        );

        Ok(Voice {
            sample_rate: self.sample_rate,
            buffer_length: self.buffer_length,
            min_voiced_frames: self.min_voiced_frames,
            thresholds: Thresholds {
                clipping: self.clipping_threshold,
                noise_floor_margin: self.noise_floor_margin,
            },
            prior: self.prior,
            state: SessionState::Created,
            core: Some(Analysis {
                segmenter: Segmenter::new(frame_size, hop_size),
                extractor: FeatureExtractor::new(self.sample_rate as f32, frame_size, fft),
                stats: RunningStatistics::default(),
                cached: None,
            }),
        })
    }
}

impl Default for VoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Buffers and statistics released on destroy.
struct Analysis {
    segmenter: Segmenter,
    extractor: FeatureExtractor,
    stats: RunningStatistics,
    cached: Option<(Quality, EmotionProbabilities)>,
}

impl Analysis {
    fn feed<I>(&mut self, input: &mut I, thresholds: &Thresholds)
    where
        I: Iterator<Item = f32>,
    {
        while let Some(frame) = self.segmenter.next_frame(input) {
            let features = self.extractor.extract(frame);
            let class = classify(&features, thresholds);
            trace!(
                "frame {}: {:?} (energy {:.3e}, pitch {:?}, stability {:.3})",
                self.stats.frame_count,
                class,
                features.energy,
                features.pitch_hz,
                features.spectral_stability
            );
            self.stats.record(&features, class);
        }
        self.cached = None;
    }

    fn reset(&mut self) {
        self.segmenter.clear();
        self.extractor.reset();
        self.stats = RunningStatistics::default();
        self.cached = None;
    }
}

/// Streaming voice analysis session.
pub struct Voice {
    sample_rate: f64,
    buffer_length: usize,
    min_voiced_frames: u64,
    thresholds: Thresholds,
    prior: EmotionProbabilities,
    state: SessionState,
    core: Option<Analysis>,
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("sample_rate", &self.sample_rate)
            .field("buffer_length", &self.buffer_length)
            .field("state", &self.state)
            .field("prior", &self.prior)
            .finish_non_exhaustive()
    }
}

impl Voice {
    /// Start customizing with a builder.
    pub fn builder() -> VoiceBuilder {
        VoiceBuilder::new()
    }

    /// Create a session with default analysis parameters.
    ///
    /// Returns `Err(VoiceError::InvalidParameter)` if `sample_rate` is not a
    /// positive, finite number or is too low to analyze.
    pub fn new(sample_rate: f64, buffer_length: usize) -> Result<Self, VoiceError> {
        VoiceBuilder::new()
            .sample_rate(sample_rate)
            .buffer_length(buffer_length)
            .build()
    }

    /// Sample rate in Hz, fixed at creation.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The buffer length given at creation.
    pub fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Prior probabilities applied by [`Voice::extract`].
    pub fn prior(&self) -> EmotionProbabilities {
        self.prior
    }

    /// Frame and hop size in samples, `None` once destroyed.
    pub fn frame_geometry(&self) -> Option<(usize, usize)> {
        self.core
            .as_ref()
            .map(|c| (c.segmenter.frame_size(), c.segmenter.hop_size()))
    }

    /// Statistics accumulated since creation or the last reset.
    pub fn statistics(&self) -> Result<&RunningStatistics, VoiceError> {
        self.core
            .as_ref()
            .map(|c| &c.stats)
            .ok_or(VoiceError::UseAfterDestroy)
    }

    /// Replace the prior probabilities.
    ///
    /// Returns `Err(VoiceError::InvalidDistribution)`, leaving the prior
    /// unchanged, unless the values are non-negative and sum to 1.
    pub fn set_prior(&mut self, prior: EmotionProbabilities) -> Result<(), VoiceError> {
        let core = self.core.as_mut().ok_or(VoiceError::UseAfterDestroy)?;
        prior.validate()?;
        self.prior = prior;
        core.cached = None;
        Ok(())
    }

    /// Push samples in any supported encoding, arrays or single values.
    ///
    /// Complete frames are analyzed immediately; a trailing partial frame is
    /// kept for the next call.
    pub fn fill<'a>(&mut self, samples: impl Into<Samples<'a>>) -> Result<(), VoiceError> {
        let core = self.core.as_mut().ok_or(VoiceError::UseAfterDestroy)?;
        let samples: Samples<'a> = samples.into();
        let mut input = samples.normalized();
        core.feed(&mut input, &self.thresholds);
        self.state = SessionState::Filling;
        Ok(())
    }

    /// Produce the quality report and emotion probabilities.
    ///
    /// The result is cached until the next fill, prior change or reset.
    pub fn extract(&mut self) -> Result<(Quality, EmotionProbabilities), VoiceError> {
        let core = self.core.as_mut().ok_or(VoiceError::UseAfterDestroy)?;
        let result = match core.cached {
            Some(cached) => cached,
            None => {
                let quality = Quality::from_statistics(&core.stats, self.min_voiced_frames);
                let probabilities = emotion::score(&core.stats, &self.prior);
                debug!(
                    "extracted: valid {}, {} analyzed, {} lost, dominant {}",
                    quality.valid,
                    quality.num_frames_analyzed,
                    quality.num_frames_lost,
                    probabilities.dominant()
                );
                core.cached = Some((quality, probabilities));
                (quality, probabilities)
            }
        };
        self.state = SessionState::Extracted;
        Ok(result)
    }

    /// Clear statistics and buffered samples, keeping sample rate, buffer
    /// length, configuration and prior.
    pub fn reset(&mut self) -> Result<(), VoiceError> {
        let core = self.core.as_mut().ok_or(VoiceError::UseAfterDestroy)?;
        core.reset();
        self.state = SessionState::Created;
        debug!("voice reset");
        Ok(())
    }

    /// Release the session's buffers. Repeated calls do nothing.
    pub fn destroy(&mut self) {
        if self.core.take().is_some() {
            debug!("voice destroyed");
        }
        self.state = SessionState::Destroyed;
    }

    /// True once [`Voice::destroy`] has been called.
    pub fn is_destroyed(&self) -> bool {
        self.core.is_none()
    }
}

/// Split an interlaced stereo buffer (`L R L R ...`) between two sessions.
///
/// Both sessions are validated before either is touched, so the call either
/// advances both channels or neither.
///
/// Returns:
/// - `Err(UseAfterDestroy)` if either session is destroyed.
/// - `Err(MismatchedSessions)` if sample rates or frame geometry differ.
/// - `Err(InvalidParameter)` for a scalar or odd-length input.
pub fn fill_interlaced_stereo<'a>(
    left: &mut Voice,
    right: &mut Voice,
    samples: impl Into<Samples<'a>>,
) -> Result<(), VoiceError> {
    let (Some(left_geometry), Some(right_geometry)) =
        (left.frame_geometry(), right.frame_geometry())
    else {
        return Err(VoiceError::UseAfterDestroy);
    };
    if left.sample_rate != right.sample_rate {
        return Err(VoiceError::MismatchedSessions(format!(
            "sample rates differ: {} Hz vs {} Hz",
            left.sample_rate, right.sample_rate
        )));
    }
    if left_geometry != right_geometry {
        return Err(VoiceError::MismatchedSessions(format!(
            "frame/hop sizes differ: {left_geometry:?} vs {right_geometry:?}"
        )));
    }

    let samples: Samples<'a> = samples.into();
    let (left_channel, right_channel) =
        samples
            .deinterleave()
            .ok_or_else(|| VoiceError::InvalidParameter {
                arg: "samples",
                msg: "interlaced stereo needs an array with an even number of samples"
                    .to_string(),
            })?;

    left.fill(&left_channel)?;
    right.fill(&right_channel)?;
    Ok(())
}
