//! Quality report
//!
//! Validity judgment and frame counts attached to every extraction.

use crate::statistics::RunningStatistics;

/// Default number of voiced frames required for a valid result.
pub const DEFAULT_MIN_VOICED_FRAMES: u64 = 5;

/// How much usable signal an extraction was based on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Quality {
    /// Enough voiced frames were analyzed for the probabilities to be meaningful.
    pub valid: bool,
    /// Frames classified as voiced.
    pub num_frames_analyzed: u64,
    /// Frames classified as lost.
    pub num_frames_lost: u64,
}

impl Quality {
    /// Summarize `stats` against the `min_voiced_frames` threshold.
    pub fn from_statistics(stats: &RunningStatistics, min_voiced_frames: u64) -> Self {
        Quality {
            valid: stats.voiced_frame_count >= min_voiced_frames,
            num_frames_analyzed: stats.voiced_frame_count,
            num_frames_lost: stats.lost_frame_count,
        }
    }
}
