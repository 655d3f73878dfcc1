//! Engine
//!
//! One-time initialization shared by sessions: FFT plans are created once per
//! frame size and handed to every voice built through the engine. Sessions
//! only share those read-only plans, never mutable state, and they outlive the
//! engine that created them.

use log::debug;
use rustfft::FftPlanner;

use crate::voice::{Voice, VoiceBuilder, VoiceError};

/// Crate name, version and license.
pub const VERSION_AND_LICENSE: &str = concat!(
    env!("CARGO_PKG_NAME"),
    " ",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_LICENSE"),
    ")"
);

/// Version and license of this library.
pub fn version_and_license() -> &'static str {
    VERSION_AND_LICENSE
}

/// Session factory holding the shared FFT planner.
pub struct Engine {
    planner: FftPlanner<f32>,
    voices_created: u64,
}

impl Engine {
    /// Initialize the engine.
    pub fn init() -> Self {
        debug!("engine initialized: {VERSION_AND_LICENSE}");
        Engine {
            planner: FftPlanner::new(),
            voices_created: 0,
        }
    }

    /// Create a session with default analysis parameters.
    ///
    /// Returns `Err(VoiceError::InvalidParameter)` if `sample_rate` is not a
    /// positive, finite number or is too low to analyze.
    pub fn create_voice(
        &mut self,
        sample_rate: f64,
        buffer_length: usize,
    ) -> Result<Voice, VoiceError> {
        self.build_voice(
            VoiceBuilder::new()
                .sample_rate(sample_rate)
                .buffer_length(buffer_length),
        )
    }

    /// Create a session from a customized builder.
    pub fn build_voice(&mut self, builder: VoiceBuilder) -> Result<Voice, VoiceError> {
        let voice = builder.build_with(&mut self.planner)?;
        self.voices_created += 1;
        Ok(voice)
    }

    /// Number of sessions created so far.
    pub fn voices_created(&self) -> u64 {
        self.voices_created
    }

    /// Tear the engine down. Sessions already created stay usable.
    pub fn shutdown(self) {
        debug!("engine shut down after {} voices", self.voices_created);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_names_the_crate() {
        assert!(version_and_license().starts_with("voice_emotion "));
        assert!(version_and_license().contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn voices_outlive_the_engine() {
        let mut engine = Engine::init();
        let mut voice = engine.create_voice(16_000.0, 0).unwrap();
        assert!(engine.create_voice(0.0, 0).is_err());
        assert_eq!(engine.voices_created(), 1);
        engine.shutdown();
        voice.fill(&vec![0.0f32; 1600]).unwrap();
        assert_eq!(voice.statistics().unwrap().frame_count, 4);
    }
}
