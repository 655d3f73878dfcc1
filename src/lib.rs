//! # voice_emotion
//!
//! A streaming voice analysis crate: feed audio samples into a session, let it
//! track pitch, energy and spectral stability frame by frame, and extract a
//! probability distribution over five emotions together with a quality report.
//!
//! ## Example
//! ```rust
//! use voice_emotion::{Engine, EmotionProbabilities};
//!
//! fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1) Initialize the engine once
//!     let mut engine = Engine::init();
//!
//!     // 2) Create a session for 16 kHz audio
//!     let mut voice = engine.create_voice(16_000.0, 16_000)?;
//!     voice.set_prior(EmotionProbabilities::uniform())?;
//!
//!     // 3) In your audio loop, push chunks in any supported encoding:
//!     let chunk: Vec<i16> = vec![0; 1_600]; // fill with actual samples
//!     voice.fill(&chunk)?;
//!
//!     // 4) Extract whenever a result is needed
//!     let (quality, probabilities) = voice.extract()?;
//!     if quality.valid {
//!         println!("dominant emotion: {}", probabilities.dominant());
//!     } else {
//!         println!("only {} voiced frames", quality.num_frames_analyzed);
//!     }
//!
//!     // 5) Reuse for another stream, or release it
//!     voice.reset()?;
//!     voice.destroy();
//!     Ok(())
//! }
//! # run().unwrap();
//! ```
//!
//! ## Features
//! - `decode`: enables `detect::detect`, which decodes an audio file via
//!   `symphonia` and returns labeled probabilities

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

/// Session API.
pub use voice::{fill_interlaced_stereo, SessionState, Voice, VoiceBuilder, VoiceError};

/// Engine initialization and version information.
pub use engine::{version_and_license, Engine, VERSION_AND_LICENSE};

/// Emotion taxonomy and scoring.
pub use emotion::{Cues, Emotion, EmotionProbabilities, EMOTIONS};

/// Extraction quality report.
pub use report::Quality;

/// Accepted sample encodings.
pub use samples::{Normalized, Sample, Samples};

/// Per-frame analysis building blocks.
pub use classifier::{FrameClass, LostReason, Thresholds};
pub use features::{FeatureExtractor, Features};
pub use segmenter::Segmenter;
pub use statistics::{RunningStat, RunningStatistics};

/// Frame quality classification module.
pub mod classifier;

/// Emotion model module.
pub mod emotion;

/// Engine module.
pub mod engine;

/// Feature extraction module.
pub mod features;

/// Quality report module.
pub mod report;

/// Sample encoding module.
pub mod samples;

/// Frame segmentation module.
pub mod segmenter;

/// Running statistics module.
pub mod statistics;

/// Voice session module.
pub mod voice;

/// Audio file decoding and one-shot detection.
#[cfg(feature = "decode")]
pub mod detect;
