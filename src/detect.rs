//! File detection
//!
//! Decode an audio file with symphonia, run it through a single session and
//! report the emotion probabilities by label.

use std::{collections::BTreeMap, fs::File, path::Path};

use log::{debug, warn};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::DecoderOptions,
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::{MediaSourceStream, MediaSourceStreamOptions},
    meta::MetadataOptions,
    probe::Hint,
};

use crate::{engine::Engine, voice::VoiceError};

/// Emotion probabilities keyed by label, e.g. `"emotion-happy"`.
pub type EmotionLabels = BTreeMap<&'static str, f64>;

/// Decoded audio, down-mixed to mono.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count of the source.
    pub channels: usize,
    /// Mono samples; multichannel input is averaged per frame.
    pub samples: Vec<f32>,
}

fn decode_error(context: &str, err: impl std::fmt::Display) -> VoiceError {
    VoiceError::DecodeFailure(format!("{context}: {err}"))
}

/// Decode the default audio track of a file into mono `f32` samples.
///
/// Returns `Err(VoiceError::DecodeFailure)` if the file cannot be opened,
/// probed or decoded.
pub fn decode_file(path: impl AsRef<Path>) -> Result<DecodedAudio, VoiceError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| decode_error(&format!("cannot open {}", path.display()), e))?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_error("unsupported format", e))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| VoiceError::DecodeFailure("no default audio track".to_string()))?;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| VoiceError::DecodeFailure("unknown sample rate".to_string()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error("unsupported codec", e))?;

    let mut channels = track
        .codec_params
        .channels
        .map_or(1, symphonia::core::audio::Channels::count);
    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(decode_error("read error", e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("skipping undecodable packet: {e}");
                continue;
            }
            Err(e) => return Err(decode_error("decode error", e)),
        };

        let spec = *decoded.spec();
        channels = spec.channels.count().max(1);
        let frames = decoded.capacity();
        // Reuse the buffer unless this packet is larger than any before it.
        if sample_buf
            .as_ref()
            .is_none_or(|b| b.capacity() < frames * channels)
        {
            sample_buf = Some(SampleBuffer::<f32>::new(frames as u64, spec));
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        for frame in buf.samples().chunks(channels) {
            samples.push(frame.iter().sum::<f32>() / channels as f32);
        }
    }

    if samples.is_empty() {
        return Err(VoiceError::DecodeFailure(format!(
            "no audio decoded from {}",
            path.display()
        )));
    }
    debug!(
        "decoded {}: {} Hz, {} channel(s), {} samples",
        path.display(),
        sample_rate,
        channels,
        samples.len()
    );

    Ok(DecodedAudio {
        sample_rate,
        channels,
        samples,
    })
}

/// Detect the emotion in an audio file.
///
/// Returns `Ok(None)` when the recording holds too little voiced signal for
/// a valid result.
pub fn detect(path: impl AsRef<Path>) -> Result<Option<EmotionLabels>, VoiceError> {
    detect_with(&mut Engine::init(), path)
}

/// Like [`detect`], reusing an existing engine.
pub fn detect_with(
    engine: &mut Engine,
    path: impl AsRef<Path>,
) -> Result<Option<EmotionLabels>, VoiceError> {
    let audio = decode_file(path)?;
    let mut voice = engine.create_voice(audio.sample_rate as f64, audio.samples.len())?;
    voice.fill(&audio.samples)?;
    let (quality, probabilities) = voice.extract()?;
    voice.destroy();

    if !quality.valid {
        return Ok(None);
    }
    Ok(Some(probabilities.labels().collect()))
}
