//! Integration tests for the session lifecycle, input encodings and stereo fill.

mod common;

use common::{interleave, sine, speech_like, to_i16, RATE};
use lazy_static::lazy_static;
use voice_emotion::{
    fill_interlaced_stereo, EmotionProbabilities, Sample, SessionState, Voice, VoiceError,
};

lazy_static! {
    static ref SPEECH: Vec<f32> = speech_like(3 * RATE as usize);
    static ref TONE: Vec<f32> = sine(220.0, 0.5, RATE as usize);
}

fn voice() -> Voice {
    Voice::new(RATE as f64, SPEECH.len()).unwrap()
}

#[test]
fn create_rejects_bad_sample_rates() {
    for rate in [
        0.0,
        -16_000.0,
        f64::NAN,
        f64::INFINITY,
        500.0,
        768_001.0,
        1e300,
    ] {
        assert!(
            matches!(
                Voice::new(rate, 0),
                Err(VoiceError::InvalidParameter { .. })
            ),
            "sample rate {rate} should be rejected"
        );
    }
}

#[test]
fn builder_validates_configuration() {
    let invalid = [
        Voice::builder().hop_size(0).build(),
        Voice::builder().frame_size(512).hop_size(1024).build(),
        Voice::builder().frame_size(8).build(),
        Voice::builder().frame_size(usize::MAX).build(),
        Voice::builder().min_voiced_frames(0).build(),
        Voice::builder().clipping_threshold(1.5).build(),
        Voice::builder().noise_floor_margin(0.5).build(),
        Voice::builder().buffer_length(i32::MAX as usize + 1).build(),
    ];
    for result in invalid {
        assert!(matches!(result, Err(VoiceError::InvalidParameter { .. })));
    }

    let prior = EmotionProbabilities::from_array([0.5, 0.5, 0.5, 0.0, 0.0]);
    assert!(matches!(
        Voice::builder().prior(prior).build(),
        Err(VoiceError::InvalidDistribution { .. })
    ));

    let v = Voice::builder()
        .sample_rate(8_000.0)
        .frame_size(256)
        .build()
        .unwrap();
    assert_eq!(v.frame_geometry(), Some((256, 128)));
}

#[test]
fn frame_must_cover_shortest_pitch_lag() {
    // 16 kHz / 500 Hz gives a 32-sample lag, so 35 samples is the shortest frame.
    for size in [32, 33, 34] {
        assert!(
            matches!(
                Voice::builder().sample_rate(RATE as f64).frame_size(size).build(),
                Err(VoiceError::InvalidParameter { arg: "frame_size", .. })
            ),
            "frame of {size} samples should be rejected"
        );
    }

    let mut v = Voice::builder()
        .sample_rate(RATE as f64)
        .frame_size(35)
        .build()
        .unwrap();
    v.fill(&TONE[..1600]).unwrap();
    let (quality, _) = v.extract().unwrap();
    assert!(quality.num_frames_analyzed + quality.num_frames_lost > 0);

    let top = Voice::builder().sample_rate(768_000.0).build().unwrap();
    assert_eq!(top.frame_geometry(), Some((30_720, 15_360)));
}

#[test]
fn chunked_fill_matches_single_fill() {
    let mut whole = voice();
    whole.fill(&SPEECH[..]).unwrap();
    let expected = whole.extract().unwrap();

    let mut streamed = voice();
    let sizes = [1usize, 17, 333, 1024, 4096, 5];
    let mut offset = 0;
    let mut i = 0;
    while offset < SPEECH.len() {
        let end = (offset + sizes[i % sizes.len()]).min(SPEECH.len());
        let chunk = &SPEECH[offset..end];
        if chunk.len() == 1 {
            streamed.fill(Sample::F32(chunk[0])).unwrap();
        } else {
            streamed.fill(chunk).unwrap();
        }
        offset = end;
        i += 1;
    }

    assert_eq!(streamed.extract().unwrap(), expected);
    assert_eq!(streamed.statistics().unwrap(), whole.statistics().unwrap());
}

#[test]
fn encodings_normalize_identically() {
    let f32_samples = &TONE[..];
    let f64_samples: Vec<f64> = f32_samples.iter().map(|&s| s as f64).collect();
    let i16_samples = to_i16(f32_samples);
    let i32_samples: Vec<i32> = i16_samples.iter().map(|&s| (s as i32) << 16).collect();

    let mut a = voice();
    a.fill(f32_samples).unwrap();
    let mut b = voice();
    b.fill(&f64_samples).unwrap();
    assert_eq!(a.extract().unwrap(), b.extract().unwrap());

    let mut c = voice();
    c.fill(&i16_samples).unwrap();
    let mut d = voice();
    d.fill(&i32_samples).unwrap();
    assert_eq!(c.extract().unwrap(), d.extract().unwrap());

    let mut e = voice();
    for &s in &i16_samples {
        e.fill(s).unwrap();
    }
    assert_eq!(e.extract().unwrap(), c.extract().unwrap());
}

#[test]
fn extract_is_cached_until_next_fill() {
    let mut v = voice();
    assert_eq!(v.state(), SessionState::Created);
    v.fill(&SPEECH[..RATE as usize]).unwrap();
    assert_eq!(v.state(), SessionState::Filling);

    let first = v.extract().unwrap();
    let second = v.extract().unwrap();
    assert_eq!(first, second);
    assert_eq!(v.state(), SessionState::Extracted);

    v.fill(&SPEECH[RATE as usize..]).unwrap();
    assert_eq!(v.state(), SessionState::Filling);
    let (quality, _) = v.extract().unwrap();
    assert!(
        quality.num_frames_analyzed + quality.num_frames_lost
            > first.0.num_frames_analyzed + first.0.num_frames_lost
    );
}

#[test]
fn reset_reproduces_previous_result() {
    let mut v = voice();
    v.fill(&SPEECH[..]).unwrap();
    let before = v.extract().unwrap();

    v.reset().unwrap();
    assert_eq!(v.state(), SessionState::Created);
    assert_eq!(v.statistics().unwrap().frame_count, 0);

    v.fill(&SPEECH[..]).unwrap();
    assert_eq!(v.extract().unwrap(), before);

    let mut fresh = voice();
    fresh.fill(&SPEECH[..]).unwrap();
    assert_eq!(fresh.extract().unwrap(), before);
}

#[test]
fn reset_keeps_configuration_and_prior() {
    let prior = EmotionProbabilities::from_array([0.4, 0.3, 0.1, 0.1, 0.1]);
    let mut v = voice();
    v.set_prior(prior).unwrap();
    v.fill(&TONE[..]).unwrap();
    v.reset().unwrap();
    assert_eq!(v.prior(), prior);
    assert_eq!(v.sample_rate(), RATE as f64);
    assert_eq!(v.buffer_length(), SPEECH.len());
    assert_eq!(v.frame_geometry(), Some((640, 320)));
}

#[test]
fn destroyed_voice_rejects_everything() {
    let mut v = voice();
    v.fill(&TONE[..]).unwrap();
    v.destroy();
    assert_eq!(v.state(), SessionState::Destroyed);
    assert!(v.is_destroyed());

    assert!(matches!(v.fill(&TONE[..]), Err(VoiceError::UseAfterDestroy)));
    assert!(matches!(v.fill(0.25f64), Err(VoiceError::UseAfterDestroy)));
    assert!(matches!(v.extract(), Err(VoiceError::UseAfterDestroy)));
    assert!(matches!(v.reset(), Err(VoiceError::UseAfterDestroy)));
    assert!(matches!(v.statistics(), Err(VoiceError::UseAfterDestroy)));
    assert!(matches!(
        v.set_prior(EmotionProbabilities::uniform()),
        Err(VoiceError::UseAfterDestroy)
    ));

    v.destroy();
    assert_eq!(v.state(), SessionState::Destroyed);
}

#[test]
fn invalid_prior_leaves_prior_unchanged() {
    let mut v = voice();
    let ones = EmotionProbabilities::from_array([1.0; 5]);
    assert!(matches!(
        v.set_prior(ones),
        Err(VoiceError::InvalidDistribution { .. })
    ));
    assert_eq!(v.prior(), EmotionProbabilities::uniform());

    let skewed = EmotionProbabilities::from_array([0.1, 0.1, 0.1, 0.6, 0.1]);
    v.set_prior(skewed).unwrap();
    assert_eq!(v.prior(), skewed);
}

#[test]
fn changing_prior_invalidates_cached_result() {
    let mut v = voice();
    v.fill(&TONE[..]).unwrap();
    let (_, uniform) = v.extract().unwrap();
    v.set_prior(EmotionProbabilities::from_array([0.02, 0.02, 0.02, 0.92, 0.02]))
        .unwrap();
    let (_, biased) = v.extract().unwrap();
    assert!(biased.anger > uniform.anger);
}

#[test]
fn stereo_fill_matches_separate_fills() {
    let left_signal = to_i16(&SPEECH[..]);
    let right_signal = to_i16(&sine(180.0, 0.3, SPEECH.len()));
    let stereo = interleave(&left_signal, &right_signal);

    let mut left = voice();
    let mut right = voice();
    for chunk in stereo.chunks(2 * 777) {
        fill_interlaced_stereo(&mut left, &mut right, chunk).unwrap();
    }

    let mut left_alone = voice();
    left_alone.fill(&left_signal).unwrap();
    let mut right_alone = voice();
    right_alone.fill(&right_signal).unwrap();

    assert_eq!(left.statistics().unwrap(), left_alone.statistics().unwrap());
    assert_eq!(right.statistics().unwrap(), right_alone.statistics().unwrap());
    assert_eq!(left.extract().unwrap(), left_alone.extract().unwrap());
    assert_eq!(right.extract().unwrap(), right_alone.extract().unwrap());
}

#[test]
fn stereo_fill_is_all_or_nothing() {
    let stereo = interleave(&TONE[..], &TONE[..]);

    let mut left = voice();
    let mut other_rate = Voice::new(22_050.0, 0).unwrap();
    assert!(matches!(
        fill_interlaced_stereo(&mut left, &mut other_rate, &stereo),
        Err(VoiceError::MismatchedSessions(_))
    ));
    assert_eq!(left.state(), SessionState::Created);
    assert_eq!(left.statistics().unwrap().frame_count, 0);

    let mut other_frames = Voice::builder().frame_size(1024).build().unwrap();
    assert!(matches!(
        fill_interlaced_stereo(&mut left, &mut other_frames, &stereo),
        Err(VoiceError::MismatchedSessions(_))
    ));

    let mut right = voice();
    right.destroy();
    assert!(matches!(
        fill_interlaced_stereo(&mut left, &mut right, &stereo),
        Err(VoiceError::UseAfterDestroy)
    ));
    assert_eq!(left.statistics().unwrap().frame_count, 0);

    let mut right = voice();
    assert!(matches!(
        fill_interlaced_stereo(&mut left, &mut right, &stereo[..stereo.len() - 1]),
        Err(VoiceError::InvalidParameter { .. })
    ));
    assert!(matches!(
        fill_interlaced_stereo(&mut left, &mut right, 0.5f32),
        Err(VoiceError::InvalidParameter { .. })
    ));
    assert_eq!(left.statistics().unwrap().frame_count, 0);
    assert_eq!(right.statistics().unwrap().frame_count, 0);
}
