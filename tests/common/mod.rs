//! Synthetic test signals shared by the integration tests.

#![allow(dead_code)]

use std::f32::consts::PI;

pub const RATE: f32 = 16_000.0;

/// Pure tone.
pub fn sine(freq: f32, amp: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| amp * (2.0 * PI * freq * i as f32 / RATE).sin())
        .collect()
}

/// Tone whose frequency swings sinusoidally by `depth` (fraction of `freq`).
pub fn vibrato(freq: f32, depth: f32, rate_hz: f32, amp: f32, len: usize) -> Vec<f32> {
    let mut phase = 0.0f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / RATE;
            let f = freq * (1.0 + depth * (2.0 * PI * rate_hz * t).sin());
            phase += 2.0 * PI * f / RATE;
            if phase > 2.0 * PI {
                phase -= 2.0 * PI;
            }
            amp * phase.sin()
        })
        .collect()
}

/// Uniform white noise in `[-amp, amp]` from a fixed-seed LCG.
pub fn noise(amp: f32, len: usize, seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_add(1_442_695_040_888_963_407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            amp * (((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0)
        })
        .collect()
}

/// Harmonic "syllables" with a drifting pitch, separated by low noise gaps.
pub fn speech_like(len: usize) -> Vec<f32> {
    let hiss = noise(0.002, len, 99);
    let mut phase = 0.0f32;
    (0..len)
        .map(|i| {
            let t = i as f32 / RATE;
            let f0 = 160.0 + 40.0 * (2.0 * PI * 0.7 * t).sin();
            phase += 2.0 * PI * f0 / RATE;
            if phase > 2.0 * PI {
                phase -= 2.0 * PI;
            }
            let syllable = (2.0 * PI * 2.5 * t).sin().max(0.0);
            let voiced: f32 = (1..=5)
                .map(|k| (k as f32 * phase).sin() / k as f32)
                .sum();
            0.3 * syllable * voiced + hiss[i]
        })
        .collect()
}

/// `L R L R ...` interleaving of two equally long channels.
pub fn interleave<T: Copy>(left: &[T], right: &[T]) -> Vec<T> {
    left.iter()
        .zip(right)
        .flat_map(|(&l, &r)| [l, r])
        .collect()
}

pub fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * 32_767.0) as i16)
        .collect()
}
