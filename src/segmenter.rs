//! Frame segmenter
//!
//! Slices a sample stream into fixed-size, possibly overlapping analysis frames.
//! Partial frames are carried across calls, so the frame boundaries depend only
//! on the concatenated stream and never on how it was chunked.

/// Streaming frame segmenter.
#[derive(Debug, Clone)]
pub struct Segmenter {
    frame_size: usize,
    hop_size: usize,
    buffer: Vec<f32>,
    emitted: bool,
}

impl Segmenter {
    /// Create a segmenter. Callers guarantee `1 <= hop_size <= frame_size`.
    pub fn new(frame_size: usize, hop_size: usize) -> Self {
        debug_assert!(hop_size >= 1 && hop_size <= frame_size);
        Segmenter {
            frame_size,
            hop_size,
            buffer: Vec::with_capacity(frame_size),
            emitted: false,
        }
    }

    /// Frame length in samples.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Distance between consecutive frame starts, in samples.
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Number of samples currently buffered toward the next frame.
    pub fn pending(&self) -> usize {
        if self.emitted {
            self.buffer.len() - self.hop_size
        } else {
            self.buffer.len()
        }
    }

    /// Pull samples from `input` until a full frame is available and return it.
    ///
    /// Returns `None` once `input` is exhausted; the partial frame stays buffered
    /// for the next call.
    pub fn next_frame<I>(&mut self, input: &mut I) -> Option<&[f32]>
    where
        I: Iterator<Item = f32>,
    {
        if self.emitted {
            self.buffer.drain(..self.hop_size);
            self.emitted = false;
        }
        while self.buffer.len() < self.frame_size {
            self.buffer.push(input.next()?);
        }
        self.emitted = true;
        Some(&self.buffer)
    }

    /// Drop all buffered samples.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.emitted = false;
    }
}
