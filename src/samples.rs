//! Sample encodings
//!
//! Tagged input accepted by [`Voice::fill`](crate::Voice::fill): slices or single
//! values in one of four numeric encodings, normalized to `f32` in `[-1, 1]`.

/// Full-scale divisor for 16-bit integer samples.
const I16_SCALE: f32 = 32_768.0;

/// Full-scale divisor for 32-bit integer samples.
const I32_SCALE: f64 = 2_147_483_648.0;

/// A single sample in one of the supported encodings.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Sample {
    /// 64-bit float, nominally in `[-1, 1]`.
    F64(f64),
    /// 32-bit float, nominally in `[-1, 1]`.
    F32(f32),
    /// 32-bit signed integer PCM.
    I32(i32),
    /// 16-bit signed integer PCM.
    I16(i16),
}

impl Sample {
    /// Convert to the internal `f32` representation.
    #[inline]
    pub fn normalize(self) -> f32 {
        match self {
            Sample::F64(v) => v as f32,
            Sample::F32(v) => v,
            Sample::I32(v) => (v as f64 / I32_SCALE) as f32,
            Sample::I16(v) => v as f32 / I16_SCALE,
        }
    }
}

/// A chunk of samples borrowed from the caller.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Samples<'a> {
    /// Array of 64-bit floats.
    F64(&'a [f64]),
    /// Array of 32-bit floats.
    F32(&'a [f32]),
    /// Array of 32-bit integers.
    I32(&'a [i32]),
    /// Array of 16-bit integers.
    I16(&'a [i16]),
    /// One scalar value.
    Value(Sample),
}

impl<'a> Samples<'a> {
    /// Number of samples in the chunk.
    pub fn len(&self) -> usize {
        match self {
            Samples::F64(s) => s.len(),
            Samples::F32(s) => s.len(),
            Samples::I32(s) => s.len(),
            Samples::I16(s) => s.len(),
            Samples::Value(_) => 1,
        }
    }

    /// True when the chunk holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the chunk as normalized `f32` samples.
    pub fn normalized(self) -> Normalized<'a> {
        let inner = match self {
            Samples::F64(s) => Inner::F64(s.iter()),
            Samples::F32(s) => Inner::F32(s.iter()),
            Samples::I32(s) => Inner::I32(s.iter()),
            Samples::I16(s) => Inner::I16(s.iter()),
            Samples::Value(v) => Inner::Value(Some(v)),
        };
        Normalized { inner }
    }

    /// Split an interlaced stereo chunk (`L R L R ...`) into two normalized channels.
    ///
    /// Returns `None` for scalar input or an odd number of samples.
    pub fn deinterleave(self) -> Option<(Vec<f32>, Vec<f32>)> {
        if matches!(self, Samples::Value(_)) || self.len() % 2 != 0 {
            return None;
        }
        let per_channel = self.len() / 2;
        let mut left = Vec::with_capacity(per_channel);
        let mut right = Vec::with_capacity(per_channel);
        for (i, s) in self.normalized().enumerate() {
            if i % 2 == 0 {
                left.push(s);
            } else {
                right.push(s);
            }
        }
        Some((left, right))
    }
}

/// Iterator over a [`Samples`] chunk, yielding normalized `f32` values.
#[derive(Debug, Clone)]
pub struct Normalized<'a> {
    inner: Inner<'a>,
}

#[derive(Debug, Clone)]
enum Inner<'a> {
    F64(std::slice::Iter<'a, f64>),
    F32(std::slice::Iter<'a, f32>),
    I32(std::slice::Iter<'a, i32>),
    I16(std::slice::Iter<'a, i16>),
    Value(Option<Sample>),
}

impl Iterator for Normalized<'_> {
    type Item = f32;

    #[inline]
    fn next(&mut self) -> Option<f32> {
        match &mut self.inner {
            Inner::F64(it) => it.next().map(|&v| Sample::F64(v).normalize()),
            Inner::F32(it) => it.next().copied(),
            Inner::I32(it) => it.next().map(|&v| Sample::I32(v).normalize()),
            Inner::I16(it) => it.next().map(|&v| Sample::I16(v).normalize()),
            Inner::Value(v) => v.take().map(Sample::normalize),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Inner::F64(it) => it.size_hint(),
            Inner::F32(it) => it.size_hint(),
            Inner::I32(it) => it.size_hint(),
            Inner::I16(it) => it.size_hint(),
            Inner::Value(v) => {
                let n = usize::from(v.is_some());
                (n, Some(n))
            }
        }
    }
}

impl ExactSizeIterator for Normalized<'_> {}

impl<'a> From<&'a [f64]> for Samples<'a> {
    fn from(s: &'a [f64]) -> Self {
        Samples::F64(s)
    }
}

impl<'a> From<&'a [f32]> for Samples<'a> {
    fn from(s: &'a [f32]) -> Self {
        Samples::F32(s)
    }
}

impl<'a> From<&'a [i32]> for Samples<'a> {
    fn from(s: &'a [i32]) -> Self {
        Samples::I32(s)
    }
}

impl<'a> From<&'a [i16]> for Samples<'a> {
    fn from(s: &'a [i16]) -> Self {
        Samples::I16(s)
    }
}

impl<'a> From<&'a Vec<f64>> for Samples<'a> {
    fn from(s: &'a Vec<f64>) -> Self {
        Samples::F64(s)
    }
}

impl<'a> From<&'a Vec<f32>> for Samples<'a> {
    fn from(s: &'a Vec<f32>) -> Self {
        Samples::F32(s)
    }
}

impl<'a> From<&'a Vec<i32>> for Samples<'a> {
    fn from(s: &'a Vec<i32>) -> Self {
        Samples::I32(s)
    }
}

impl<'a> From<&'a Vec<i16>> for Samples<'a> {
    fn from(s: &'a Vec<i16>) -> Self {
        Samples::I16(s)
    }
}

impl From<Sample> for Samples<'static> {
    fn from(v: Sample) -> Self {
        Samples::Value(v)
    }
}

impl From<f64> for Samples<'static> {
    fn from(v: f64) -> Self {
        Samples::Value(Sample::F64(v))
    }
}

impl From<f32> for Samples<'static> {
    fn from(v: f32) -> Self {
        Samples::Value(Sample::F32(v))
    }
}

impl From<i32> for Samples<'static> {
    fn from(v: i32) -> Self {
        Samples::Value(Sample::I32(v))
    }
}

impl From<i16> for Samples<'static> {
    fn from(v: i16) -> Self {
        Samples::Value(Sample::I16(v))
    }
}
