use alloc::{vec, vec::Vec};

use crate::{Layout, Sample};

/// Planar history of the most recent input samples of every channel.
///
/// Channel `c` lives at `buffer[c * stride..c * stride + samples_avail]`. The stride only grows,
/// so steady-state streaming with a constant chunk size never reallocates.
pub(crate) struct SampleHistory<T> {
    buffer: Vec<T>,
    stride: usize,
    channels: usize,
    samples_avail: usize,
}

impl<T: Sample> SampleHistory<T> {
    pub(crate) fn new(channels: usize) -> Self {
        Self {
            buffer: Vec::new(),
            stride: 0,
            channels,
            samples_avail: 0,
        }
    }

    /// Number of buffered frames per channel.
    #[inline]
    pub(crate) fn samples_avail(&self) -> usize {
        self.samples_avail
    }

    /// Drops all samples and prefills every channel with `frames` zeros.
    pub(crate) fn reset(&mut self, frames: usize) {
        self.reserve(frames);
        self.samples_avail = frames;
        for channel in 0..self.channels {
            let start = channel * self.stride;
            self.buffer[start..start + frames].fill(T::default());
        }
    }

    /// Makes room for `needed` frames per channel, keeping the buffered samples.
    fn reserve(&mut self, needed: usize) {
        if needed <= self.stride {
            return;
        }

        let mut buffer = vec![T::default(); needed * self.channels];
        for channel in 0..self.channels {
            let old = channel * self.stride;
            let new = channel * needed;
            buffer[new..new + self.samples_avail]
                .copy_from_slice(&self.buffer[old..old + self.samples_avail]);
        }

        self.buffer = buffer;
        self.stride = needed;
    }

    /// Appends `frames` frames to every channel.
    ///
    /// `input` must already be validated against `layout`: one slice of at least
    /// `frames * channels` interleaved samples, or one slice of at least `frames` samples per
    /// channel. `None` appends silence.
    pub(crate) fn append(&mut self, input: Option<&[&[T]]>, layout: Layout, frames: usize) {
        if frames == 0 {
            return;
        }
        self.reserve(self.samples_avail + frames);

        let channels = self.channels;
        for channel in 0..channels {
            let start = channel * self.stride + self.samples_avail;
            let target = &mut self.buffer[start..start + frames];

            match (input, layout) {
                (None, _) => target.fill(T::default()),
                (Some(input), Layout::Interleaved) => {
                    let source = input[0].iter().skip(channel).step_by(channels);
                    for (sample, &value) in target.iter_mut().zip(source) {
                        *sample = value;
                    }
                }
                (Some(input), Layout::Planar) => {
                    target.copy_from_slice(&input[channel][..frames]);
                }
            }
        }

        self.samples_avail += frames;
    }

    /// Fills the `pad` frames in front of the first real sample with its point reflection.
    ///
    /// The first real sample sits at index `pad` and is left untouched:
    /// `s[pad - k] = 2 * s[pad] - s[pad + k]`.
    pub(crate) fn mirror(&mut self, pad: usize) {
        debug_assert!(self.samples_avail > 2 * pad);

        for channel in 0..self.channels {
            let samples = &mut self.buffer[channel * self.stride..];
            let pivot = samples[pad];
            for k in 1..=pad {
                samples[pad - k] = T::reflect(pivot, samples[pad + k]);
            }
        }
    }

    /// The buffered samples of one channel.
    #[inline]
    pub(crate) fn channel(&self, channel: usize) -> &[T] {
        let start = channel * self.stride;
        &self.buffer[start..start + self.samples_avail]
    }

    /// Discards the oldest `frames` frames of every channel.
    ///
    /// Returns how many frames past the buffered samples were requested; those have to be
    /// skipped once they arrive.
    pub(crate) fn consume(&mut self, frames: usize) -> usize {
        if frames >= self.samples_avail {
            let overshoot = frames - self.samples_avail;
            self.samples_avail = 0;
            return overshoot;
        }

        let left = self.samples_avail - frames;
        for channel in 0..self.channels {
            let start = channel * self.stride;
            self.buffer
                .copy_within(start + frames..start + self.samples_avail, start);
        }
        self.samples_avail = left;

        0
    }
}
