use crate::{
    Layout, Method, ResampleError, Sample, SampleFormat,
    fir::InnerProductFn,
    history::SampleHistory,
    planner::{FilterSpec, RationalRate, ResamplerOptions},
    taps::TapCache,
};

/// Writes `frames` output frames in the configured layout.
type ResampleFn<T> = fn(&mut Resampler<T>, &mut [&mut [T]], usize);

/// A streaming polyphase resampler for one sample type.
///
/// The sample format is selected by the type parameter: `Resampler<f64>`, `Resampler<f32>`,
/// `Resampler<i32>` or `Resampler<i16>`. Input and output positions are tracked with integer
/// arithmetic only, so the output timing never drifts, no matter how long the stream runs or
/// how it is split into chunks.
pub struct Resampler<T: Sample> {
    method: Method,
    layout: Layout,
    channels: usize,
    options: ResamplerOptions,
    rate: RationalRate,
    spec: FilterSpec,
    taps: TapCache<T>,
    history: SampleHistory<T>,
    inner_product: InnerProductFn<T>,
    resample_fn: ResampleFn<T>,
    /// Index of the first history sample of the next output frame.
    samp_index: usize,
    /// Filter phase of the next output frame.
    samp_phase: usize,
    /// Input frames to drop before they enter the history.
    skip: usize,
    /// Whether the history still waits for its mirror padding.
    filling: bool,
}

impl<T: Sample> Resampler<T> {
    /// Create a new [`Resampler`].
    ///
    /// Parameters:
    /// - `method`: The interpolation kernel.
    /// - `layout`: Whether the buffers passed to [`Resampler::resample`] are interleaved or
    ///   hold one slice per channel.
    /// - `channels`: The channel count.
    /// - `in_rate`: Input sample rate.
    /// - `out_rate`: Output sample rate.
    /// - `options`: Filter options. Unset options use the defaults of the method, see
    ///   [`ResamplerOptions::from_quality`] to derive them from a quality level.
    ///
    /// Both rates are reduced by their greatest common divisor, so only their ratio matters.
    ///
    /// # Example
    ///
    /// ```rust
    /// use audio_resampler::{Layout, Method, Resampler, ResamplerOptions};
    ///
    /// let resampler = Resampler::<f32>::new(
    ///     Method::Kaiser,
    ///     Layout::Interleaved,
    ///     2,
    ///     48000,
    ///     44100,
    ///     ResamplerOptions::default(),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(resampler.in_rate(), 160);
    /// assert_eq!(resampler.out_rate(), 147);
    /// ```
    pub fn new(
        method: Method,
        layout: Layout,
        channels: usize,
        in_rate: u32,
        out_rate: u32,
        options: ResamplerOptions,
    ) -> Result<Self, ResampleError> {
        if channels == 0 {
            return Err(ResampleError::InvalidChannelCount);
        }
        let rate = RationalRate::new(in_rate, out_rate)?;
        options.validate()?;

        let spec = FilterSpec::design(method, rate, &options)?;
        let taps = TapCache::new(spec.kernel(method), spec.n_taps, rate);

        let resample_fn: ResampleFn<T> = match layout {
            Layout::Interleaved => resample_interleaved,
            Layout::Planar => resample_planar,
        };

        let mut resampler = Self {
            method,
            layout,
            channels,
            options,
            rate,
            spec,
            taps,
            history: SampleHistory::new(channels),
            inner_product: T::inner_product(),
            resample_fn,
            samp_index: 0,
            samp_phase: 0,
            skip: 0,
            filling: true,
        };
        resampler.log_configuration();
        resampler.reset();

        Ok(resampler)
    }

    /// Changes the conversion rates and, if given, replaces the options wholesale.
    ///
    /// Everything is validated before the resampler is touched, so on error the resampler
    /// keeps working with its previous configuration. An update that neither changes the
    /// reduced rate nor the options keeps the stream running. Any other update rebuilds the
    /// filter and starts a new stream, as if [`Resampler::reset`] was called.
    pub fn update(
        &mut self,
        in_rate: u32,
        out_rate: u32,
        options: Option<ResamplerOptions>,
    ) -> Result<(), ResampleError> {
        let rate = RationalRate::new(in_rate, out_rate)?;
        let options = options.unwrap_or(self.options);
        options.validate()?;

        if rate == self.rate && options == self.options {
            return Ok(());
        }

        let spec = FilterSpec::design(self.method, rate, &options)?;
        self.rate = rate;
        self.options = options;
        self.spec = spec;
        self.taps = TapCache::new(self.spec.kernel(self.method), self.spec.n_taps, rate);
        self.log_configuration();
        self.reset();

        Ok(())
    }

    fn log_configuration(&self) {
        log::debug!(
            "resampling {}:{} with {:?}: {} taps, cutoff {:.4}, kaiser beta {:.4}",
            self.rate.in_rate,
            self.rate.out_rate,
            self.method,
            self.spec.n_taps,
            self.spec.cutoff,
            self.spec.kaiser_beta,
        );
    }

    /// Resets the stream state, clearing all buffered input.
    ///
    /// Call this when starting to process a new audio stream to avoid discontinuities from
    /// previous audio data. The computed filter coefficients are kept.
    pub fn reset(&mut self) {
        self.history.reset(self.padding());
        self.samp_index = 0;
        self.samp_phase = 0;
        self.skip = 0;
        self.filling = true;
    }

    /// Frames in front of the first real input sample.
    fn padding(&self) -> usize {
        self.spec.n_taps / 2 - 1
    }

    /// Process audio frames, resampling from input to output sample rate.
    ///
    /// This is a streaming API: the resampler buffers as much input history as its filter
    /// needs and produces as many output frames as the buffered input allows, up to
    /// `out_frames`. Use [`Resampler::out_frames`] to size the output.
    ///
    /// ## Parameters
    ///
    /// - `input`: One interleaved slice of at least `in_frames * channels` samples for
    ///   [`Layout::Interleaved`], one slice of at least `in_frames` samples per channel for
    ///   [`Layout::Planar`]. `None` feeds `in_frames` frames of silence.
    /// - `in_frames`: Number of input frames.
    /// - `output`: Output slices, with the same layout rules as `input`.
    /// - `out_frames`: Capacity of the output in frames.
    ///
    /// ## Returns
    ///
    /// `Ok((consumed, produced))` in frames. All input is always consumed: frames that can't
    /// produce output yet are buffered.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use audio_resampler::{Layout, Method, Resampler, ResamplerOptions};
    ///
    /// let mut resampler = Resampler::<f32>::new(
    ///     Method::Kaiser,
    ///     Layout::Interleaved,
    ///     2,
    ///     48000,
    ///     44100,
    ///     ResamplerOptions::default(),
    /// )
    /// .unwrap();
    ///
    /// let input = vec![0.0f32; 2 * 480];
    /// let out_frames = resampler.out_frames(480);
    /// let mut output = vec![0.0f32; 2 * out_frames];
    ///
    /// match resampler.resample(
    ///     Some(&[input.as_slice()]),
    ///     480,
    ///     &mut [output.as_mut_slice()],
    ///     out_frames,
    /// ) {
    ///     Ok((consumed, produced)) => {
    ///         println!("Processed {consumed} input frames into {produced} output frames");
    ///     }
    ///     Err(error) => eprintln!("Resampling error: {error:?}"),
    /// }
    /// ```
    pub fn resample(
        &mut self,
        input: Option<&[&[T]]>,
        in_frames: usize,
        output: &mut [&mut [T]],
        out_frames: usize,
    ) -> Result<(usize, usize), ResampleError> {
        if let Some(input) = input {
            self.check_buffers(input, in_frames, ResampleError::InputBufferSize)?;
        }
        self.check_buffers(output, out_frames, ResampleError::OutputBufferSize)?;

        if self.skip > 0 && self.skip >= in_frames {
            self.skip -= in_frames;
            return Ok((in_frames, 0));
        }

        self.samp_index += self.skip;
        self.skip = 0;
        self.history.append(input, self.layout, in_frames);

        let samples_avail = self.history.samples_avail();
        let need = self.spec.n_taps + self.samp_index;
        if samples_avail < need || out_frames == 0 {
            return Ok((in_frames, 0));
        }

        if self.filling {
            log::trace!("priming history with {} mirrored frames", self.padding());
            self.history.mirror(self.padding());
            self.filling = false;
        }

        let produced = self.calc_out(samples_avail - need).min(out_frames);
        let resample_fn = self.resample_fn;
        resample_fn(self, output, produced);

        self.skip = self.history.consume(self.samp_index);
        self.samp_index = 0;

        Ok((in_frames, produced))
    }

    /// Pushes the remaining buffered input through the filter and starts a new stream.
    ///
    /// Feeds [`Resampler::max_latency`] frames of silence, so the output covers the complete
    /// input. The output needs room for `out_frames(max_latency())` frames.
    ///
    /// Returns the number of produced frames.
    pub fn drain(
        &mut self,
        output: &mut [&mut [T]],
        out_frames: usize,
    ) -> Result<usize, ResampleError> {
        let (_, produced) = self.resample(None, self.max_latency(), output, out_frames)?;
        self.reset();
        Ok(produced)
    }

    fn check_buffers<B: AsRef<[T]>>(
        &self,
        buffers: &[B],
        frames: usize,
        size_error: ResampleError,
    ) -> Result<(), ResampleError> {
        let (count, samples) = match self.layout {
            Layout::Interleaved => (1, frames.saturating_mul(self.channels)),
            Layout::Planar => (self.channels, frames),
        };

        if buffers.len() != count {
            return Err(ResampleError::ChannelBufferCount);
        }
        if buffers.iter().any(|buffer| buffer.as_ref().len() < samples) {
            return Err(size_error);
        }

        Ok(())
    }

    /// The core loop: computes `frames` output frames and hands every sample to `write`.
    #[inline(always)]
    fn process<W: FnMut(usize, usize, T)>(&mut self, frames: usize, mut write: W) {
        let mut samp_index = self.samp_index;
        let mut samp_phase = self.samp_phase;

        for frame in 0..frames {
            let tap = self.taps.tap(samp_phase);
            for channel in 0..self.channels {
                let window = &self.history.channel(channel)[samp_index..];
                write(frame, channel, (self.inner_product)(window, tap.coeffs));
            }
            samp_index += tap.sample_inc;
            samp_phase = tap.next_phase;
        }

        self.samp_index = samp_index;
        self.samp_phase = samp_phase;
    }

    /// Number of output frames whose filter window fits into `extra` frames beyond the
    /// window of the next output frame.
    fn calc_out(&self, extra: usize) -> usize {
        let in_rate = self.rate.in_rate as u128;
        let out_rate = self.rate.out_rate as u128;
        let steps = ((extra as u128 + 1) * out_rate - 1 - self.samp_phase as u128) / in_rate;
        usize::try_from(steps + 1).unwrap_or(usize::MAX)
    }

    /// Returns the number of output frames that become available when `in_frames` more input
    /// frames are fed.
    ///
    /// This is the exact count of output frames whose filter window fits into the buffered
    /// and new input: with `x` frames beyond the window of the next output frame it is
    /// `((x + 1) * out_rate - 1 - phase) / in_rate + 1` for the reduced rates. That can be
    /// more than the estimate `(x * out_rate - phase) / in_rate + 1`, so size output buffers
    /// with this method. [`Resampler::in_frames`] is its inverse.
    pub fn out_frames(&self, in_frames: usize) -> usize {
        let need = self.spec.n_taps + self.samp_index + self.skip;
        let avail = self.history.samples_avail() + in_frames;
        if avail < need {
            0
        } else {
            self.calc_out(avail - need)
        }
    }

    /// Returns the minimal number of input frames that make `out_frames` output frames
    /// available.
    pub fn in_frames(&self, out_frames: usize) -> usize {
        if out_frames == 0 {
            return 0;
        }

        let in_rate = self.rate.in_rate as u128;
        let out_rate = self.rate.out_rate as u128;
        let advance = (self.samp_phase as u128 + (out_frames as u128 - 1) * in_rate) / out_rate;
        let need = (self.spec.n_taps + self.samp_index + self.skip) as u128 + advance;
        let missing = need.saturating_sub(self.history.samples_avail() as u128);
        usize::try_from(missing).unwrap_or(usize::MAX)
    }

    /// Returns the algorithmic delay (latency) of the resampler in input frames.
    ///
    /// This is half the filter length.
    pub fn max_latency(&self) -> usize {
        self.spec.n_taps / 2
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn format(&self) -> SampleFormat {
        T::FORMAT
    }

    /// The input rate, reduced by the greatest common divisor of both rates.
    pub fn in_rate(&self) -> u32 {
        self.rate.in_rate as u32
    }

    /// The output rate, reduced by the greatest common divisor of both rates.
    pub fn out_rate(&self) -> u32 {
        self.rate.out_rate as u32
    }

    /// The filter designed for the current method, options and rates.
    pub fn filter_spec(&self) -> FilterSpec {
        self.spec
    }

    pub fn options(&self) -> ResamplerOptions {
        self.options
    }
}

fn resample_interleaved<T: Sample>(
    resampler: &mut Resampler<T>,
    output: &mut [&mut [T]],
    frames: usize,
) {
    let channels = resampler.channels;
    let output = &mut *output[0];
    resampler.process(frames, |frame, channel, value| {
        output[frame * channels + channel] = value;
    });
}

fn resample_planar<T: Sample>(
    resampler: &mut Resampler<T>,
    output: &mut [&mut [T]],
    frames: usize,
) {
    resampler.process(frames, |frame, channel, value| {
        output[channel][frame] = value;
    });
}
