use crate::{
    Method, ResampleError,
    window::{Kernel, kaiser_beta, kaiser_order},
};

/// Cutoff and tap count of a Blackman-Nuttall filter for one quality level.
struct BlackmanQuality {
    n_taps: usize,
    cutoff: f64,
}

/// Kaiser filter parameters for one quality level.
struct KaiserQuality {
    cutoff: f64,
    /// Applied to the cutoff when downsampling.
    downsample_cutoff_factor: f64,
    /// Stopband attenuation in dB.
    stop_attenuation: f64,
    transition_bandwidth: f64,
}

/// Blackman-Nuttall parameters for quality 0 to 10.
const BLACKMAN_QUALITIES: [BlackmanQuality; 11] = [
    BlackmanQuality { n_taps: 8, cutoff: 0.5 },
    BlackmanQuality { n_taps: 16, cutoff: 0.6 },
    BlackmanQuality { n_taps: 24, cutoff: 0.72 },
    BlackmanQuality { n_taps: 32, cutoff: 0.8 },
    BlackmanQuality { n_taps: 48, cutoff: 0.85 },
    BlackmanQuality { n_taps: 64, cutoff: 0.90 },
    BlackmanQuality { n_taps: 80, cutoff: 0.92 },
    BlackmanQuality { n_taps: 96, cutoff: 0.933 },
    BlackmanQuality { n_taps: 128, cutoff: 0.950 },
    BlackmanQuality { n_taps: 148, cutoff: 0.955 },
    BlackmanQuality { n_taps: 160, cutoff: 0.960 },
];

/// Kaiser parameters for quality 0 to 10. The comment is the resulting tap count.
#[rustfmt::skip]
const KAISER_QUALITIES: [KaiserQuality; 11] = [
    KaiserQuality { cutoff: 0.860, downsample_cutoff_factor: 0.96511, stop_attenuation: 60.0, transition_bandwidth: 0.7 },    // 8
    KaiserQuality { cutoff: 0.880, downsample_cutoff_factor: 0.96591, stop_attenuation: 65.0, transition_bandwidth: 0.29 },   // 16
    KaiserQuality { cutoff: 0.910, downsample_cutoff_factor: 0.96923, stop_attenuation: 70.0, transition_bandwidth: 0.145 },  // 32
    KaiserQuality { cutoff: 0.920, downsample_cutoff_factor: 0.97600, stop_attenuation: 80.0, transition_bandwidth: 0.105 },  // 48
    KaiserQuality { cutoff: 0.940, downsample_cutoff_factor: 0.97979, stop_attenuation: 85.0, transition_bandwidth: 0.087 },  // 64
    KaiserQuality { cutoff: 0.940, downsample_cutoff_factor: 0.98085, stop_attenuation: 95.0, transition_bandwidth: 0.077 },  // 80
    KaiserQuality { cutoff: 0.945, downsample_cutoff_factor: 0.99471, stop_attenuation: 100.0, transition_bandwidth: 0.068 }, // 96
    KaiserQuality { cutoff: 0.950, downsample_cutoff_factor: 1.0, stop_attenuation: 105.0, transition_bandwidth: 0.055 },     // 128
    KaiserQuality { cutoff: 0.960, downsample_cutoff_factor: 1.0, stop_attenuation: 110.0, transition_bandwidth: 0.045 },     // 160
    KaiserQuality { cutoff: 0.968, downsample_cutoff_factor: 1.0, stop_attenuation: 115.0, transition_bandwidth: 0.039 },     // 192
    KaiserQuality { cutoff: 0.975, downsample_cutoff_factor: 1.0, stop_attenuation: 120.0, transition_bandwidth: 0.0305 },    // 256
];

const DEFAULT_CUBIC_B: f64 = 1.0;
const DEFAULT_CUBIC_C: f64 = 0.0;

/// Quality level of the filter, from 0 (fastest) to 10 (best).
///
/// Only used to derive [`ResamplerOptions`] once, see [`ResamplerOptions::from_quality`].
/// Defaults to 4.
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct Quality(u8);

impl Quality {
    /// Lowest quality.
    pub const MIN: Quality = Quality(0);
    /// Highest quality.
    pub const MAX: Quality = Quality(10);

    /// Returns `None` for levels above [`Quality::MAX`].
    pub const fn new(level: u8) -> Option<Self> {
        if level <= Self::MAX.0 { Some(Quality(level)) } else { None }
    }

    pub const fn level(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Quality(4)
    }
}

impl TryFrom<u8> for Quality {
    type Error = ResampleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Quality::new(value).ok_or(ResampleError::InvalidQuality)
    }
}

/// Tuning options of the filter. Every option is optional; unset options fall back to the
/// defaults of the method at quality 4.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct ResamplerOptions {
    /// Normalized cutoff frequency in (0, 1]. Used by the windowed sinc methods.
    pub cutoff: Option<f64>,
    /// Stopband attenuation in dB. Used by [`Method::Kaiser`].
    pub stop_attenuation: Option<f64>,
    /// Normalized transition bandwidth. Used by [`Method::Kaiser`].
    pub transition_bandwidth: Option<f64>,
    /// The B parameter of [`Method::Cubic`], in [0, 2].
    pub cubic_b: Option<f64>,
    /// The C parameter of [`Method::Cubic`], in [0, 2].
    pub cubic_c: Option<f64>,
    /// Explicit filter length, at most [`FilterSpec::MAX_N_TAPS`]. `Some(0)` means automatic.
    pub n_taps: Option<usize>,
}

impl ResamplerOptions {
    /// Translates a quality level into explicit options for the given method and rates.
    ///
    /// # Example
    ///
    /// ```rust
    /// use audio_resampler::{Method, Quality, ResamplerOptions};
    ///
    /// let options = ResamplerOptions::from_quality(Method::Kaiser, Quality::MAX, 48000, 44100);
    /// assert_eq!(options.stop_attenuation, Some(120.0));
    /// ```
    pub fn from_quality(method: Method, quality: Quality, in_rate: u32, out_rate: u32) -> Self {
        let level = quality.0 as usize;
        match method {
            Method::Nearest => ResamplerOptions::default(),
            Method::Linear => ResamplerOptions::default().with_n_taps(2),
            Method::Cubic => ResamplerOptions::default()
                .with_n_taps(4)
                .with_cubic(DEFAULT_CUBIC_B, DEFAULT_CUBIC_C),
            Method::BlackmanNuttall => {
                let map = &BLACKMAN_QUALITIES[level];
                ResamplerOptions::default()
                    .with_n_taps(map.n_taps)
                    .with_cutoff(map.cutoff)
            }
            Method::Kaiser => {
                let map = &KAISER_QUALITIES[level];
                let mut cutoff = map.cutoff;
                if out_rate < in_rate {
                    cutoff *= map.downsample_cutoff_factor;
                }
                ResamplerOptions::default()
                    .with_cutoff(cutoff)
                    .with_stop_attenuation(map.stop_attenuation)
                    .with_transition_bandwidth(map.transition_bandwidth)
            }
        }
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn with_stop_attenuation(mut self, attenuation: f64) -> Self {
        self.stop_attenuation = Some(attenuation);
        self
    }

    pub fn with_transition_bandwidth(mut self, bandwidth: f64) -> Self {
        self.transition_bandwidth = Some(bandwidth);
        self
    }

    /// Sets both cubic parameters. `(0.0, 0.5)` is Catmull-Rom, `(0.0, 0.0)` Hermite.
    pub fn with_cubic(mut self, b: f64, c: f64) -> Self {
        self.cubic_b = Some(b);
        self.cubic_c = Some(c);
        self
    }

    pub fn with_n_taps(mut self, n_taps: usize) -> Self {
        self.n_taps = Some(n_taps);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ResampleError> {
        if self.cutoff.is_some_and(|cutoff| !(cutoff > 0.0 && cutoff <= 1.0)) {
            return Err(ResampleError::InvalidOption("cutoff"));
        }
        if self
            .stop_attenuation
            .is_some_and(|attenuation| !(attenuation.is_finite() && attenuation > 0.0))
        {
            return Err(ResampleError::InvalidOption("stop-attenuation"));
        }
        if self
            .transition_bandwidth
            .is_some_and(|bandwidth| !(bandwidth.is_finite() && bandwidth > 0.0))
        {
            return Err(ResampleError::InvalidOption("transition-bandwidth"));
        }
        if self.n_taps.is_some_and(|n_taps| n_taps > FilterSpec::MAX_N_TAPS) {
            return Err(ResampleError::InvalidOption("n-taps"));
        }
        if self.cubic_b.is_some_and(|b| !(0.0..=2.0).contains(&b)) {
            return Err(ResampleError::InvalidOption("cubic-b"));
        }
        if self.cubic_c.is_some_and(|c| !(0.0..=2.0).contains(&c)) {
            return Err(ResampleError::InvalidOption("cubic-c"));
        }
        Ok(())
    }

    fn n_taps_or(&self, default: usize) -> usize {
        match self.n_taps {
            Some(n_taps) if n_taps > 0 => n_taps,
            _ => default,
        }
    }
}

/// A conversion ratio reduced by the greatest common divisor of both rates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) struct RationalRate {
    pub(crate) in_rate: usize,
    pub(crate) out_rate: usize,
}

impl RationalRate {
    pub(crate) fn new(in_rate: u32, out_rate: u32) -> Result<Self, ResampleError> {
        if in_rate == 0 || out_rate == 0 {
            return Err(ResampleError::InvalidRate);
        }
        let divisor = gcd(in_rate, out_rate);
        Ok(RationalRate {
            in_rate: (in_rate / divisor) as usize,
            out_rate: (out_rate / divisor) as usize,
        })
    }

    pub(crate) fn is_downsampling(self) -> bool {
        self.out_rate < self.in_rate
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// The filter derived from the method, its options and the conversion ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FilterSpec {
    /// Filter length. Always even; a multiple of 8 above 4 taps.
    pub n_taps: usize,
    /// Normalized cutoff frequency. Only meaningful for the windowed sinc methods.
    pub cutoff: f64,
    /// Kaiser window shape. Zero for all other methods.
    pub kaiser_beta: f64,
    pub cubic_b: f64,
    pub cubic_c: f64,
}

impl FilterSpec {
    /// Upper bound of the filter length, after stretching for downsampling.
    pub const MAX_N_TAPS: usize = 1 << 16;
    /// Upper bound of the coefficient table, `out_rate * n_taps` of the reduced ratio.
    pub const MAX_COEFFICIENTS: usize = 1 << 26;

    /// Sizes the filter. Fails if the Kaiser order or the stretched filter exceeds
    /// [`FilterSpec::MAX_N_TAPS`], or the coefficient table exceeds
    /// [`FilterSpec::MAX_COEFFICIENTS`].
    pub(crate) fn design(
        method: Method,
        rate: RationalRate,
        options: &ResamplerOptions,
    ) -> Result<Self, ResampleError> {
        let mut spec = FilterSpec {
            n_taps: 2,
            cutoff: 1.0,
            kaiser_beta: 0.0,
            cubic_b: DEFAULT_CUBIC_B,
            cubic_c: DEFAULT_CUBIC_C,
        };
        let mut stretch = true;

        match method {
            Method::Nearest => {
                spec.n_taps = 2;
                stretch = false;
            }
            Method::Linear => {
                spec.n_taps = options.n_taps_or(2);
            }
            Method::Cubic => {
                spec.n_taps = options.n_taps_or(4);
                spec.cubic_b = options.cubic_b.unwrap_or(DEFAULT_CUBIC_B);
                spec.cubic_c = options.cubic_c.unwrap_or(DEFAULT_CUBIC_C);
            }
            Method::BlackmanNuttall => {
                let map = &BLACKMAN_QUALITIES[Quality::default().0 as usize];
                spec.n_taps = options.n_taps_or(map.n_taps);
                spec.cutoff = options.cutoff.unwrap_or(map.cutoff);
            }
            Method::Kaiser => {
                let map = &KAISER_QUALITIES[Quality::default().0 as usize];
                let mut default_cutoff = map.cutoff;
                if rate.is_downsampling() {
                    default_cutoff *= map.downsample_cutoff_factor;
                }

                let attenuation = options.stop_attenuation.unwrap_or(map.stop_attenuation);
                let bandwidth = options
                    .transition_bandwidth
                    .unwrap_or(map.transition_bandwidth);
                spec.kaiser_beta = kaiser_beta(attenuation);
                spec.n_taps = match options.n_taps_or(0) {
                    0 => {
                        let order = kaiser_order(attenuation, bandwidth).max(0.0);
                        if order >= Self::MAX_N_TAPS as f64 {
                            return Err(ResampleError::InvalidOption("transition-bandwidth"));
                        }
                        order as usize + 1
                    }
                    n_taps => n_taps,
                };
                spec.cutoff = options.cutoff.unwrap_or(default_cutoff);
            }
        }

        if rate.is_downsampling() && stretch {
            // Widen the filter over the larger source band to suppress aliasing.
            spec.cutoff = spec.cutoff * rate.out_rate as f64 / rate.in_rate as f64;
            spec.n_taps = spec
                .n_taps
                .checked_mul(rate.in_rate)
                .map(|scaled| scaled / rate.out_rate)
                .ok_or(ResampleError::FilterTooLarge)?;
        }
        if spec.n_taps > Self::MAX_N_TAPS {
            return Err(ResampleError::FilterTooLarge);
        }

        spec.n_taps = spec.n_taps.max(2).next_multiple_of(2);
        if spec.n_taps > 4 {
            spec.n_taps = spec.n_taps.next_multiple_of(8);
        }

        rate.out_rate
            .checked_mul(spec.n_taps)
            .filter(|&len| len <= Self::MAX_COEFFICIENTS)
            .ok_or(ResampleError::FilterTooLarge)?;

        Ok(spec)
    }

    pub(crate) fn kernel(&self, method: Method) -> Kernel {
        match method {
            Method::Nearest => Kernel::Nearest,
            Method::Linear => Kernel::Linear,
            Method::Cubic => Kernel::Cubic {
                b: self.cubic_b,
                c: self.cubic_c,
            },
            Method::BlackmanNuttall => Kernel::BlackmanNuttall {
                cutoff: self.cutoff,
            },
            Method::Kaiser => Kernel::Kaiser {
                cutoff: self.cutoff,
                beta: self.kaiser_beta,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "Expected {expected}, got {actual}"
        );
    }

    fn design(method: Method, in_rate: u32, out_rate: u32, options: ResamplerOptions) -> FilterSpec {
        let rate = RationalRate::new(in_rate, out_rate).unwrap();
        FilterSpec::design(method, rate, &options).unwrap()
    }

    #[test]
    fn test_rational_rate_is_reduced() {
        let rate = RationalRate::new(44100, 48000).unwrap();
        assert_eq!(rate.in_rate, 147);
        assert_eq!(rate.out_rate, 160);

        let rate = RationalRate::new(48000, 48000).unwrap();
        assert_eq!((rate.in_rate, rate.out_rate), (1, 1));
    }

    #[test]
    fn test_rational_rate_rejects_zero() {
        assert_eq!(RationalRate::new(0, 48000), Err(ResampleError::InvalidRate));
        assert_eq!(RationalRate::new(48000, 0), Err(ResampleError::InvalidRate));
    }

    #[test]
    fn test_quality_bounds() {
        assert_eq!(Quality::new(10), Some(Quality::MAX));
        assert_eq!(Quality::new(11), None);
        assert_eq!(Quality::try_from(12), Err(ResampleError::InvalidQuality));
        assert_eq!(Quality::default().level(), 4);
    }

    #[test]
    fn test_nearest_is_never_stretched() {
        let spec = design(Method::Nearest, 48000, 8000, ResamplerOptions::default());
        assert_eq!(spec.n_taps, 2);
    }

    #[test]
    fn test_linear_downsample_stretches_taps() {
        let spec = design(Method::Linear, 2, 1, ResamplerOptions::default());
        assert_eq!(spec.n_taps, 4);

        let spec = design(Method::Linear, 1, 2, ResamplerOptions::default());
        assert_eq!(spec.n_taps, 2);
    }

    #[test]
    fn test_cubic_defaults_and_override() {
        let spec = design(Method::Cubic, 1, 2, ResamplerOptions::default());
        assert_eq!(spec.n_taps, 4);
        assert_eq!((spec.cubic_b, spec.cubic_c), (1.0, 0.0));

        let spec = design(
            Method::Cubic,
            1,
            2,
            ResamplerOptions::default().with_cubic(0.0, 0.5),
        );
        assert_eq!((spec.cubic_b, spec.cubic_c), (0.0, 0.5));

        // Stretched to 8 taps when downsampling by two.
        let spec = design(Method::Cubic, 2, 1, ResamplerOptions::default());
        assert_eq!(spec.n_taps, 8);
    }

    #[test]
    fn test_kaiser_default_upsampling() {
        let spec = design(Method::Kaiser, 44100, 48000, ResamplerOptions::default());
        assert_eq!(spec.n_taps, 64);
        assert_approx(spec.cutoff, 0.94);
        assert_approx(spec.kaiser_beta, 0.1102 * (85.0 - 8.7));
    }

    #[test]
    fn test_kaiser_default_downsampling() {
        let spec = design(Method::Kaiser, 48000, 44100, ResamplerOptions::default());
        // 62 taps stretched by 160 / 147 and rounded up to a multiple of 8.
        assert_eq!(spec.n_taps, 72);
        assert_approx(spec.cutoff, 0.94 * 0.97979 * 147.0 / 160.0);
    }

    #[test]
    fn test_kaiser_quality_table_tap_counts() {
        let expected = [8, 16, 32, 48, 64, 80, 96, 128, 160, 192, 256];
        for (level, &n_taps) in expected.iter().enumerate() {
            let quality = Quality::new(level as u8).unwrap();
            let options = ResamplerOptions::from_quality(Method::Kaiser, quality, 44100, 48000);
            let spec = design(Method::Kaiser, 44100, 48000, options);
            assert_eq!(spec.n_taps, n_taps, "quality {level}");
        }
    }

    #[test]
    fn test_blackman_nuttall_quality() {
        let options =
            ResamplerOptions::from_quality(Method::BlackmanNuttall, Quality::MIN, 44100, 48000);
        let spec = design(Method::BlackmanNuttall, 44100, 48000, options);
        assert_eq!(spec.n_taps, 8);
        assert_approx(spec.cutoff, 0.5);

        let spec = design(
            Method::BlackmanNuttall,
            44100,
            48000,
            ResamplerOptions::default(),
        );
        assert_eq!(spec.n_taps, 48);
        assert_approx(spec.cutoff, 0.85);
    }

    #[test]
    fn test_n_taps_is_even_and_rounded() {
        let spec = design(Method::Linear, 1, 2, ResamplerOptions::default().with_n_taps(3));
        assert_eq!(spec.n_taps, 4);

        let spec = design(Method::Linear, 1, 2, ResamplerOptions::default().with_n_taps(5));
        assert_eq!(spec.n_taps, 8);

        // Zero means automatic.
        let spec = design(Method::Linear, 1, 2, ResamplerOptions::default().with_n_taps(0));
        assert_eq!(spec.n_taps, 2);
    }

    #[test]
    fn test_options_validation() {
        assert!(ResamplerOptions::default().validate().is_ok());
        assert_eq!(
            ResamplerOptions::default().with_cutoff(0.0).validate(),
            Err(ResampleError::InvalidOption("cutoff"))
        );
        assert_eq!(
            ResamplerOptions::default().with_cutoff(1.5).validate(),
            Err(ResampleError::InvalidOption("cutoff"))
        );
        assert_eq!(
            ResamplerOptions::default().with_cubic(2.5, 0.0).validate(),
            Err(ResampleError::InvalidOption("cubic-b"))
        );
        assert_eq!(
            ResamplerOptions::default()
                .with_stop_attenuation(f64::NAN)
                .validate(),
            Err(ResampleError::InvalidOption("stop-attenuation"))
        );
        assert_eq!(
            ResamplerOptions::default()
                .with_transition_bandwidth(-0.1)
                .validate(),
            Err(ResampleError::InvalidOption("transition-bandwidth"))
        );
    }

    #[test]
    fn test_n_taps_option_is_bounded() {
        let options = ResamplerOptions::default().with_n_taps(FilterSpec::MAX_N_TAPS);
        assert!(options.validate().is_ok());
        assert_eq!(
            ResamplerOptions::default().with_n_taps(usize::MAX).validate(),
            Err(ResampleError::InvalidOption("n-taps"))
        );
    }

    #[test]
    fn test_filter_size_is_bounded() {
        let rate = RationalRate::new(44100, 48000).unwrap();
        let narrow = ResamplerOptions::default().with_transition_bandwidth(1e-300);
        assert_eq!(
            FilterSpec::design(Method::Kaiser, rate, &narrow),
            Err(ResampleError::InvalidOption("transition-bandwidth"))
        );
        // An explicit length makes the order irrelevant.
        let spec = design(Method::Kaiser, 44100, 48000, narrow.with_n_taps(64));
        assert_eq!(spec.n_taps, 64);

        let rate = RationalRate::new(1_000_000, 1).unwrap();
        assert_eq!(
            FilterSpec::design(Method::Linear, rate, &ResamplerOptions::default()),
            Err(ResampleError::FilterTooLarge)
        );
        let options = ResamplerOptions::default().with_n_taps(FilterSpec::MAX_N_TAPS);
        assert_eq!(
            FilterSpec::design(Method::Cubic, RationalRate::new(3, 2).unwrap(), &options),
            Err(ResampleError::FilterTooLarge)
        );

        let rate = RationalRate::new(100_000_000, 100_000_001).unwrap();
        assert_eq!(
            FilterSpec::design(Method::Linear, rate, &ResamplerOptions::default()),
            Err(ResampleError::FilterTooLarge)
        );
        let spec = design(Method::Linear, 1_000_000, 1_000_001, ResamplerOptions::default());
        assert_eq!(spec.n_taps, 2);
    }

    #[test]
    fn test_from_quality_kaiser_downsample_cutoff() {
        let options = ResamplerOptions::from_quality(Method::Kaiser, Quality::default(), 48000, 44100);
        assert_approx(options.cutoff.unwrap(), 0.94 * 0.97979);
        assert_eq!(options.stop_attenuation, Some(85.0));
        assert_eq!(options.transition_bandwidth, Some(0.087));
    }
}
