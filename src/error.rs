/// Errors the resampler can return.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResampleError {
    /// An input or output sample rate of zero.
    InvalidRate,
    /// A channel count of zero.
    InvalidChannelCount,
    /// A quality level above [`Quality::MAX`](crate::Quality::MAX).
    InvalidQuality,
    /// An option outside of its documented range. Carries the option name.
    InvalidOption(&'static str),
    /// The rate pair needs more filter taps or coefficients than
    /// [`FilterSpec::MAX_N_TAPS`](crate::FilterSpec::MAX_N_TAPS) and
    /// [`FilterSpec::MAX_COEFFICIENTS`](crate::FilterSpec::MAX_COEFFICIENTS) allow.
    FilterTooLarge,
    /// The number of channel slices does not match the configured layout.
    ChannelBufferCount,
    /// Input buffer size is too small.
    InputBufferSize,
    /// Output buffer size is too small.
    OutputBufferSize,
}

impl core::fmt::Display for ResampleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidRate => "Sample rates must be greater than zero".fmt(f),
            Self::InvalidChannelCount => "Channel count must be greater than zero".fmt(f),
            Self::InvalidQuality => "Quality level must be between 0 and 10".fmt(f),
            Self::InvalidOption(name) => write!(f, "Option '{name}' is out of range"),
            Self::FilterTooLarge => "Filter for this rate pair is too large".fmt(f),
            Self::ChannelBufferCount => "Channel buffer count does not match the layout".fmt(f),
            Self::InputBufferSize => "Input buffer size is too small".fmt(f),
            Self::OutputBufferSize => "Output buffer size is too small".fmt(f),
        }
    }
}

impl core::fmt::Debug for ResampleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self, f)
    }
}

#[cfg(not(feature = "no_std"))]
impl std::error::Error for ResampleError {}
