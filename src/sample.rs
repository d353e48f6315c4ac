use core::fmt::Debug;

use crate::{fir, taps::quantize_fixed};

/// All sample encodings the resampler can operate on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 64-bit IEEE float.
    F64,
    /// 32-bit IEEE float.
    F32,
    /// 32-bit signed integer.
    S32,
    /// 16-bit signed integer.
    S16,
}

impl SampleFormat {
    /// Width of one sample in bytes.
    pub const fn width(self) -> usize {
        match self {
            SampleFormat::F64 => 8,
            SampleFormat::F32 | SampleFormat::S32 => 4,
            SampleFormat::S16 => 2,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, SampleFormat::F64 | SampleFormat::F32)
    }

    /// Fixed-point precision of the filter coefficients in bits.
    ///
    /// A coefficient of `1 << precision` has unity gain. Float formats have no precision.
    pub const fn precision(self) -> Option<u32> {
        match self {
            SampleFormat::F64 | SampleFormat::F32 => None,
            SampleFormat::S32 => Some(30),
            SampleFormat::S16 => Some(15),
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for f64 {}
    impl Sealed for f32 {}
    impl Sealed for i32 {}
    impl Sealed for i16 {}
}

/// A sample type the resampler can be instantiated with.
///
/// Implemented for `f64`, `f32`, `i32` and `i16`. The trait is sealed: the format specific
/// parts (coefficient storage, quantization, inner product) are an implementation detail.
pub trait Sample: sealed::Sealed + Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// The encoding of this sample type.
    const FORMAT: SampleFormat;

    /// Storage type of one filter coefficient.
    ///
    /// Integer formats store coefficients as `i32`, since a unity S16 tap (`1 << 15`) does not
    /// fit into an `i16`. The all-zero bit pattern of every coefficient type is a valid zero.
    type Coeff: Copy + Default + Debug + Send + Sync + 'static;

    /// Converts normalized-to-`weight` taps into coefficients. Returns how far the
    /// coefficient sum misses exact unity gain, in coefficient units.
    #[doc(hidden)]
    fn quantize_taps(raw: &[f64], weight: f64, taps: &mut [Self::Coeff]) -> i64;

    /// Selects the inner product implementation for the running CPU.
    #[doc(hidden)]
    fn inner_product() -> fn(&[Self], &[Self::Coeff]) -> Self;

    /// Point reflection of `sample` about `pivot` (`2 * pivot - sample`), saturating for
    /// integer formats.
    #[doc(hidden)]
    fn reflect(pivot: Self, sample: Self) -> Self;
}

impl Sample for f64 {
    const FORMAT: SampleFormat = SampleFormat::F64;
    type Coeff = f64;

    fn quantize_taps(raw: &[f64], weight: f64, taps: &mut [f64]) -> i64 {
        for (tap, value) in taps.iter_mut().zip(raw) {
            *tap = value / weight;
        }
        0
    }

    fn inner_product() -> fn(&[f64], &[f64]) -> f64 {
        fir::inner_product_f64
    }

    #[inline(always)]
    fn reflect(pivot: f64, sample: f64) -> f64 {
        2.0 * pivot - sample
    }
}

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::F32;
    type Coeff = f32;

    fn quantize_taps(raw: &[f64], weight: f64, taps: &mut [f32]) -> i64 {
        for (tap, value) in taps.iter_mut().zip(raw) {
            *tap = (value / weight) as f32;
        }
        0
    }

    fn inner_product() -> fn(&[f32], &[f32]) -> f32 {
        fir::select_inner_product_f32()
    }

    #[inline(always)]
    fn reflect(pivot: f32, sample: f32) -> f32 {
        2.0 * pivot - sample
    }
}

impl Sample for i32 {
    const FORMAT: SampleFormat = SampleFormat::S32;
    type Coeff = i32;

    fn quantize_taps(raw: &[f64], weight: f64, taps: &mut [i32]) -> i64 {
        quantize_fixed(raw, weight, fir::PRECISION_S32, taps)
    }

    fn inner_product() -> fn(&[i32], &[i32]) -> i32 {
        fir::inner_product_s32
    }

    #[inline(always)]
    fn reflect(pivot: i32, sample: i32) -> i32 {
        (2 * pivot as i64 - sample as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}

impl Sample for i16 {
    const FORMAT: SampleFormat = SampleFormat::S16;
    type Coeff = i32;

    fn quantize_taps(raw: &[f64], weight: f64, taps: &mut [i32]) -> i64 {
        quantize_fixed(raw, weight, fir::PRECISION_S16, taps)
    }

    fn inner_product() -> fn(&[i16], &[i32]) -> i16 {
        fir::inner_product_s16
    }

    #[inline(always)]
    fn reflect(pivot: i16, sample: i16) -> i16 {
        (2 * pivot as i32 - sample as i32).clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }
}
