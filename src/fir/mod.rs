//! Inner products of a history window with one phase of filter coefficients.
//!
//! The scalar functions are the reference implementation for every format. For `f32`, a
//! vectorized version is selected once per configuration; it only differs from the scalar
//! path by floating point summation order.

#[cfg(target_arch = "x86_64")]
mod avx;
#[cfg(target_arch = "x86_64")]
mod sse;

#[cfg(target_arch = "aarch64")]
mod neon;

/// Fixed-point precision of S16 coefficients.
pub(crate) const PRECISION_S16: u32 = 15;
/// Fixed-point precision of S32 coefficients.
pub(crate) const PRECISION_S32: u32 = 30;

pub(crate) type InnerProductFn<T> = fn(&[T], &[<T as crate::Sample>::Coeff]) -> T;

/// Scalar inner product for `f64`.
pub(crate) fn inner_product_f64(samples: &[f64], coeffs: &[f64]) -> f64 {
    let samples = &samples[..coeffs.len()];
    let mut sum = 0.0f64;
    for (sample, coeff) in samples.iter().zip(coeffs) {
        sum += coeff * sample;
    }
    sum
}

/// Scalar inner product for `f32`.
#[cfg_attr(any(target_arch = "x86_64", target_arch = "aarch64"), allow(dead_code))]
pub(crate) fn inner_product_f32(samples: &[f32], coeffs: &[f32]) -> f32 {
    let samples = &samples[..coeffs.len()];
    let mut sum = 0.0f32;
    for (sample, coeff) in samples.iter().zip(coeffs) {
        sum += coeff * sample;
    }
    sum
}

#[inline(always)]
fn accumulate_fixed<S: Copy + Into<i64>>(samples: &[S], coeffs: &[i32], precision: u32) -> i64 {
    let samples = &samples[..coeffs.len()];
    let mut acc = 0i64;
    for (&sample, &coeff) in samples.iter().zip(coeffs) {
        acc += sample.into() * coeff as i64;
    }
    (acc + (1 << (precision - 1))) >> precision
}

/// Fixed-point inner product for `i32` samples with rounding and saturation.
pub(crate) fn inner_product_s32(samples: &[i32], coeffs: &[i32]) -> i32 {
    accumulate_fixed(samples, coeffs, PRECISION_S32).clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Fixed-point inner product for `i16` samples with rounding and saturation.
pub(crate) fn inner_product_s16(samples: &[i16], coeffs: &[i32]) -> i16 {
    accumulate_fixed(samples, coeffs, PRECISION_S16).clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Selects the fastest `f32` inner product available on the running CPU.
///
/// - **AVX+FMA**: 8 f32 per iteration with fused multiply-add (x86_64, runtime detected)
/// - **SSE**: 4 f32 per iteration (x86_64, always available)
/// - **NEON**: 4 f32 per iteration with fused multiply-add (aarch64, always available)
/// - **Scalar**: Fallback for all other architectures
pub(crate) fn select_inner_product_f32() -> InnerProductFn<f32> {
    #[cfg(all(target_arch = "x86_64", not(feature = "no_std")))]
    {
        if std::arch::is_x86_feature_detected!("avx") && std::arch::is_x86_feature_detected!("fma")
        {
            fn wrapper(samples: &[f32], coeffs: &[f32]) -> f32 {
                // Safety: We've checked that avx and fma are available at runtime.
                unsafe { avx::inner_product_avx_fma(samples, coeffs) }
            }
            return wrapper;
        }
    }

    #[cfg(target_arch = "x86_64")]
    {
        fn wrapper(samples: &[f32], coeffs: &[f32]) -> f32 {
            // Safety: SSE is part of the x86_64 baseline.
            unsafe { sse::inner_product_sse(samples, coeffs) }
        }
        wrapper
    }

    #[cfg(target_arch = "aarch64")]
    {
        fn wrapper(samples: &[f32], coeffs: &[f32]) -> f32 {
            // Safety: NEON is mandatory on aarch64, so it's always available.
            unsafe { neon::inner_product_neon(samples, coeffs) }
        }
        wrapper
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        inner_product_f32
    }
}
