//! NEON optimized inner product for aarch64.

use core::arch::aarch64::*;

/// NEON implementation of the `f32` inner product.
#[target_feature(enable = "neon")]
pub(super) unsafe fn inner_product_neon(samples: &[f32], coeffs: &[f32]) -> f32 {
    const SIMD_WIDTH: usize = 4;

    let taps = coeffs.len();
    let samples = &samples[..taps];
    let simd_iterations = taps / SIMD_WIDTH;

    unsafe {
        let mut acc = vdupq_n_f32(0.0);

        for i in 0..simd_iterations {
            let offset = i * SIMD_WIDTH;

            let input_vec = vld1q_f32(samples.as_ptr().add(offset));
            let coeffs_vec = vld1q_f32(coeffs.as_ptr().add(offset));

            acc = vfmaq_f32(acc, coeffs_vec, input_vec);
        }

        // Horizontal sum: reduce 4-element vector to single scalar.
        let mut sum = vaddvq_f32(acc);

        for i in simd_iterations * SIMD_WIDTH..taps {
            sum += coeffs[i] * samples[i];
        }

        sum
    }
}
