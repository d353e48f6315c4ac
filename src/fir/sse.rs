//! SSE optimized inner product.

use core::arch::x86_64::*;

/// SSE implementation of the `f32` inner product.
///
/// Uses 128-bit SIMD registers to process 4 f32 values at a time.
/// For a 64-tap filter, this performs 16 iterations instead of 64.
#[target_feature(enable = "sse")]
pub(super) unsafe fn inner_product_sse(samples: &[f32], coeffs: &[f32]) -> f32 {
    const SIMD_WIDTH: usize = 4;

    let taps = coeffs.len();
    let samples = &samples[..taps];
    let simd_iterations = taps / SIMD_WIDTH;

    unsafe {
        let mut acc = _mm_setzero_ps();

        for i in 0..simd_iterations {
            let offset = i * SIMD_WIDTH;

            let input_vec = _mm_loadu_ps(samples.as_ptr().add(offset));
            let coeffs_vec = _mm_loadu_ps(coeffs.as_ptr().add(offset));

            // acc = acc + (coeffs_vec * input_vec).
            let prod = _mm_mul_ps(coeffs_vec, input_vec);
            acc = _mm_add_ps(acc, prod);
        }

        // Horizontal sum without relying on SSE3 hadd.
        let shuf = _mm_shuffle_ps(acc, acc, 0b01_00_11_10); // [a2, a3, a0, a1]
        let sum1 = _mm_add_ps(acc, shuf); // [a0+a2, a1+a3, a2+a0, a3+a1]
        let shuf2 = _mm_shuffle_ps(sum1, sum1, 0b00_00_00_01); // [a1+a3, ...]
        let sum2 = _mm_add_ps(sum1, shuf2); // [a0+a2+a1+a3, ...]
        let mut sum = _mm_cvtss_f32(sum2);

        for i in simd_iterations * SIMD_WIDTH..taps {
            sum += coeffs[i] * samples[i];
        }

        sum
    }
}
