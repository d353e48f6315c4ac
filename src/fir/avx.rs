//! AVX+FMA optimized inner product.

/// AVX+FMA implementation of the `f32` inner product.
///
/// Processes 8 taps per iteration and finishes odd lengths with a scalar tail.
#[target_feature(enable = "avx,fma")]
pub(super) unsafe fn inner_product_avx_fma(samples: &[f32], coeffs: &[f32]) -> f32 {
    use core::arch::x86_64::*;

    const SIMD_WIDTH: usize = 8;

    let taps = coeffs.len();
    let samples = &samples[..taps];
    let simd_iterations = taps / SIMD_WIDTH;

    unsafe {
        let mut acc = _mm256_setzero_ps();

        for i in 0..simd_iterations {
            let offset = i * SIMD_WIDTH;

            // History windows start at arbitrary frames and coefficient rows are only
            // 64-byte aligned for tap counts that are a multiple of 16, so load unaligned.
            let input_vec = _mm256_loadu_ps(samples.as_ptr().add(offset));
            let coeffs_vec = _mm256_loadu_ps(coeffs.as_ptr().add(offset));

            acc = _mm256_fmadd_ps(coeffs_vec, input_vec, acc);
        }

        // Step 1: Extract and add high/low 128-bit lanes to get a single 128-bit vector.
        let high = _mm256_extractf128_ps(acc, 1);
        let low = _mm256_castps256_ps128(acc);
        let sum128 = _mm_add_ps(high, low);

        // Step 2: Horizontal sum within 128-bit vector using shuffle.
        let shuf = _mm_shuffle_ps(sum128, sum128, 0b01_00_11_10);
        let sum1 = _mm_add_ps(sum128, shuf);
        let shuf2 = _mm_shuffle_ps(sum1, sum1, 0b00_00_00_01);
        let sum2 = _mm_add_ps(sum1, shuf2);
        let mut sum = _mm_cvtss_f32(sum2);

        for i in simd_iterations * SIMD_WIDTH..taps {
            sum += coeffs[i] * samples[i];
        }

        sum
    }
}
