#[cfg(feature = "no_std")]
use alloc::alloc::{Layout, alloc_zeroed, dealloc};
use alloc::{vec, vec::Vec};
use core::{
    marker::PhantomData,
    ops::{Deref, DerefMut},
    ptr::NonNull,
    slice,
};
#[cfg(not(feature = "no_std"))]
use std::alloc::{Layout, alloc_zeroed, dealloc};

use crate::{Sample, planner::RationalRate, window::Kernel};

/// Maximum number of bisection steps when searching for exact fixed-point taps.
const QUANTIZE_ITERATIONS: usize = 32;

/// A zero initialized, 64-byte aligned memory of coefficients.
pub(crate) struct AlignedMemory<C> {
    ptr: NonNull<C>,
    len: usize,
    layout: Layout,
    _marker: PhantomData<C>,
}

impl<C: Copy> AlignedMemory<C> {
    /// Allocates `len` zeroed values. `C` must be a plain number type for which the all-zero
    /// bit pattern is valid.
    pub(crate) fn zeroed(len: usize) -> Self {
        const ALIGNMENT: usize = 64;

        // Never allocate zero bytes.
        let size = len
            .checked_mul(size_of::<C>())
            .expect("coefficient table size overflows")
            .max(ALIGNMENT);

        unsafe {
            let layout = Layout::from_size_align(size, ALIGNMENT).expect("invalid layout");
            let ptr = alloc_zeroed(layout) as *mut C;

            let Some(ptr) = NonNull::new(ptr) else {
                panic!("failed to allocate aligned memory for filter coefficients");
            };

            Self {
                ptr,
                len,
                layout,
                _marker: PhantomData,
            }
        }
    }
}

impl<C> Deref for AlignedMemory<C> {
    type Target = [C];

    fn deref(&self) -> &Self::Target {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<C> DerefMut for AlignedMemory<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<C> Drop for AlignedMemory<C> {
    fn drop(&mut self) {
        unsafe {
            dealloc(self.ptr.as_ptr() as *mut u8, self.layout);
        }
    }
}

// Safety: AlignedMemory owns its allocation exclusively, like a Box<[C]>.
unsafe impl<C: Send> Send for AlignedMemory<C> {}

// Safety: Shared access only hands out shared slices.
unsafe impl<C: Sync> Sync for AlignedMemory<C> {}

/// Stepping metadata of one output phase.
#[derive(Debug, Copy, Clone)]
struct Tap {
    /// Input frames to advance after producing an output frame with this phase.
    sample_inc: usize,
    next_phase: usize,
    /// Whether the coefficients of this phase have been computed.
    ready: bool,
}

/// One phase of the polyphase filter, as handed to the inner loop.
pub(crate) struct TapRef<'a, C> {
    pub(crate) coeffs: &'a [C],
    pub(crate) sample_inc: usize,
    pub(crate) next_phase: usize,
}

/// Polyphase coefficient table with one lazily computed entry per output phase.
///
/// Coefficients are stored contiguously: all phases × taps in a single allocation.
/// Layout: [phase0_tap0..N, phase1_tap0..N, ..., phaseM_tap0..N]
pub(crate) struct TapCache<T: Sample> {
    kernel: Kernel,
    n_taps: usize,
    out_rate: usize,
    taps: Vec<Tap>,
    coeffs: AlignedMemory<T::Coeff>,
    /// Unnormalized kernel values of the phase under construction.
    scratch: Vec<f64>,
}

impl<T: Sample> TapCache<T> {
    /// `n_taps` and `rate` must come from [`FilterSpec::design`](crate::FilterSpec), which
    /// bounds the size of the coefficient table.
    pub(crate) fn new(kernel: Kernel, n_taps: usize, rate: RationalRate) -> Self {
        let RationalRate { in_rate, out_rate } = rate;

        let taps = (0..out_rate)
            .map(|phase| Tap {
                sample_inc: (phase + in_rate) / out_rate,
                next_phase: (phase + in_rate) % out_rate,
                ready: false,
            })
            .collect();

        TapCache {
            kernel,
            n_taps,
            out_rate,
            taps,
            coeffs: AlignedMemory::zeroed(
                out_rate
                    .checked_mul(n_taps)
                    .expect("coefficient count overflows"),
            ),
            scratch: vec![0.0; n_taps],
        }
    }

    /// Returns the tap of `phase`, computing its coefficients on first access.
    #[inline]
    pub(crate) fn tap(&mut self, phase: usize) -> TapRef<'_, T::Coeff> {
        if !self.taps[phase].ready {
            self.make_taps(phase);
        }

        let tap = self.taps[phase];
        let start = phase * self.n_taps;
        TapRef {
            coeffs: &self.coeffs[start..start + self.n_taps],
            sample_inc: tap.sample_inc,
            next_phase: tap.next_phase,
        }
    }

    fn make_taps(&mut self, phase: usize) {
        let n_taps = self.n_taps;

        // Offset of the first tap from the output position of this phase.
        let mut x = 1.0 - (n_taps / 2) as f64 - phase as f64 / self.out_rate as f64;
        let mut weight = 0.0;
        for value in self.scratch.iter_mut() {
            *value = self.kernel.evaluate(x, n_taps);
            weight += *value;
            x += 1.0;
        }

        if weight == 0.0 {
            log::warn!("filter phase {phase} has no DC weight, using unnormalized taps");
            weight = 1.0;
        }

        let start = phase * n_taps;
        let coeffs = &mut self.coeffs[start..start + n_taps];
        let residual = T::quantize_taps(&self.scratch, weight, coeffs);
        if residual != 0 {
            log::warn!("fixed-point taps of filter phase {phase} miss unity gain by {residual}");
        }

        self.taps[phase].ready = true;
    }

    #[cfg(test)]
    pub(crate) fn is_ready(&self, phase: usize) -> bool {
        self.taps[phase].ready
    }
}

/// Quantizes `raw / weight` to fixed-point coefficients with `precision` fractional bits.
///
/// Each tap is rounded down after adding a common bias. The bias is bisected in [0, 1] until
/// the taps sum to exactly `1 << precision`, so the filter has exact unity DC gain. If the
/// iteration budget runs out, the taps hold the closest sum found. Returns the signed
/// difference of that sum to `1 << precision`.
pub(crate) fn quantize_fixed(raw: &[f64], weight: f64, precision: u32, taps: &mut [i32]) -> i64 {
    let target = 1i64 << precision;
    let multiplier = target as f64 / weight;

    let quantize = |value: f64, offset: f64| -> i64 {
        let scaled = floor(offset + value * multiplier);
        scaled.clamp(i32::MIN as f64, i32::MAX as f64) as i64
    };
    let sum_at = |offset: f64| -> i64 { raw.iter().map(|&value| quantize(value, offset)).sum() };

    let mut low = 0.0;
    let mut high = 1.0;
    let mut offset = 0.5;
    let mut best_offset = offset;
    let mut best_error = i64::MAX;

    for _ in 0..QUANTIZE_ITERATIONS {
        let sum = sum_at(offset);
        let error = sum - target;
        if error.abs() < best_error.saturating_abs() {
            best_error = error;
            best_offset = offset;
        }

        if sum == target {
            break;
        }
        if sum < target {
            low = offset;
        } else {
            high = offset;
        }
        offset = (low + high) / 2.0;
    }

    for (tap, &value) in taps.iter_mut().zip(raw) {
        *tap = quantize(value, best_offset) as i32;
    }

    best_error
}

#[inline(always)]
fn floor(x: f64) -> f64 {
    #[cfg(not(feature = "no_std"))]
    return x.floor();
    #[cfg(feature = "no_std")]
    return libm::floor(x);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, ResamplerOptions, fir, planner::FilterSpec, window::linear_tap};

    fn build<T: Sample>(method: Method, in_rate: u32, out_rate: u32) -> (TapCache<T>, RationalRate) {
        let rate = RationalRate::new(in_rate, out_rate).unwrap();
        let spec = FilterSpec::design(method, rate, &ResamplerOptions::default()).unwrap();
        (TapCache::new(spec.kernel(method), spec.n_taps, rate), rate)
    }

    #[test]
    fn test_coefficients_are_aligned() {
        let (cache, _) = build::<f32>(Method::Kaiser, 44100, 48000);
        assert_eq!(cache.coeffs.as_ptr().addr() % 64, 0);
        assert!(cache.coeffs.iter().all(|&coeff| coeff == 0.0));
    }

    #[test]
    fn test_taps_are_computed_lazily() {
        let (mut cache, _) = build::<f64>(Method::Kaiser, 44100, 48000);
        assert!(!cache.is_ready(3));
        let _ = cache.tap(3);
        assert!(cache.is_ready(3));
        assert!(!cache.is_ready(4));
    }

    #[test]
    fn test_float_taps_have_unity_gain() {
        let (mut cache, rate) = build::<f64>(Method::Kaiser, 44100, 48000);
        for phase in 0..rate.out_rate {
            let sum: f64 = cache.tap(phase).coeffs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12, "phase {phase}: sum {sum}");
        }

        let (mut cache, rate) = build::<f32>(Method::BlackmanNuttall, 48000, 32000);
        for phase in 0..rate.out_rate {
            let sum: f32 = cache.tap(phase).coeffs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "phase {phase}: sum {sum}");
        }
    }

    #[test]
    fn test_s16_taps_have_exact_unity_gain() {
        let target = 1i64 << fir::PRECISION_S16;
        for method in [Method::Linear, Method::Kaiser] {
            let (mut cache, rate) = build::<i16>(method, 44100, 48000);
            for phase in 0..rate.out_rate {
                let sum: i64 = cache.tap(phase).coeffs.iter().map(|&c| c as i64).sum();
                assert_eq!(sum, target, "{method:?} phase {phase}");
            }
        }
    }

    #[test]
    fn test_s16_cubic_taps_stay_close_to_unity() {
        let target = 1i64 << fir::PRECISION_S16;
        let (mut cache, rate) = build::<i16>(Method::Cubic, 44100, 48000);
        for phase in 0..rate.out_rate {
            let sum: i64 = cache.tap(phase).coeffs.iter().map(|&c| c as i64).sum();
            assert!((sum - target).abs() <= 2, "phase {phase}: sum {sum}");
        }
    }

    #[test]
    fn test_s32_taps_have_exact_unity_gain() {
        let target = 1i64 << fir::PRECISION_S32;
        let (mut cache, rate) = build::<i32>(Method::Linear, 3, 7);
        for phase in 0..rate.out_rate {
            let sum: i64 = cache.tap(phase).coeffs.iter().map(|&c| c as i64).sum();
            assert_eq!(sum, target, "phase {phase}");
        }
    }

    #[test]
    fn test_quantize_fixed_finds_exact_sum() {
        // Thirds cannot be represented exactly, the bias has to absorb the rounding error.
        let raw = [1.0, 2.0];
        let mut taps = [0i32; 2];
        assert_eq!(quantize_fixed(&raw, 3.0, 15, &mut taps), 0);
        assert_eq!(taps, [10923, 21845]);
    }

    #[test]
    fn test_quantize_fixed_keeps_closest_sum() {
        // Three equal taps move together, the sum jumps from 32766 to 32769.
        let raw = [1.0, 1.0, 1.0];
        let mut taps = [0i32; 3];
        assert_eq!(quantize_fixed(&raw, 3.0, 15, &mut taps), 1);
        assert_eq!(taps, [10923; 3]);
        assert_eq!(taps.iter().sum::<i32>(), (1 << 15) + 1);
    }

    #[test]
    fn test_unity_tap_fits_s16_coefficients() {
        let (mut cache, _) = build::<i16>(Method::Nearest, 1, 1);
        assert_eq!(cache.tap(0).coeffs, &[1 << 15, 0]);
    }

    #[test]
    fn test_linear_taps_match_kernel() {
        // Downsampling by two stretches the linear kernel to four taps.
        let (mut cache, _) = build::<f64>(Method::Linear, 2, 1);
        let raw: Vec<f64> = [-1.0, 0.0, 1.0, 2.0].iter().map(|&x| linear_tap(x, 4)).collect();
        let weight: f64 = raw.iter().sum();
        let tap = cache.tap(0);
        for (coeff, value) in tap.coeffs.iter().zip(&raw) {
            assert!((coeff - value / weight).abs() < 1e-15);
        }
        assert_eq!(tap.sample_inc, 2);
        assert_eq!(tap.next_phase, 0);
    }

    #[test]
    fn test_phase_cycle_advances_exactly_in_rate() {
        let (mut cache, rate) = build::<f32>(Method::Cubic, 44100, 48000);
        let mut phase = 0;
        let mut advance = 0;
        for _ in 0..rate.out_rate {
            let tap = cache.tap(phase);
            advance += tap.sample_inc;
            phase = tap.next_phase;
        }
        assert_eq!(phase, 0);
        assert_eq!(advance, rate.in_rate);
    }

    #[test]
    fn test_nearest_has_single_tap_per_phase() {
        let (mut cache, rate) = build::<f64>(Method::Nearest, 1, 2);
        for phase in 0..rate.out_rate {
            let coeffs = cache.tap(phase).coeffs;
            assert_eq!(coeffs, &[1.0, 0.0], "phase {phase}");
        }
    }
}
