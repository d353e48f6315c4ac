use core::f64::consts::PI;

/// Continuous-time interpolation kernel, evaluated at a distance `x` (in input samples) from
/// the output position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Kernel {
    Nearest,
    Linear,
    /// Mitchell-Netravali cubic with its B and C parameters.
    Cubic { b: f64, c: f64 },
    BlackmanNuttall { cutoff: f64 },
    Kaiser { cutoff: f64, beta: f64 },
}

impl Kernel {
    /// Evaluates the kernel at `x` for a filter of `n_taps` taps.
    #[inline]
    pub(crate) fn evaluate(&self, x: f64, n_taps: usize) -> f64 {
        match *self {
            Kernel::Nearest => nearest_tap(x),
            Kernel::Linear => linear_tap(x, n_taps),
            Kernel::Cubic { b, c } => cubic_tap(x, n_taps, b, c),
            Kernel::BlackmanNuttall { cutoff } => blackman_nuttall_tap(x, n_taps, cutoff),
            Kernel::Kaiser { cutoff, beta } => kaiser_tap(x, n_taps, cutoff, beta),
        }
    }
}

/// Box kernel over the half-open interval `[-0.5, 0.5)`.
///
/// The interval is half-open so that exactly one of the integer-spaced tap offsets hits the
/// support, also at a phase of exactly one half.
pub(crate) fn nearest_tap(x: f64) -> f64 {
    if (-0.5..0.5).contains(&x) { 1.0 } else { 0.0 }
}

/// Triangle kernel spanning the whole filter.
pub(crate) fn linear_tap(x: f64, n_taps: usize) -> f64 {
    let a = x.abs() / n_taps as f64;
    if a < 1.0 { 1.0 - a } else { 0.0 }
}

/// Mitchell-Netravali cubic kernel with support `|4x / n_taps| <= 2`.
///
/// `(b, c)` of `(1, 0)` is the cubic B-spline, `(0, 0.5)` Catmull-Rom and `(0, 0)` Hermite.
pub(crate) fn cubic_tap(x: f64, n_taps: usize, b: f64, c: f64) -> f64 {
    let a = (x * 4.0).abs() / n_taps as f64;
    let a2 = a * a;
    let a3 = a2 * a;

    if a <= 1.0 {
        ((12.0 - 9.0 * b - 6.0 * c) * a3 + (-18.0 + 12.0 * b + 6.0 * c) * a2 + (6.0 - 2.0 * b))
            / 6.0
    } else if a <= 2.0 {
        ((-b - 6.0 * c) * a3
            + (6.0 * b + 30.0 * c) * a2
            + (-12.0 * b - 48.0 * c) * a
            + (8.0 * b + 24.0 * c))
            / 6.0
    } else {
        0.0
    }
}

/// Scaled sinc `sin(pi x fc) / (pi x)`, which is `fc` at `x == 0`.
#[inline]
fn scaled_sinc(x: f64, cutoff: f64) -> f64 {
    let y = PI * x;
    if y == 0.0 { cutoff } else { sin(y * cutoff) / y }
}

/// Sinc windowed by the 4-term Blackman-Nuttall window.
pub(crate) fn blackman_nuttall_tap(x: f64, n_taps: usize, cutoff: f64) -> f64 {
    let w = 2.0 * PI * x / n_taps as f64 + PI;
    let window = 0.3635819 - 0.4891775 * cos(w) + 0.1365995 * cos(2.0 * w)
        - 0.0106411 * cos(3.0 * w);
    scaled_sinc(x, cutoff) * window
}

/// Sinc windowed by a Kaiser window.
///
/// The window is left unnormalized (`I0(beta)` at the center); the taps are normalized to
/// unity gain afterwards anyway.
pub(crate) fn kaiser_tap(x: f64, n_taps: usize, cutoff: f64, beta: f64) -> f64 {
    let w = 2.0 * x / n_taps as f64;
    scaled_sinc(x, cutoff) * bessel_i0(beta * sqrt((1.0 - w * w).max(0.0)))
}

/// Kaiser beta for a stopband attenuation of `attenuation` dB.
pub(crate) fn kaiser_beta(attenuation: f64) -> f64 {
    if attenuation > 50.0 {
        0.1102 * (attenuation - 8.7)
    } else if attenuation >= 21.0 {
        0.5842 * powf(attenuation - 21.0, 0.4) + 0.07886 * (attenuation - 21.0)
    } else {
        0.0
    }
}

/// Kaiser filter order for a stopband attenuation in dB and a normalized transition bandwidth.
pub(crate) fn kaiser_order(attenuation: f64, transition_bandwidth: f64) -> f64 {
    // Transition width in radians.
    let dw = 2.0 * PI * transition_bandwidth;
    (attenuation - 8.0) / (2.285 * dw)
}

/// Modified Bessel function of the first kind, order zero (power series).
fn bessel_i0(x: f64) -> f64 {
    let base = x * x / 4.0;

    let mut term = 1.0;
    let mut result = 1.0;

    for idx in 1..1500 {
        term = term * base / (idx * idx) as f64;
        let previous = result;
        result += term;
        if result == previous {
            break;
        }
    }

    result
}

#[inline(always)]
fn sin(x: f64) -> f64 {
    #[cfg(not(feature = "no_std"))]
    return x.sin();
    #[cfg(feature = "no_std")]
    return libm::sin(x);
}

#[inline(always)]
fn cos(x: f64) -> f64 {
    #[cfg(not(feature = "no_std"))]
    return x.cos();
    #[cfg(feature = "no_std")]
    return libm::cos(x);
}

#[inline(always)]
fn sqrt(x: f64) -> f64 {
    #[cfg(not(feature = "no_std"))]
    return x.sqrt();
    #[cfg(feature = "no_std")]
    return libm::sqrt(x);
}

#[inline(always)]
fn powf(x: f64, y: f64) -> f64 {
    #[cfg(not(feature = "no_std"))]
    return x.powf(y);
    #[cfg(feature = "no_std")]
    return libm::pow(x, y);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "Expected {expected}, got {actual}"
        );
    }

    fn assert_approx_f64(actual: f64, expected: f64) {
        assert!(
            (actual / expected - 1.0).abs() < 0.000001,
            "Expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_bessel_i0_known_values() {
        // Test against scipy.special.i0 reference values
        assert_approx_f64(bessel_i0(0.0), 1.000000000000000);
        assert_approx_f64(bessel_i0(1.0), 1.266065877752008);
        assert_approx_f64(bessel_i0(2.0), 2.279585302336067);
        assert_approx_f64(bessel_i0(5.0), 27.239871823604442);
        assert_approx_f64(bessel_i0(10.0), 2815.716628466253951);
    }

    #[test]
    fn test_kaiser_beta_branches() {
        assert_approx(kaiser_beta(85.0), 0.1102 * 76.3, 1e-12);
        assert_approx(kaiser_beta(120.0), 12.26526, 1e-9);
        // 0.5842 * 9^0.4 + 0.07886 * 9
        assert_approx(kaiser_beta(30.0), 2.116625, 1e-5);
        assert_approx(kaiser_beta(21.0), 0.0, 1e-12);
        assert_eq!(kaiser_beta(20.9), 0.0);
    }

    #[test]
    fn test_kaiser_order() {
        // Default quality: 85 dB over a 0.087 transition band gives an order of ~61.6.
        let order = kaiser_order(85.0, 0.087);
        assert_approx(order, 61.646, 1e-3);
    }

    #[test]
    fn test_nearest_tap_half_open() {
        assert_eq!(nearest_tap(0.0), 1.0);
        assert_eq!(nearest_tap(0.49), 1.0);
        assert_eq!(nearest_tap(-0.5), 1.0);
        assert_eq!(nearest_tap(0.5), 0.0);
        assert_eq!(nearest_tap(-0.51), 0.0);
    }

    #[test]
    fn test_linear_tap() {
        assert_eq!(linear_tap(0.0, 4), 1.0);
        assert_eq!(linear_tap(-1.0, 4), 0.75);
        assert_eq!(linear_tap(2.0, 4), 0.5);
        assert_eq!(linear_tap(4.0, 4), 0.0);
        assert_eq!(linear_tap(-5.0, 4), 0.0);
    }

    #[test]
    fn test_cubic_tap_presets() {
        // B-spline: 2/3 at the center, 1/6 one sample away.
        assert_approx(cubic_tap(0.0, 4, 1.0, 0.0), 2.0 / 3.0, 1e-12);
        assert_approx(cubic_tap(1.0, 4, 1.0, 0.0), 1.0 / 6.0, 1e-12);
        // Catmull-Rom interpolates: 1 at the center, 0 at the neighbours.
        assert_approx(cubic_tap(0.0, 4, 0.0, 0.5), 1.0, 1e-12);
        assert_approx(cubic_tap(1.0, 4, 0.0, 0.5), 0.0, 1e-12);
        // Zero beyond the support.
        assert_eq!(cubic_tap(2.5, 4, 1.0, 0.0), 0.0);
    }

    #[test]
    fn test_blackman_nuttall_center_is_cutoff() {
        // The window coefficients sum to one at the center.
        assert_approx(blackman_nuttall_tap(0.0, 48, 0.85), 0.85, 1e-6);
        // The window closes at the filter edges.
        assert_approx(blackman_nuttall_tap(24.0, 48, 0.85), 0.0, 1e-3);
    }

    #[test]
    fn test_kaiser_tap_center_and_edge() {
        let beta = kaiser_beta(85.0);
        assert_approx_f64(kaiser_tap(0.0, 64, 0.94, beta), 0.94 * bessel_i0(beta));
        // Outside of the window only the unit Bessel term is left.
        let edge = kaiser_tap(40.0, 64, 0.94, beta);
        let sinc = sin(PI * 40.0 * 0.94) / (PI * 40.0);
        assert_approx(edge, sinc, 1e-12);
    }

    #[test]
    fn test_kernel_dispatch() {
        let kernel = Kernel::Cubic { b: 0.0, c: 0.5 };
        assert_eq!(kernel.evaluate(0.0, 4), cubic_tap(0.0, 4, 0.0, 0.5));
        assert_eq!(Kernel::Linear.evaluate(1.0, 2), 0.5);
        assert_eq!(Kernel::Nearest.evaluate(0.2, 2), 1.0);
    }
}
