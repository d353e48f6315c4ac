//! A streaming polyphase audio resampler.
//!
//! Converts interleaved or planar audio between two arbitrary sample rates. The conversion
//! ratio is reduced to lowest terms and stepped through with integer arithmetic only, so
//! streams of any length can be processed in chunks of any size without timing drift.
//!
//! The filter is a polyphase FIR filter with one coefficient set per output phase. The
//! coefficients are computed lazily from the selected [`Method`] on first use.
//!
//! Supported sample formats are `f64`, `f32`, `i32` and `i16` (see [`SampleFormat`]). Integer
//! formats are filtered in fixed-point arithmetic with coefficients quantized to exact unity
//! gain.
//!
//! # Example
//!
//! ```rust
//! use audio_resampler::{Layout, Method, Resampler, ResamplerOptions};
//!
//! let mut resampler = Resampler::<i16>::new(
//!     Method::Cubic,
//!     Layout::Planar,
//!     2,
//!     44100,
//!     48000,
//!     ResamplerOptions::default(),
//! )
//! .unwrap();
//!
//! let left = vec![0i16; 441];
//! let right = vec![0i16; 441];
//! let out_frames = resampler.out_frames(441);
//! let mut left_out = vec![0i16; out_frames];
//! let mut right_out = vec![0i16; out_frames];
//!
//! let (consumed, produced) = resampler
//!     .resample(
//!         Some(&[left.as_slice(), right.as_slice()]),
//!         441,
//!         &mut [left_out.as_mut_slice(), right_out.as_mut_slice()],
//!         out_frames,
//!     )
//!     .unwrap();
//!
//! assert_eq!(consumed, 441);
//! assert_eq!(produced, out_frames);
//! ```
#![cfg_attr(feature = "no_std", no_std)]

extern crate alloc;

mod error;
mod fir;
mod history;
mod planner;
mod resampler;
mod sample;
mod taps;
mod window;

pub use error::ResampleError;
pub use planner::{FilterSpec, Quality, ResamplerOptions};
pub use resampler::Resampler;
pub use sample::{Sample, SampleFormat};

/// The interpolation kernel of the filter.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// Picks the closest input frame. Fastest, with strong aliasing.
    Nearest,
    /// Linear interpolation between the two neighbouring frames.
    Linear,
    /// Mitchell-Netravali cubic interpolation, see [`ResamplerOptions::with_cubic`].
    Cubic,
    /// Sinc windowed by a Blackman-Nuttall window.
    BlackmanNuttall,
    /// Sinc windowed by a Kaiser window, designed from the stopband attenuation and the
    /// transition bandwidth.
    #[default]
    Kaiser,
}

/// How the channels of one buffer are arranged.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Layout {
    /// One slice holding all channels, frame by frame: `[L0, R0, L1, R1, ...]`.
    #[default]
    Interleaved,
    /// One slice per channel.
    Planar,
}
