//! Biquad filter design and rational-ratio (L/M) resampling.
//!
//! [`filters`] designs RBJ cookbook biquads and runs them sample by sample. [`processing`]
//! resamples by interpolating, low-pass filtering and decimating, and plans ratios and output
//! lengths for semitone pitch shifts.

pub mod config;
pub mod error;
pub mod filters;
pub mod local;
pub mod processing;
pub mod utils;

pub use error::{ResampleError, Result};
pub use filters::{BiquadFilter, FilterCoefficients, FilterInstance, FilterState, FilterType};
pub use processing::resampler::{
    decimate, interpolate, planned_output_length, resample, RatioPair, RationalResampler,
    ResampledSignal, ResamplerConfig,
};
pub use processing::semitone::{
    plan_ratio_for_length, plan_ratio_for_semitone_shift, plan_semitone_stages,
    planned_semitone_lengths, resample_semitones, ShiftedSignal, SEMITONE_BASE, SEMITONE_BASE_FINE,
};
