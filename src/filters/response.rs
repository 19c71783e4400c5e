//! Magnitude response of a biquad, for plotting and diagnostics.
//!
//! The coefficient arrays are zero-padded to the FFT size and transformed with `rustfft`;
//! the response in each bin is `|B(k)| / |A(k)|`.

use super::biquad::FilterCoefficients;
use crate::error::{ResampleError, Result};

use num_complex::Complex;
use rustfft::FftPlanner;

/// Returns `(frequency_hz, magnitude_db)` for bins `0..=fft_size / 2`.
///
/// # Arguments
///
/// * `coefficients` - The filter to analyse
/// * `sample_rate` - Sample rate the coefficients were designed for
/// * `fft_size` - Number of FFT points, at least 3 so both coefficient arrays fit
///
/// # Returns
///
/// * `Result<Vec<(f64, f64)>>` - One entry per bin from DC up to Nyquist. A bin where the
///   numerator vanishes reports negative infinity.
pub fn frequency_response_db(
    coefficients: &FilterCoefficients,
    sample_rate: u32,
    fft_size: usize,
) -> Result<Vec<(f64, f64)>> {
    if sample_rate == 0 {
        return Err(ResampleError::invalid("sample rate must be positive"));
    }
    if fft_size < 3 {
        return Err(ResampleError::invalid(format!(
            "FFT size must be at least 3, got {}",
            fft_size
        )));
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_size);

    let mut numerator = padded(&coefficients.b(), fft_size);
    let mut denominator = padded(&coefficients.a(), fft_size);
    fft.process(&mut numerator);
    fft.process(&mut denominator);

    let bin_width = sample_rate as f64 / fft_size as f64;
    let response = numerator
        .iter()
        .zip(denominator.iter())
        .take(fft_size / 2 + 1)
        .enumerate()
        .map(|(k, (b, a))| (k as f64 * bin_width, 20.0 * (b.norm() / a.norm()).log10()))
        .collect();

    Ok(response)
}

/// Magnitude in dB at a single frequency, evaluated directly on the unit circle.
pub fn magnitude_db_at(coefficients: &FilterCoefficients, sample_rate: u32, frequency: f64) -> f64 {
    let omega = 2.0 * std::f64::consts::PI * frequency / sample_rate as f64;
    let z_inv = Complex::new(omega.cos(), -omega.sin());
    let z_inv2 = z_inv * z_inv;

    let b = coefficients.b();
    let a = coefficients.a();
    let num = b[0] + z_inv * b[1] + z_inv2 * b[2];
    let den = a[0] + z_inv * a[1] + z_inv2 * a[2];

    20.0 * (num.norm() / den.norm()).log10()
}

fn padded(taps: &[f64; 3], fft_size: usize) -> Vec<Complex<f64>> {
    let mut buffer = vec![Complex::new(0.0, 0.0); fft_size];
    for (slot, &tap) in buffer.iter_mut().zip(taps.iter()) {
        slot.re = tap;
    }
    buffer
}
