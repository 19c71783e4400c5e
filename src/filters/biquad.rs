// Biquad filter, 2nd order, RBJ cookbook coefficients
use super::FilterInstance;
use crate::error::{ResampleError, Result};

use serde::{Deserialize, Serialize};

/// Butterworth Q, maximally flat passband.
pub const DEFAULT_Q: f64 = 0.707;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
}

// DESIGN COMPONENT ------------------------------------------------------------

/// Intermediate values of the cookbook design for one (sample rate, cutoff, Q) triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignIntermediates {
    pub omega: f64,
    pub tsin: f64,
    pub tcos: f64,
    pub alpha: f64,
}

impl DesignIntermediates {
    /// Validates the parameters and computes `omega`, `sin(omega)`, `cos(omega)` and `alpha`.
    ///
    /// The cutoff must lie strictly between 0 and Nyquist and Q must be positive.
    pub fn compute(sample_rate: u32, cutoff: f64, q: f64) -> Result<Self> {
        if sample_rate == 0 {
            return Err(ResampleError::invalid("sample rate must be positive"));
        }
        Self::compute_at_rate(sample_rate as f64, cutoff, q)
    }

    /// [`DesignIntermediates::compute`] for a rate that need not be integral or fit in `u32`,
    /// such as the intermediate rate `input_rate * L` of a resampler.
    pub fn compute_at_rate(sample_rate: f64, cutoff: f64, q: f64) -> Result<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ResampleError::invalid(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        let nyquist = sample_rate / 2.0;
        if !cutoff.is_finite() || cutoff <= 0.0 || cutoff >= nyquist {
            return Err(ResampleError::invalid(format!(
                "cutoff {} Hz must lie in (0, {}) for sample rate {}",
                cutoff, nyquist, sample_rate
            )));
        }
        if !q.is_finite() || q <= 0.0 {
            return Err(ResampleError::invalid(format!("Q must be positive, got {}", q)));
        }

        let omega = 2.0 * std::f64::consts::PI * cutoff / sample_rate;
        let (tsin, tcos) = omega.sin_cos();
        let alpha = tsin / (2.0 * q);

        Ok(Self {
            omega,
            tsin,
            tcos,
            alpha,
        })
    }

    /// Unnormalized `(b, a)` for the requested response. `a[0]` is `1 + alpha`.
    pub fn unnormalized(&self, filter_type: FilterType) -> ([f64; 3], [f64; 3]) {
        let Self { tcos, alpha, .. } = *self;
        let a = [1.0 + alpha, -2.0 * tcos, 1.0 - alpha];

        let b = match filter_type {
            FilterType::Lowpass => [(1.0 - tcos) / 2.0, 1.0 - tcos, (1.0 - tcos) / 2.0],
            FilterType::Highpass => [(1.0 + tcos) / 2.0, -(1.0 + tcos), (1.0 + tcos) / 2.0],
            FilterType::Bandpass => [alpha, 0.0, -alpha],
        };

        (b, a)
    }
}

/// Feedforward `b` and feedback `a` coefficients of a biquad, always normalized so `a[0] == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterCoefficients {
    b: [f64; 3],
    a: [f64; 3],
}

impl FilterCoefficients {
    /// Designs a lowpass, highpass or bandpass biquad.
    pub fn design(sample_rate: u32, cutoff: f64, q: f64, filter_type: FilterType) -> Result<Self> {
        let intermediates = DesignIntermediates::compute(sample_rate, cutoff, q)?;
        let (b, a) = intermediates.unnormalized(filter_type);
        Self::from_raw(b, a)
    }

    /// Designs at a floating-point sample rate, see [`DesignIntermediates::compute_at_rate`].
    pub fn design_at_rate(sample_rate: f64, cutoff: f64, q: f64, filter_type: FilterType) -> Result<Self> {
        let intermediates = DesignIntermediates::compute_at_rate(sample_rate, cutoff, q)?;
        let (b, a) = intermediates.unnormalized(filter_type);
        Self::from_raw(b, a)
    }

    /// Normalizes arbitrary coefficients by `a[0]`.
    pub fn from_raw(b: [f64; 3], a: [f64; 3]) -> Result<Self> {
        let a0 = a[0];
        if a0 == 0.0 || !a0.is_finite() {
            return Err(ResampleError::invalid(format!(
                "a0 must be finite and non-zero, got {}",
                a0
            )));
        }

        Ok(Self {
            b: [b[0] / a0, b[1] / a0, b[2] / a0],
            a: [1.0, a[1] / a0, a[2] / a0],
        })
    }

    /// Pass-through filter, `y = x`.
    pub fn identity() -> Self {
        Self {
            b: [1.0, 0.0, 0.0],
            a: [1.0, 0.0, 0.0],
        }
    }

    pub fn b(&self) -> [f64; 3] {
        self.b
    }

    pub fn a(&self) -> [f64; 3] {
        self.a
    }
}

// RUNTIME COMPONENT -----------------------------------------------------------

/// The two delay registers of the transposed direct form II recurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterState {
    pub reg0: f64,
    pub reg1: f64,
}

#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coefficients: FilterCoefficients,
    state: FilterState,
}

impl BiquadFilter {
    pub fn new(coefficients: FilterCoefficients) -> Self {
        BiquadFilter {
            coefficients,
            state: FilterState::default(),
        }
    }

    pub fn design(sample_rate: u32, cutoff: f64, q: f64, filter_type: FilterType) -> Result<Self> {
        Ok(Self::new(FilterCoefficients::design(
            sample_rate,
            cutoff,
            q,
            filter_type,
        )?))
    }

    // Butterworth lowpass, Q set to 0.707
    pub fn lowpass(sample_rate: u32, cutoff: f64) -> Result<Self> {
        Self::design(sample_rate, cutoff, DEFAULT_Q, FilterType::Lowpass)
    }

    // Filter an input sample and update the internal state.
    // NaN or infinite input is not checked and poisons the state from then on.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let [b0, b1, b2] = self.coefficients.b;
        let [_, a1, a2] = self.coefficients.a;
        let FilterState { reg0, reg1 } = self.state;

        let output = b0 * input + reg0;
        self.state.reg0 = b1 * input + reg1 - a1 * output;
        self.state.reg1 = b2 * input - a2 * output;

        output
    }

    pub fn process_buffer(&mut self, input: &[f64]) -> Vec<f64> {
        let mut output = vec![0.0; input.len()];
        for (out, &sample) in output.iter_mut().zip(input) {
            *out = self.process(sample);
        }
        output
    }

    pub fn reset(&mut self) {
        self.state = FilterState::default();
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn coefficients(&self) -> &FilterCoefficients {
        &self.coefficients
    }
}

impl FilterInstance for BiquadFilter {
    fn process_sample(&mut self, input: f64) -> f64 {
        self.process(input)
    }

    fn reset(&mut self) {
        BiquadFilter::reset(self);
    }

    fn process_buffer(&mut self, input: &[f64]) -> Vec<f64> {
        BiquadFilter::process_buffer(self, input)
    }
}
