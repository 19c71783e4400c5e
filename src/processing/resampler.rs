use crate::error::{ResampleError, Result};
use crate::filters::biquad::{BiquadFilter, FilterCoefficients, FilterType, DEFAULT_Q};
use crate::filters::FilterInstance;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// RATIO
// -----------------------------------------------------------------------------

/// Resampling ratio `output_rate / input_rate = l / m`. The pair is not required to be coprime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatioPair {
    pub l: u32,
    pub m: u32,
}

impl RatioPair {
    pub fn new(l: u32, m: u32) -> Result<Self> {
        let ratio = Self { l, m };
        ratio.validate()?;
        Ok(ratio)
    }

    pub const fn unity() -> Self {
        Self { l: 1, m: 1 }
    }

    /// Reduced ratio converting `input_rate` into `output_rate`, e.g. 44100 -> 48000 is 160/147.
    pub fn from_rates(input_rate: u32, output_rate: u32) -> Result<Self> {
        Self::new(output_rate, input_rate).map(|ratio| ratio.reduced())
    }

    pub fn validate(&self) -> Result<()> {
        if self.l == 0 || self.m == 0 {
            return Err(ResampleError::invalid(format!(
                "L and M must be positive, got {}/{}",
                self.l, self.m
            )));
        }
        Ok(())
    }

    pub fn reduced(&self) -> Self {
        let divisor = gcd(self.l as u64, self.m as u64).max(1) as u32;
        Self {
            l: self.l / divisor,
            m: self.m / divisor,
        }
    }

    pub fn inverted(&self) -> Self {
        Self {
            l: self.m,
            m: self.l,
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.l as f64 / self.m as f64
    }
}

pub(crate) fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

// -----------------------------------------------------------------------------
// LENGTH BOOKKEEPING
// -----------------------------------------------------------------------------

/// `n + (n - 1) * (l - 1)` samples after zero-stuffing, 0 for an empty signal.
pub fn interpolated_length(input_length: usize, l: u32) -> usize {
    if input_length == 0 {
        return 0;
    }
    input_length + (input_length - 1) * (l as usize).saturating_sub(1)
}

/// Number of indices `0, m, 2m, ...` below `input_length`, i.e. `ceil(input_length / m)`.
pub fn decimated_length(input_length: usize, m: u32) -> usize {
    let m = m.max(1) as usize;
    (input_length + m - 1) / m
}

/// Predicted length of [`resample`] output: `ceil((n + (n - 1)(l - 1)) / m)`.
pub fn planned_output_length(input_length: usize, l: u32, m: u32) -> usize {
    decimated_length(interpolated_length(input_length, l), m)
}

// -----------------------------------------------------------------------------
// STAGES
// -----------------------------------------------------------------------------

/// Inserts `l - 1` zeros after every sample but the last.
pub fn interpolate(signal: &[f64], l: u32) -> Result<Vec<f64>> {
    if l == 0 {
        return Err(ResampleError::invalid("interpolation factor L must be positive"));
    }
    let stride = l as usize;
    let mut output = vec![0.0; interpolated_length(signal.len(), l)];
    for (i, &sample) in signal.iter().enumerate() {
        output[i * stride] = sample;
    }
    Ok(output)
}

/// Keeps the samples at indices `0, m, 2m, ...`.
pub fn decimate(signal: &[f64], m: u32) -> Result<Vec<f64>> {
    if m == 0 {
        return Err(ResampleError::invalid("decimation factor M must be positive"));
    }
    let stride = m as usize;
    let mut output = vec![0.0; decimated_length(signal.len(), m)];
    for (i, out) in output.iter_mut().enumerate() {
        *out = signal[i * stride];
    }
    Ok(output)
}

/// Cutoff that suppresses both interpolation images and decimation aliasing:
/// `min(input_rate / 2, input_rate * l / (2 * m))`.
pub fn anti_alias_cutoff(input_rate: u32, ratio: RatioPair) -> f64 {
    let nyquist = input_rate as f64 / 2.0;
    nyquist.min(nyquist * ratio.l as f64 / ratio.m as f64)
}

// -----------------------------------------------------------------------------
// RESAMPLER
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ResamplerConfig {
    /// Q of the biquad low-pass stage.
    pub q: f64,
    /// Multiply kept samples by L to undo the amplitude lost to zero-stuffing. Off by default,
    /// so the output is exactly `decimate(lowpass(interpolate(signal)))`.
    pub compensate_gain: bool,
    /// Divide L and M by their gcd before running.
    pub reduce_ratio: bool,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            q: DEFAULT_Q,
            compensate_gain: false,
            reduce_ratio: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResampledSignal {
    pub samples: Vec<f64>,
    /// `input_rate * l / m`, not necessarily integral.
    pub sample_rate: f64,
    /// The ratio that was actually applied (after optional reduction).
    pub ratio: RatioPair,
}

#[derive(Debug, Clone, Default)]
pub struct RationalResampler {
    config: ResamplerConfig,
}

impl RationalResampler {
    pub fn new(config: ResamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResamplerConfig {
        &self.config
    }

    fn effective_ratio(&self, ratio: RatioPair) -> Result<RatioPair> {
        ratio.validate()?;
        Ok(if self.config.reduce_ratio {
            ratio.reduced()
        } else {
            ratio
        })
    }

    /// The low-pass stage used by [`RationalResampler::resample`], designed at `input_rate * l`.
    /// The intermediate rate is handled in floating point, so it may exceed `u32::MAX`.
    pub fn design_lowpass(&self, input_rate: u32, ratio: RatioPair) -> Result<BiquadFilter> {
        if input_rate == 0 {
            return Err(ResampleError::invalid("input sample rate must be positive"));
        }
        ratio.validate()?;
        let intermediate_rate = input_rate as f64 * ratio.l as f64;
        let coefficients = FilterCoefficients::design_at_rate(
            intermediate_rate,
            anti_alias_cutoff(input_rate, ratio),
            self.config.q,
            FilterType::Lowpass,
        )?;
        Ok(BiquadFilter::new(coefficients))
    }

    /// Interpolates by L, low-pass filters at the intermediate rate and decimates by M.
    ///
    /// The zero-stuffed buffer is never materialized: the filter is fed the same sequence
    /// `interpolate` would build and only every M-th output is kept, so the result is identical
    /// to `decimate(filter(interpolate(signal)))` while memory stays proportional to the output.
    pub fn resample(&self, signal: &[f64], input_rate: u32, ratio: RatioPair) -> Result<ResampledSignal> {
        let ratio = self.effective_ratio(ratio)?;
        if input_rate == 0 {
            return Err(ResampleError::invalid("input sample rate must be positive"));
        }
        let sample_rate = input_rate as f64 * ratio.as_f64();

        // 1/1 has no band to protect; the cutoff would sit exactly on Nyquist
        if ratio.l == 1 && ratio.m == 1 {
            return Ok(ResampledSignal {
                samples: signal.to_vec(),
                sample_rate,
                ratio,
            });
        }

        let mut lowpass = self.design_lowpass(input_rate, ratio)?;
        let samples = self.run_stages(signal, ratio, &mut lowpass);

        Ok(ResampledSignal {
            samples,
            sample_rate,
            ratio,
        })
    }

    /// Same pipeline as [`RationalResampler::resample`] with a caller-supplied low-pass stage.
    /// The filter keeps whatever state it ends with.
    pub fn resample_with_filter<F>(&self, signal: &[f64], ratio: RatioPair, filter: &mut F) -> Result<Vec<f64>>
    where
        F: FilterInstance + ?Sized,
    {
        let ratio = self.effective_ratio(ratio)?;
        Ok(self.run_stages(signal, ratio, filter))
    }

    /// Resamples independent channels in parallel, each through its own filter.
    pub fn resample_channels(
        &self,
        channels: &[Vec<f64>],
        input_rate: u32,
        ratio: RatioPair,
    ) -> Result<Vec<ResampledSignal>> {
        channels
            .par_iter()
            .map(|channel| self.resample(channel, input_rate, ratio))
            .collect()
    }

    fn run_stages<F>(&self, signal: &[f64], ratio: RatioPair, filter: &mut F) -> Vec<f64>
    where
        F: FilterInstance + ?Sized,
    {
        let planned = planned_output_length(signal.len(), ratio.l, ratio.m);
        let mut output = Vec::with_capacity(planned);
        if signal.is_empty() {
            return output;
        }

        let gain = if self.config.compensate_gain {
            ratio.l as f64
        } else {
            1.0
        };
        let zeros_per_sample = ratio.l as usize - 1;
        let last = signal.len() - 1;

        // Counts down to the next index that is a multiple of M
        let mut until_kept = 0usize;
        let mut feed = |value: f64, output: &mut Vec<f64>| {
            let filtered = filter.process_sample(value);
            if until_kept == 0 {
                output.push(filtered * gain);
                until_kept = ratio.m as usize;
            }
            until_kept -= 1;
        };

        for (i, &sample) in signal.iter().enumerate() {
            feed(sample, &mut output);
            if i != last {
                for _ in 0..zeros_per_sample {
                    feed(0.0, &mut output);
                }
            }
        }

        debug_assert_eq!(output.len(), planned);
        output
    }
}

/// Resamples with the default configuration. No gain is applied, so pass-band amplitude drops
/// by a factor of L; use a [`RationalResampler`] with `compensate_gain` to restore it.
pub fn resample(signal: &[f64], input_rate: u32, l: u32, m: u32) -> Result<ResampledSignal> {
    RationalResampler::default().resample(signal, input_rate, RatioPair::new(l, m)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f64> {
        (0..len).map(|i| i as f64 + 1.0).collect()
    }

    #[test]
    fn interpolate_inserts_zeros_between_samples() {
        let output = interpolate(&[1.0, 2.0, 3.0], 3).unwrap();
        assert_eq!(output, vec![1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 3.0]);
        assert_eq!(interpolate(&[4.0], 5).unwrap(), vec![4.0]);
        assert!(interpolate(&[], 4).unwrap().is_empty());
        assert_eq!(interpolate(&[1.0, 2.0], 1).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn decimate_keeps_every_mth_sample() {
        let signal = ramp(10);
        assert_eq!(decimate(&signal, 3).unwrap(), vec![1.0, 4.0, 7.0, 10.0]);
        assert_eq!(decimate(&signal, 5).unwrap(), vec![1.0, 6.0]);
        assert_eq!(decimate(&signal, 1).unwrap(), signal);
        assert!(decimate(&[], 3).unwrap().is_empty());
    }

    #[test]
    fn zero_factors_are_rejected() {
        assert!(matches!(interpolate(&[1.0], 0), Err(ResampleError::InvalidParameter(_))));
        assert!(matches!(decimate(&[1.0], 0), Err(ResampleError::InvalidParameter(_))));
        assert!(RatioPair::new(0, 3).is_err());
        assert!(RatioPair::new(3, 0).is_err());
        assert!(resample(&[1.0, 2.0], 48000, 0, 1).is_err());
        assert!(resample(&[1.0, 2.0], 0, 2, 1).is_err());
    }

    #[test]
    fn ratio_helpers() {
        assert_eq!(RatioPair::from_rates(44100, 48000).unwrap(), RatioPair { l: 160, m: 147 });
        assert_eq!(RatioPair { l: 370, m: 392 }.reduced(), RatioPair { l: 185, m: 196 });
        assert_eq!(RatioPair { l: 185, m: 196 }.inverted(), RatioPair { l: 196, m: 185 });
        assert_eq!(gcd(34567, 0), 34567);
    }

    #[test]
    fn planned_length_small_matrix() {
        assert_eq!(planned_output_length(0, 3, 2), 0);
        assert_eq!(planned_output_length(1, 5, 3), 1);
        assert_eq!(planned_output_length(10, 3, 2), 14);
        assert_eq!(planned_output_length(34567, 1, 1), 34567);
    }

    #[test]
    fn cutoff_is_limited_by_the_narrower_band() {
        assert_eq!(anti_alias_cutoff(44100, RatioPair { l: 2, m: 1 }), 22050.0);
        assert_eq!(anti_alias_cutoff(44100, RatioPair { l: 1, m: 2 }), 11025.0);
    }

    #[test]
    fn fused_matches_staged_composition() {
        let signal: Vec<f64> = (0..97).map(|i| ((i * 31) % 17) as f64 - 8.0).collect();
        let input_rate = 8000;
        for &(l, m) in &[(3u32, 2u32), (2, 5), (7, 7), (1, 3), (5, 1)] {
            let ratio = RatioPair::new(l, m).unwrap();
            let resampler = RationalResampler::new(ResamplerConfig {
                compensate_gain: false,
                ..ResamplerConfig::default()
            });

            let fused = resampler.resample(&signal, input_rate, ratio).unwrap();

            let mut lowpass = resampler.design_lowpass(input_rate, ratio).unwrap();
            let staged = decimate(&lowpass.process_buffer(&interpolate(&signal, l).unwrap()), m).unwrap();

            assert_eq!(fused.samples, staged, "ratio {}/{}", l, m);
            assert_eq!(fused.samples.len(), planned_output_length(signal.len(), l, m));
        }
    }

    #[test]
    fn gain_compensation_scales_by_l() {
        let signal = ramp(40);
        let ratio = RatioPair::new(4, 3).unwrap();
        let raw = RationalResampler::new(ResamplerConfig {
            compensate_gain: false,
            ..ResamplerConfig::default()
        })
        .resample(&signal, 16000, ratio)
        .unwrap();
        let compensated = RationalResampler::new(ResamplerConfig {
            compensate_gain: true,
            ..ResamplerConfig::default()
        })
        .resample(&signal, 16000, ratio)
        .unwrap();

        for (r, c) in raw.samples.iter().zip(&compensated.samples) {
            assert_eq!(r * 4.0, *c);
        }
    }

    #[test]
    fn default_output_is_not_rescaled() {
        let signal = ramp(30);
        let ratio = RatioPair::new(3, 2).unwrap();
        let output = resample(&signal, 8000, 3, 2).unwrap();

        let mut lowpass = RationalResampler::default().design_lowpass(8000, ratio).unwrap();
        let staged = decimate(&lowpass.process_buffer(&interpolate(&signal, 3).unwrap()), 2).unwrap();
        assert_eq!(output.samples, staged);
    }

    #[test]
    fn unity_ratio_is_identity() {
        let signal = ramp(16);
        let output = resample(&signal, 44100, 1, 1).unwrap();
        assert_eq!(output.samples, signal);
        assert_eq!(output.sample_rate, 44100.0);
    }

    #[test]
    fn reduce_ratio_changes_the_applied_pair() {
        let resampler = RationalResampler::new(ResamplerConfig {
            reduce_ratio: true,
            ..ResamplerConfig::default()
        });
        let output = resampler
            .resample(&ramp(100), 48000, RatioPair { l: 4, m: 2 })
            .unwrap();
        assert_eq!(output.ratio, RatioPair { l: 2, m: 1 });
        assert_eq!(output.samples.len(), planned_output_length(100, 2, 1));
        assert_eq!(output.sample_rate, 96000.0);
    }

    #[test]
    fn empty_signal_yields_empty_output() {
        let output = resample(&[], 48000, 185, 196).unwrap();
        assert!(output.samples.is_empty());
    }

    #[test]
    fn intermediate_rate_beyond_u32_is_supported() {
        let output = resample(&[1.0, 2.0, 3.0], 48000, 99999, 100000).unwrap();
        assert_eq!(output.samples.len(), planned_output_length(3, 99999, 100000));
        assert_eq!(output.samples.len(), 2);
        assert!(output.samples.iter().all(|x| x.is_finite()));
        assert!((output.sample_rate - 47999.52).abs() < 1e-6);
    }
}
