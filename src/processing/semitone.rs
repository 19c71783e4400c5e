use super::resampler::{gcd, planned_output_length, RatioPair, RationalResampler};
use crate::error::{ResampleError, Result};

/// Single-semitone step, 185/196 ~ 2^(-1/12) (error ~3e-6).
pub const SEMITONE_BASE: RatioPair = RatioPair { l: 185, m: 196 };

/// Finer single-semitone step, 7450/7893 ~ 2^(-1/12) (error ~6e-9). Much larger intermediate buffers.
pub const SEMITONE_BASE_FINE: RatioPair = RatioPair { l: 7450, m: 7893 };

// -----------------------------------------------------------------------------
// PLANNING
// -----------------------------------------------------------------------------

/// Ratio for the whole of `shift`, `base^|shift|` for pitching up and its inverse for pitching
/// down, approximating 2^(-shift/12).
///
/// `base` is the step for pitching up: it shortens the signal by roughly 2^(-1/12), so the
/// result played back at the input rate sounds `base.m / base.l` ~ 2^(1/12) higher. A zero
/// shift is 1/1. Powers that do not fit in 32-bit factors are rejected; use
/// [`plan_semitone_stages`] to chain single steps instead.
pub fn plan_ratio_for_semitone_shift(shift: i32, base: RatioPair) -> Result<RatioPair> {
    let step = semitone_step(shift, base)?.reduced();
    if step == RatioPair::unity() {
        return Ok(step);
    }
    let mut ratio = RatioPair::unity();
    for _ in 0..shift.unsigned_abs() {
        ratio = match (ratio.l.checked_mul(step.l), ratio.m.checked_mul(step.m)) {
            (Some(l), Some(m)) => RatioPair { l, m }.reduced(),
            _ => {
                return Err(ResampleError::invalid(format!(
                    "{}/{} to the power {} does not fit in 32-bit factors",
                    step.l,
                    step.m,
                    shift.unsigned_abs()
                )))
            }
        };
    }
    Ok(ratio)
}

fn semitone_step(shift: i32, base: RatioPair) -> Result<RatioPair> {
    base.validate()?;
    Ok(match shift.signum() {
        1 => base,
        -1 => base.inverted(),
        _ => RatioPair::unity(),
    })
}

/// One single-semitone stage per semitone of `shift`. The step ratio is compounded stage by
/// stage instead of raising L and M to the k-th power, which keeps intermediate rates bounded.
pub fn plan_semitone_stages(shift: i32, base: RatioPair) -> Result<Vec<RatioPair>> {
    let step = semitone_step(shift, base)?;
    Ok(vec![step; shift.unsigned_abs() as usize])
}

/// Running output length after each stage of a `shift` semitone change.
pub fn planned_semitone_lengths(input_length: usize, shift: i32, base: RatioPair) -> Result<Vec<usize>> {
    let stages = plan_semitone_stages(shift, base)?;
    let mut length = input_length;
    Ok(stages
        .iter()
        .map(|stage| {
            length = planned_output_length(length, stage.l, stage.m);
            length
        })
        .collect())
}

/// Ratio turning `input_length` samples into (about) `target_length`: `L = target / g`,
/// `M = input / g` with `g = gcd(input, target)`.
///
/// Zero-stuffing leaves `L - 1` samples out after the last input sample, so the planned
/// output falls short of `target_length` by `floor((L - 1) / M)` samples.
pub fn plan_ratio_for_length(input_length: usize, target_length: usize) -> Result<RatioPair> {
    if input_length == 0 || target_length == 0 {
        return Err(ResampleError::invalid(format!(
            "lengths must be positive, got {} -> {}",
            input_length, target_length
        )));
    }
    let divisor = gcd(input_length as u64, target_length as u64);
    let l = u32::try_from(target_length as u64 / divisor);
    let m = u32::try_from(input_length as u64 / divisor);
    match (l, m) {
        (Ok(l), Ok(m)) => RatioPair::new(l, m),
        _ => Err(ResampleError::invalid(format!(
            "ratio {} -> {} does not reduce to 32-bit factors",
            input_length, target_length
        ))),
    }
}

// -----------------------------------------------------------------------------
// EXECUTION
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftedSignal {
    pub samples: Vec<f64>,
    /// Playback rate, unchanged from the input.
    pub sample_rate: u32,
    pub stages: Vec<RatioPair>,
    /// Length after each stage.
    pub stage_lengths: Vec<usize>,
}

impl RationalResampler {
    /// Pitch-shifts by `shift` semitones by chaining single-step resamples. Every stage treats
    /// its input as running at `input_rate`.
    pub fn resample_semitones(
        &self,
        signal: &[f64],
        input_rate: u32,
        shift: i32,
        base: RatioPair,
    ) -> Result<ShiftedSignal> {
        if input_rate == 0 {
            return Err(ResampleError::invalid("input sample rate must be positive"));
        }
        let stages = plan_semitone_stages(shift, base)?;
        let mut samples = signal.to_vec();
        let mut stage_lengths = Vec::with_capacity(stages.len());
        let mut applied = Vec::with_capacity(stages.len());

        for &stage in &stages {
            let output = self.resample(&samples, input_rate, stage)?;
            stage_lengths.push(output.samples.len());
            applied.push(output.ratio);
            samples = output.samples;
        }

        Ok(ShiftedSignal {
            samples,
            sample_rate: input_rate,
            stages: applied,
            stage_lengths,
        })
    }
}

/// Semitone shift with the default resampler configuration and the 185/196 step.
pub fn resample_semitones(signal: &[f64], input_rate: u32, shift: i32) -> Result<ShiftedSignal> {
    RationalResampler::default().resample_semitones(signal, input_rate, shift, SEMITONE_BASE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_of_each_sign() {
        let up = plan_ratio_for_semitone_shift(1, SEMITONE_BASE).unwrap();
        let down = plan_ratio_for_semitone_shift(-1, SEMITONE_BASE).unwrap();
        assert_eq!(up, RatioPair { l: 185, m: 196 });
        assert_eq!(down, RatioPair { l: 196, m: 185 });
        assert_eq!(plan_ratio_for_semitone_shift(0, SEMITONE_BASE).unwrap(), RatioPair::unity());

        // Playback pitch ratio is m / l
        let semitone = 2f64.powf(1.0 / 12.0);
        assert!((1.0 / up.as_f64() - semitone).abs() < 1e-4);
        assert!((1.0 / down.as_f64() - 1.0 / semitone).abs() < 1e-4);
    }

    #[test]
    fn whole_shift_is_a_power_of_the_step() {
        assert_eq!(
            plan_ratio_for_semitone_shift(2, SEMITONE_BASE).unwrap(),
            RatioPair { l: 185 * 185, m: 196 * 196 }
        );
        assert_eq!(
            plan_ratio_for_semitone_shift(-3, SEMITONE_BASE).unwrap(),
            RatioPair { l: 196 * 196 * 196, m: 185 * 185 * 185 }
        );

        for shift in [-3, -2, 2, 3] {
            let ratio = plan_ratio_for_semitone_shift(shift, SEMITONE_BASE).unwrap();
            let exact = 2f64.powf(-shift as f64 / 12.0);
            let relative = (ratio.as_f64() - exact).abs() / exact;
            assert!(relative < 5e-6 * shift.abs() as f64, "shift {}: {}", shift, ratio.as_f64());
        }
    }

    #[test]
    fn oversized_powers_are_rejected() {
        assert!(plan_ratio_for_semitone_shift(4, SEMITONE_BASE).is_ok());
        assert!(matches!(
            plan_ratio_for_semitone_shift(5, SEMITONE_BASE),
            Err(ResampleError::InvalidParameter(_))
        ));
        assert!(plan_ratio_for_semitone_shift(-3, SEMITONE_BASE_FINE).is_err());
        // chained stages stay available for large shifts
        assert_eq!(plan_semitone_stages(5, SEMITONE_BASE).unwrap(), vec![SEMITONE_BASE; 5]);
    }

    #[test]
    fn fine_base_is_closer() {
        let exact = 2f64.powf(-1.0 / 12.0);
        let coarse = (SEMITONE_BASE.as_f64() - exact).abs();
        let fine = (SEMITONE_BASE_FINE.as_f64() - exact).abs();
        assert!(fine < coarse);
    }

    #[test]
    fn stage_count_follows_magnitude() {
        assert_eq!(plan_semitone_stages(3, SEMITONE_BASE).unwrap().len(), 3);
        assert_eq!(plan_semitone_stages(-2, SEMITONE_BASE).unwrap().len(), 2);
        assert!(plan_semitone_stages(0, SEMITONE_BASE).unwrap().is_empty());
        assert!(plan_semitone_stages(1, RatioPair { l: 0, m: 1 }).is_err());
    }

    #[test]
    fn running_lengths_compound() {
        assert_eq!(
            planned_semitone_lengths(34567, 2, SEMITONE_BASE).unwrap(),
            vec![32627, 30795]
        );
        assert_eq!(
            planned_semitone_lengths(34567, -2, SEMITONE_BASE).unwrap(),
            vec![36622, 38799]
        );
        assert_eq!(
            planned_semitone_lengths(34567, 1, SEMITONE_BASE_FINE).unwrap(),
            vec![32626]
        );
    }

    #[test]
    fn ratio_for_length() {
        assert_eq!(plan_ratio_for_length(44100, 48000).unwrap(), RatioPair { l: 160, m: 147 });
        assert_eq!(plan_ratio_for_length(100, 50).unwrap(), RatioPair { l: 1, m: 2 });
        assert!(plan_ratio_for_length(0, 10).is_err());

        let ratio = plan_ratio_for_length(300, 400).unwrap();
        let planned = planned_output_length(300, ratio.l, ratio.m);
        assert_eq!(planned, 400 - ((ratio.l - 1) / ratio.m) as usize);
    }

    #[test]
    fn zero_shift_returns_input() {
        let signal = vec![0.5, -0.5, 0.25];
        let shifted = resample_semitones(&signal, 44100, 0).unwrap();
        assert_eq!(shifted.samples, signal);
        assert!(shifted.stages.is_empty());
        assert_eq!(shifted.sample_rate, 44100);
    }
}
