use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Test and demo signals

pub fn sine_wave(frequency: f64, sample_rate: u32, amplitude: f64, length: usize) -> Vec<f64> {
    let step = 2.0 * std::f64::consts::PI * frequency / sample_rate as f64;
    (0..length)
        .map(|i| amplitude * f64::sin(step * i as f64))
        .collect()
}

/// Uniform noise in `[-amplitude, amplitude)`, reproducible for a given seed.
pub fn white_noise(length: usize, amplitude: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..length)
        .map(|_| rng.gen_range(-amplitude..amplitude))
        .collect()
}

/// Peak absolute value, 0 for an empty slice.
pub fn peak(signal: &[f64]) -> f64 {
    signal.iter().fold(0.0, |max, &x| max.max(x.abs()))
}

/// Root mean square, 0 for an empty slice.
pub fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_seeded() {
        assert_eq!(white_noise(64, 1.0, 7), white_noise(64, 1.0, 7));
        assert_ne!(white_noise(64, 1.0, 7), white_noise(64, 1.0, 8));
        assert!(peak(&white_noise(1000, 0.5, 1)) <= 0.5);
    }

    #[test]
    fn sine_rms_is_amplitude_over_root_two() {
        let sine = sine_wave(1000.0, 48000, 2.0, 48000);
        assert!((rms(&sine) - 2.0 / 2f64.sqrt()).abs() < 1e-6);
        assert!((peak(&sine) - 2.0).abs() < 1e-3);
    }
}
