pub mod biquad;
pub mod response;

pub use biquad::{BiquadFilter, DesignIntermediates, FilterCoefficients, FilterState, FilterType};
pub use response::{frequency_response_db, magnitude_db_at};

// FILTER COMPONENT ------------------------------------------------------------

/// A sample-by-sample filter with internal state.
///
/// The resampler runs its low-pass stage through this trait, so any filter a caller
/// supplies behaves exactly like the built-in [`BiquadFilter`].
pub trait FilterInstance: Send {
    fn process_sample(&mut self, input: f64) -> f64;

    /// Clears the internal state so the filter can be reused on an unrelated buffer.
    fn reset(&mut self);

    /// Runs `process_sample` over the buffer in order, carrying state across calls.
    fn process_buffer(&mut self, input: &[f64]) -> Vec<f64> {
        let mut output = Vec::with_capacity(input.len());
        for &sample in input {
            output.push(self.process_sample(sample));
        }
        output
    }
}
