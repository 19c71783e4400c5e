pub mod resampler;
pub mod semitone;
pub mod signal_processor;
