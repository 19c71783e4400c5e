use super::resampler::{RatioPair, RationalResampler};
use super::semitone::{plan_ratio_for_length, plan_semitone_stages, SEMITONE_BASE};
use crate::config::{Config, ProcessorConfig, StageConfig};
use crate::error::{ResampleError, Result};
use crate::filters::biquad::BiquadFilter;
use crate::filters::FilterInstance;
use crate::utils::log::{log_csv, log_with_header};

use std::time::Instant;

const LOG_FILE: &str = "processor.log";
const STAGE_CSV: &str = "stages.csv";

// -----------------------------------------------------------------------------
// SIGNAL PROCESSOR
// -----------------------------------------------------------------------------

/// Output of one [`SignalProcessor::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSignal {
    pub samples: Vec<f64>,
    /// Rate at which `samples` are meant to be played back.
    pub sample_rate: f64,
    /// Resampling stages applied, in order.
    pub stages: Vec<RatioPair>,
    /// Length after each resampling stage.
    pub stage_lengths: Vec<usize>,
}

pub struct SignalProcessor {
    pub index: usize,
    config: ProcessorConfig,
    filters: Vec<(String, Box<dyn FilterInstance>)>,
    resampler: RationalResampler,
    stage: Option<StageConfig>,
}

impl SignalProcessor {
    pub fn new(config: ProcessorConfig, resampler: RationalResampler) -> Self {
        SignalProcessor {
            index: 0,
            config,
            filters: Vec::new(),
            resampler,
            stage: None,
        }
    }

    /// Builds the filters and the resampling stage described by a loaded config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut processor = Self::new(
            config.processor.clone(),
            RationalResampler::new(config.resampler),
        );

        for filter_config in &config.filters {
            let filter = BiquadFilter::design(
                config.processor.sample_rate,
                filter_config.cutoff,
                filter_config.q,
                filter_config.filter_type,
            )?;
            processor.add_filter(&filter_config.id, Box::new(filter));
        }
        processor.set_stage(config.stage.clone());

        Ok(processor)
    }

    pub fn add_filter(&mut self, id: &str, filter: Box<dyn FilterInstance>) {
        self.filters.push((id.to_string(), filter));
    }

    pub fn set_stage(&mut self, stage: Option<StageConfig>) {
        self.stage = stage;
    }

    /// Runs the filters in order, then the resampling stage.
    ///
    /// Filters keep their state between runs, so consecutive chunks of one recording can be
    /// fed through the same processor.
    pub fn run(&mut self, samples: &[f64]) -> Result<ProcessedSignal> {
        let start = Instant::now();
        let input_rate = self.config.sample_rate;

        // Filters keep their state, so nothing may fail once they have run
        let stages = self.plan_stages(samples.len())?;
        self.validate_stages(&stages)?;

        let mut filtered = samples.to_vec();
        for (id, filter) in self.filters.iter_mut() {
            filtered = filter.process_buffer(&filtered);
            if self.config.verbose {
                println!("filter {} applied to {} samples", id, filtered.len());
            }
        }

        let mut stage_lengths = Vec::with_capacity(stages.len());
        for stage in &stages {
            filtered = self.resampler.resample(&filtered, input_rate, *stage)?.samples;
            stage_lengths.push(filtered.len());
        }

        // Semitone stages are played back at the input rate, the other modes convert it
        let sample_rate = match self.stage {
            Some(StageConfig::Semitones { .. }) | None => input_rate as f64,
            Some(_) => stages
                .iter()
                .fold(input_rate as f64, |rate, stage| rate * stage.as_f64()),
        };

        let duration = start.elapsed();
        if self.config.verbose {
            println!(
                "run {}: {} -> {} samples through {} stage(s) in {:?}",
                self.index,
                samples.len(),
                filtered.len(),
                stages.len(),
                duration
            );
        }

        if self.config.enable_debug_logging {
            self.log_run(samples.len(), &stages, &stage_lengths, duration.as_secs_f64())?;
        }

        self.index += 1;
        Ok(ProcessedSignal {
            samples: filtered,
            sample_rate,
            stages,
            stage_lengths,
        })
    }

    fn plan_stages(&self, input_length: usize) -> Result<Vec<RatioPair>> {
        match &self.stage {
            None => Ok(Vec::new()),
            Some(StageConfig::Ratio { l, m }) => Ok(vec![RatioPair::new(*l, *m)?]),
            Some(StageConfig::Semitones { shift, base }) => {
                plan_semitone_stages(*shift, base.unwrap_or(SEMITONE_BASE))
            }
            Some(StageConfig::TargetLength { length }) => {
                if input_length == 0 {
                    return Ok(Vec::new());
                }
                Ok(vec![plan_ratio_for_length(input_length, *length)?])
            }
            Some(StageConfig::Rates { output_rate }) => Ok(vec![RatioPair::from_rates(
                self.config.sample_rate,
                *output_rate,
            )?]),
        }
    }

    fn validate_stages(&self, stages: &[RatioPair]) -> Result<()> {
        for stage in stages {
            if *stage == RatioPair::unity() {
                if self.config.sample_rate == 0 {
                    return Err(ResampleError::invalid("input sample rate must be positive"));
                }
            } else {
                self.resampler.design_lowpass(self.config.sample_rate, *stage)?;
            }
        }
        Ok(())
    }

    fn log_run(
        &self,
        input_length: usize,
        stages: &[RatioPair],
        stage_lengths: &[usize],
        seconds: f64,
    ) -> Result<()> {
        let log_dir = &self.config.log_dir;
        let formatted_message = format!(
            "index: {}, input_length: {}, filters: {}, stages: {:?}, lengths: {:?}, seconds: {:.6}",
            self.index,
            input_length,
            self.filters.len(),
            stages,
            stage_lengths,
            seconds
        );
        log_with_header(log_dir, LOG_FILE, "run", &formatted_message)?;

        for (n, (stage, length)) in stages.iter().zip(stage_lengths).enumerate() {
            let row = [
                self.index.to_string(),
                n.to_string(),
                stage.l.to_string(),
                stage.m.to_string(),
                length.to_string(),
            ];
            let row: Vec<&str> = row.iter().map(String::as_str).collect();
            log_csv(log_dir, STAGE_CSV, &["run", "stage", "l", "m", "length"], &row)?;
        }
        Ok(())
    }
}
