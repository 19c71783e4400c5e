// src/config/mod.rs
use crate::error::{ResampleError, Result};
use crate::filters::biquad::{FilterType, DEFAULT_Q};
use crate::processing::resampler::{RatioPair, ResamplerConfig};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub processor: ProcessorConfig,
    #[serde(default)]
    pub filters: Vec<BiquadFilterConfig>,
    #[serde(default)]
    pub resampler: ResamplerConfig,
    #[serde(default)]
    pub stage: Option<StageConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProcessorConfig {
    pub verbose: bool,
    pub sample_rate: u32,
    pub enable_debug_logging: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_log_dir() -> String {
    "logs".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BiquadFilterConfig {
    pub id: String,
    pub filter_type: FilterType,
    pub cutoff: f64,
    #[serde(default = "default_q")]
    pub q: f64,
}

fn default_q() -> f64 {
    DEFAULT_Q
}

/// The resampling step run after the filters.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StageConfig {
    Ratio { l: u32, m: u32 },
    Semitones {
        shift: i32,
        #[serde(default)]
        base: Option<RatioPair>,
    },
    TargetLength { length: usize },
    Rates { output_rate: u32 },
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| ResampleError::Config(format!("Failed to read config file: {}", e)))?;

    serde_yaml::from_str(&config_str)
        .map_err(|e| ResampleError::Config(format!("Failed to parse config file: {}", e)))
}

pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let yaml = serde_yaml::to_string(config)
        .map_err(|e| ResampleError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(path, yaml)
        .map_err(|e| ResampleError::Config(format!("Failed to write config file: {}", e)))
}
