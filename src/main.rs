use colored::Colorize;
use rational_resampler::local::process_file;
use rational_resampler::processing::semitone::{planned_semitone_lengths, SEMITONE_BASE};
use rational_resampler::utils::generate::{peak, sine_wave};
use rational_resampler::{RationalResampler, ResamplerConfig, Result};

const DEFAULT_SIZE: usize = 34567;
const DEFAULT_FFT_SIZE: usize = 4096;
const USAGE: &str = "usage: resampler plan [size]\n       \
                     resampler process <config.yaml> <input.csv> <output.csv>\n       \
                     resampler response <config.yaml> <output.csv> [fft_size]\n       \
                     resampler demo [semitones]";

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("plan") => plan(args.get(2)),
        Some("process") if args.len() >= 5 => process(&args[2], &args[3], &args[4]),
        Some("response") if args.len() >= 4 => response(&args[2], &args[3], args.get(4)),
        Some("demo") => demo(args.get(2)),
        _ => {
            println!("{}", USAGE);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_or<T: std::str::FromStr>(arg: Option<&String>, default: T) -> Result<T> {
    match arg {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| {
            rational_resampler::ResampleError::InvalidParameter(format!("cannot parse {:?}", value))
        }),
    }
}

// Length bookkeeping for one and two semitones in both directions
fn plan(size: Option<&String>) -> Result<()> {
    let size = parse_or(size, DEFAULT_SIZE)?;

    for (label, sign) in [("up", 1i32), ("down", -1i32)] {
        for i in 1..=2 {
            let expected = size as f64 * 2f64.powf(-(sign * i) as f64 / 12.0);
            let sizes = planned_semitone_lengths(size, sign * i, SEMITONE_BASE)?;
            println!("{} {} semitone", label.bold(), i);
            println!("\texpected: {} -> {:.2}", size, expected);
            println!("\tsizes:    {}", format!("{:?}", sizes).green());
        }
    }
    Ok(())
}

fn process(config: &str, input: &str, output: &str) -> Result<()> {
    let lengths = process_file::run(config, input, output)?;
    println!(
        "{} {} channel(s) -> {} {:?}",
        "processed".green(),
        lengths.len(),
        output,
        lengths
    );
    Ok(())
}

fn response(config: &str, output: &str, fft_size: Option<&String>) -> Result<()> {
    let fft_size = parse_or(fft_size, DEFAULT_FFT_SIZE)?;
    process_file::export_response(config, output, fft_size)?;
    println!("{} {}", "response written to".green(), output);
    Ok(())
}

fn demo(shift: Option<&String>) -> Result<()> {
    let shift: i32 = parse_or(shift, 1)?;
    let sample_rate = 44100;
    let sine = sine_wave(440.0, sample_rate, 0.5, DEFAULT_SIZE);

    let resampler = RationalResampler::new(ResamplerConfig {
        compensate_gain: true,
        ..ResamplerConfig::default()
    });
    let shifted = resampler.resample_semitones(&sine, sample_rate, shift, SEMITONE_BASE)?;
    println!(
        "440 Hz sine, {} samples, shifted {} semitone(s)",
        sine.len(),
        shift
    );
    for (stage, length) in shifted.stages.iter().zip(&shifted.stage_lengths) {
        println!("\t{}/{} -> {}", stage.l, stage.m, length);
    }

    let level = peak(&shifted.samples);
    let level = if (level - 0.5).abs() < 0.05 {
        format!("{:.4}", level).green()
    } else {
        format!("{:.4}", level).yellow()
    };
    println!("\tpeak: {}", level);
    Ok(())
}
