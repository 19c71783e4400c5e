use std::fs::File;
use std::path::Path;
use std::time::Instant;

use crate::config::load_config;
use crate::error::{ResampleError, Result};
use crate::filters::biquad::FilterCoefficients;
use crate::filters::response::frequency_response_db;
use crate::processing::signal_processor::SignalProcessor;

// -----------------------------------------------------------------------------
// CSV SIGNALS
// -----------------------------------------------------------------------------

/// Reads one signal per column. The first row is a header.
pub fn read_signals_from_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<Vec<f64>>> {
    let mut rdr = csv::Reader::from_reader(File::open(file_path)?);
    let num_signals = rdr.headers()?.len();
    let mut data: Vec<Vec<f64>> = vec![Vec::new(); num_signals];

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        for (index, value) in record.iter().enumerate() {
            let sample = value.trim().parse::<f64>().map_err(|e| {
                ResampleError::invalid(format!(
                    "row {}, column {}: cannot parse {:?} as a sample ({})",
                    row + 1,
                    index,
                    value,
                    e
                ))
            })?;
            data[index].push(sample);
        }
    }

    Ok(data)
}

/// Writes one signal per column under `channel_0, channel_1, ...` headers. Shorter signals
/// leave their trailing cells empty.
pub fn write_signals_to_csv<P: AsRef<Path>>(file_path: P, signals: &[Vec<f64>]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(file_path)?;
    let headers: Vec<String> = (0..signals.len()).map(|i| format!("channel_{}", i)).collect();
    wtr.write_record(&headers)?;

    let rows = signals.iter().map(Vec::len).max().unwrap_or(0);
    for row in 0..rows {
        let record: Vec<String> = signals
            .iter()
            .map(|signal| signal.get(row).map(|x| x.to_string()).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    Ok(())
}

/// Writes `(frequency_hz, magnitude_db)` pairs, one column pair per filter.
pub fn write_response_to_csv<P: AsRef<Path>>(
    file_path: P,
    responses: &[(String, Vec<(f64, f64)>)],
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(file_path)?;
    let mut headers = vec!["frequency_hz".to_string()];
    headers.extend(responses.iter().map(|(id, _)| format!("{}_db", id)));
    wtr.write_record(&headers)?;

    let bins = responses.first().map(|(_, r)| r.len()).unwrap_or(0);
    for bin in 0..bins {
        let mut record = vec![responses[0].1[bin].0.to_string()];
        record.extend(responses.iter().map(|(_, r)| r[bin].1.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    Ok(())
}

// -----------------------------------------------------------------------------
// RUN CODE
// -----------------------------------------------------------------------------

/// Loads a config, runs every column of `input` through its own processor and writes the
/// processed columns to `output`.
pub fn run<P: AsRef<Path>>(config_path: P, input: P, output: P) -> Result<Vec<usize>> {
    let config = load_config(config_path)?;
    let signals = read_signals_from_csv(input)?;

    let start_time = Instant::now();
    let mut processed = Vec::with_capacity(signals.len());
    for signal in &signals {
        let mut processor = SignalProcessor::from_config(&config)?;
        processed.push(processor.run(signal)?.samples);
    }
    let duration = start_time.elapsed();

    if config.processor.verbose {
        println!(
            "Processed {} channel(s) in {:?}",
            processed.len(),
            duration
        );
    }

    write_signals_to_csv(output, &processed)?;
    Ok(processed.iter().map(Vec::len).collect())
}

/// Writes the frequency response of every filter in the config.
pub fn export_response<P: AsRef<Path>>(config_path: P, output: P, fft_size: usize) -> Result<()> {
    let config = load_config(config_path)?;
    let sample_rate = config.processor.sample_rate;

    let mut responses = Vec::with_capacity(config.filters.len());
    for filter in &config.filters {
        let coefficients =
            FilterCoefficients::design(sample_rate, filter.cutoff, filter.q, filter.filter_type)?;
        responses.push((
            filter.id.clone(),
            frequency_response_db(&coefficients, sample_rate, fft_size)?,
        ));
    }

    write_response_to_csv(output, &responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn signals_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.csv");
        let signals = vec![vec![0.5, -1.25, 3.0], vec![1.0, 2.0, 4.0]];

        write_signals_to_csv(&path, &signals).unwrap();
        assert_eq!(read_signals_from_csv(&path).unwrap(), signals);
    }

    #[test]
    fn unparsable_sample_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "left\n0.5\nabc").unwrap();

        assert!(matches!(
            read_signals_from_csv(&path),
            Err(ResampleError::InvalidParameter(_))
        ));
    }

    #[test]
    fn run_processes_every_column() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");

        std::fs::write(
            &config_path,
            "processor: { verbose: false, sample_rate: 8000, enable_debug_logging: false }\n\
             stage: { mode: ratio, l: 3, m: 2 }\n",
        )
        .unwrap();
        write_signals_to_csv(&input, &[vec![1.0; 10], vec![0.0; 10]]).unwrap();

        let lengths = run(&config_path, &input, &output).unwrap();
        assert_eq!(lengths, vec![14, 14]);
        let written = read_signals_from_csv(&output).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[1].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn response_export_has_one_row_per_bin() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let output = dir.path().join("response.csv");
        std::fs::write(
            &config_path,
            "processor: { verbose: false, sample_rate: 48000, enable_debug_logging: false }\n\
             filters:\n  - { id: lp, filter_type: lowpass, cutoff: 2048.0 }\n",
        )
        .unwrap();

        export_response(&config_path, &output, 64).unwrap();
        let contents = std::fs::read_to_string(&output).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("frequency_hz,lp_db"));
        assert_eq!(lines.count(), 33);
    }
}
