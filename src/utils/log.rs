use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Logs a message to a file with timestamp
///
/// # Arguments
///
/// * `log_dir` - Directory holding the log files (created if missing)
/// * `filename` - The name of the log file inside `log_dir`
/// * `message` - The message to log
///
/// # Returns
///
/// * `io::Result<()>` - Success or error result
pub fn log_to_file<P: AsRef<Path>>(log_dir: P, filename: &str, message: &str) -> io::Result<()> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(filename))?;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

    writeln!(file, "\n--- Log entry at {} ---", timestamp)?;
    writeln!(file, "{}", message)?;
    writeln!(file, "--- End of entry ---\n")?;

    file.flush()?;

    Ok(())
}

/// Logs a message to a file with a detailed formatted header
pub fn log_with_header<P: AsRef<Path>>(
    log_dir: P,
    filename: &str,
    header: &str,
    message: &str,
) -> io::Result<()> {
    let formatted_message = format!(
        "===== {} =====\n{}\n====================",
        header, message
    );
    log_to_file(log_dir, filename, &formatted_message)
}

/// Appends a row to a CSV file, writing `headers` first when the file is new
pub fn log_csv<P: AsRef<Path>>(
    log_dir: P,
    filename: &str,
    headers: &[&str],
    data: &[&str],
) -> io::Result<()> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir)?;

    let path = log_dir.join(filename);
    let file_exists = path.exists();

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    if !file_exists && !headers.is_empty() {
        writeln!(file, "{}", headers.join(","))?;
    }

    writeln!(file, "{}", data.join(","))?;
    file.flush()?;

    Ok(())
}
