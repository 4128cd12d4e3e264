//! CSV measurement log.
//!
//! Append-only log of every measurement the session emits. The file survives
//! restarts: rows are appended to an existing log and the header is written
//! only when the file is new or empty.

use crate::error::EcResult;
use crate::measurement::Measurement;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

const HEADER: [&str; 4] = ["Timestamp", "Conductivity", "Unit", "Temperature"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Appending CSV writer for measurements.
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Open the log at `path`, creating parent directories and the file as
    /// needed. A header row is written iff the file is empty.
    pub fn create(path: impl AsRef<Path>) -> EcResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::Writer::from_writer(file);
        if needs_header {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        info!(path = %path.display(), "CSV log ready");
        Ok(Self { path, writer })
    }

    /// Append one measurement and flush, so rows survive an abrupt exit.
    /// A missing temperature becomes an empty cell.
    pub fn append(&mut self, measurement: &Measurement) -> EcResult<()> {
        self.writer.write_record(&[
            measurement
                .timestamp
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            measurement.conductivity.to_string(),
            measurement.unit.as_str().to_string(),
            measurement
                .temperature
                .map_or_else(String::new, |t| t.to_string()),
        ])?;
        self.writer.flush()?;
        Ok(())
    }

    /// Where the log lives.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// True when the log already holds at least one data row beyond the header.
/// Used to decide whether a mock session should seed a backlog; a file that
/// got its header written but never a row does not count.
pub fn log_has_rows(path: &Path) -> bool {
    use std::io::BufRead;

    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut lines = std::io::BufReader::new(file).lines();
    let _ = lines.next(); // header
    lines.any(|line| line.is_ok_and(|l| !l.trim().is_empty()))
}
