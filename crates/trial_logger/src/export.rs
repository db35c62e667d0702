use crate::error::{Result, TrialLoggerError};
use chrono::Local;
use csv::WriterBuilder;
use fitts_core::{TrialRecord, write_records};
use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

/// Writes `trials_<timestamp>.csv` into `output_dir` and returns its path.
pub fn export_trials(records: &[TrialRecord], output_dir: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let filename = format!("trials_{timestamp}.csv");

    std::fs::create_dir_all(output_dir).map_err(|e| TrialLoggerError::CreateDir {
        path: output_dir.to_path_buf(),
        source: e,
    })?;
    let file_path = output_dir.join(&filename);

    let file = File::create(&file_path).map_err(|e| TrialLoggerError::CreateFile {
        path: file_path.clone(),
        source: e,
    })?;

    let writer = BufWriter::new(file);
    #[allow(unused_mut)]
    let mut builder = WriterBuilder::new();
    #[cfg(windows)]
    {
        use csv::Terminator;
        builder.terminator(Terminator::CRLF);
    }

    let mut wtr = builder.from_writer(writer);
    write_records(&mut wtr, records)?;
    Ok(file_path)
}
