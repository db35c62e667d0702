use crate::error::{Result, TrialLoggerError};
use std::{
    env,
    path::{Path, PathBuf},
};

const ENV_OUTPUT_DIR: &str = "TRIAL_LOGGER_OUTPUT_DIR";
const DEFAULT_OUTPUT_DIR: &str = "csv";

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
}

impl OutputConfig {
    /// `--output-dir` wins over `TRIAL_LOGGER_OUTPUT_DIR`; both fall back to `./csv`.
    pub fn resolve(cli_output_dir: Option<&Path>) -> Result<Self> {
        let output_dir = match cli_output_dir {
            Some(dir) => dir.to_path_buf(),
            None => match env::var(ENV_OUTPUT_DIR) {
                Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
                _ => PathBuf::from(DEFAULT_OUTPUT_DIR),
            },
        };

        // If the path already exists but is not a directory, reject early.
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(TrialLoggerError::InvalidConfiguration(format!(
                "Output path is not a directory: {}",
                output_dir.display()
            )));
        }
        Ok(Self { output_dir })
    }
}
