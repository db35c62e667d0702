use thiserror::Error;

pub type Result<T> = std::result::Result<T, FittsError>;

#[derive(Debug, Error)]
pub enum FittsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid target id {id} for pair {pair_index}")]
    InvalidTargetId { pair_index: usize, id: i32 },

    #[error("No geometry resolved for pair {pair_index} (target {target})")]
    MissingGeometry { pair_index: usize, target: u8 },

    #[error("Empty pair list for {phase} phase")]
    EmptyPairList { phase: String },

    #[error("Invalid {table} table: {message}")]
    InvalidTable { table: &'static str, message: String },
}

impl From<toml::de::Error> for FittsError {
    fn from(err: toml::de::Error) -> Self {
        FittsError::Config(format!("TOML parse error: {}", err))
    }
}
