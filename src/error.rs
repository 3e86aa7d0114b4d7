use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreKeepError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Data Validation Error: {0}")]
    Validation(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Import Failed: {0}")]
    Import(String),

    #[error("Unknown session '{0}'")]
    UnknownSession(String),
}

pub type SkResult<T> = Result<T, ScoreKeepError>;
