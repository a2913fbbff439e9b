use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubconvError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not detect subtitle format of {0}")]
    UndetectedFormat(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SubconvError>;
