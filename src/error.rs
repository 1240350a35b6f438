use thiserror::Error;

#[derive(Error, Debug)]
pub enum SublingoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid timecode: {0}")]
    InvalidTimecode(String),

    #[error("Malformed subtitle block at {position}: {reason}")]
    MalformedBlock { position: usize, reason: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Encoding detection failed: {0}")]
    EncodingDetection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Subtitle source error: {0}")]
    Source(String),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, SublingoError>;
