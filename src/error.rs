use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("failed to parse annotations: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("model error: {0}")]
    Model(String),

    #[error("unexpected model output: {0}")]
    ModelOutput(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown label '{0}'")]
    UnknownLabel(String),

    #[error("{name} must be within [0, 1], got {value}")]
    InvalidThreshold { name: &'static str, value: f32 },

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("download cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("detection needs weights.url and weights.sha256 to be configured")]
    MissingWeightsConfig,
}

pub type Result<T> = std::result::Result<T, LensError>;
