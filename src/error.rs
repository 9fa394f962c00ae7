use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, converting or writing labeled images
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed annotation in {}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
