use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot open {role} file {}: {source}", path.display())]
    FileOpen {
        role: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a valid action. Valid are \"encrypt\" or \"decrypt\".")]
    UnsupportedAction(String),

    #[error("Invalid chunk layout: {block_count} blocks of {block_bytes} bytes")]
    InvalidChunkLayout {
        block_count: usize,
        block_bytes: usize,
    },

    #[error("Transform error: {0}")]
    Transform(String),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
