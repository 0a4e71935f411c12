use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    #[error("Unknown model: {0}")]
    NotFound(String),

    #[error("Another download is already in progress")]
    AlreadyBusy,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Failed to remove model folder '{}': {cause}", path.display())]
    Removal { path: PathBuf, cause: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
