use serde::{Deserialize, Serialize};

use super::AppError;

/// A named downloadable model file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Artifact {
    #[serde(skip)]
    pub name: String,
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub description: String,
}

impl Artifact {
    pub fn new(name: &str, url: &str, filename: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            filename: filename.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Total size known, progress reported as a percentage.
    Determinate,
    /// No content-length, progress reported as activity steps.
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Connecting,
    Transferring(TransferMode),
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressTick {
    /// 0.0 to 100.0
    Percent(f32),
    Step,
}

/// Messages pushed by an active transfer, observed in order by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Status(String),
    SizeKnown(u64),
    ModeIndeterminate,
    Progress(ProgressTick),
    Completed(String),
    Failed(AppError),
    SessionEnded,
}
