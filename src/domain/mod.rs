pub mod catalog;
pub mod error;
pub mod model;

pub use catalog::Catalog;
pub use error::AppError;
pub use model::{Artifact, DownloadPhase, ProgressEvent, ProgressTick, TransferMode};
