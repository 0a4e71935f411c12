pub mod download_coordinator;
pub mod mailbox;

pub use download_coordinator::DownloadCoordinator;
