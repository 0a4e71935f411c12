use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use log::{error, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;

use super::mailbox::{Mailbox, MailboxSender};
use crate::{
    api::ApiClient,
    config::ManagerConfig,
    domain::{
        AppError, Artifact, Catalog, DownloadPhase, ProgressEvent, ProgressTick, TransferMode,
    },
};

/// Runs at most one model download at a time and reports through a mailbox.
#[derive(Clone)]
pub struct DownloadCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    catalog: Arc<Catalog>,
    api_client: ApiClient,
    runtime: Handle,
    mailbox: Mailbox,
    busy: AtomicBool,
    phase: Mutex<DownloadPhase>,
    chunk_size: usize,
    partial_suffix: String,
}

/// State of the one in-flight download
struct TransferSession {
    artifact: Artifact,
    destination: PathBuf,
    partial: PathBuf,
    downloaded: u64,
    total: Option<u64>,
}

impl TransferSession {
    fn mode(&self) -> TransferMode {
        match self.total {
            Some(_) => TransferMode::Determinate,
            None => TransferMode::Indeterminate,
        }
    }

    fn tick(&self) -> ProgressTick {
        match self.total {
            Some(0) => ProgressTick::Percent(100.0),
            Some(total) => {
                let percent = self.downloaded as f64 / total as f64 * 100.0;
                ProgressTick::Percent(percent.min(100.0) as f32)
            }
            None => ProgressTick::Step,
        }
    }
}

/// Emits `SessionEnded` and frees the slot when the session is dropped,
/// whether it finished, failed or panicked.
///
/// `SessionEnded` is queued before the slot is released, so a consumer on
/// another thread can drain it and still see `AlreadyBusy` for a moment.
/// Callers that observed `SessionEnded` should treat that as transient.
struct SessionGuard {
    inner: Arc<Inner>,
    events: MailboxSender,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.events.send(ProgressEvent::SessionEnded);
        self.inner.set_phase(DownloadPhase::Idle);
        self.inner.busy.store(false, Ordering::Release);
    }
}

impl Inner {
    fn set_phase(&self, phase: DownloadPhase) {
        *self
            .phase
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = phase;
    }
}

impl DownloadCoordinator {
    /// `runtime` is where transfers get spawned; they are never joined.
    pub fn new(
        catalog: Arc<Catalog>,
        config: &ManagerConfig,
        runtime: Handle,
    ) -> Result<Self, AppError> {
        let api_client = ApiClient::new(&config.http)
            .map_err(|e| AppError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner: Arc::new(Inner {
                catalog,
                api_client,
                runtime,
                mailbox: Mailbox::new(),
                busy: AtomicBool::new(false),
                phase: Mutex::new(DownloadPhase::Idle),
                chunk_size: config.chunk_size.max(1),
                partial_suffix: config.partial_suffix.clone(),
            }),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub fn list_artifacts(&self) -> Vec<Artifact> {
        self.inner.catalog.list_artifacts()
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.inner.catalog.is_present(name)
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> DownloadPhase {
        *self
            .inner
            .phase
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every event queued since the last call, oldest first
    pub fn drain_events(&self) -> Vec<ProgressEvent> {
        self.inner.mailbox.drain()
    }

    /// Deletes a downloaded model. Refused while a transfer is running.
    pub fn remove_artifact(&self, name: &str) -> Result<(), AppError> {
        self.inner.catalog.get(name)?;
        if self.is_busy() {
            return Err(AppError::AlreadyBusy);
        }
        self.inner.catalog.remove_artifact(name)
    }

    /// Accepts or rejects a download and returns without touching the network.
    pub fn start_download(&self, name: &str) -> Result<(), AppError> {
        let catalog = &self.inner.catalog;
        let artifact = catalog.get(name)?.clone();
        let dir = catalog.resolve_directory(name)?;

        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AppError::AlreadyBusy);
        }

        if let Err(e) = std::fs::create_dir_all(&dir) {
            self.inner.busy.store(false, Ordering::Release);
            return Err(AppError::Io(format!(
                "Failed to create {}: {}",
                dir.display(),
                e
            )));
        }

        let session = TransferSession {
            destination: dir.join(&artifact.filename),
            partial: dir.join(format!("{}{}", artifact.filename, self.inner.partial_suffix)),
            artifact,
            downloaded: 0,
            total: None,
        };

        self.inner.set_phase(DownloadPhase::Connecting);
        info!(
            "Starting download of {} into {}",
            session.artifact.name,
            session.destination.display()
        );

        let guard = SessionGuard {
            inner: Arc::clone(&self.inner),
            events: self.inner.mailbox.sender(),
        };
        let coordinator = self.clone();
        self.inner.runtime.spawn(async move {
            let _guard = guard;
            coordinator.run_session(session).await;
        });

        Ok(())
    }

    async fn run_session(&self, mut session: TransferSession) {
        let events = self.inner.mailbox.sender();

        match self.transfer(&mut session, &events).await {
            Ok(()) => {
                if session.mode() == TransferMode::Determinate {
                    events.send(ProgressEvent::Progress(ProgressTick::Percent(100.0)));
                }
                info!(
                    "Download complete: {} ({} bytes)",
                    session.artifact.name, session.downloaded
                );
                events.send(ProgressEvent::Completed(session.artifact.name.clone()));
                self.inner.set_phase(DownloadPhase::Completed);
            }
            Err(err) => {
                error!("Download of {} failed: {}", session.artifact.name, err);
                events.send(ProgressEvent::Failed(err));
                self.inner.set_phase(DownloadPhase::Failed);

                if let Err(e) = tokio::fs::remove_file(&session.partial).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            "Could not remove incomplete file {}: {}",
                            session.partial.display(),
                            e
                        );
                    }
                }
            }
        }
    }

    async fn transfer(
        &self,
        session: &mut TransferSession,
        events: &MailboxSender,
    ) -> Result<(), AppError> {
        let url = session.artifact.url.clone();
        events.send(ProgressEvent::Status(format!("Connecting to {}...", url)));

        let (total, stream) = self
            .inner
            .api_client
            .download_file_stream(&url)
            .await
            .map_err(|e| AppError::Connection(e.to_string()))?;

        session.total = total;
        match total {
            Some(size) => {
                info!("{} reports {} bytes", session.artifact.name, size);
                events.send(ProgressEvent::SizeKnown(size));
            }
            None => events.send(ProgressEvent::ModeIndeterminate),
        }
        self.inner
            .set_phase(DownloadPhase::Transferring(session.mode()));
        events.send(ProgressEvent::Status(format!(
            "Downloading {}...",
            session.artifact.name
        )));

        let mut file = tokio::fs::File::create(&session.partial)
            .await
            .map_err(|e| AppError::Io(format!("Failed to create file: {}", e)))?;
        let mut stream = stream.boxed();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AppError::Connection(e.to_string()))?;

            for block in chunk.chunks(self.inner.chunk_size) {
                file.write_all(block)
                    .await
                    .map_err(|e| AppError::Io(format!("Write error: {}", e)))?;
                session.downloaded += block.len() as u64;
                events.send(ProgressEvent::Progress(session.tick()));
            }
        }

        file.flush()
            .await
            .map_err(|e| AppError::Io(format!("Failed to flush file: {}", e)))?;
        file.sync_all()
            .await
            .map_err(|e| AppError::Io(format!("Failed to sync file: {}", e)))?;
        drop(file);

        tokio::fs::rename(&session.partial, &session.destination)
            .await
            .map_err(|e| AppError::Io(format!("Failed to move file into place: {}", e)))?;

        Ok(())
    }
}
