use std::time::Duration;

use iced::{Subscription, Task};
use log::{info, warn};
use rfd::{AsyncMessageDialog, MessageButtons, MessageDialogResult, MessageLevel};

use crate::application::DownloadCoordinator;
use crate::domain::AppError;
use crate::ui::{ManagerView, ViewMessage};

pub struct ModelManagerApp {
    view: ManagerView,
    coordinator: DownloadCoordinator,
    poll_interval: Duration,
}

impl ModelManagerApp {
    pub fn new(coordinator: DownloadCoordinator, poll_interval: Duration) -> Self {
        let view = ManagerView::new(coordinator.catalog());

        Self {
            view,
            coordinator,
            poll_interval,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(ViewMessage),
    /// Drain the download mailbox
    Tick,
    /// (Model name, user answered yes)
    RemoveConfirmed(String, bool),
    DialogClosed,
}

fn show_dialog(level: MessageLevel, title: &str, description: String) -> Task<Message> {
    let dialog = AsyncMessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok);

    Task::perform(async move { dialog.show().await }, |_| Message::DialogClosed)
}

pub fn update(app: &mut ModelManagerApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ViewMessage::ModelSelected(name)) => {
            app.view.select(name);
        }
        Message::UiMessage(ViewMessage::DownloadPressed) => {
            let Some(name) = app.view.selected.clone() else {
                return Task::none();
            };
            if !app.view.can_download {
                return Task::none();
            }

            match app.coordinator.start_download(&name) {
                Ok(()) => app.view.begin_download(&name),
                Err(AppError::AlreadyBusy) => {
                    warn!("Download of {} rejected while {:?}", name, app.coordinator.phase());
                    if !app.view.is_downloading {
                        // Previous session already reported its end; the slot frees right after
                        app.view.status_message =
                            "Previous download is finishing, try again.".to_string();
                        return Task::none();
                    }
                    return show_dialog(
                        MessageLevel::Warning,
                        "Busy",
                        "Another download is already in progress.".to_string(),
                    );
                }
                Err(e) => {
                    app.view.status_message = format!("Error: {}", e);
                    return show_dialog(MessageLevel::Error, "Error", e.to_string());
                }
            }
        }
        Message::UiMessage(ViewMessage::RemovePressed) => {
            let Some(name) = app.view.selected.clone() else {
                return Task::none();
            };
            if app.view.is_downloading {
                return Task::none();
            }
            if !app.coordinator.is_present(&name) {
                return show_dialog(
                    MessageLevel::Info,
                    "Info",
                    format!("Model '{}' is not downloaded.", name),
                );
            }

            let dialog = AsyncMessageDialog::new()
                .set_level(MessageLevel::Warning)
                .set_title("Confirm Removal")
                .set_description(format!(
                    "Are you sure you want to remove the model '{}'?",
                    name
                ))
                .set_buttons(MessageButtons::YesNo);

            return Task::perform(
                async move { matches!(dialog.show().await, MessageDialogResult::Yes) },
                move |confirmed| Message::RemoveConfirmed(name.clone(), confirmed),
            );
        }
        Message::RemoveConfirmed(name, confirmed) => {
            if !confirmed {
                return Task::none();
            }

            app.view.status_message = format!("Removing {}...", name);
            let result = app.coordinator.remove_artifact(&name);
            app.view.refresh(app.coordinator.catalog());

            match result {
                Ok(()) => {
                    info!("Removed {}", name);
                    app.view.status_message = format!("Successfully removed {}.", name);
                }
                Err(e) => {
                    warn!("Removing {} failed: {}", name, e);
                    app.view.status_message = format!("Error removing {}.", name);
                    return show_dialog(MessageLevel::Error, "Error", e.to_string());
                }
            }
        }
        Message::Tick => {
            let mut dialogs = Vec::new();
            for event in app.coordinator.drain_events() {
                if let Some(failure) = app.view.apply_event(event, app.coordinator.catalog()) {
                    dialogs.push(show_dialog(MessageLevel::Error, "Download Error", failure));
                }
            }
            return Task::batch(dialogs);
        }
        Message::DialogClosed => {}
    }
    Task::none()
}

pub fn view(app: &ModelManagerApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

pub fn subscription(app: &ModelManagerApp) -> Subscription<Message> {
    iced::time::every(app.poll_interval).map(|_| Message::Tick)
}
