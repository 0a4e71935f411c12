use iced::{
    widget::{button, column, progress_bar, row, scrollable, text, Column, Space},
    Element, Length,
};

use crate::domain::{Catalog, ProgressEvent, ProgressTick, TransferMode};

/// One line of the model list
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRow {
    pub name: String,
    pub description: String,
    pub downloaded: bool,
}

impl ModelRow {
    pub fn label(&self) -> String {
        let status = if self.downloaded {
            "[Downloaded]"
        } else {
            "[Available]"
        };
        format!("{} {}", self.name, status)
    }
}

/// Main view state
pub struct ManagerView {
    pub rows: Vec<ModelRow>,
    pub selected: Option<String>,
    pub status_message: String,
    pub progress: f32,
    pub progress_mode: TransferMode,
    pub is_downloading: bool,
    pub can_download: bool,
    pub can_remove: bool,
}

impl Default for ManagerView {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            selected: None,
            status_message: "Ready".to_string(),
            progress: 0.0,
            progress_mode: TransferMode::Determinate,
            is_downloading: false,
            can_download: false,
            can_remove: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ViewMessage {
    ModelSelected(String),
    DownloadPressed,
    RemovePressed,
}

impl ManagerView {
    pub fn new(catalog: &Catalog) -> Self {
        let mut view = Self::default();
        view.refresh(catalog);
        view
    }

    /// Re-reads presence for every model and recomputes which actions are allowed.
    pub fn refresh(&mut self, catalog: &Catalog) {
        self.rows = catalog
            .entries()
            .into_iter()
            .map(|(artifact, downloaded)| ModelRow {
                name: artifact.name,
                description: artifact.description,
                downloaded,
            })
            .collect();

        if let Some(name) = &self.selected {
            if !self.rows.iter().any(|r| &r.name == name) {
                self.selected = None;
                self.status_message = "Error: Invalid selection.".to_string();
            }
        }
        self.update_actions();
    }

    pub fn select(&mut self, name: String) {
        match self.rows.iter().find(|r| r.name == name) {
            Some(row) => {
                self.status_message = format!("Selected: {} ({})", row.name, row.description);
                self.selected = Some(name);
            }
            None => {
                self.selected = None;
                self.status_message = "Error: Invalid selection.".to_string();
            }
        }
        self.update_actions();
    }

    pub fn selected_row(&self) -> Option<&ModelRow> {
        let name = self.selected.as_ref()?;
        self.rows.iter().find(|r| &r.name == name)
    }

    pub fn begin_download(&mut self, name: &str) {
        self.is_downloading = true;
        self.progress = 0.0;
        self.progress_mode = TransferMode::Determinate;
        self.status_message = format!("Starting download for {}...", name);
        self.update_actions();
    }

    /// Applies one mailbox event. Returns a message to show in a blocking
    /// error dialog when the transfer failed.
    pub fn apply_event(&mut self, event: ProgressEvent, catalog: &Catalog) -> Option<String> {
        match event {
            ProgressEvent::Status(message) => {
                self.status_message = message;
            }
            ProgressEvent::SizeKnown(_) => {
                self.progress_mode = TransferMode::Determinate;
                self.progress = 0.0;
            }
            ProgressEvent::ModeIndeterminate => {
                self.progress_mode = TransferMode::Indeterminate;
                self.progress = 0.0;
            }
            ProgressEvent::Progress(ProgressTick::Percent(percent)) => {
                if self.progress_mode == TransferMode::Determinate {
                    self.progress = percent;
                }
            }
            ProgressEvent::Progress(ProgressTick::Step) => {
                if self.progress_mode == TransferMode::Indeterminate {
                    self.progress = (self.progress + 5.0) % 100.0;
                }
            }
            ProgressEvent::Completed(name) => {
                self.status_message = format!("Download complete: {}", name);
                if self.progress_mode == TransferMode::Indeterminate {
                    self.progress = 100.0;
                }
                self.refresh(catalog);
            }
            ProgressEvent::Failed(err) => {
                let message = format!("Download failed: {}", err);
                self.status_message = format!("Error: {}", message);
                self.progress = 0.0;
                self.refresh(catalog);
                return Some(message);
            }
            ProgressEvent::SessionEnded => {
                self.is_downloading = false;
                self.refresh(catalog);
            }
        }
        None
    }

    fn update_actions(&mut self) {
        let downloaded = self.selected_row().map(|r| r.downloaded);
        let idle = !self.is_downloading;
        self.can_download = idle && downloaded == Some(false);
        self.can_remove = idle && downloaded == Some(true);
    }

    pub fn view(&self) -> Element<'_, ViewMessage> {
        let list: Column<'_, ViewMessage> = Column::with_children(self.rows.iter().map(|row| {
            let style = if self.selected.as_deref() == Some(row.name.as_str()) {
                button::primary
            } else {
                button::secondary
            };
            Element::from(
                button(text(row.label()).size(15))
                    .on_press(ViewMessage::ModelSelected(row.name.clone()))
                    .style(style)
                    .width(Length::Fill),
            )
        }))
        .spacing(4);

        let actions = row![
            button("Download")
                .on_press_maybe(self.can_download.then_some(ViewMessage::DownloadPressed))
                .padding([8, 16]),
            button("Remove")
                .on_press_maybe(self.can_remove.then_some(ViewMessage::RemovePressed))
                .padding([8, 16]),
        ]
        .spacing(10);

        column![
            text("AI Model Manager").size(28),
            Space::new().height(Length::Fixed(10.0)),
            scrollable(list).height(Length::Fill),
            actions,
            row![
                text("Progress:").size(14),
                progress_bar(0.0..=100.0, self.progress),
            ]
            .spacing(10),
            text(format!("Status: {}", self.status_message)).size(14),
        ]
        .padding(10)
        .spacing(10)
        .into()
    }
}
