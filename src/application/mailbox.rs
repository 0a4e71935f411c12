use std::sync::Mutex;

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::domain::ProgressEvent;

/// FIFO of progress events between the active transfer and the UI.
pub struct Mailbox {
    sender: UnboundedSender<ProgressEvent>,
    receiver: Mutex<UnboundedReceiver<ProgressEvent>>,
}

/// Producer half handed to a transfer session
#[derive(Clone)]
pub struct MailboxSender {
    sender: UnboundedSender<ProgressEvent>,
}

impl MailboxSender {
    pub fn send(&self, event: ProgressEvent) {
        // The mailbox owns a sender too, so the channel only closes on shutdown
        let _ = self.sender.send(event);
    }
}

impl Mailbox {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn sender(&self) -> MailboxSender {
        MailboxSender {
            sender: self.sender.clone(),
        }
    }

    /// Takes every queued event without waiting. Empty when nothing is pending.
    pub fn drain(&self) -> Vec<ProgressEvent> {
        let mut receiver = self
            .receiver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut events = Vec::new();
        loop {
            match receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}
