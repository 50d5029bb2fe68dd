use crate::consensus::EntryId;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Create the channel a consensus engine publishes committed entries on.
pub fn create_commit_stream() -> (CommitStreamPublisher, CommitStream) {
    let (tx, rx) = mpsc::unbounded_channel();

    let applier_sender = CommitStreamPublisher { sender: tx };
    let applier_receiver = CommitStream { receiver: rx };

    (applier_sender, applier_receiver)
}

pub struct CommitStreamPublisher {
    sender: mpsc::UnboundedSender<CommittedEntry>,
}

impl CommitStreamPublisher {
    pub fn notify_commit(&self, logger: &slog::Logger, id: EntryId, data: Bytes) {
        let committed_entry = CommittedEntry { id, data };

        if self.sender.send(committed_entry).is_err() {
            slog::warn!(logger, "CommitStream has disconnected.");
        }
    }
}

/// CommitStream yields committed entries in log order, to be applied to the replica's state
/// machine.
pub struct CommitStream {
    receiver: mpsc::UnboundedReceiver<CommittedEntry>,
}

#[derive(Debug)]
pub struct CommittedEntry {
    pub id: EntryId,
    pub data: Bytes,
}

impl CommitStream {
    /// Returns None once the engine has exited.
    pub async fn recv(&mut self) -> Option<CommittedEntry> {
        self.receiver.recv().await
    }
}
