//! A single admitted WebSocket connection as seen by the rest of the gateway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use gateway_common::id::prefix;
use gateway_common::PrefixedId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("connection closed")]
    Closed,
    #[error("outbound queue full")]
    Full,
}

/// Cloneable handle to one live connection.
///
/// Writes go through a bounded queue drained by the connection's writer
/// task, so the order of writes on one transport is the order they were
/// queued. The `completion` token is owned by the connection task; settling
/// it tears the connection down.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    id: Arc<str>,
    outbound: mpsc::Sender<Message>,
    completion: CancellationToken,
    failed: Arc<AtomicBool>,
}

impl PrefixedId for ConnectionHandle {
    const PREFIX: &'static str = prefix::CONNECTION;
}

impl ConnectionHandle {
    pub fn new(outbound: mpsc::Sender<Message>, completion: CancellationToken) -> Self {
        Self {
            id: Self::generate_id().into(),
            outbound,
            completion,
            failed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a handle together with the receiving half of its outbound queue.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx, CancellationToken::new()), rx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn completion(&self) -> &CancellationToken {
        &self.completion
    }

    /// Open until completion is settled, the writer side is gone, or a send
    /// has failed.
    pub fn is_open(&self) -> bool {
        !self.completion.is_cancelled()
            && !self.outbound.is_closed()
            && !self.failed.load(Ordering::Acquire)
    }

    /// Settle the completion signal. Idempotent.
    pub fn complete(&self) {
        self.completion.cancel();
    }

    /// Queue a message, waiting for room if the writer is behind.
    pub async fn send(&self, message: Message) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }
        self.outbound.send(message).await.map_err(|_| {
            self.mark_failed();
            SendError::Closed
        })
    }

    /// Queue a message without waiting.
    ///
    /// A full queue only drops this message; the handle stays open.
    pub fn try_send(&self, message: Message) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }
        self.outbound.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => {
                self.mark_failed();
                SendError::Closed
            }
        })
    }

    fn mark_failed(&self) {
        self.failed.store(true, Ordering::Release);
    }
}
