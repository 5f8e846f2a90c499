//! Raises events: resolves the audience through the registry, then pushes the
//! payload to every open connection of every recipient.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes};

use crate::store::{AudienceStore, StoreError};

use super::directory::ConnectionDirectory;
use super::events::{EventArgs, EventPayload, EventType};
use super::registry::EventRegistry;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No handler for the tag. The registry is fixed at startup, so this is a
    /// wiring bug rather than a runtime condition.
    #[error("no handler registered for {0}")]
    UnknownEvent(EventType),
    #[error("{event} takes {expected} argument(s), got {got}")]
    ArityMismatch {
        event: EventType,
        expected: usize,
        got: usize,
    },
    #[error("audience resolution failed: {0}")]
    Audience(#[from] StoreError),
}

/// Counts from one raise, taken before delivery completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Recipients with at least one open connection.
    pub recipients: usize,
    /// Delivery tasks spawned.
    pub connections: usize,
}

impl DispatchSummary {
    fn absorb(&mut self, other: DispatchSummary) {
        self.recipients += other.recipients;
        self.connections += other.connections;
    }
}

pub struct Dispatcher {
    registry: Arc<EventRegistry>,
    directory: Arc<ConnectionDirectory>,
    store: Arc<dyn AudienceStore>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<EventRegistry>,
        directory: Arc<ConnectionDirectory>,
        store: Arc<dyn AudienceStore>,
    ) -> Self {
        Self {
            registry,
            directory,
            store,
        }
    }

    /// Resolve the audience for `event` and start delivery.
    ///
    /// Returns once every delivery has been spawned; it never waits for a
    /// write to finish. Audience failures fail this event only. Write
    /// failures are logged by the delivery task and never reach the caller.
    pub async fn raise(
        &self,
        event: EventType,
        args: impl Into<EventArgs>,
    ) -> Result<DispatchSummary, DispatchError> {
        let args = args.into();
        let Some(handler) = self.registry.get(event) else {
            tracing::error!(%event, "raise for event type with no registered handler");
            return Err(DispatchError::UnknownEvent(event));
        };

        let got = args.arity();
        let Some(resolve) = handler.invoke(self.store.clone(), args) else {
            tracing::error!(%event, expected = handler.arity(), got, "raise with wrong argument count");
            return Err(DispatchError::ArityMismatch {
                event,
                expected: handler.arity(),
                got,
            });
        };

        let notifications = resolve.await.map_err(|err| {
            tracing::warn!(%event, error = %err, "audience resolution failed");
            DispatchError::Audience(err)
        })?;

        let mut summary = DispatchSummary::default();
        for notification in &notifications {
            summary.absorb(self.deliver(&notification.recipients, &notification.payload));
        }

        tracing::debug!(
            %event,
            recipients = summary.recipients,
            connections = summary.connections,
            "event dispatched"
        );
        Ok(summary)
    }

    /// Run [`raise`](Self::raise) on its own task, logging any failure.
    pub fn raise_detached(self: &Arc<Self>, event: EventType, args: impl Into<EventArgs>) {
        let dispatcher = Arc::clone(self);
        let args = args.into();
        tokio::spawn(async move {
            if let Err(err) = dispatcher.raise(event, args).await {
                tracing::warn!(%event, error = %err, "detached raise failed");
            }
        });
    }

    /// Push a payload to every open connection of one user, bypassing the
    /// registry.
    pub fn send_to_user(&self, user_id: &str, payload: &EventPayload) -> DispatchSummary {
        self.deliver(&[user_id.to_string()], payload)
    }

    /// Spawn one delivery task per open connection of each recipient.
    /// Must be called from within a Tokio runtime.
    pub fn deliver(&self, recipients: &[String], payload: &EventPayload) -> DispatchSummary {
        let text: Utf8Bytes = match serde_json::to_string(payload) {
            Ok(json) => json.into(),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize event payload");
                return DispatchSummary::default();
            }
        };

        let mut summary = DispatchSummary::default();
        let mut seen = HashSet::new();
        for user_id in recipients {
            if !seen.insert(user_id.as_str()) {
                continue;
            }

            let mut reached = false;
            for handle in self.directory.lookup(user_id) {
                if !handle.is_open() {
                    // Left for the liveness sweep.
                    continue;
                }
                reached = true;
                summary.connections += 1;

                let message = Message::Text(text.clone());
                let user_id = user_id.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle.send(message).await {
                        tracing::debug!(
                            %user_id,
                            connection_id = %handle.id(),
                            error = %err,
                            "event delivery dropped"
                        );
                    }
                });
            }
            if reached {
                summary.recipients += 1;
            }
        }
        summary
    }
}
