//! Event tag → handler table, built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::store::{AudienceStore, StoreError};

use super::events::{EventArgs, EventType, Notification};
use super::handlers;

/// What a handler resolves to: the notifications to fan out.
pub type HandlerFuture = BoxFuture<'static, Result<Vec<Notification>, StoreError>>;

pub type UnaryHandler = fn(Arc<dyn AudienceStore>, String) -> HandlerFuture;
pub type BinaryHandler = fn(Arc<dyn AudienceStore>, String, String) -> HandlerFuture;

/// A handler tagged with the number of ids it takes.
#[derive(Debug, Clone, Copy)]
pub enum Handler {
    Unary(UnaryHandler),
    Binary(BinaryHandler),
}

impl Handler {
    pub fn arity(&self) -> usize {
        match self {
            Handler::Unary(_) => 1,
            Handler::Binary(_) => 2,
        }
    }

    /// Start the handler, or `None` if `args` has the wrong shape.
    pub fn invoke(&self, store: Arc<dyn AudienceStore>, args: EventArgs) -> Option<HandlerFuture> {
        match (self, args) {
            (Handler::Unary(f), EventArgs::One(subject)) => Some(f(store, subject)),
            (Handler::Binary(f), EventArgs::Two(subject, related)) => {
                Some(f(store, subject, related))
            }
            _ => None,
        }
    }
}

/// Read-only after construction; one handler per tag.
#[derive(Debug, Default)]
pub struct EventRegistry {
    handlers: HashMap<EventType, Handler>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table covering every [`EventType`].
    pub fn standard() -> Self {
        use EventType::*;
        use Handler::{Binary, Unary};

        Self::new()
            .with_handler(MessageSent, Binary(handlers::message_sent))
            .with_handler(MessageEdited, Binary(handlers::message_edited))
            .with_handler(MessageDeleted, Binary(handlers::message_deleted))
            .with_handler(ChannelCreated, Unary(handlers::channel_created))
            .with_handler(ChannelDeleted, Unary(handlers::channel_deleted))
            .with_handler(GroupNewMember, Binary(handlers::group_new_member))
            .with_handler(UserNewGroup, Binary(handlers::user_new_group))
            .with_handler(KeyAddedToKeystore, Binary(handlers::key_added))
            .with_handler(KeyRemovedFromKeystore, Binary(handlers::key_removed))
            .with_handler(RefreshKeystore, Unary(handlers::refresh_keystore))
            .with_handler(UsernameChanged, Unary(handlers::username_changed))
            .with_handler(FriendRequestAdded, Binary(handlers::friend_request_added))
            .with_handler(FriendRequestUpdated, Binary(handlers::friend_request_updated))
            .with_handler(FriendRequestRemoved, Binary(handlers::friend_request_removed))
    }

    /// Add a handler. A second registration for the same tag replaces the
    /// first and is logged, since it means two handlers were declared.
    pub fn with_handler(mut self, event: EventType, handler: Handler) -> Self {
        if self.handlers.insert(event, handler).is_some() {
            tracing::warn!(%event, "event handler registered twice; keeping the last one");
        }
        self
    }

    pub fn get(&self, event: EventType) -> Option<Handler> {
        self.handlers.get(&event).copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn standard_registry_covers_every_tag_with_matching_arity() {
        let registry = EventRegistry::standard();
        assert_eq!(registry.len(), EventType::ALL.len());
        for event in EventType::ALL {
            let handler = registry.get(event).expect("handler registered");
            assert_eq!(handler.arity(), event.arity(), "arity of {event}");
        }
    }

    #[test]
    fn empty_registry_has_no_handlers() {
        let registry = EventRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get(EventType::MessageSent).is_none());
    }

    #[tokio::test]
    async fn invoke_rejects_wrong_shape() {
        let store: Arc<dyn AudienceStore> = Arc::new(MemoryStore::new());
        let handler = Handler::Binary(handlers::message_sent);

        assert!(handler.invoke(store.clone(), EventArgs::from("c1")).is_none());
        let fut = handler.invoke(store, EventArgs::from(("c1", "m1"))).unwrap();
        assert!(fut.await.unwrap()[0].recipients.is_empty());
    }

    #[test]
    fn duplicate_registration_keeps_last() {
        let registry = EventRegistry::new()
            .with_handler(EventType::RefreshKeystore, Handler::Binary(handlers::key_added))
            .with_handler(EventType::RefreshKeystore, Handler::Unary(handlers::refresh_keystore));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(EventType::RefreshKeystore).unwrap().arity(), 1);
    }
}
