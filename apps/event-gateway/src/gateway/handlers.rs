//! Audience resolution and payload construction for each event tag.
//!
//! Channel-scoped events go to the channel's access list, keystore and
//! friend-request events go to the ids passed in, and username changes go to
//! the actor's accepted friends.

use std::sync::Arc;

use crate::store::AudienceStore;

use super::events::{EventPayload, EventType, Notification};
use super::registry::HandlerFuture;

// ---------------------------------------------------------------------------
// Channel-scoped
// ---------------------------------------------------------------------------

pub fn message_sent(store: Arc<dyn AudienceStore>, channel: String, message: String) -> HandlerFuture {
    channel_message(store, EventType::MessageSent, channel, message)
}

pub fn message_edited(store: Arc<dyn AudienceStore>, channel: String, message: String) -> HandlerFuture {
    channel_message(store, EventType::MessageEdited, channel, message)
}

pub fn message_deleted(store: Arc<dyn AudienceStore>, channel: String, message: String) -> HandlerFuture {
    channel_message(store, EventType::MessageDeleted, channel, message)
}

pub fn channel_created(store: Arc<dyn AudienceStore>, channel: String) -> HandlerFuture {
    channel_event(store, EventType::ChannelCreated, channel)
}

pub fn channel_deleted(store: Arc<dyn AudienceStore>, channel: String) -> HandlerFuture {
    channel_event(store, EventType::ChannelDeleted, channel)
}

pub fn group_new_member(store: Arc<dyn AudienceStore>, channel: String, user: String) -> HandlerFuture {
    Box::pin(async move {
        let members = store.members_of_channel(&channel).await?;
        let payload = EventPayload::new(EventType::GroupNewMember)
            .channel(channel)
            .user(user);
        Ok(vec![Notification::new(members, payload)])
    })
}

fn channel_message(
    store: Arc<dyn AudienceStore>,
    event: EventType,
    channel: String,
    message: String,
) -> HandlerFuture {
    Box::pin(async move {
        let members = store.members_of_channel(&channel).await?;
        let payload = EventPayload::new(event).channel(channel).message(message);
        Ok(vec![Notification::new(members, payload)])
    })
}

fn channel_event(store: Arc<dyn AudienceStore>, event: EventType, channel: String) -> HandlerFuture {
    Box::pin(async move {
        let members = store.members_of_channel(&channel).await?;
        Ok(vec![Notification::new(members, EventPayload::new(event).channel(channel))])
    })
}

// ---------------------------------------------------------------------------
// Direct
// ---------------------------------------------------------------------------

pub fn user_new_group(_store: Arc<dyn AudienceStore>, channel: String, user: String) -> HandlerFuture {
    Box::pin(async move {
        let payload = EventPayload::new(EventType::UserNewGroup).channel(channel);
        Ok(vec![Notification::to_user(user, payload)])
    })
}

pub fn key_added(_store: Arc<dyn AudienceStore>, user: String, key_user: String) -> HandlerFuture {
    keystore_change(EventType::KeyAddedToKeystore, user, key_user)
}

pub fn key_removed(_store: Arc<dyn AudienceStore>, user: String, key_user: String) -> HandlerFuture {
    keystore_change(EventType::KeyRemovedFromKeystore, user, key_user)
}

pub fn refresh_keystore(_store: Arc<dyn AudienceStore>, user: String) -> HandlerFuture {
    Box::pin(async move {
        Ok(vec![Notification::to_user(
            user,
            EventPayload::new(EventType::RefreshKeystore),
        )])
    })
}

pub fn friend_request_added(_store: Arc<dyn AudienceStore>, user: String, friend: String) -> HandlerFuture {
    friend_request(EventType::FriendRequestAdded, user, friend)
}

pub fn friend_request_updated(_store: Arc<dyn AudienceStore>, user: String, friend: String) -> HandlerFuture {
    friend_request(EventType::FriendRequestUpdated, user, friend)
}

pub fn friend_request_removed(_store: Arc<dyn AudienceStore>, user: String, friend: String) -> HandlerFuture {
    friend_request(EventType::FriendRequestRemoved, user, friend)
}

fn keystore_change(event: EventType, user: String, key_user: String) -> HandlerFuture {
    Box::pin(async move {
        let payload = EventPayload::new(event).key_user(key_user);
        Ok(vec![Notification::to_user(user, payload)])
    })
}

/// Both parties hear about the transition; each payload names the other side.
fn friend_request(event: EventType, user: String, friend: String) -> HandlerFuture {
    Box::pin(async move {
        Ok(vec![
            Notification::to_user(user.clone(), EventPayload::new(event).user(friend.clone())),
            Notification::to_user(friend, EventPayload::new(event).user(user)),
        ])
    })
}

// ---------------------------------------------------------------------------
// Friends-scoped
// ---------------------------------------------------------------------------

pub fn username_changed(store: Arc<dyn AudienceStore>, user: String) -> HandlerFuture {
    Box::pin(async move {
        let friends = store.accepted_friends_of(&user).await?;
        let payload = EventPayload::new(EventType::UsernameChanged).user(user);
        Ok(vec![Notification::new(friends, payload)])
    })
}
