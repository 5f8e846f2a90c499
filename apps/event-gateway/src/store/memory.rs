use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;

use super::{AudienceStore, IdentityResolver, StoreError};

/// On-disk fixture format accepted by [`MemoryStore::from_seed_file`].
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub tokens: HashMap<String, String>,
    #[serde(default)]
    pub channels: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub friends: HashMap<String, Vec<String>>,
}

#[derive(Default)]
struct Tables {
    /// token -> user id
    tokens: HashMap<String, String>,
    /// channel id -> access list
    channels: HashMap<String, Vec<String>>,
    /// user id -> accepted friends
    friends: HashMap<String, Vec<String>>,
}

/// In-memory identity and audience store for development and tests.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    pub fn from_seed(seed: Seed) -> Self {
        let store = Self::new();
        for (token, user_id) in seed.tokens {
            store.insert_token(&token, &user_id);
        }
        for (channel_id, members) in seed.channels {
            store.set_channel_members(&channel_id, members);
        }
        for (user_id, friends) in seed.friends {
            for friend in friends {
                store.add_friendship(&user_id, &friend);
            }
        }
        store
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let seed: Seed = serde_json::from_str(&raw)?;
        Ok(Self::from_seed(seed))
    }

    pub fn insert_token(&self, token: &str, user_id: &str) {
        self.tables
            .write()
            .tokens
            .insert(token.to_string(), user_id.to_string());
    }

    pub fn revoke_token(&self, token: &str) {
        self.tables.write().tokens.remove(token);
    }

    pub fn set_channel_members(&self, channel_id: &str, members: Vec<String>) {
        self.tables
            .write()
            .channels
            .insert(channel_id.to_string(), members);
    }

    /// Records an accepted friendship in both directions.
    pub fn add_friendship(&self, a: &str, b: &str) {
        let mut tables = self.tables.write();
        for (from, to) in [(a, b), (b, a)] {
            let list = tables.friends.entry(from.to_string()).or_default();
            if !list.iter().any(|f| f == to) {
                list.push(to.to_string());
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityResolver for MemoryStore {
    async fn resolve_user(&self, token: &str) -> Result<Option<String>, StoreError> {
        Ok(self.tables.read().tokens.get(token).cloned())
    }
}

#[async_trait]
impl AudienceStore for MemoryStore {
    async fn members_of_channel(&self, channel_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .tables
            .read()
            .channels
            .get(channel_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn accepted_friends_of(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .tables
            .read()
            .friends
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_known_tokens_only() {
        let store = MemoryStore::new();
        store.insert_token("tok_a", "usr_a");

        assert_eq!(store.resolve_user("tok_a").await.unwrap().as_deref(), Some("usr_a"));
        assert!(store.resolve_user("tok_b").await.unwrap().is_none());

        store.revoke_token("tok_a");
        assert!(store.resolve_user("tok_a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_channel_has_empty_access_list() {
        let store = MemoryStore::new();
        assert!(store.members_of_channel("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn friendships_are_symmetric_and_deduplicated() {
        let store = MemoryStore::new();
        store.add_friendship("u1", "u2");
        store.add_friendship("u2", "u1");

        assert_eq!(store.accepted_friends_of("u1").await.unwrap(), vec!["u2"]);
        assert_eq!(store.accepted_friends_of("u2").await.unwrap(), vec!["u1"]);
    }

    #[tokio::test]
    async fn seed_populates_every_table() {
        let seed: Seed = serde_json::from_value(serde_json::json!({
            "tokens": { "tok": "u1" },
            "channels": { "c1": ["u1", "u2"] },
            "friends": { "u1": ["u3"] }
        }))
        .unwrap();
        let store = MemoryStore::from_seed(seed);

        assert_eq!(store.resolve_user("tok").await.unwrap().as_deref(), Some("u1"));
        assert_eq!(store.members_of_channel("c1").await.unwrap(), vec!["u1", "u2"]);
        assert_eq!(store.accepted_friends_of("u3").await.unwrap(), vec!["u1"]);
    }

    #[test]
    fn missing_seed_file_is_an_io_error() {
        let err = MemoryStore::from_seed_file("/definitely/not/here.json").err().unwrap();
        assert!(matches!(err, StoreError::SeedIo(_)));
    }
}
