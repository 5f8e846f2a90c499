//! Storage collaborators the gateway calls into: identity lookup during
//! admission and audience lookup during dispatch.

pub mod memory;

use async_trait::async_trait;

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read seed file: {0}")]
    SeedIo(#[from] std::io::Error),
    #[error("failed to parse seed file: {0}")]
    SeedParse(#[from] serde_json::Error),
}

/// Resolves an identity token presented by a connecting client.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Returns the user id the token belongs to, or `None` when the token is
    /// unknown or expired.
    async fn resolve_user(&self, token: &str) -> Result<Option<String>, StoreError>;
}

/// Answers "who should hear about this" for channel- and friend-scoped events.
#[async_trait]
pub trait AudienceStore: Send + Sync {
    /// Every user on the channel's access list.
    async fn members_of_channel(&self, channel_id: &str) -> Result<Vec<String>, StoreError>;

    /// Users with an accepted friendship with `user_id`.
    async fn accepted_friends_of(&self, user_id: &str) -> Result<Vec<String>, StoreError>;
}
