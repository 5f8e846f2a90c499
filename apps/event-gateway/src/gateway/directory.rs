//! Process-wide user id → open connections map.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::connection::ConnectionHandle;

/// Every currently admitted connection, grouped by user.
///
/// A user key is present only while it has at least one recorded
/// connection; every mutating call removes a key whose list became empty
/// before returning. Each call is atomic on its own (the key's shard lock is
/// held for the duration), nothing spans two calls.
pub struct ConnectionDirectory {
    users: DashMap<String, Vec<ConnectionHandle>>,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    /// Append a connection for `user_id`, creating the entry if needed.
    pub fn register(&self, user_id: &str, handle: ConnectionHandle) {
        self.users
            .entry(user_id.to_string())
            .or_default()
            .push(handle);
    }

    /// Drop every connection of `user_id` and settle their completion
    /// signals. Returns how many were removed; 0 when the user is absent.
    pub fn unregister(&self, user_id: &str) -> usize {
        match self.users.remove(user_id) {
            Some((_, handles)) => {
                for handle in &handles {
                    handle.complete();
                }
                handles.len()
            }
            None => 0,
        }
    }

    /// Snapshot of the user's connections (empty if none).
    pub fn lookup(&self, user_id: &str) -> Vec<ConnectionHandle> {
        self.users
            .get(user_id)
            .map(|handles| handles.value().clone())
            .unwrap_or_default()
    }

    /// Remove the listed connection ids from the user's entry, dropping the
    /// entry once it is empty. Returns the number of handles removed.
    pub fn prune<S: AsRef<str>>(&self, user_id: &str, dead: &[S]) -> usize {
        if dead.is_empty() {
            return 0;
        }
        match self.users.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let before = entry.get().len();
                entry
                    .get_mut()
                    .retain(|h| !dead.iter().any(|id| id.as_ref() == h.id()));
                let removed = before - entry.get().len();
                if entry.get().is_empty() {
                    entry.remove();
                }
                removed
            }
            Entry::Vacant(_) => 0,
        }
    }

    /// Snapshot of every user id with at least one connection.
    pub fn users(&self) -> Vec<String> {
        self.users.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn connection_count(&self) -> usize {
        self.users.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for ConnectionDirectory {
    fn default() -> Self {
        Self::new()
    }
}
