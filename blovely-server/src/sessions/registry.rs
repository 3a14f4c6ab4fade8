//! In-memory mapping from a canonical user id to live connection handles.
//!
//! Nothing here is persisted; on process restart every client must rejoin.
//! A user may hold several simultaneous connections (multi-tab, multi-device),
//! and a connection is bound to exactly one user at a time.

use std::collections::HashSet;

use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// user id -> its live connection ids
    users: DashMap<Uuid, HashSet<String>>,
    /// connection id -> the user it is bound to
    connections: DashMap<String, Uuid>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection to a user. Returns `true` when this is the user's
    /// first live connection (they just came online).
    ///
    /// Rebinding an already-registered connection to a different user moves
    /// it; the old binding is dropped first.
    pub fn register(&self, conn_id: impl Into<String>, user_id: Uuid) -> bool {
        let conn_id = conn_id.into();

        if let Some(previous) = self.connections.insert(conn_id.clone(), user_id) {
            if previous != user_id {
                self.detach(&previous, &conn_id);
            }
        }

        let mut entry = self.users.entry(user_id).or_default();
        let first = entry.is_empty();
        entry.insert(conn_id);
        first
    }

    /// Drop a connection. Returns the user it was bound to and whether that
    /// was their last live connection. No-op for unknown connections.
    pub fn unregister(&self, conn_id: &str) -> Option<(Uuid, bool)> {
        let (_, user_id) = self.connections.remove(conn_id)?;
        let last = self.detach(&user_id, conn_id);
        Some((user_id, last))
    }

    /// The user currently bound to a connection, if any.
    pub fn user_for(&self, conn_id: &str) -> Option<Uuid> {
        self.connections.get(conn_id).map(|entry| *entry)
    }

    /// Snapshot of the live connection ids registered under a user.
    pub fn connections_for(&self, user_id: Uuid) -> Vec<String> {
        self.users
            .get(&user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.users
            .get(&user_id)
            .map(|set| !set.is_empty())
            .unwrap_or(false)
    }

    /// Remove `conn_id` from the user's set; returns `true` when the set is
    /// now empty (and removes the empty entry).
    fn detach(&self, user_id: &Uuid, conn_id: &str) -> bool {
        let mut empty = false;
        if let Some(mut set) = self.users.get_mut(user_id) {
            set.remove(conn_id);
            empty = set.is_empty();
        }
        if empty {
            self.users.remove_if(user_id, |_, set| set.is_empty());
        }
        empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_first_connection_reports_online() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();

        assert!(registry.register("conn-1", user));
        assert!(!registry.register("conn-2", user));
        assert!(registry.is_online(user));
        assert_eq!(registry.connections_for(user).len(), 2);
    }

    #[test]
    fn unregister_last_connection_reports_offline() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();
        registry.register("conn-1", user);
        registry.register("conn-2", user);

        assert_eq!(registry.unregister("conn-1"), Some((user, false)));
        assert_eq!(registry.unregister("conn-2"), Some((user, true)));
        assert!(!registry.is_online(user));
        assert!(registry.connections_for(user).is_empty());
    }

    #[test]
    fn unregister_unknown_is_noop() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.unregister("ghost"), None);
    }

    #[test]
    fn connection_binds_to_one_user_at_a_time() {
        let registry = SessionRegistry::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        registry.register("conn-1", first);
        registry.register("conn-1", second);

        assert_eq!(registry.user_for("conn-1"), Some(second));
        assert!(!registry.is_online(first));
        assert!(registry.is_online(second));
    }

    #[test]
    fn rejoin_with_same_user_is_stable() {
        let registry = SessionRegistry::new();
        let user = Uuid::new_v4();

        registry.register("conn-1", user);
        registry.register("conn-1", user);

        assert_eq!(registry.connections_for(user), vec!["conn-1".to_string()]);
        assert_eq!(registry.unregister("conn-1"), Some((user, true)));
    }
}
