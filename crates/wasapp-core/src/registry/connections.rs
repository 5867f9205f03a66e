//! Connection Registry: live connections and their public identity.

use std::collections::HashMap;

use crate::models::{default_display_name, ConnectionId, User};

/// Source of presence truth: connection id -> user.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    users: HashMap<ConnectionId, User>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the identity of `connection_id`.
    ///
    /// A missing or empty `requested_name` falls back to a generated
    /// `Usuario xxxx` name. Names are not checked for uniqueness.
    pub fn register(&mut self, connection_id: &str, requested_name: Option<&str>) -> User {
        let name = match requested_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_display_name(),
        };
        let user = User::new(connection_id, name);
        self.users.insert(connection_id.to_string(), user.clone());
        user
    }

    /// Replace the stored name. Returns `None` for unknown connections.
    pub fn rename(&mut self, connection_id: &str, new_name: &str) -> Option<User> {
        let user = self.users.get_mut(connection_id)?;
        user.name = new_name.to_string();
        Some(user.clone())
    }

    /// Drop a connection. Removing an absent id is a no-op.
    pub fn remove(&mut self, connection_id: &str) -> Option<User> {
        self.users.remove(connection_id)
    }

    /// Snapshot of every registered user, in no particular order.
    pub fn list(&self) -> Vec<User> {
        self.users.values().cloned().collect()
    }

    pub fn lookup(&self, connection_id: &str) -> Option<&User> {
        self.users.get(connection_id)
    }

    pub fn contains(&self, connection_id: &str) -> bool {
        self.users.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
