//! Users, groups and the ids that name them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an open connection. Doubles as the public user id.
pub type ConnectionId = String;

/// Identity of a group, minted at creation.
pub type GroupId = String;

/// Identity of a routed message, shared by every copy of it.
pub type MessageId = String;

/// Prefix of the generated display name.
pub const DEFAULT_NAME_PREFIX: &str = "Usuario";

/// Mint a fresh opaque id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Display name used when a client connects without a username,
/// e.g. `Usuario 3fa8`.
pub fn default_display_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{} {}", DEFAULT_NAME_PREFIX, &suffix[..4])
}

/// A connected user as seen by other clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: ConnectionId,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<ConnectionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Discriminator the view layer uses to tell groups from private chats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    #[default]
    Group,
}

/// A named broadcast set with fixed membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub participants: Vec<ConnectionId>,
    #[serde(rename = "type", default)]
    pub kind: GroupKind,
}

impl Group {
    /// Build a group whose participants are `members` plus `creator`,
    /// deduplicated, first occurrence wins.
    pub fn new(
        id: impl Into<GroupId>,
        name: impl Into<String>,
        creator: &str,
        members: impl IntoIterator<Item = ConnectionId>,
    ) -> Self {
        let mut participants: Vec<ConnectionId> = Vec::new();
        for member in members.into_iter().chain(std::iter::once(creator.to_string())) {
            if !participants.contains(&member) {
                participants.push(member);
            }
        }

        Self {
            id: id.into(),
            name: name.into(),
            participants,
            kind: GroupKind::Group,
        }
    }

    pub fn has_member(&self, connection_id: &str) -> bool {
        self.participants.iter().any(|p| p == connection_id)
    }
}

/// A group participant with the name currently registered for it.
///
/// `name` is `None` once the participant has disconnected: membership
/// outlives the connection, the display name does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ConnectionId,
    pub name: Option<String>,
}

/// Read-side view of a group with participant names resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub id: GroupId,
    pub name: String,
    pub participants: Vec<Participant>,
    #[serde(rename = "type")]
    pub kind: GroupKind,
}
