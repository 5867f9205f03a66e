//! Group Registry: groups are created once and never change.

use std::collections::HashMap;

use crate::models::{new_id, ConnectionId, Group, GroupId, Participant, Roster};
use crate::registry::ConnectionRegistry;

/// group id -> group. There is no delete, join, leave or rename.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: HashMap<GroupId, Group>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new group with a fresh id. The creator is always a member.
    pub fn create(
        &mut self,
        name: &str,
        creator_id: &str,
        member_ids: impl IntoIterator<Item = ConnectionId>,
    ) -> Group {
        let group = Group::new(new_id(), name, creator_id, member_ids);
        self.groups.insert(group.id.clone(), group.clone());
        group
    }

    pub fn lookup(&self, group_id: &str) -> Option<&Group> {
        self.groups.get(group_id)
    }

    /// Membership gate for group-addressed actions.
    pub fn is_member(&self, group_id: &str, connection_id: &str) -> bool {
        self.groups
            .get(group_id)
            .is_some_and(|group| group.has_member(connection_id))
    }

    /// Every group listing `connection_id` as a participant.
    pub fn groups_of<'a>(&'a self, connection_id: &'a str) -> impl Iterator<Item = &'a Group> + 'a {
        self.groups
            .values()
            .filter(move |group| group.has_member(connection_id))
    }

    /// Group with participant names resolved against `connections`.
    ///
    /// Names are never stored on the group, so a rename shows up here as
    /// soon as the Connection Registry holds it.
    pub fn roster(&self, group_id: &str, connections: &ConnectionRegistry) -> Option<Roster> {
        let group = self.groups.get(group_id)?;
        let participants = group
            .participants
            .iter()
            .map(|id| Participant {
                id: id.clone(),
                name: connections.lookup(id).map(|user| user.name.clone()),
            })
            .collect();

        Some(Roster {
            id: group.id.clone(),
            name: group.name.clone(),
            participants,
            kind: group.kind,
        })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<ConnectionId> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_includes_creator_once() {
        let mut groups = GroupRegistry::new();
        let group = groups.create("team", "a", ids(&["b", "c", "a"]));

        let mut members = group.participants.clone();
        members.sort();
        assert_eq!(members, ids(&["a", "b", "c"]));
        assert_eq!(groups.lookup(&group.id), Some(&group));
    }

    #[test]
    fn test_group_ids_are_unique() {
        let mut groups = GroupRegistry::new();
        let first = groups.create("same", "a", Vec::new());
        let second = groups.create("same", "a", Vec::new());
        assert_ne!(first.id, second.id);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_is_member() {
        let mut groups = GroupRegistry::new();
        let group = groups.create("team", "a", ids(&["b"]));
        assert!(groups.is_member(&group.id, "a"));
        assert!(groups.is_member(&group.id, "b"));
        assert!(!groups.is_member(&group.id, "c"));
        assert!(!groups.is_member("missing", "a"));
    }

    #[test]
    fn test_groups_of() {
        let mut groups = GroupRegistry::new();
        let g1 = groups.create("one", "a", ids(&["b"]));
        groups.create("two", "c", Vec::new());

        let found: Vec<_> = groups.groups_of("b").map(|g| g.id.clone()).collect();
        assert_eq!(found, vec![g1.id]);
        assert_eq!(groups.groups_of("z").count(), 0);
    }

    #[test]
    fn test_roster_follows_renames_and_disconnects() {
        let mut connections = ConnectionRegistry::new();
        connections.register("a", Some("Ana"));
        connections.register("b", Some("Bea"));

        let mut groups = GroupRegistry::new();
        let group = groups.create("team", "a", ids(&["b"]));

        connections.rename("b", "Beatriz");
        connections.remove("a");

        let roster = groups.roster(&group.id, &connections).unwrap();
        let a = roster.participants.iter().find(|p| p.id == "a").unwrap();
        let b = roster.participants.iter().find(|p| p.id == "b").unwrap();
        assert_eq!(a.name, None);
        assert_eq!(b.name.as_deref(), Some("Beatriz"));
        assert!(groups.roster("missing", &connections).is_none());
    }
}
