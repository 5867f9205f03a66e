//! Message Router: decides who hears about each command.
//!
//! The router holds no chat state. Every operation borrows the registries,
//! applies the command, and returns the deliveries the transport must
//! perform. Rejected commands come back as [`RouteError`] and produce no
//! deliveries at all.

use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use tracing::{debug, warn};

use crate::error::{Result, RouteError};
use crate::models::{new_id, ConnectionId, User};
use crate::protocol::{
    ClientCommand, CreateGroup, DeleteMessage, Delivery, GroupMessage, GroupMessageReceived,
    MessageDeleted, NameChange, PrivateMessage, ReceivedMessage, SentMessage, ServerEvent,
};
use crate::registry::{ConnectionRegistry, GroupRegistry, Registries};

/// Wall-clock format used for message timestamps, e.g. `3:04:05 PM`.
pub const DEFAULT_TIME_FORMAT: &str = "%-I:%M:%S %p";

/// Whether `format` is a strftime pattern chrono can render.
pub fn is_valid_time_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

#[derive(Debug, Clone)]
pub struct Router {
    time_format: String,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router stamping messages with `format`. Falls back to
    /// [`DEFAULT_TIME_FORMAT`] if chrono cannot parse it.
    pub fn with_time_format(format: impl Into<String>) -> Self {
        let format = format.into();
        if is_valid_time_format(&format) {
            Self { time_format: format }
        } else {
            warn!("Invalid time format {:?}, using {:?}", format, DEFAULT_TIME_FORMAT);
            Self::default()
        }
    }

    pub fn time_format(&self) -> &str {
        &self.time_format
    }

    /// Display timestamp for a message being routed now.
    fn timestamp(&self) -> String {
        Local::now().format(&self.time_format).to_string()
    }

    /// A new connection joined: tell it who it is, tell everyone who is here.
    pub fn connect(
        &self,
        connections: &mut ConnectionRegistry,
        connection_id: &str,
        requested_name: Option<&str>,
    ) -> (User, Vec<Delivery>) {
        let user = connections.register(connection_id, requested_name);
        let deliveries = vec![
            Delivery::to(connection_id, ServerEvent::SelfInfo(user.clone())),
            Delivery::broadcast(ServerEvent::UsersList(connections.list())),
        ];
        (user, deliveries)
    }

    /// A connection closed. Group membership is left untouched.
    pub fn disconnect(&self, connections: &mut ConnectionRegistry, connection_id: &str) -> Vec<Delivery> {
        match connections.remove(connection_id) {
            Some(_) => vec![Delivery::broadcast(ServerEvent::UsersList(connections.list()))],
            None => Vec::new(),
        }
    }

    /// Dispatch an inbound command from `from`.
    pub fn route(&self, registries: &mut Registries, from: &str, command: ClientCommand) -> Result<Vec<Delivery>> {
        match command {
            ClientCommand::PrivateMessage(PrivateMessage { to, content }) => {
                self.send_private(&registries.connections, from, &to, content)
            }
            ClientCommand::CreateGroup(CreateGroup { name, participants }) => {
                Ok(self.create_group(&mut registries.groups, from, &name, participants))
            }
            ClientCommand::GroupMessage(GroupMessage { group_id, content }) => {
                self.send_group(&registries.groups, from, &group_id, content)
            }
            ClientCommand::UpdateName(new_name) => self.update_name(
                &mut registries.connections,
                &registries.groups,
                from,
                &new_name,
            ),
            ClientCommand::DeleteMessage(DeleteMessage { message_id, chat_id }) => self.delete_message(
                &registries.connections,
                &registries.groups,
                from,
                message_id,
                &chat_id,
            ),
        }
    }

    /// Direct message. The recipient gets `message:received`, the sender a
    /// `message:sent` confirmation carrying the same message id.
    pub fn send_private(
        &self,
        connections: &ConnectionRegistry,
        from: &str,
        to: &str,
        content: String,
    ) -> Result<Vec<Delivery>> {
        if !connections.contains(from) {
            return Err(RouteError::UnknownConnection(from.to_string()));
        }
        if !connections.contains(to) {
            return Err(RouteError::UnknownRecipient(to.to_string()));
        }
        if from == to {
            return Err(RouteError::SelfMessage(from.to_string()));
        }

        let message_id = new_id();
        let timestamp = self.timestamp();
        debug!("Private message {} from {} to {}", message_id, from, to);

        Ok(vec![
            Delivery::to(
                to,
                ServerEvent::MessageReceived(ReceivedMessage {
                    content: content.clone(),
                    from: from.to_string(),
                    timestamp: timestamp.clone(),
                    message_id: message_id.clone(),
                }),
            ),
            Delivery::to(
                from,
                ServerEvent::MessageSent(SentMessage {
                    content,
                    to: to.to_string(),
                    timestamp,
                    message_id,
                }),
            ),
        ])
    }

    /// Group message, echoed to every participant including the sender.
    pub fn send_group(
        &self,
        groups: &GroupRegistry,
        from: &str,
        group_id: &str,
        content: String,
    ) -> Result<Vec<Delivery>> {
        let group = groups
            .lookup(group_id)
            .ok_or_else(|| RouteError::UnknownGroup(group_id.to_string()))?;
        if !group.has_member(from) {
            return Err(RouteError::NotAMember {
                connection: from.to_string(),
                group: group_id.to_string(),
            });
        }

        let message_id = new_id();
        debug!("Group message {} from {} to group {}", message_id, from, group_id);

        Ok(vec![Delivery::to_all(
            group.participants.clone(),
            ServerEvent::GroupMessageReceived(GroupMessageReceived {
                message_id,
                group_id: group_id.to_string(),
                content,
                from: from.to_string(),
                timestamp: self.timestamp(),
            }),
        )])
    }

    /// Create a group and announce it to all of its participants.
    ///
    /// Listed members are not checked against the Connection Registry;
    /// unknown ids simply never receive anything.
    pub fn create_group(
        &self,
        groups: &mut GroupRegistry,
        from: &str,
        name: &str,
        member_ids: Vec<ConnectionId>,
    ) -> Vec<Delivery> {
        let group = groups.create(name, from, member_ids);
        debug!(
            "Group {} ({}) created by {} with {} participants",
            group.id,
            group.name,
            from,
            group.participants.len()
        );
        vec![Delivery::to_all(
            group.participants.clone(),
            ServerEvent::GroupCreated(group),
        )]
    }

    /// Rename a connection and fan the change out: each of its groups,
    /// then every open connection, then the renamer itself.
    pub fn update_name(
        &self,
        connections: &mut ConnectionRegistry,
        groups: &GroupRegistry,
        connection_id: &str,
        new_name: &str,
    ) -> Result<Vec<Delivery>> {
        let user = connections
            .rename(connection_id, new_name)
            .ok_or_else(|| RouteError::UnknownConnection(connection_id.to_string()))?;

        let change = NameChange {
            user_id: connection_id.to_string(),
            new_name: new_name.to_string(),
        };

        let mut deliveries: Vec<Delivery> = groups
            .groups_of(connection_id)
            .map(|group| {
                Delivery::to_all(
                    group.participants.clone(),
                    ServerEvent::GroupUserUpdated(change.clone()),
                )
            })
            .collect();
        deliveries.push(Delivery::broadcast(ServerEvent::NameUpdated(change)));
        deliveries.push(Delivery::to(connection_id, ServerEvent::SelfInfo(user)));

        Ok(deliveries)
    }

    /// Soft-delete notice. Nothing is validated against message history:
    /// the server keeps none.
    ///
    /// For a group, every participant is told, whoever asked. For a private
    /// chat, `chat_id` is the peer's id; the peer is told the chat is the
    /// requester, the requester gets back the `chat_id` it sent.
    pub fn delete_message(
        &self,
        connections: &ConnectionRegistry,
        groups: &GroupRegistry,
        requester: &str,
        message_id: String,
        chat_id: &str,
    ) -> Result<Vec<Delivery>> {
        if let Some(group) = groups.lookup(chat_id) {
            return Ok(vec![Delivery::to_all(
                group.participants.clone(),
                ServerEvent::MessageDeleted(MessageDeleted {
                    message_id,
                    chat_id: chat_id.to_string(),
                }),
            )]);
        }

        if !connections.contains(chat_id) {
            return Err(RouteError::UnknownChat(chat_id.to_string()));
        }

        Ok(vec![
            Delivery::to(
                chat_id,
                ServerEvent::MessageDeleted(MessageDeleted {
                    message_id: message_id.clone(),
                    chat_id: requester.to_string(),
                }),
            ),
            Delivery::to(
                requester,
                ServerEvent::MessageDeleted(MessageDeleted {
                    message_id,
                    chat_id: chat_id.to_string(),
                }),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Recipients;

    fn setup(names: &[&str]) -> Registries {
        let mut registries = Registries::new();
        for name in names {
            registries.connections.register(name, Some(name));
        }
        registries
    }

    fn only(ids: &[&str]) -> Recipients {
        Recipients::Only(ids.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_connect_sends_self_info_then_presence() {
        let router = Router::new();
        let mut registries = setup(&["a"]);

        let (user, deliveries) = router.connect(&mut registries.connections, "b", Some("Bea"));
        assert_eq!(user, User::new("b", "Bea"));
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0], Delivery::to("b", ServerEvent::SelfInfo(user)));
        assert_eq!(deliveries[1].recipients, Recipients::Everyone);
        match &deliveries[1].event {
            ServerEvent::UsersList(users) => assert_eq!(users.len(), 2),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_disconnect_rebroadcasts_once() {
        let router = Router::new();
        let mut registries = setup(&["a", "b"]);

        let deliveries = router.disconnect(&mut registries.connections, "a");
        assert_eq!(
            deliveries,
            vec![Delivery::broadcast(ServerEvent::UsersList(vec![User::new("b", "b")]))]
        );
        assert!(router.disconnect(&mut registries.connections, "a").is_empty());
    }

    #[test]
    fn test_private_message_pairs_share_id() {
        let router = Router::new();
        let registries = setup(&["a", "b"]);

        let deliveries = router
            .send_private(&registries.connections, "a", "b", "hi".into())
            .unwrap();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].recipients, only(&["b"]));
        assert_eq!(deliveries[1].recipients, only(&["a"]));

        match (&deliveries[0].event, &deliveries[1].event) {
            (ServerEvent::MessageReceived(received), ServerEvent::MessageSent(sent)) => {
                assert_eq!(received.message_id, sent.message_id);
                assert_eq!(received.timestamp, sent.timestamp);
                assert_eq!(received.from, "a");
                assert_eq!(sent.to, "b");
                assert_eq!(received.content, "hi");
            }
            other => panic!("unexpected events {:?}", other),
        }
    }

    #[test]
    fn test_private_message_rejections() {
        let router = Router::new();
        let registries = setup(&["a"]);

        assert_eq!(
            router.send_private(&registries.connections, "a", "a", "hi".into()),
            Err(RouteError::SelfMessage("a".into()))
        );
        assert_eq!(
            router.send_private(&registries.connections, "a", "nobody", "hi".into()),
            Err(RouteError::UnknownRecipient("nobody".into()))
        );
    }

    #[test]
    fn test_create_group_announces_to_all_participants() {
        let router = Router::new();
        let mut registries = setup(&["a", "b", "c"]);

        let deliveries = router
            .route(
                &mut registries,
                "a",
                ClientCommand::CreateGroup(CreateGroup {
                    name: "team".into(),
                    participants: vec!["b".into(), "c".into(), "a".into()],
                }),
            )
            .unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].recipients, only(&["b", "c", "a"]));
        match &deliveries[0].event {
            ServerEvent::GroupCreated(group) => {
                assert_eq!(group.name, "team");
                assert_eq!(registries.groups.lookup(&group.id), Some(group));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_group_message_echoes_to_sender() {
        let router = Router::new();
        let mut registries = setup(&["a", "b", "c"]);
        let group = registries.groups.create("team", "a", vec!["b".into()]);

        let deliveries = router
            .send_group(&registries.groups, "b", &group.id, "yo".into())
            .unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].recipients, only(&["b", "a"]));

        assert_eq!(
            router.send_group(&registries.groups, "c", &group.id, "yo".into()),
            Err(RouteError::NotAMember {
                connection: "c".into(),
                group: group.id.clone(),
            })
        );
        assert_eq!(
            router.send_group(&registries.groups, "a", "nope", "yo".into()),
            Err(RouteError::UnknownGroup("nope".into()))
        );
    }

    #[test]
    fn test_update_name_fan_out_order() {
        let router = Router::new();
        let mut registries = setup(&["a", "b", "c"]);
        let group = registries.groups.create("team", "a", vec!["b".into()]);
        registries.groups.create("other", "c", Vec::new());

        let deliveries = router
            .route(&mut registries, "a", ClientCommand::UpdateName("X".into()))
            .unwrap();
        let change = NameChange {
            user_id: "a".into(),
            new_name: "X".into(),
        };
        assert_eq!(
            deliveries,
            vec![
                Delivery::to_all(group.participants.clone(), ServerEvent::GroupUserUpdated(change.clone())),
                Delivery::broadcast(ServerEvent::NameUpdated(change)),
                Delivery::to("a", ServerEvent::SelfInfo(User::new("a", "X"))),
            ]
        );

        let roster = registries.groups.roster(&group.id, &registries.connections).unwrap();
        let a = roster.participants.iter().find(|p| p.id == "a").unwrap();
        assert_eq!(a.name.as_deref(), Some("X"));
    }

    #[test]
    fn test_update_name_unknown_connection_is_rejected() {
        let router = Router::new();
        let mut registries = setup(&[]);
        assert_eq!(
            router.route(&mut registries, "ghost", ClientCommand::UpdateName("X".into())),
            Err(RouteError::UnknownConnection("ghost".into()))
        );
    }

    #[test]
    fn test_group_delete_is_not_authorized() {
        let router = Router::new();
        let registries = setup(&["a", "b", "outsider"]);
        let mut groups = registries.groups;
        let group = groups.create("team", "a", vec!["b".into()]);

        let deliveries = router
            .delete_message(&registries.connections, &groups, "outsider", "m1".into(), &group.id)
            .unwrap();
        assert_eq!(
            deliveries,
            vec![Delivery::to_all(
                group.participants.clone(),
                ServerEvent::MessageDeleted(MessageDeleted {
                    message_id: "m1".into(),
                    chat_id: group.id.clone(),
                }),
            )]
        );
    }

    #[test]
    fn test_private_delete_chat_id_asymmetry() {
        let router = Router::new();
        let registries = setup(&["a", "b"]);

        let deliveries = router
            .delete_message(&registries.connections, &registries.groups, "a", "m1".into(), "b")
            .unwrap();
        assert_eq!(
            deliveries,
            vec![
                Delivery::to(
                    "b",
                    ServerEvent::MessageDeleted(MessageDeleted {
                        message_id: "m1".into(),
                        chat_id: "a".into(),
                    }),
                ),
                Delivery::to(
                    "a",
                    ServerEvent::MessageDeleted(MessageDeleted {
                        message_id: "m1".into(),
                        chat_id: "b".into(),
                    }),
                ),
            ]
        );

        assert_eq!(
            router.delete_message(&registries.connections, &registries.groups, "a", "m1".into(), "zzz"),
            Err(RouteError::UnknownChat("zzz".into()))
        );
    }

    #[test]
    fn test_time_format_validation() {
        assert!(is_valid_time_format(DEFAULT_TIME_FORMAT));
        assert!(is_valid_time_format("%H:%M"));
        assert!(!is_valid_time_format("%Q"));

        let router = Router::with_time_format("%Q");
        assert_eq!(router.time_format(), DEFAULT_TIME_FORMAT);
        assert!(!router.timestamp().is_empty());
    }
}
