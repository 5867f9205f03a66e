//! Wire protocol for the relay socket.
//!
//! Every frame is a JSON text message shaped as
//! `{"event": "<name>", "data": <payload>}`, with the event names the
//! browser client already listens for.

use serde::{Deserialize, Serialize};

use crate::models::{ConnectionId, Group, GroupId, MessageId, User};

/// Error code sent back for frames that are not valid commands.
pub const PARSE_ERROR: &str = "PARSE_ERROR";
/// Error code sent back for binary frames.
pub const UNSUPPORTED_FRAME: &str = "UNSUPPORTED_FRAME";

/// Commands a connection can issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientCommand {
    #[serde(rename = "message:private")]
    PrivateMessage(PrivateMessage),
    #[serde(rename = "group:create")]
    CreateGroup(CreateGroup),
    #[serde(rename = "message:group")]
    GroupMessage(GroupMessage),
    #[serde(rename = "user:updateName")]
    UpdateName(String),
    #[serde(rename = "message:delete")]
    DeleteMessage(DeleteMessage),
}

impl ClientCommand {
    /// Parse one text frame.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Event name as it appears on the wire, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::PrivateMessage(_) => "message:private",
            ClientCommand::CreateGroup(_) => "group:create",
            ClientCommand::GroupMessage(_) => "message:group",
            ClientCommand::UpdateName(_) => "user:updateName",
            ClientCommand::DeleteMessage(_) => "message:delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub to: ConnectionId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    #[serde(default)]
    pub participants: Vec<ConnectionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    pub group_id: GroupId,
    pub content: String,
}

/// `chat_id` is a group id, or the peer's connection id for a private chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessage {
    pub message_id: MessageId,
    pub chat_id: String,
}

/// Events pushed to connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "self:info")]
    SelfInfo(User),
    #[serde(rename = "users:list")]
    UsersList(Vec<User>),
    #[serde(rename = "message:received")]
    MessageReceived(ReceivedMessage),
    #[serde(rename = "message:sent")]
    MessageSent(SentMessage),
    #[serde(rename = "group:created")]
    GroupCreated(Group),
    #[serde(rename = "message:group:received")]
    GroupMessageReceived(GroupMessageReceived),
    #[serde(rename = "user:nameUpdated")]
    NameUpdated(NameChange),
    #[serde(rename = "group:userUpdated")]
    GroupUserUpdated(NameChange),
    #[serde(rename = "message:deleted")]
    MessageDeleted(MessageDeleted),
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            code: code.into(),
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedMessage {
    pub content: String,
    pub from: ConnectionId,
    pub timestamp: String,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub content: String,
    pub to: ConnectionId,
    pub timestamp: String,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageReceived {
    pub message_id: MessageId,
    pub group_id: GroupId,
    pub content: String,
    pub from: ConnectionId,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameChange {
    pub user_id: ConnectionId,
    pub new_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeleted {
    pub message_id: MessageId,
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

/// Who receives a [`Delivery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    /// Every connection open at dispatch time.
    Everyone,
    /// An explicit set. Ids without an open connection are skipped.
    Only(Vec<ConnectionId>),
}

impl Recipients {
    /// Whether `connection_id` is addressed, given it is currently open.
    pub fn includes(&self, connection_id: &str) -> bool {
        match self {
            Recipients::Everyone => true,
            Recipients::Only(ids) => ids.iter().any(|id| id == connection_id),
        }
    }
}

/// One outbound event and the connections it goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipients: Recipients,
    pub event: ServerEvent,
}

impl Delivery {
    pub fn to(connection_id: impl Into<ConnectionId>, event: ServerEvent) -> Self {
        Self {
            recipients: Recipients::Only(vec![connection_id.into()]),
            event,
        }
    }

    pub fn to_all(connection_ids: Vec<ConnectionId>, event: ServerEvent) -> Self {
        Self {
            recipients: Recipients::Only(connection_ids),
            event,
        }
    }

    pub fn broadcast(event: ServerEvent) -> Self {
        Self {
            recipients: Recipients::Everyone,
            event,
        }
    }
}
