//! Error types for routing decisions.

use thiserror::Error;

use crate::models::{ConnectionId, GroupId};

/// Result type for router operations.
pub type Result<T> = std::result::Result<T, RouteError>;

/// Reasons the router declines to deliver a command.
///
/// None of these reach the originating client. The protocol drops such
/// commands silently; the transport only logs them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown recipient: {0}")]
    UnknownRecipient(ConnectionId),

    #[error("connection {0} tried to message itself")]
    SelfMessage(ConnectionId),

    #[error("unknown group: {0}")]
    UnknownGroup(GroupId),

    #[error("connection {connection} is not a member of group {group}")]
    NotAMember {
        connection: ConnectionId,
        group: GroupId,
    },

    #[error("chat id {0} matches no group and no connection")]
    UnknownChat(String),

    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),
}
