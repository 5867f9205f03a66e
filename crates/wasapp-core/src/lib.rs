//! wasapp-core: presence and message routing for the Wasapp chat relay.
//!
//! The crate owns no I/O. It is made of three pieces:
//!
//! - **registry**: the Connection Registry (who is online, under which name)
//!   and the Group Registry (fixed-membership broadcast sets).
//! - **router**: stateless routing rules turning one inbound command into
//!   a list of [`Delivery`] values.
//! - **protocol**: the JSON event envelope spoken over the socket.
//!
//! A transport drives the router one event at a time and hands each
//! [`Delivery`] to the matching connections.

pub mod error;
pub mod models;
pub mod protocol;
pub mod registry;
pub mod router;

pub use crate::error::{Result, RouteError};
pub use crate::models::{ConnectionId, Group, GroupId, GroupKind, MessageId, Participant, Roster, User};
pub use crate::protocol::{ClientCommand, Delivery, Recipients, ServerEvent};
pub use crate::registry::{ConnectionRegistry, GroupRegistry, Registries};
pub use crate::router::{Router, DEFAULT_TIME_FORMAT};
