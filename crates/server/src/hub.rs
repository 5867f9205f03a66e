//! Connection hub
//!
//! Owns the registries and one outbox per open connection. Every inbound
//! event takes the hub lock, runs the router and hands out all resulting
//! events before the lock is released, so events are handled one at a time
//! and to completion.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};
use wasapp_core::models::new_id;
use wasapp_core::protocol::{PARSE_ERROR, UNSUPPORTED_FRAME};
use wasapp_core::{
    ClientCommand, ConnectionId, Delivery, Recipients, Registries, Roster, Router, ServerEvent, User,
};

/// Sending half of a connection's event queue.
pub type Outbox = mpsc::Sender<ServerEvent>;

/// Counters exposed on `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerStats {
    pub connections: usize,
    pub groups: usize,
}

struct HubState {
    registries: Registries,
    outboxes: HashMap<ConnectionId, Outbox>,
}

pub struct Hub {
    router: Router,
    state: Mutex<HubState>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new(Router::new())
    }
}

impl Hub {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            state: Mutex::new(HubState {
                registries: Registries::new(),
                outboxes: HashMap::new(),
            }),
        }
    }

    pub fn with_time_format(format: &str) -> Self {
        Self::new(Router::with_time_format(format))
    }

    /// Register a new connection under a fresh id and announce it.
    pub fn connect(&self, username: Option<&str>, outbox: Outbox) -> User {
        let connection_id = new_id();
        let mut state = self.state.lock();
        let HubState { registries, outboxes } = &mut *state;

        outboxes.insert(connection_id.clone(), outbox);
        let (user, deliveries) = self
            .router
            .connect(&mut registries.connections, &connection_id, username);
        info!(connection_id = %user.id, name = %user.name, "User connected");

        dispatch(outboxes, deliveries);
        user
    }

    /// Route one command issued by `connection_id`.
    ///
    /// Commands the router declines are dropped without telling the client.
    pub fn handle(&self, connection_id: &str, command: ClientCommand) {
        let event = command.name();
        let mut state = self.state.lock();
        let HubState { registries, outboxes } = &mut *state;

        match self.router.route(registries, connection_id, command) {
            Ok(deliveries) => {
                debug!(connection_id = %connection_id, event, deliveries = deliveries.len(), "Command routed");
                dispatch(outboxes, deliveries);
            }
            Err(e) => {
                debug!(connection_id = %connection_id, event, error = %e, "Command dropped");
            }
        }
    }

    /// Parse and route a text frame. Frames that are not valid commands
    /// are answered with a `PARSE_ERROR` event.
    pub fn handle_frame(&self, connection_id: &str, text: &str) {
        match ClientCommand::parse(text) {
            Ok(command) => self.handle(connection_id, command),
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "Failed to parse frame");
                self.reject(connection_id, PARSE_ERROR, format!("Invalid message format: {}", e));
            }
        }
    }

    /// Binary frames are not part of the protocol.
    pub fn handle_binary(&self, connection_id: &str) {
        self.reject(connection_id, UNSUPPORTED_FRAME, "Binary frames are not supported");
    }

    /// Send an `error` event to a single connection.
    pub fn reject(&self, connection_id: &str, code: &str, message: impl Into<String>) {
        let state = self.state.lock();
        dispatch(
            &state.outboxes,
            vec![Delivery::to(connection_id, ServerEvent::error(code, message))],
        );
    }

    /// Drop a connection and rebroadcast presence. Safe to call twice.
    pub fn disconnect(&self, connection_id: &str) {
        let mut state = self.state.lock();
        let HubState { registries, outboxes } = &mut *state;

        outboxes.remove(connection_id);
        let deliveries = self.router.disconnect(&mut registries.connections, connection_id);
        if !deliveries.is_empty() {
            info!(connection_id = %connection_id, "User disconnected");
        }
        dispatch(outboxes, deliveries);
    }

    /// Current presence list.
    pub fn users(&self) -> Vec<User> {
        self.state.lock().registries.connections.list()
    }

    /// Group with participant names as currently registered.
    pub fn roster(&self, group_id: &str) -> Option<Roster> {
        let state = self.state.lock();
        state
            .registries
            .groups
            .roster(group_id, &state.registries.connections)
    }

    pub fn stats(&self) -> ServerStats {
        let state = self.state.lock();
        ServerStats {
            connections: state.registries.connections.len(),
            groups: state.registries.groups.len(),
        }
    }
}

/// Hand each event to its recipients' outboxes without waiting on any of them.
fn dispatch(outboxes: &HashMap<ConnectionId, Outbox>, deliveries: Vec<Delivery>) {
    for Delivery { recipients, event } in deliveries {
        match recipients {
            Recipients::Everyone => {
                for (connection_id, outbox) in outboxes {
                    push(connection_id, outbox, event.clone());
                }
            }
            Recipients::Only(connection_ids) => {
                for connection_id in connection_ids {
                    match outboxes.get(&connection_id) {
                        Some(outbox) => push(&connection_id, outbox, event.clone()),
                        // Group members outlive their connections.
                        None => debug!(connection_id = %connection_id, "No open connection, event skipped"),
                    }
                }
            }
        }
    }
}

fn push(connection_id: &str, outbox: &Outbox, event: ServerEvent) {
    match outbox.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(connection_id = %connection_id, "Outbox full, event dropped");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(connection_id = %connection_id, "Outbox closed, event dropped");
        }
    }
}
