//! In-memory registries owned by the transport and lent to the router.

pub mod connections;
pub mod groups;

pub use connections::ConnectionRegistry;
pub use groups::GroupRegistry;

/// Both registries, threaded through the router as one context.
#[derive(Debug, Default)]
pub struct Registries {
    pub connections: ConnectionRegistry,
    pub groups: GroupRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }
}
