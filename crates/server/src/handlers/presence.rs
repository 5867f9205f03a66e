use crate::config::AppState;
use crate::error::{Error, Result};
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;
use wasapp_core::{Roster, User};

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let users = state.hub.users();
    debug!("GET /users - {} online", users.len());
    Json(users)
}

/// GET /groups/:group_id
///
/// Participants carry their current name, or `null` once disconnected.
pub async fn get_group(
    Path(group_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Roster>> {
    debug!("GET /groups/{}", group_id);
    state
        .hub
        .roster(&group_id)
        .map(Json)
        .ok_or(Error::GroupNotFound(group_id))
}
