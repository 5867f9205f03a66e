use crate::config::AppState;
use crate::hub::ServerStats;
use axum::{extract::State, response::Html, Json};

/// GET /
pub async fn index() -> Html<&'static str> {
    Html("<h1>Hello world</h1>")
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> Json<ServerStats> {
    Json(state.hub.stats())
}
