use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::{dispatch::Transport, mcp::McpServer, server::state::AppState};

/// One JSON-RPC message per post, notifications are answered with `202 Accepted` and no body.
pub async fn rpc<S: Transport>(State(state): State<AppState<S>>, Json(message): Json<Value>) -> Response {
    match McpServer::new(state.trigger.clone()).handle_value(message).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
