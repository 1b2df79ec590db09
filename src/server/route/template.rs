use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Result,
    routing::get,
    Json, Router,
};

use crate::{
    dispatch::Transport,
    registry::{TemplateDraft, WebhookTemplate},
    server::state::AppState,
};

pub fn route_templates<S: Transport>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(list::<S>).post(create::<S>))
        .route("/{id}", get(read::<S>).put(update::<S>).delete(delete::<S>))
}

pub async fn create<S: Transport>(
    State(state): State<AppState<S>>,
    Json(draft): Json<TemplateDraft>,
) -> (StatusCode, Json<WebhookTemplate>) {
    (StatusCode::CREATED, Json(state.trigger.registry().create(draft)))
}

pub async fn list<S: Transport>(State(state): State<AppState<S>>) -> Json<Vec<WebhookTemplate>> {
    Json(state.trigger.registry().list())
}

pub async fn read<S: Transport>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<WebhookTemplate>> {
    Ok(Json(state.trigger.registry().get(&id)?))
}

pub async fn update<S: Transport>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(draft): Json<TemplateDraft>,
) -> Result<Json<WebhookTemplate>> {
    Ok(Json(state.trigger.registry().update(&id, draft)?))
}

pub async fn delete<S: Transport>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<StatusCode> {
    state.trigger.registry().delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
