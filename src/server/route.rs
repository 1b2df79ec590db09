#[cfg(feature = "mcp")]
pub mod mcp;
pub mod template;
pub mod webhook;

use std::time::Instant;

use axum::{
    extract::Request,
    http::Uri,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use super::{error::NoRoute, state::AppState};
use crate::dispatch::Transport;

pub fn app<S: Transport>(state: AppState<S>) -> NormalizePath<Router<()>> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}
pub fn router<S: Transport>(state: AppState<S>) -> Router<()> {
    let router = Router::new()
        .route("/", get(root))
        .nest("/templates", template::route_templates())
        .nest("/webhooks", webhook::route_webhooks());
    #[cfg(feature = "mcp")]
    let router = router.route("/mcp", axum::routing::post(mcp::rpc::<S>));
    router.fallback(no_route).layer(middleware::from_fn(access_log)).with_state(state)
}

pub async fn root() -> Json<Value> {
    Json(json!({"status": "ok", "message": concat!("Welcome to ", env!("CARGO_PKG_NAME"))}))
}

pub async fn no_route(uri: Uri) -> NoRoute {
    NoRoute(uri)
}

pub async fn access_log(req: Request, next: Next) -> Response {
    let (method, uri, start) = (req.method().clone(), req.uri().clone(), Instant::now());
    let res = next.run(req).await;
    tracing::info!(%method, %uri, status = %res.status(), elapsed = ?start.elapsed(), "handled");
    res
}
