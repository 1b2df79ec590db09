use axum::{extract::State, response::Result, routing::post, Json, Router};

use crate::{
    dispatch::{DispatchResult, Transport},
    server::{error::DispatchFailed, state::AppState},
    trigger::{AdhocTrigger, TemplateTrigger},
};

pub fn route_webhooks<S: Transport>() -> Router<AppState<S>> {
    Router::new().route("/trigger/adhoc", post(adhoc::<S>)).route("/trigger/template", post(template::<S>))
}

pub async fn adhoc<S: Transport>(
    State(state): State<AppState<S>>,
    Json(AdhocTrigger { request, wait_for_response }): Json<AdhocTrigger>,
) -> Result<Json<DispatchResult>> {
    responded(state.trigger.trigger_adhoc(request, wait_for_response).await)
}

pub async fn template<S: Transport>(
    State(state): State<AppState<S>>,
    Json(TemplateTrigger { template_id, values, wait_for_response }): Json<TemplateTrigger>,
) -> Result<Json<DispatchResult>> {
    responded(state.trigger.trigger_templated(&template_id, &values, wait_for_response).await?)
}

fn responded(result: DispatchResult) -> Result<Json<DispatchResult>> {
    match result.error().cloned() {
        Some(error) => Err(DispatchFailed { error, result }.into()),
        None => Ok(Json(result)),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::{
        dispatch::redact::REDACTED,
        server::route::tests::{oneshot, state, Recording},
    };

    #[tokio::test]
    async fn test_adhoc_sync() {
        let transport = Recording::default();
        let payload = json!({
            "url": "https://api.test/hook",
            "headers": {"Authorization": "Bearer xyz"},
            "body": {"message": "Hello, World!"},
        });
        let (status, body) =
            oneshot(state(transport.clone()), Method::POST, "/webhooks/trigger/adhoc", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_json_diff::assert_json_eq!(
            body,
            json!({
                "webhook_status": "success",
                "webhook_request": {
                    "method": "POST",
                    "url": "https://api.test/hook",
                    "headers": {"Authorization": REDACTED},
                    "body": {"message": "Hello, World!"},
                },
                "webhook_response": {
                    "status_code": 201,
                    "headers": {"content-type": "application/json"},
                    "body": {"ok": true},
                },
            })
        );
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].headers()["authorization"], "Bearer xyz");
    }

    #[tokio::test]
    async fn test_adhoc_malformed() {
        let payload = json!({"method": "BAD METHOD", "url": "https://api.test/hook"});
        let (status, body) = oneshot(state(Default::default()), Method::POST, "/webhooks/trigger/adhoc", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "bad request");
        assert_eq!(body["detail"]["webhook_status"], "error");
        assert_eq!(body["detail"]["error"]["kind"], "malformed");
    }

    #[tokio::test]
    async fn test_template_trigger() {
        let transport = Recording::default();
        let state = state(transport.clone());
        let draft = json!({"name": "n", "method": "GET", "url_template": "https://api.test/{id}", "body_template": {"n": "{name}"}});
        let (_, created) = oneshot(state.clone(), Method::POST, "/templates", Some(draft)).await;
        let id = created["id"].as_str().unwrap();

        let missing = json!({"template_id": id, "values": {"id": "42"}});
        let (status, body) = oneshot(state.clone(), Method::POST, "/webhooks/trigger/template", Some(missing)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "missing value for placeholder `name`");
        assert!(transport.sent.lock().unwrap().is_empty());

        let complete = json!({"template_id": id, "values": {"id": "42", "name": "Ada"}, "wait_for_response": false});
        let (status, body) = oneshot(state.clone(), Method::POST, "/webhooks/trigger/template", Some(complete)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "webhook_status": "accepted",
                "message": "Webhook request has been sent asynchronously",
                "webhook_request": {"method": "GET", "url": "https://api.test/42"},
            })
        );

        let unknown = json!({"template_id": "nope"});
        let (status, _) = oneshot(state, Method::POST, "/webhooks/trigger/template", Some(unknown)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
