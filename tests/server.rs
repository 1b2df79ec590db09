#![cfg(feature = "cli")]

use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use hooktrigger::{
    command::Cmd,
    dispatch::{client::DefaultHttpClient, Dispatcher},
    registry::{TemplateDraft, TemplateRegistry},
    server::{route, state::AppState},
    trigger::Trigger,
};
use httptest::{
    all_of,
    matchers::{json_decoded, request},
    responders::{json_encoded, status_code},
    Expectation, Server,
};
use serde_json::{json, Value};

async fn spawn_service(registry: Arc<TemplateRegistry>) -> String {
    let trigger = Trigger::new(registry, Dispatcher::new(DefaultHttpClient::new().unwrap()));
    let app = route::app(AppState::new(trigger));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, axum::ServiceExt::<axum::extract::Request>::into_make_service(app)).await.unwrap()
    });
    format!("http://{}", addr)
}

async fn run(api_url: &str, args: &[&str], input: &str) -> (ExitCode, String) {
    let argv = ["hooktrigger", "--no-color", "--api-url", api_url].into_iter().chain(args.iter().copied());
    let cmd = Cmd::try_parse_from(argv).unwrap();
    let mut out = Vec::new();
    let code = cmd.run(&mut out, &mut input.as_bytes()).await.unwrap();
    (code, String::from_utf8(out).unwrap())
}

fn json_of(printed: &str) -> Value {
    let body: String = printed.lines().skip(1).collect::<Vec<_>>().join("\n");
    serde_json::from_str(&body).unwrap()
}

#[tokio::test]
async fn test_cli_template_lifecycle() {
    console::set_colors_enabled(false);
    let target = Server::run();
    target.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/users/42/events"),
            request::body(json_decoded(httptest::matchers::eq(json!({"event": "user.created", "name": "Ada"})))),
        ])
        .respond_with(status_code(202).append_header("Content-Type", "application/json").body(r#"{"queued":true}"#)),
    );
    let api = spawn_service(Arc::new(TemplateRegistry::new())).await;

    let url = format!("http://{}/users/{{id}}/events", target.addr());
    let (code, printed) = run(
        &api,
        &[
            "templates",
            "create",
            "--name",
            "user created",
            "--url",
            &url,
            "-H",
            "Authorization: Bearer {token}",
            "--body",
            r#"{"event": "user.created", "name": "{name}"}"#,
        ],
        "",
    )
    .await;
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(printed.lines().next().unwrap().ends_with("201 Created"));
    let created = json_of(&printed);
    let id = created["id"].as_str().unwrap().to_string();

    let (code, printed) = run(&api, &["templates", "get", "user created"], "").await;
    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(json_of(&printed)["id"], id.as_str());

    let (code, printed) =
        run(&api, &["templates", "trigger", &id, "-v", "id=42", "-v", "token=xyz"], "").await;
    assert_eq!(code, ExitCode::FAILURE);
    assert_eq!(json_of(&printed)["detail"], "missing value for placeholder `name`");

    let (code, printed) = run(
        &api,
        &["templates", "trigger", "user created", "-v", "id=42", "-v", "token=xyz", "-v", "name=Ada"],
        "",
    )
    .await;
    assert_eq!(code, ExitCode::SUCCESS);
    let result = json_of(&printed);
    assert_eq!(result["webhook_status"], "success");
    assert_eq!(result["webhook_request"]["headers"]["Authorization"], "REDACTED");
    assert_eq!(result["webhook_response"]["status_code"], 202);
    assert_eq!(result["webhook_response"]["body"], json!({"queued": true}));

    let (code, printed) = run(&api, &["templates", "delete", "user created"], "n\n").await;
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(printed.ends_with("canceled\n"));

    let (code, _) = run(&api, &["templates", "delete", "user created"], "y\n").await;
    assert_eq!(code, ExitCode::SUCCESS);
    let (code, printed) = run(&api, &["templates", "list"], "").await;
    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(json_of(&printed), json!([]));
}

#[tokio::test]
async fn test_cli_adhoc() {
    console::set_colors_enabled(false);
    let target = Server::run();
    target.expect(
        Expectation::matching(request::method_path("PUT", "/hook"))
            .respond_with(json_encoded(json!({"ok": true}))),
    );
    let api = spawn_service(Arc::new(TemplateRegistry::new())).await;

    let url = target.url_str("/hook");
    let (code, printed) = run(&api, &["webhooks", "adhoc", "--url", &url, "--method", "put"], "").await;
    assert_eq!(code, ExitCode::SUCCESS);
    let result = json_of(&printed);
    assert_eq!(result["webhook_status"], "success");
    assert_eq!(result["webhook_request"]["method"], "PUT");
    assert_eq!(result["webhook_response"]["body"], json!({"ok": true}));
}

#[tokio::test]
async fn test_cli_unreachable_target() {
    console::set_colors_enabled(false);
    let api = spawn_service(Arc::new(TemplateRegistry::new())).await;

    // nothing listens on the discard port
    let (code, printed) = run(&api, &["webhooks", "adhoc", "--url", "http://127.0.0.1:9/"], "").await;
    assert_eq!(code, ExitCode::FAILURE);
    let error = json_of(&printed);
    assert_eq!(error["msg"], "webhook target is unavailable");
    assert_eq!(error["detail"]["error"]["kind"], "network");
}

#[tokio::test]
async fn test_cli_unresolved_template() {
    let api = spawn_service(Arc::new(TemplateRegistry::new())).await;
    let cmd = Cmd::try_parse_from(["hooktrigger", "--api-url", &api, "templates", "get", "nothing"]).unwrap();
    let err = cmd.run(&mut Vec::<u8>::new(), &mut "".as_bytes()).await.unwrap_err();
    assert!(err.to_string().contains("nothing"));
}

#[tokio::test]
async fn test_cli_resolve_names_that_are_not_path_segments() {
    console::set_colors_enabled(false);
    let names = ["..", "", "a/b", "?q=1", "00000000-0000-0000-0000-000000000000"];
    let registry = TemplateRegistry::from_iter(names.iter().map(|name| TemplateDraft {
        name: name.to_string(),
        method: "POST".to_string(),
        url_template: "https://api.test/hook".to_string(),
        headers_template: Default::default(),
        body_template: json!({}),
    }));
    let api = spawn_service(Arc::new(registry)).await;

    for name in names {
        let (code, printed) = run(&api, &["templates", "get", name], "").await;
        assert_eq!(code, ExitCode::SUCCESS, "{name:?}");
        assert_eq!(json_of(&printed)["name"], name, "{name:?}");
    }
}
