//! Templated webhook registry and dispatcher
//!
//! Register reusable HTTP request templates with `{placeholder}` slots, then fire concrete webhooks by
//! supplying values, or fire one-off webhooks without any template.
//!
//! # Binary Usage
//! ## Install
//! ```sh
//! cargo install --git https://github.com/hayas1/hooktrigger hooktrigger
//! ```
//!
//! ## Run Service
//! ```sh
//! hooktrigger serve --config config.yaml
//! ```
//! ```yaml
//! bind: 127.0.0.1:8000
//! timeout: 10
//! templates:
//!   - name: user created
//!     method: POST
//!     url_template: https://api.example.com/users/{user_id}/events
//!     headers_template:
//!       Authorization: Bearer {token}
//!     body_template:
//!       event: user.created
//!       message: "{message}"
//! ```
//!
//! ## Run CLI
//! ```sh
//! hooktrigger templates trigger "user created" -v user_id=123 -v token=xyz -v message=Hello
//! ```
//! ```sh
//! ✅ 200 OK success
//! {
//!   "webhook_status": "success",
//!   "webhook_request": {
//!     "method": "POST",
//!     "url": "https://api.example.com/users/123/events",
//!     "headers": {
//!       "Authorization": "REDACTED"
//!     },
//!     ...
//! ```
//! - Sensitive headers are masked only in the echoed request, the target receives the real value.
//! - With `--async` the service answers `accepted` at once and sends the webhook in background.
//!
//! ## Run as MCP tools
//! ```sh
//! hooktrigger mcp --config config.yaml
//! ```
//! `trigger_adhoc_webhook_mcp` and `trigger_templated_webhook_mcp` are served on stdio. A running service also
//! answers the same tools at `POST /mcp`.
//!
//! # Library Usage
//! ```no_run
//! use std::sync::Arc;
//!
//! use hooktrigger::{
//!     dispatch::{client::DefaultHttpClient, Dispatcher},
//!     registry::{TemplateDraft, TemplateRegistry},
//!     template::Values,
//!     trigger::Trigger,
//! };
//!
//! # async fn run() -> hooktrigger::Result<()> {
//! let registry = Arc::new(TemplateRegistry::new());
//! let template = registry.create(TemplateDraft {
//!     name: "ping".to_string(),
//!     method: "GET".to_string(),
//!     url_template: "https://api.example.com/{id}".to_string(),
//!     headers_template: Default::default(),
//!     body_template: serde_json::Value::Null,
//! });
//! let trigger = Trigger::new(registry, Dispatcher::new(DefaultHttpClient::new()?));
//! let result = trigger.trigger_templated(&template.id, &Values::from_iter([("id", "42")]), true).await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "cli")]
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod registry;
#[cfg(feature = "server")]
pub mod server;
pub mod template;
pub mod trigger;

pub use {error::HookError as Error, error::HookResult as Result};
