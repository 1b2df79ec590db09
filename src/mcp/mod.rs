//! Model Context Protocol bridge, exposing the ad-hoc and templated triggers as tools.
//!
//! The same [`McpServer`] answers newline delimited JSON-RPC on stdio ([`serve_stdio`]) and, with the `server`
//! feature, single requests posted to `/mcp` of the http front end.

pub mod protocol;
pub mod server;
pub mod tools;

use std::sync::Arc;

use tokio::io::BufReader;

pub use self::server::McpServer;
use crate::{config::Config, dispatch::client::DefaultHttpClient, error::HookResult, trigger::Trigger};

/// Serves MCP on stdin and stdout until stdin is closed. Logs go to stderr.
pub async fn serve_stdio(config: Config) -> HookResult<()> {
    let _ = tracing_subscriber::fmt().with_writer(std::io::stderr).try_init();
    let (registry, dispatcher) = (config.registry(), config.dispatcher(DefaultHttpClient::new()?));
    tracing::info!(templates = registry.len(), timeout = ?dispatcher.timeout(), "serve mcp on stdio");
    let server = McpServer::new(Arc::new(Trigger::new(registry, dispatcher)));
    server.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}
