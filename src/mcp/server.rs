use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::{
    protocol::{
        InitializeResult, RpcError, RpcRequest, RpcResponse, ToolCall, ToolsList, INTERNAL_ERROR, INVALID_PARAMS,
        INVALID_REQUEST, JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
    },
    tools,
};
use crate::{dispatch::Transport, error::HookResult, trigger::Trigger};

/// Answers MCP requests with the trigger tools, sharing the registry of whoever built the [`Trigger`].
#[derive(Debug)]
pub struct McpServer<S> {
    trigger: Arc<Trigger<S>>,
}
impl<S> Clone for McpServer<S> {
    fn clone(&self) -> Self {
        Self { trigger: self.trigger.clone() }
    }
}
impl<S> McpServer<S> {
    pub fn new(trigger: Arc<Trigger<S>>) -> Self {
        Self { trigger }
    }
}

impl<S: Transport> McpServer<S> {
    /// Serves newline delimited messages until `input` ends.
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> HookResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle(&line).await {
                let mut bytes = serde_json::to_vec(&response)?;
                bytes.push(b'\n');
                output.write_all(&bytes).await?;
                output.flush().await?;
            }
        }
        tracing::info!("mcp input closed");
        Ok(())
    }

    /// Answers one raw message, `None` for notifications.
    pub async fn handle(&self, message: &str) -> Option<RpcResponse> {
        match serde_json::from_str(message) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => Some(RpcResponse::error(Value::Null, RpcError::new(PARSE_ERROR, e.to_string()))),
        }
    }

    pub async fn handle_value(&self, message: Value) -> Option<RpcResponse> {
        let request: RpcRequest = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => return Some(RpcResponse::error(Value::Null, RpcError::new(INVALID_REQUEST, e.to_string()))),
        };
        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "mcp notification");
            return None;
        };
        if request.jsonrpc != JSONRPC_VERSION {
            let message = format!("unsupported jsonrpc version `{}`", request.jsonrpc);
            return Some(RpcResponse::error(id, RpcError::new(INVALID_REQUEST, message)));
        }

        tracing::debug!(method = %request.method, %id, "mcp request");
        match self.respond(request).await {
            Ok(result) => Some(RpcResponse::result(id, result)),
            Err(error) => {
                tracing::info!(%id, %error, "mcp request failed");
                Some(RpcResponse::error(id, error))
            }
        }
    }

    async fn respond(&self, request: RpcRequest) -> Result<Value, RpcError> {
        match request.method.as_str() {
            "initialize" => to_result(InitializeResult::new(request.params["protocolVersion"].as_str())),
            "ping" => Ok(json!({})),
            "tools/list" => to_result(ToolsList { tools: tools::tools() }),
            "tools/call" => {
                let call: ToolCall =
                    serde_json::from_value(request.params).map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string()))?;
                tracing::info!(tool = %call.name, "call tool");
                let output = tools::call(&self.trigger, call).await?;
                to_result(output.into_result().map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))?)
            }
            method => Err(RpcError::new(METHOD_NOT_FOUND, format!("unknown method `{}`", method))),
        }
    }
}

fn to_result<T: Serialize>(result: T) -> Result<Value, RpcError> {
    serde_json::to_value(result).map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))
}
