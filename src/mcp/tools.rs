use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use super::protocol::{Content, RpcError, Tool, ToolCall, ToolResult, INVALID_PARAMS};
use crate::{
    dispatch::{DispatchResult, Transport},
    error::TriggerError,
    trigger::{AdhocTrigger, TemplateTrigger, Trigger},
};

pub const ADHOC_TOOL: &str = "trigger_adhoc_webhook_mcp";
pub const TEMPLATED_TOOL: &str = "trigger_templated_webhook_mcp";

pub fn tools() -> Vec<Tool> {
    vec![
        Tool {
            name: ADHOC_TOOL.to_string(),
            description: "Trigger an ad-hoc webhook.\nMirrors the /webhooks/trigger/adhoc endpoint.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "method": {"type": "string", "default": "POST"},
                    "url": {"type": "string", "description": "absolute url of the target"},
                    "headers": {"type": "object", "additionalProperties": {"type": "string"}, "default": {}},
                    "body": {"description": "sent as json", "default": {}},
                    "wait_for_response": {"type": "boolean", "default": true},
                },
                "required": ["url"],
            }),
        },
        Tool {
            name: TEMPLATED_TOOL.to_string(),
            description: "Trigger a templated webhook.\nMirrors the /webhooks/trigger/template endpoint.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "template_id": {"type": "string"},
                    "values": {"type": "object", "description": "value of each placeholder", "default": {}},
                    "wait_for_response": {"type": "boolean", "default": true},
                },
                "required": ["template_id"],
            }),
        },
    ]
}

/// `{"error": {"status_code": ..., "detail": ...}}` returned by a tool instead of a dispatch result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub status_code: u16,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Dispatched(DispatchResult),
    Failed { error: ToolFailure },
}
impl ToolOutput {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn into_result(self) -> Result<ToolResult, serde_json::Error> {
        let structured_content = serde_json::to_value(&self)?;
        let text = serde_json::to_string_pretty(&structured_content)?;
        Ok(ToolResult { content: vec![Content::Text { text }], structured_content, is_error: self.is_error() })
    }
}
impl From<DispatchResult> for ToolOutput {
    fn from(result: DispatchResult) -> Self {
        if let DispatchResult::Error { error, webhook_request } = &result {
            let detail = format!("sending the webhook to `{}` failed: {}", webhook_request.url, error);
            return Self::Failed { error: ToolFailure { status_code: error.kind.status_code().as_u16(), detail } };
        }
        Self::Dispatched(result)
    }
}
impl From<TriggerError> for ToolOutput {
    fn from(e: TriggerError) -> Self {
        Self::Failed { error: ToolFailure { status_code: e.status_code().as_u16(), detail: e.to_string() } }
    }
}

/// Runs one tool. Trigger failures are tool output, only an unknown tool or bad arguments are rpc errors.
pub async fn call<S: Transport>(trigger: &Trigger<S>, tool: ToolCall) -> Result<ToolOutput, RpcError> {
    match tool.name.as_str() {
        ADHOC_TOOL => {
            let AdhocTrigger { request, wait_for_response } = arguments(tool.arguments)?;
            Ok(trigger.trigger_adhoc(request, wait_for_response).await.into())
        }
        TEMPLATED_TOOL => {
            let TemplateTrigger { template_id, values, wait_for_response } = arguments(tool.arguments)?;
            match trigger.trigger_templated(&template_id, &values, wait_for_response).await {
                Ok(result) => Ok(result.into()),
                Err(e) => Ok(e.into()),
            }
        }
        name => Err(RpcError::new(INVALID_PARAMS, format!("unknown tool `{}`", name))),
    }
}

fn arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, RpcError> {
    serde_json::from_value(arguments).map_err(|e| RpcError::new(INVALID_PARAMS, format!("invalid arguments: {}", e)))
}
