use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    dispatch::{request::WebhookRequest, DispatchResult, Dispatcher, Transport},
    error::{TemplateError, TriggerError},
    registry::{TemplateDraft, TemplateRegistry},
    template::Values,
};

pub fn default_wait_for_response() -> bool {
    true
}

/// Payload of an ad-hoc trigger, the request itself plus the wait mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdhocTrigger {
    #[serde(flatten)]
    pub request: WebhookRequest,
    #[serde(default = "default_wait_for_response")]
    pub wait_for_response: bool,
}

/// Payload of a templated trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateTrigger {
    pub template_id: String,
    #[serde(default)]
    pub values: Values,
    #[serde(default = "default_wait_for_response")]
    pub wait_for_response: bool,
}

/// Entry point of both trigger operations, holding the shared registry and the dispatcher.
#[derive(Debug, Clone)]
pub struct Trigger<S> {
    registry: Arc<TemplateRegistry>,
    dispatcher: Dispatcher<S>,
}

impl<S> Trigger<S> {
    pub fn new(registry: Arc<TemplateRegistry>, dispatcher: Dispatcher<S>) -> Self {
        Self { registry, dispatcher }
    }
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }
    pub fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }
}

impl<S: Transport> Trigger<S> {
    pub async fn trigger_adhoc(&self, request: WebhookRequest, wait_for_response: bool) -> DispatchResult {
        self.dispatcher.dispatch(request, wait_for_response).await
    }

    /// Nothing is sent when the template is unknown or a placeholder has no value.
    pub async fn trigger_templated(
        &self,
        template_id: &str,
        values: &Values,
        wait_for_response: bool,
    ) -> Result<DispatchResult, TriggerError> {
        let template = self.registry.get(template_id)?;
        let request = render_request(&template, values).inspect_err(|e| {
            tracing::info!(id = template_id, name = %template.name, error = %e, "cannot render template");
        })?;
        Ok(self.dispatcher.dispatch(request, wait_for_response).await)
    }
}

/// Fills `values` into the url, headers and body of the template. The method is taken verbatim.
pub fn render_request(template: &TemplateDraft, values: &Values) -> Result<WebhookRequest, TemplateError> {
    let url = values.render(&template.url_template)?;
    let headers = template
        .headers_template
        .iter()
        .map(|(name, value)| Ok::<_, TemplateError>((name.clone(), values.render(value)?)))
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    let body = values.substitute(&template.body_template)?;
    Ok(WebhookRequest { method: template.method.clone(), url, headers, body })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::template::placeholders;

    fn draft() -> TemplateDraft {
        TemplateDraft {
            name: "user created".to_string(),
            method: "post".to_string(),
            url_template: "https://api.test/users/{id}?source={source}".to_string(),
            headers_template: [
                ("Authorization".to_string(), "Bearer {token}".to_string()),
                ("X-Event".to_string(), "user.created".to_string()),
            ]
            .into_iter()
            .collect(),
            body_template: json!({"user": {"id": "{id}", "tags": ["{source}", "static"]}, "count": 1}),
        }
    }

    #[test]
    fn test_render_request() {
        let values = Values::from_iter([("id", "42"), ("source", "web"), ("token", "xyz"), ("unused", "ignored")]);
        let request = render_request(&draft(), &values).unwrap();
        assert_eq!(request.method, "post");
        assert_eq!(request.url, "https://api.test/users/42?source=web");
        assert_eq!(request.headers["Authorization"], "Bearer xyz");
        assert_eq!(request.headers["X-Event"], "user.created");
        assert_eq!(request.body, json!({"user": {"id": "42", "tags": ["web", "static"]}, "count": 1}));

        let rendered = serde_json::to_value(&request).unwrap();
        assert!(placeholders(&rendered).is_empty());
    }

    #[test]
    fn test_render_request_method_is_not_substituted() {
        let template = TemplateDraft { method: "{verb}".to_string(), ..draft() };
        let values = Values::from_iter([("id", "42"), ("source", "web"), ("token", "xyz"), ("verb", "GET")]);
        assert_eq!(render_request(&template, &values).unwrap().method, "{verb}");
    }

    #[test]
    fn test_render_request_missing_placeholder() {
        for (missing, values) in [
            ("id", Values::from_iter([("source", "web"), ("token", "xyz")])),
            ("token", Values::from_iter([("id", "42"), ("source", "web")])),
        ] {
            let err = render_request(&draft(), &values).unwrap_err();
            assert_eq!(err, TemplateError::MissingPlaceholder(missing.to_string()));
        }
    }

    #[test]
    fn test_rendering_twice_is_stable() {
        let values = Values::from_iter([("id", "42"), ("source", "web"), ("token", "xyz")]);
        let once = render_request(&draft(), &values).unwrap();
        let as_template = TemplateDraft {
            name: String::new(),
            method: once.method.clone(),
            url_template: once.url.clone(),
            headers_template: once.headers.clone(),
            body_template: once.body.clone(),
        };
        assert_eq!(render_request(&as_template, &values).unwrap(), once);
    }
}
