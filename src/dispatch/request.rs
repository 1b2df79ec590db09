use std::collections::BTreeMap;

use bytes::Bytes;
use http::{
    header::{HeaderName, HeaderValue, CONTENT_TYPE},
    Method, Uri,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DispatchError;

pub fn default_method() -> String {
    Method::POST.to_string()
}
pub fn default_body() -> Value {
    Value::Object(Default::default())
}

/// A fully resolved request, free of placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookRequest {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_body")]
    pub body: Value,
}

impl WebhookRequest {
    pub fn new<M: ToString, U: ToString>(method: M, url: U) -> Self {
        Self { method: method.to_string(), url: url.to_string(), headers: BTreeMap::new(), body: default_body() }
    }
    pub fn header<K: ToString, V: ToString>(mut self, name: K, value: V) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
    pub fn body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn parse_method(&self) -> Result<Method, DispatchError> {
        Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| DispatchError::malformed(format!("invalid method `{}`: {}", self.method, e)))
    }

    pub fn parse_url(&self) -> Result<Uri, DispatchError> {
        let uri: Uri = self.url.parse().map_err(|e| DispatchError::network(format!("invalid url `{}`: {}", self.url, e)))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            Err(DispatchError::network(format!("url `{}` is not absolute", self.url)))
        } else {
            Ok(uri)
        }
    }

    /// Builds the request actually sent over the wire, headers unredacted.
    ///
    /// Every `malformed` check runs before the url is parsed, so a `network` error means only the target is unusable.
    pub fn to_http(&self) -> Result<http::Request<Bytes>, DispatchError> {
        let method = self.parse_method()?;
        let body = match &self.body {
            Value::Null => Bytes::new(),
            json => Bytes::from(
                serde_json::to_vec(json).map_err(|e| DispatchError::malformed(format!("unserializable body: {}", e)))?,
            ),
        };

        let mut request = http::Request::new(body);
        *request.method_mut() = method;
        let headers = request.headers_mut();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DispatchError::malformed(format!("invalid header name `{}`: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| DispatchError::malformed(format!("invalid value of header `{}`: {}", name, e)))?;
            headers.append(name, value);
        }
        if !self.body.is_null() && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        *request.uri_mut() = self.parse_url()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dispatch::ErrorKind;

    #[test]
    fn test_to_http() {
        let request = WebhookRequest::new("post", "https://api.test/users?notify=1")
            .header("X-Event", "user.created")
            .body(json!({"name": "Ada"}));
        let http = request.to_http().unwrap();
        assert_eq!(http.method(), Method::POST);
        assert_eq!(http.uri(), "https://api.test/users?notify=1");
        assert_eq!(http.headers()["x-event"], "user.created");
        assert_eq!(http.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(&http.body()[..], br#"{"name":"Ada"}"#);
    }

    #[test]
    fn test_to_http_keeps_caller_content_type() {
        let request = WebhookRequest::new("PUT", "http://localhost:3000/").header("Content-Type", "application/vnd+json");
        let http = request.to_http().unwrap();
        assert_eq!(http.headers().get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(http.headers()[CONTENT_TYPE], "application/vnd+json");
        assert_eq!(&http.body()[..], b"{}");
    }

    #[test]
    fn test_to_http_null_body() {
        let http = WebhookRequest::new("GET", "http://localhost:3000/").body(Value::Null).to_http().unwrap();
        assert!(http.body().is_empty());
        assert!(!http.headers().contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_to_http_malformed() {
        let err = WebhookRequest::new("GE T", "http://localhost:3000/").to_http().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);

        let err = WebhookRequest::new("GET", "http://localhost:3000/").header("bad header", "v").to_http().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);

        let err = WebhookRequest::new("GET", "http://localhost:3000/").header("X-Bad", "line\nbreak").to_http().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);
    }

    #[test]
    fn test_to_http_invalid_url_is_network_error() {
        for url in ["not a url", "/relative/path", ""] {
            let err = WebhookRequest::new("GET", url).to_http().unwrap_err();
            assert_eq!(err.kind, ErrorKind::Network, "{url}");
        }

        let err = WebhookRequest::new("GET", "not a url").header("bad header", "v").to_http().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);
    }
}
