use std::collections::BTreeMap;

use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use mime::Mime;
use serde::Serialize;
use serde_json::Value;

/// Downstream response, normalized for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookResponse {
    #[serde(with = "http_serde::status_code")]
    pub status_code: StatusCode,
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Undecodable { byte_length: usize },
}

impl From<http::Response<Bytes>> for WebhookResponse {
    fn from(response: http::Response<Bytes>) -> Self {
        let (parts, bytes) = response.into_parts();
        let body = ResponseBody::decode(&parts.headers, bytes);
        Self { status_code: parts.status, headers: flatten_headers(&parts.headers), body }
    }
}

/// Multiple values of one header are joined with `, `.
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flatten = BTreeMap::<String, String>::new();
    for (name, value) in headers {
        let v = String::from_utf8_lossy(value.as_bytes());
        flatten
            .entry(name.to_string())
            .and_modify(|joined| {
                joined.push_str(", ");
                joined.push_str(&v);
            })
            .or_insert_with(|| v.to_string());
    }
    flatten
}

impl ResponseBody {
    pub fn decode(headers: &HeaderMap, bytes: Bytes) -> Self {
        if Self::is_json(headers) {
            if let Ok(json) = serde_json::from_slice(&bytes) {
                return Self::Json(json);
            }
        }
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Self::Text(text),
            Err(_) => Self::Undecodable { byte_length: bytes.len() },
        }
    }

    pub fn is_json(headers: &HeaderMap) -> bool {
        headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Mime>().ok())
            .map(|m| {
                (m.type_() == mime::APPLICATION && m.subtype() == mime::JSON) || m.suffix() == Some(mime::JSON)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(content_type: Option<&str>, body: &'static [u8]) -> http::Response<Bytes> {
        let mut builder = http::Response::builder().status(StatusCode::OK);
        if let Some(t) = content_type {
            builder = builder.header(CONTENT_TYPE, t);
        }
        builder.body(Bytes::from_static(body)).unwrap()
    }

    #[test]
    fn test_json_body() {
        let normalized = WebhookResponse::from(response(Some("application/json; charset=utf-8"), br#"{"ok":true}"#));
        assert_eq!(normalized.status_code, StatusCode::OK);
        assert_eq!(normalized.body, ResponseBody::Json(json!({"ok": true})));
        assert_eq!(normalized.headers["content-type"], "application/json; charset=utf-8");

        let problem = WebhookResponse::from(response(Some("application/problem+json"), br#"{"title":"x"}"#));
        assert_eq!(problem.body, ResponseBody::Json(json!({"title": "x"})));
    }

    #[test]
    fn test_text_body() {
        let plain = WebhookResponse::from(response(Some("text/plain"), b"hello world"));
        assert_eq!(plain.body, ResponseBody::Text("hello world".to_string()));

        let unlabeled = WebhookResponse::from(response(None, br#"{"ok":true}"#));
        assert_eq!(unlabeled.body, ResponseBody::Text(r#"{"ok":true}"#.to_string()));

        let broken = WebhookResponse::from(response(Some("application/json"), b"not json"));
        assert_eq!(broken.body, ResponseBody::Text("not json".to_string()));

        let empty = WebhookResponse::from(response(Some("application/json"), b""));
        assert_eq!(empty.body, ResponseBody::Text(String::new()));
    }

    #[test]
    fn test_undecodable_body() {
        let binary = WebhookResponse::from(response(Some("application/octet-stream"), &[0xff, 0xfe, 0x00]));
        assert_eq!(binary.body, ResponseBody::Undecodable { byte_length: 3 });
    }

    #[test]
    fn test_flatten_headers() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", "a=1".parse().unwrap());
        headers.append("set-cookie", "b=2".parse().unwrap());
        headers.append("x-single", "v".parse().unwrap());
        let flatten = flatten_headers(&headers);
        assert_eq!(flatten["set-cookie"], "a=1, b=2");
        assert_eq!(flatten["x-single"], "v");
    }

    #[test]
    fn test_serialize() {
        let normalized = WebhookResponse::from(response(Some("application/json"), br#"{"ok":true}"#));
        assert_json_diff::assert_json_eq!(
            serde_json::to_value(&normalized).unwrap(),
            json!({"status_code": 200, "headers": {"content-type": "application/json"}, "body": {"ok": true}})
        );
    }
}
