//! HTTP transport types shared by the request builders and the transports.
//!
//! # Design
//! Requests and responses are plain data. `AeiClient` builds `HttpRequest`
//! values without touching the network; a `Transport` executes them and
//! hands back an `HttpResponse`. Keeping the two halves apart makes every
//! wire detail (URL, headers, body) assertable in unit tests.
//!
//! All fields use owned types so values can be moved across threads freely.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::types::StatusBody;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute, including any query string. Header names are stored
/// exactly as they go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value whose name matches `name` case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// Returned uninterpreted by the facade; callers decide whether to check
/// the status and which DTO to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Decode the body into `T`. Missing or mistyped keys surface as
    /// `MalformedResponse`; when the body is a failure envelope its code,
    /// error and help are kept in the message.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| {
            let message = e.to_string();
            let message = match serde_json::from_str::<StatusBody>(&self.body) {
                Ok(envelope) => envelope.status.annotate(message),
                Err(_) => message,
            };
            ApiError::MalformedResponse(message)
        })
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "https://aei.ai/api/v1/users".to_string(),
            headers: vec![("Authorization".to_string(), "Bearer t".to_string())],
            body: None,
        };
        assert_eq!(req.header("authorization"), Some("Bearer t"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn json_decode_failure_is_malformed_response() {
        let resp = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "<html>".to_string(),
        };
        let err = resp.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn failure_envelope_keeps_service_diagnostics() {
        let resp = HttpResponse {
            status: 401,
            headers: Vec::new(),
            body: r#"{"status":{"code":401,"error":"invalid access token","help":"log in again"}}"#
                .to_string(),
        };
        let err = resp.json::<crate::types::UserEnvelope>().unwrap_err();
        let ApiError::MalformedResponse(message) = &err else {
            panic!("expected MalformedResponse, got {err:?}");
        };
        assert!(message.contains("missing field `user`"), "{message}");
        assert!(message.contains("401: invalid access token"), "{message}");
        assert!(message.contains("help: log in again"), "{message}");
    }

    #[test]
    fn successful_envelope_with_missing_key_has_plain_message() {
        let resp = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"status":{"code":200}}"#.to_string(),
        };
        let err = resp.json::<crate::types::UserEnvelope>().unwrap_err();
        let ApiError::MalformedResponse(message) = &err else {
            panic!("expected MalformedResponse, got {err:?}");
        };
        assert!(!message.contains("service returned"), "{message}");
    }
}
