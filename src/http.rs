//! Runtime HTTP helper shared by every block.
//!
//! Issues exactly one authenticated request and turns the response into a
//! JSON value. No retries, no pagination.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::RequestError;

/// Method and optional JSON body of a single request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, body: None }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Parse an upper- or lower-case method name into a supported `Method`.
pub fn parse_method(method: &str) -> Result<Method, RequestError> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        _ => Err(RequestError::UnsupportedMethod {
            method: method.to_string(),
        }),
    }
}

/// Whether requests with this method carry a JSON body.
pub fn is_mutating(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Send `{base_url}{endpoint}` with the API key as the raw `Authorization` header.
///
/// Returns `{"success": true}` for 204, parsed JSON for JSON responses and a
/// JSON string for anything else. Status codes >= 400 become
/// [`RequestError::Http`] carrying the raw response text.
pub fn request(
    client: &Client,
    api_key: &str,
    base_url: &str,
    endpoint: &str,
    options: RequestOptions,
) -> Result<Value, RequestError> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), endpoint);
    debug!(method = %options.method, %url, "sending request");

    let mut req = client
        .request(options.method.clone(), &url)
        .header(AUTHORIZATION, api_key)
        .header(CONTENT_TYPE, "application/json");

    if is_mutating(&options.method) {
        if let Some(body) = &options.body {
            req = req.json(body);
        }
    }

    send_request(req)
}

fn send_request(req: RequestBuilder) -> Result<Value, RequestError> {
    let resp = req.send().map_err(RequestError::RequestFailed)?;
    let status = resp.status();
    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_json_content_type);
    let text = resp.text().map_err(RequestError::ResponseRead)?;

    if status.as_u16() >= 400 {
        return Err(RequestError::Http { status, body: text });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(json!({ "success": true }));
    }

    if is_json {
        return serde_json::from_str(&text).map_err(RequestError::InvalidJson);
    }

    Ok(Value::String(text))
}

fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}
