// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Outcome of one request as it moves through the pipeline

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Version};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

use super::headers;
use super::request::Request;
use super::transport::MediaPart;
use crate::error::{Error, Result, StatusKind};

/// Longest body excerpt kept in status errors
const ERROR_BODY_EXCERPT: usize = 512;

/// Accumulates status, headers, body and the first error of one request
///
/// Once an error is set it is terminal: later stages skip their work and a
/// second error never replaces the first.
#[derive(Debug)]
pub struct ReadResult {
    /// The request being executed
    pub request: Request,
    url: Url,
    status: Option<StatusCode>,
    status_line: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    redirected: bool,
    error: Option<Error>,
    parsed: Option<Value>,
    media: Option<MediaPart>,
    log: Vec<String>,
}

impl ReadResult {
    /// Start a result for a validated request
    pub fn new(request: Request, url: Url) -> Self {
        Self {
            request,
            url,
            status: None,
            status_line: String::new(),
            headers: Vec::new(),
            body: Bytes::new(),
            redirected: false,
            error: None,
            parsed: None,
            media: None,
            log: Vec::new(),
        }
    }

    /// Current target URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Point the result at a new location, relative to the current URL
    pub fn set_url(&mut self, location: &str) -> Result<()> {
        self.url = self.url.join(location)?;
        Ok(())
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status.map(|s| s.as_u16())
    }

    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    /// Record the response status and build its status line
    pub fn set_status(&mut self, status: StatusCode, version: Version) {
        self.status = Some(status);
        self.status_line = format!(
            "{:?} {} {}",
            version,
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string();
    }

    /// Response headers in arrival order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Append one header; duplicates are kept
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Replace the headers from a response header map
    pub fn set_headers(&mut self, headers: &HeaderMap) {
        self.headers = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
    }

    /// First header value, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Redirect target
    pub fn location(&self) -> Option<String> {
        self.header(headers::LOCATION)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: Bytes) {
        self.body = body;
    }

    /// Read a whole stream into the body; a read error becomes the result's error
    pub async fn read_stream<R>(mut self, what: &str, mut stream: R) -> Self
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut buf = Vec::new();
        match stream.read_to_end(&mut buf).await {
            Ok(read) => {
                tracing::debug!(what, bytes = read, "Stream read");
                self.body = Bytes::from(buf);
            }
            Err(e) => {
                self.append_to_log(format!("Failed reading {}: {}", what, e));
                self.set_error(e.into());
            }
        }
        self
    }

    /// Media to upload with this POST
    pub fn media(&self) -> Option<&MediaPart> {
        self.media.as_ref()
    }

    pub fn set_media(&mut self, media: MediaPart) {
        self.media = Some(media);
    }

    pub fn redirected(&self) -> bool {
        self.redirected
    }

    pub fn set_redirected(&mut self, redirected: bool) {
        self.redirected = redirected;
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Attach an error; the first one wins
    pub fn set_error(&mut self, error: Error) {
        if let Some(ref existing) = self.error {
            tracing::debug!(kept = %existing, ignored = %error, "Result already failed");
            return;
        }
        self.error = Some(error);
    }

    /// Whether the response asks us to go elsewhere
    pub fn is_moved(&self) -> bool {
        self.status
            .map(|s| StatusKind::from_status(s.as_u16()) == StatusKind::Moved)
            .unwrap_or(false)
    }

    /// Forget the previous response before re-issuing to a new URL
    pub(crate) fn reset_response(&mut self) {
        self.status = None;
        self.status_line.clear();
        self.headers.clear();
        self.body = Bytes::new();
    }

    /// Turn a non-success final status into an error
    pub(crate) fn check_status(&mut self) {
        if self.has_error() {
            return;
        }
        let Some(status) = self.status else {
            return;
        };
        if status.is_success() {
            return;
        }
        let code = status.as_u16();
        let kind = StatusKind::from_status(code);
        let error = if kind == StatusKind::Moved {
            Error::protocol(kind, self.url.as_str(), "Redirect was not followed")
        } else {
            let mut body = self.text_lossy();
            if body.len() > ERROR_BODY_EXCERPT {
                let mut end = ERROR_BODY_EXCERPT;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            Error::HttpStatus {
                status: code,
                kind,
                url: self.url.to_string(),
                status_line: self.status_line.clone(),
                headers: self.headers.clone(),
                body,
            }
        };
        self.set_error(error);
    }

    /// Append a line to this result's diagnostic log
    pub fn append_to_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Append `headers: {name: value, ...}` to a diagnostic message
    pub fn append_headers(&self, out: &mut String) {
        out.push_str("; headers: {");
        for (i, (name, value)) in self.headers.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
        }
        out.push('}');
    }

    /// Parse the body as JSON unless this is a file download
    ///
    /// Returns the result on success, or its terminal error.
    pub fn try_to_parse(mut self) -> Result<Self> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        if self.request.api_routine.is_file_download() || self.body.is_empty() {
            return Ok(self);
        }
        match serde_json::from_slice::<Value>(&self.body) {
            Ok(value) => {
                self.parsed = Some(value);
                Ok(self)
            }
            Err(e) => Err(Error::parse(self.url.as_str(), e)),
        }
    }

    /// Parsed body, if any
    pub fn parsed(&self) -> Option<&Value> {
        self.parsed.as_ref()
    }

    /// Parsed body as an object; an empty body yields an empty object
    pub fn json_object(&self) -> Result<Map<String, Value>> {
        match &self.parsed {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(Error::parse(
                self.url.as_str(),
                format!("expected JSON object, got {}", json_type(other)),
            )),
        }
    }

    /// Parsed body as an array
    ///
    /// Some servers wrap lists in an object; the first array-valued member
    /// is used in that case.
    pub fn json_array(&self) -> Result<Vec<Value>> {
        match &self.parsed {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(Value::Object(map)) => map
                .iter()
                .find_map(|(key, value)| match value {
                    Value::Array(items) => {
                        tracing::trace!(key = %key, "Found array inside object");
                        Some(items.clone())
                    }
                    _ => None,
                })
                .ok_or_else(|| Error::parse(self.url.as_str(), "no array in JSON object")),
            Some(other) => Err(Error::parse(
                self.url.as_str(),
                format!("expected JSON array, got {}", json_type(other)),
            )),
        }
    }

    /// Deserialize the body into `T`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::parse(self.url.as_str(), e))
    }

    /// Get body as text
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| Error::parse(self.url.as_str(), e))
    }

    /// Get body as text, lossy conversion
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ApiRoutine;

    fn result_with_body(body: &str) -> ReadResult {
        let url = Url::parse("https://example.social/api/v1/statuses").unwrap();
        let mut result = ReadResult::new(Request::get(url.as_str()), url);
        result.set_status(StatusCode::OK, Version::HTTP_11);
        result.set_body(Bytes::from(body.to_string()));
        result
    }

    #[test]
    fn test_status_line() {
        let result = result_with_body("");
        assert_eq!(result.status_line(), "HTTP/1.1 200 OK");
        assert_eq!(result.status_code(), Some(200));
    }

    #[test]
    fn test_first_error_wins() {
        let mut result = result_with_body("");
        result.set_error(Error::transport("https://example.social", "connection reset"));
        result.set_error(Error::other("later"));

        assert!(matches!(result.error(), Some(Error::Transport { .. })));
    }

    #[test]
    fn test_headers_keep_order_and_duplicates() {
        let mut result = result_with_body("");
        result.add_header("Set-Cookie", "a=1");
        result.add_header("Location", " https://example.social/new ");
        result.add_header("set-cookie", "b=2");

        assert_eq!(result.headers().len(), 3);
        assert_eq!(result.header("SET-COOKIE"), Some("a=1"));
        assert_eq!(result.location().as_deref(), Some("https://example.social/new"));

        let mut out = String::from("Following redirect");
        result.append_headers(&mut out);
        assert!(out.ends_with("set-cookie: b=2}"));
    }

    #[test]
    fn test_set_url_relative() {
        let mut result = result_with_body("");
        result.set_url("/api/v2/statuses").unwrap();
        assert_eq!(result.url().as_str(), "https://example.social/api/v2/statuses");
    }

    #[test]
    fn test_parse_object() {
        let result = result_with_body(r#"{"id":"42"}"#).try_to_parse().unwrap();
        let object = result.json_object().unwrap();
        assert_eq!(object.get("id").and_then(Value::as_str), Some("42"));
    }

    #[test]
    fn test_parse_array_inside_object() {
        let result = result_with_body(r#"{"meta":1,"items":[{"id":1},{"id":2}]}"#)
            .try_to_parse()
            .unwrap();
        assert_eq!(result.json_array().unwrap().len(), 2);
        assert!(result_with_body("[]")
            .try_to_parse()
            .unwrap()
            .json_array()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_failure_is_typed() {
        let err = result_with_body("<html>oops</html>").try_to_parse().unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_file_download_is_not_parsed() {
        let mut result = result_with_body("\u{89}PNG");
        result.request = result.request.clone().api_routine(ApiRoutine::DownloadFile);
        let result = result.try_to_parse().unwrap();
        assert!(result.parsed().is_none());
        assert_eq!(result.body().len(), 5);
    }

    #[test]
    fn test_check_status_maps_errors() {
        let mut result = result_with_body("not here");
        result.set_status(StatusCode::NOT_FOUND, Version::HTTP_11);
        result.check_status();

        let err = result.try_to_parse().unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.status_kind(), Some(StatusKind::NotFound));
        if let Error::HttpStatus { body, status_line, .. } = err {
            assert_eq!(body, "not here");
            assert_eq!(status_line, "HTTP/1.1 404 Not Found");
        } else {
            panic!("Expected HttpStatus");
        }
    }

    #[test]
    fn test_typed_json() {
        #[derive(serde::Deserialize)]
        struct Status {
            id: String,
        }
        let result = result_with_body(r#"{"id":"7","content":"hi"}"#);
        let status: Status = result.json().unwrap();
        assert_eq!(status.id, "7");
    }

    #[tokio::test]
    async fn test_read_stream() {
        let result = result_with_body("");
        let result = result.read_stream("test", &b"local bytes"[..]).await;
        assert_eq!(result.text().unwrap(), "local bytes");
        assert!(!result.has_error());
    }
}
