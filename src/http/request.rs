// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Abstract request description

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::connection::ConnectionConfig;
use crate::error::{Error, Result};

/// Semantic purpose of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiRoutine {
    #[default]
    Unknown,
    AccountVerifyCredentials,
    RegisterClient,
    OAuthAccessToken,
    HomeTimeline,
    PublicTimeline,
    GetNote,
    UpdateNote,
    UpdateNoteWithMedia,
    GetActor,
    Follow,
    /// Fetch a file (avatar, attachment); may be served from local storage
    DownloadFile,
}

impl ApiRoutine {
    pub fn is_file_download(&self) -> bool {
        matches!(self, ApiRoutine::DownloadFile)
    }
}

/// How POST parameters are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyFormat {
    /// application/x-www-form-urlencoded
    #[default]
    Form,
    /// application/json
    Json,
}

/// One outbound call
///
/// Builder methods consume and return the request; deriving a variant
/// for a specific connection or protocol yields a new value.
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Absolute URL or origin-relative path, as given by the caller
    pub uri: String,
    /// URL resolved against the connection origin
    pub url: Option<Url>,
    /// Media to upload with a POST
    pub media_uri: Option<Url>,
    /// Multipart field name of the media part
    pub media_part_name: String,
    /// POST parameters
    pub post_params: Option<Map<String, Value>>,
    /// POST body encoding
    pub body_format: BodyFormat,
    /// Semantic purpose
    pub api_routine: ApiRoutine,
    /// Name used in diagnostics
    pub log_name: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Request timeout
    pub timeout: Option<Duration>,
    /// Use the legacy HTTP protocol variant for this attempt
    pub legacy_protocol: bool,
}

impl Request {
    /// Create a new request with arbitrary method
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            url: None,
            media_uri: None,
            media_part_name: "media".to_string(),
            post_params: None,
            body_format: BodyFormat::default(),
            api_routine: ApiRoutine::default(),
            log_name: String::new(),
            headers: HeaderMap::new(),
            timeout: None,
            legacy_protocol: false,
        }
    }

    /// Create a new GET request
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Create a new POST request
    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Set the API routine
    pub fn api_routine(mut self, routine: ApiRoutine) -> Self {
        self.api_routine = routine;
        self
    }

    /// Set the diagnostic name
    pub fn log_name(mut self, name: impl Into<String>) -> Self {
        self.log_name = name.into();
        self
    }

    /// Attach media to upload
    pub fn media(mut self, media_uri: Url) -> Self {
        self.media_uri = Some(media_uri);
        self
    }

    /// Set the multipart field name of the media part
    pub fn media_part_name(mut self, name: impl Into<String>) -> Self {
        self.media_part_name = name.into();
        self
    }

    /// Replace the POST parameters
    pub fn post_params(mut self, params: Map<String, Value>) -> Self {
        self.post_params = Some(params);
        self
    }

    /// Add one POST parameter, replacing an existing key
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.post_params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Send POST parameters as a JSON body
    pub fn json_body(mut self) -> Self {
        self.body_format = BodyFormat::Json;
        self
    }

    /// Set a header; invalid names or values are skipped with a warning
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(
                log_name = %self.display_name(),
                header = name.as_ref(),
                "Invalid header skipped"
            ),
        }
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Same request, resolved against the connection's origin
    pub fn with_connection_config(&self, config: &ConnectionConfig) -> Self {
        let mut request = self.clone();
        request.url = config.path_to_url(&self.uri).ok();
        request
    }

    /// Same request, using the given protocol variant
    pub fn with_legacy_protocol(&self, legacy: bool) -> Self {
        let mut request = self.clone();
        request.legacy_protocol = legacy;
        request
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    /// Name for diagnostics, falling back to the routine
    pub fn display_name(&self) -> String {
        if self.log_name.is_empty() {
            format!("{:?}", self.api_routine)
        } else {
            self.log_name.clone()
        }
    }

    /// Reject malformed requests, returning the URL to fetch
    pub fn validate(&self) -> Result<Url> {
        let name = self.display_name();
        if self.uri.trim().is_empty() {
            return Err(Error::validation(name, "URI is empty"));
        }
        let url = self.url.clone().ok_or_else(|| {
            Error::validation(&name, format!("cannot resolve URI '{}'", self.uri))
        })?;
        if self.media_uri.is_some() && !self.is_post() {
            return Err(Error::validation(
                name,
                format!("media can only be sent with POST, not {}", self.method),
            ));
        }
        if !self.api_routine.is_file_download() && !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation(
                name,
                format!("unsupported scheme '{}' for {:?}", url.scheme(), self.api_routine),
            ));
        }
        Ok(url)
    }

    /// POST parameters as form pairs; empty values are skipped
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        self.post_params
            .iter()
            .flat_map(|params| params.iter())
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if value.is_empty() {
                    None
                } else {
                    Some((key.clone(), value))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::SslMode;

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("https://example.social", SslMode::Secure).unwrap()
    }

    #[test]
    fn test_request_creation() {
        let req = Request::get("api/v1/timelines/home").log_name("home");
        assert_eq!(req.method, Method::GET);
        assert!(req.url.is_none());
        assert_eq!(req.display_name(), "home");
    }

    #[test]
    fn test_with_connection_config_resolves() {
        let req = Request::get("api/v1/timelines/home");
        let bound = req.with_connection_config(&config());

        assert!(req.url.is_none());
        assert_eq!(
            bound.url.as_ref().map(Url::as_str),
            Some("https://example.social/api/v1/timelines/home")
        );
    }

    #[test]
    fn test_with_legacy_protocol_derives_new_value() {
        let req = Request::post("api/v1/statuses");
        let legacy = req.with_legacy_protocol(true);
        assert!(!req.legacy_protocol);
        assert!(legacy.legacy_protocol);
    }

    #[test]
    fn test_validate_missing_uri() {
        let req = Request::get("  ").with_connection_config(&config());
        let err = req.validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_validate_unbound() {
        let err = Request::get("statuses").validate().unwrap_err();
        assert!(err.to_string().contains("cannot resolve"));
    }

    #[test]
    fn test_validate_media_requires_post() {
        let req = Request::get("statuses")
            .media(Url::parse("file:///tmp/cat.png").unwrap())
            .with_connection_config(&config());
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_local_scheme_only_for_downloads() {
        let req = Request::get("file:///tmp/cat.png").with_connection_config(&config());
        assert!(req.validate().is_err());

        let req = req.api_routine(ApiRoutine::DownloadFile);
        assert_eq!(req.validate().unwrap().scheme(), "file");
    }

    #[test]
    fn test_invalid_header_skipped() {
        let req = Request::get("api")
            .header("authorization", "Bearer tok\nX-Injected: 1")
            .header("bad name", "v")
            .header("accept", "application/json");

        assert!(req.headers.get("authorization").is_none());
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.headers.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn test_form_pairs_skip_empty() {
        let req = Request::post("statuses")
            .param("status", "hello")
            .param("in_reply_to_id", "")
            .param("sensitive", false)
            .param("spoiler", Value::Null);

        let pairs = req.form_pairs();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&("status".to_string(), "hello".to_string())));
        assert!(pairs.contains(&("sensitive".to_string(), "false".to_string())));
    }
}
