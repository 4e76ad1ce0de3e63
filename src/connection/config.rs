// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Connection and transport configuration

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use super::store::{keys, put_or_remove, CredentialStore};
use crate::error::{Error, Result};
use crate::http::{headers, DEFAULT_USER_AGENT, MAX_REDIRECT_HOPS};
use crate::tristate::TriState;

/// How the connection uses TLS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Plain http
    None,
    /// https with certificate verification
    #[default]
    Secure,
    /// https accepting misconfigured certificates (dangerous!)
    Insecure,
}

impl SslMode {
    /// Scheme used when the origin is given without one
    pub fn scheme(&self) -> &'static str {
        match self {
            SslMode::None => "http",
            SslMode::Secure | SslMode::Insecure => "https",
        }
    }

    pub fn accepts_invalid_certs(&self) -> bool {
        matches!(self, SslMode::Insecure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::None => "none",
            SslMode::Secure => "secure",
            SslMode::Insecure => "insecure",
        }
    }
}

impl FromStr for SslMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SslMode::None),
            "secure" => Ok(SslMode::Secure),
            "insecure" => Ok(SslMode::Insecure),
            other => Err(Error::config(format!("Invalid SSL mode '{}'", other))),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth client (application) credentials issued by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthClientKeys {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl OAuthClientKeys {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    pub fn are_present(&self) -> bool {
        !self.consumer_key.is_empty() && !self.consumer_secret.is_empty()
    }
}

/// HTTP transport settings
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User agent string
    pub user_agent: String,
    /// Default timeout
    pub timeout: Duration,
    /// Default headers
    pub default_headers: HeaderMap,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Record network-level diagnostics (POST payloads, responses)
    pub log_network_messages: bool,
    /// Log redirect targets with response headers
    pub verbose: bool,
    /// Maximum redirects the pipeline follows for one attempt
    pub max_redirect_hops: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            headers::ACCEPT,
            HeaderValue::from_static("application/json, */*;q=0.8"),
        );

        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            default_headers,
            proxy: None,
            log_network_messages: false,
            verbose: false,
            max_redirect_hops: MAX_REDIRECT_HOPS,
        }
    }
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Enable/disable network-level diagnostic records
    pub fn log_network_messages(mut self, enabled: bool) -> Self {
        self.log_network_messages = enabled;
        self
    }

    /// Enable/disable verbose redirect logging
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// Set redirect hop limit
    pub fn max_redirect_hops(mut self, hops: usize) -> Self {
        self.max_redirect_hops = hops;
        self
    }
}

/// Configuration shared read-only by every request of one connection
///
/// Only the OAuth client keys can change after construction; they sit
/// behind a lock shared by all clones of the config.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    origin_url: Url,
    ssl_mode: SslMode,
    use_legacy_http_protocol: TriState,
    account_name: Option<String>,
    client_keys: Arc<RwLock<Option<OAuthClientKeys>>>,
    transport: TransportConfig,
}

impl ConnectionConfig {
    /// Create a config for `origin`, filling in the scheme from `ssl_mode`
    /// when the origin has none
    pub fn new(origin: impl AsRef<str>, ssl_mode: SslMode) -> Result<Self> {
        Ok(Self {
            origin_url: normalize_origin(origin.as_ref(), ssl_mode)?,
            ssl_mode,
            use_legacy_http_protocol: TriState::Unknown,
            account_name: None,
            client_keys: Arc::new(RwLock::new(None)),
            transport: TransportConfig::default(),
        })
    }

    /// Set the legacy-protocol preference
    pub fn use_legacy_http_protocol(mut self, value: TriState) -> Self {
        self.use_legacy_http_protocol = value;
        self
    }

    /// Set the owning account name
    pub fn account_name(mut self, name: impl Into<String>) -> Self {
        self.account_name = Some(name.into());
        self
    }

    /// Set OAuth client keys
    pub fn oauth_client_keys(self, keys: OAuthClientKeys) -> Self {
        *self.client_keys.write() = Some(keys);
        self
    }

    /// Set transport settings
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn origin_url(&self) -> &Url {
        &self.origin_url
    }

    pub fn ssl_mode(&self) -> SslMode {
        self.ssl_mode
    }

    pub fn legacy_http_protocol(&self) -> TriState {
        self.use_legacy_http_protocol
    }

    pub fn account(&self) -> Option<&str> {
        self.account_name.as_deref()
    }

    pub fn transport_config(&self) -> &TransportConfig {
        &self.transport
    }

    /// Resolve an absolute URL or an origin-relative path
    pub fn path_to_url(&self, path: &str) -> Result<Url> {
        let path = path.trim();
        if path.is_empty() {
            return Ok(self.origin_url.clone());
        }
        match Url::parse(path) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(self.origin_url.join(path)?),
            Err(e) => Err(e.into()),
        }
    }

    pub fn are_oauth_client_keys_present(&self) -> bool {
        self.client_keys
            .read()
            .as_ref()
            .map(OAuthClientKeys::are_present)
            .unwrap_or(false)
    }

    /// Cached OAuth client keys
    pub fn client_keys(&self) -> Option<OAuthClientKeys> {
        self.client_keys.read().clone()
    }

    /// Replace the cached OAuth client keys (e.g. after client registration)
    pub fn set_client_keys(&self, keys: OAuthClientKeys) {
        *self.client_keys.write() = Some(keys);
    }

    pub fn clear_client_keys(&self) {
        self.client_keys.write().take();
    }

    /// Persist settings, returning true if anything changed
    pub fn save_to(&self, store: &dyn CredentialStore) -> bool {
        let keys = self.client_keys();
        let mut changed = store.put(keys::ORIGIN_URL, self.origin_url.as_str());
        changed |= store.put(keys::SSL_MODE, self.ssl_mode.as_str());
        changed |= store.put(
            keys::USE_LEGACY_HTTP_PROTOCOL,
            self.use_legacy_http_protocol.as_str(),
        );
        changed |= put_or_remove(
            store,
            keys::OAUTH_CLIENT_KEY,
            keys.as_ref().map(|k| k.consumer_key.as_str()),
        );
        changed |= put_or_remove(
            store,
            keys::OAUTH_CLIENT_SECRET,
            keys.as_ref().map(|k| k.consumer_secret.as_str()),
        );
        changed
    }

    /// Rebuild a config from data written by [`save_to`](Self::save_to)
    pub fn load_from(store: &dyn CredentialStore) -> Result<Self> {
        let origin = store
            .get(keys::ORIGIN_URL)
            .ok_or_else(|| Error::config("No origin URL stored"))?;
        let ssl_mode = match store.get(keys::SSL_MODE) {
            Some(value) => value.parse()?,
            None => SslMode::default(),
        };
        let legacy = match store.get(keys::USE_LEGACY_HTTP_PROTOCOL) {
            Some(value) => value.parse()?,
            None => TriState::Unknown,
        };

        let config = Self::new(origin, ssl_mode)?.use_legacy_http_protocol(legacy);
        if let (Some(key), Some(secret)) = (
            store.get(keys::OAUTH_CLIENT_KEY),
            store.get(keys::OAUTH_CLIENT_SECRET),
        ) {
            config.set_client_keys(OAuthClientKeys::new(key, secret));
        }
        Ok(config)
    }
}

/// Persisted fields only; transport settings are runtime configuration.
impl PartialEq for ConnectionConfig {
    fn eq(&self, other: &Self) -> bool {
        self.origin_url == other.origin_url
            && self.ssl_mode == other.ssl_mode
            && self.use_legacy_http_protocol == other.use_legacy_http_protocol
            && self.client_keys() == other.client_keys()
    }
}

fn normalize_origin(origin: &str, ssl_mode: SslMode) -> Result<Url> {
    let origin = origin.trim();
    if origin.is_empty() {
        return Err(Error::config("Origin URL is empty"));
    }

    let with_scheme = if origin.contains("://") {
        origin.to_string()
    } else {
        format!("{}://{}", ssl_mode.scheme(), origin)
    };
    let mut url = Url::parse(&with_scheme)?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(Error::config(format!("Origin URL has no host: '{}'", origin)));
    }

    // Relative paths must join under the origin's path, not replace its last segment
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
