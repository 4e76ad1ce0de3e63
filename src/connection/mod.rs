// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Connections to one social-network server
//!
//! A [`Connection`] pairs a [`ConnectionConfig`] with a [`Transport`],
//! backend [`Credentials`] and the host's [`ConnectionContext`]. The rest
//! of the client talks to it through [`HttpConnection`].

mod config;
mod context;
mod credentials;
mod store;

pub use config::{ConnectionConfig, OAuthClientKeys, SslMode, TransportConfig};
pub use context::ConnectionContext;
pub use credentials::{Anonymous, BasicAuth, Credentials, OAuth};
pub use store::{keys, put_or_remove, CredentialStore, MemoryCredentialStore};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use url::Url;

use crate::error::Result;
use crate::http::executor::Pipeline;
use crate::http::{negotiator, LocalOnlyTransport, ReadResult, ReqwestTransport, Request, Transport};

/// What the rest of the client needs from a connection
#[async_trait]
pub trait HttpConnection: Send + Sync {
    fn config(&self) -> &ConnectionConfig;

    /// Execute a request against this connection's server
    async fn execute(&self, request: Request) -> Result<ReadResult>;

    /// Unconfigured sibling of the same backend kind
    fn new_instance(&self) -> Box<dyn HttpConnection>;

    fn ssl_mode(&self) -> SslMode;

    fn path_to_url(&self, path: &str) -> Result<Url>;

    fn is_password_needed(&self) -> bool;

    fn password(&self) -> String;

    fn set_password(&self, password: &str);

    /// Do we have enough credentials to verify them?
    fn credentials_present(&self) -> bool;

    fn user_token(&self) -> String;

    fn user_secret(&self) -> String;

    /// Store an OAuth user token; non-OAuth connections reject this
    fn set_user_token_with_secret(&self, token: &str, secret: &str) -> Result<()>;

    /// Persist settings and credentials, returning true if anything changed
    fn save_to(&self, store: &dyn CredentialStore) -> bool;

    fn clear_auth_information(&self);

    fn clear_client_keys(&self);
}

/// Standard connection
pub struct Connection {
    config: ConnectionConfig,
    transport: Arc<dyn Transport>,
    credentials: RwLock<Box<dyn Credentials>>,
    context: ConnectionContext,
}

impl Connection {
    /// Connect over HTTP with the given credentials
    pub fn new(config: ConnectionConfig, credentials: impl Credentials + 'static) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(config, transport, Box::new(credentials)))
    }

    /// Connection with a caller-supplied transport
    pub fn with_transport(
        config: ConnectionConfig,
        transport: Arc<dyn Transport>,
        credentials: Box<dyn Credentials>,
    ) -> Self {
        Self {
            config,
            transport,
            credentials: RwLock::new(credentials),
            context: ConnectionContext::default(),
        }
    }

    /// Connection that only serves local files
    pub fn local_only(config: ConnectionConfig) -> Self {
        Self::with_transport(config, Arc::new(LocalOnlyTransport), Box::new(Anonymous))
    }

    /// Replace the host capabilities
    pub fn context(mut self, context: ConnectionContext) -> Self {
        self.context = context;
        self
    }

    /// Resolve the request against the origin and add authentication
    ///
    /// Only URLs on the configured origin get credentials.
    fn bind(&self, request: &Request) -> Request {
        let request = request.with_connection_config(&self.config);
        let same_origin = request
            .url
            .as_ref()
            .map(|url| url.origin() == self.config.origin_url().origin())
            .unwrap_or(false);
        if same_origin {
            self.credentials.read().authorize(request)
        } else {
            tracing::debug!(uri = %request.uri, "Not authorizing request outside the origin");
            request
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("credentials", &*self.credentials.read())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpConnection for Connection {
    fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn execute(&self, request: Request) -> Result<ReadResult> {
        let request = self.bind(&request);
        let pipeline = Pipeline::new(&self.config, self.transport.as_ref(), &self.context);
        negotiator::execute(&pipeline, request).await
    }

    fn new_instance(&self) -> Box<dyn HttpConnection> {
        Box::new(Self {
            config: self.config.clone(),
            transport: Arc::clone(&self.transport),
            credentials: RwLock::new(self.credentials.read().fresh()),
            context: self.context.clone(),
        })
    }

    fn ssl_mode(&self) -> SslMode {
        self.config.ssl_mode()
    }

    fn path_to_url(&self, path: &str) -> Result<Url> {
        self.config.path_to_url(path)
    }

    fn is_password_needed(&self) -> bool {
        self.credentials.read().is_password_needed()
    }

    fn password(&self) -> String {
        self.credentials.read().password()
    }

    fn set_password(&self, password: &str) {
        self.credentials.write().set_password(password);
    }

    fn credentials_present(&self) -> bool {
        self.credentials.read().are_present()
    }

    fn user_token(&self) -> String {
        self.credentials.read().user_token()
    }

    fn user_secret(&self) -> String {
        self.credentials.read().user_secret()
    }

    fn set_user_token_with_secret(&self, token: &str, secret: &str) -> Result<()> {
        self.credentials
            .write()
            .set_user_token_with_secret(token, secret)
    }

    fn save_to(&self, store: &dyn CredentialStore) -> bool {
        let settings_changed = self.config.save_to(store);
        let credentials_changed = self.credentials.read().save_to(store);
        settings_changed || credentials_changed
    }

    fn clear_auth_information(&self) {
        self.credentials.write().clear();
    }

    fn clear_client_keys(&self) {
        self.config.clear_client_keys();
    }
}
