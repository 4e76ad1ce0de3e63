// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Per-backend credential adapters
//!
//! The pipeline is identical for every backend; what differs is whether a
//! password is needed, which `Authorization` header goes out and what gets
//! persisted. Each adapter supplies only that.

use std::fmt;

use super::store::{keys, put_or_remove, CredentialStore};
use crate::error::{Error, Result};
use crate::http::{headers, Request};

/// Credential behavior of one backend kind
pub trait Credentials: Send + Sync + fmt::Debug {
    /// Whether the backend authenticates with OAuth
    fn is_oauth(&self) -> bool;

    /// Whether the user must supply a password
    fn is_password_needed(&self) -> bool;

    /// Current password, empty when none
    fn password(&self) -> String;

    fn set_password(&mut self, password: &str);

    /// Do we have enough credentials to verify them?
    fn are_present(&self) -> bool;

    fn user_token(&self) -> String;

    fn user_secret(&self) -> String;

    /// Store an OAuth user token; fails on non-OAuth backends
    fn set_user_token_with_secret(&mut self, token: &str, secret: &str) -> Result<()>;

    /// Add authentication to an outgoing request
    fn authorize(&self, request: Request) -> Request;

    /// Persist credentials, returning true if anything changed
    fn save_to(&self, store: &dyn CredentialStore) -> bool;

    /// Forget user credentials
    fn clear(&mut self);

    /// Empty credentials of the same kind
    fn fresh(&self) -> Box<dyn Credentials>;
}

/// No user credentials: public endpoints and local-file-only connections
#[derive(Debug, Clone, Default)]
pub struct Anonymous;

impl Credentials for Anonymous {
    fn is_oauth(&self) -> bool {
        false
    }

    fn is_password_needed(&self) -> bool {
        false
    }

    fn password(&self) -> String {
        String::new()
    }

    fn set_password(&mut self, _password: &str) {}

    fn are_present(&self) -> bool {
        false
    }

    fn user_token(&self) -> String {
        String::new()
    }

    fn user_secret(&self) -> String {
        String::new()
    }

    fn set_user_token_with_secret(&mut self, _token: &str, _secret: &str) -> Result<()> {
        Err(Error::invalid_argument(
            "set_user_token_with_secret is for OAuth only",
        ))
    }

    fn authorize(&self, request: Request) -> Request {
        request
    }

    fn save_to(&self, _store: &dyn CredentialStore) -> bool {
        false
    }

    fn clear(&mut self) {}

    fn fresh(&self) -> Box<dyn Credentials> {
        Box::new(Anonymous)
    }
}

/// Username and password sent as HTTP Basic auth
#[derive(Clone, Default)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Restore from data written by [`Credentials::save_to`]
    pub fn load_from(store: &dyn CredentialStore) -> Self {
        Self {
            username: store.get(keys::USERNAME).unwrap_or_default(),
            password: store.get(keys::PASSWORD).unwrap_or_default(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials for BasicAuth {
    fn is_oauth(&self) -> bool {
        false
    }

    fn is_password_needed(&self) -> bool {
        true
    }

    fn password(&self) -> String {
        self.password.clone()
    }

    fn set_password(&mut self, password: &str) {
        self.password = password.to_string();
    }

    fn are_present(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    fn user_token(&self) -> String {
        String::new()
    }

    fn user_secret(&self) -> String {
        String::new()
    }

    fn set_user_token_with_secret(&mut self, _token: &str, _secret: &str) -> Result<()> {
        Err(Error::invalid_argument(
            "set_user_token_with_secret is for OAuth only",
        ))
    }

    fn authorize(&self, request: Request) -> Request {
        if !self.are_present() {
            return request;
        }
        let encoded = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            format!("{}:{}", self.username, self.password),
        );
        request.header(headers::AUTHORIZATION, format!("Basic {}", encoded))
    }

    fn save_to(&self, store: &dyn CredentialStore) -> bool {
        let mut changed = put_or_remove(store, keys::USERNAME, Some(self.username.as_str()));
        changed |= put_or_remove(store, keys::PASSWORD, Some(self.password.as_str()));
        changed
    }

    fn clear(&mut self) {
        self.password.clear();
    }

    fn fresh(&self) -> Box<dyn Credentials> {
        Box::new(BasicAuth::default())
    }
}

/// OAuth user token, sent as a bearer token
#[derive(Clone, Default)]
pub struct OAuth {
    token: String,
    secret: String,
}

impl OAuth {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }

    /// Restore from data written by [`Credentials::save_to`]
    pub fn load_from(store: &dyn CredentialStore) -> Self {
        Self {
            token: store.get(keys::USER_TOKEN).unwrap_or_default(),
            secret: store.get(keys::USER_SECRET).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for OAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth")
            .field("token_present", &!self.token.is_empty())
            .finish()
    }
}

impl Credentials for OAuth {
    fn is_oauth(&self) -> bool {
        true
    }

    fn is_password_needed(&self) -> bool {
        false
    }

    fn password(&self) -> String {
        String::new()
    }

    fn set_password(&mut self, _password: &str) {}

    fn are_present(&self) -> bool {
        !self.token.is_empty()
    }

    fn user_token(&self) -> String {
        self.token.clone()
    }

    fn user_secret(&self) -> String {
        self.secret.clone()
    }

    fn set_user_token_with_secret(&mut self, token: &str, secret: &str) -> Result<()> {
        self.token = token.to_string();
        self.secret = secret.to_string();
        Ok(())
    }

    fn authorize(&self, request: Request) -> Request {
        if self.token.is_empty() {
            return request;
        }
        request.header(headers::AUTHORIZATION, format!("Bearer {}", self.token))
    }

    fn save_to(&self, store: &dyn CredentialStore) -> bool {
        let mut changed = put_or_remove(store, keys::USER_TOKEN, Some(self.token.as_str()));
        changed |= put_or_remove(store, keys::USER_SECRET, Some(self.secret.as_str()));
        changed
    }

    fn clear(&mut self) {
        self.token.clear();
        self.secret.clear();
    }

    fn fresh(&self) -> Box<dyn Credentials> {
        Box::new(OAuth::default())
    }
}
