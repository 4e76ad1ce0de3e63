// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Wire transports

use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::{Client, Proxy, RequestBuilder};
use serde_json::{Map, Value};

use super::headers;
use super::request::BodyFormat;
use super::result::ReadResult;
use crate::connection::ConnectionConfig;
use crate::error::{Error, Result};

/// Binary part of a multipart POST
#[derive(Debug, Clone)]
pub struct MediaPart {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Sends one request over the wire
///
/// Implementations attach failures to the result instead of returning them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `result.url()`
    async fn get(&self, result: ReadResult) -> ReadResult;

    /// Send the request's POST parameters (and media part) to `result.url()`
    async fn post(&self, result: ReadResult) -> ReadResult;
}

/// reqwest-backed transport with one client per protocol variant
///
/// Redirects are never followed by the client; the pipeline does that so
/// every hop is logged and bounded.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    modern: Client,
    legacy: Client,
}

impl ReqwestTransport {
    /// Build clients from the connection's SSL mode and transport settings
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        Ok(Self {
            modern: build_client(config, false)?,
            legacy: build_client(config, true)?,
        })
    }

    fn client(&self, legacy: bool) -> &Client {
        if legacy {
            &self.legacy
        } else {
            &self.modern
        }
    }

    fn prepare(&self, result: &ReadResult) -> RequestBuilder {
        let request = &result.request;
        let mut builder = self
            .client(request.legacy_protocol)
            .request(request.method.clone(), result.url().clone());

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if request.legacy_protocol {
            builder = builder.header(headers::CONNECTION, "close");
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    fn post_builder(&self, result: &ReadResult) -> Result<RequestBuilder> {
        let request = &result.request;
        let builder = self.prepare(result);

        if let Some(media) = result.media() {
            let mut form = Form::new();
            for (name, value) in request.form_pairs() {
                form = form.text(name, value);
            }
            let part = Part::bytes(media.bytes.to_vec())
                .file_name(media.file_name.clone())
                .mime_str(&media.mime_type)?;
            form = form.part(request.media_part_name.clone(), part);
            return Ok(builder.multipart(form));
        }

        match request.body_format {
            BodyFormat::Json => {
                let params = request.post_params.clone().unwrap_or_else(Map::new);
                Ok(builder.json(&Value::Object(params)))
            }
            BodyFormat::Form => {
                let pairs = request.form_pairs();
                if pairs.is_empty() {
                    Ok(builder)
                } else {
                    Ok(builder.form(&pairs))
                }
            }
        }
    }

    async fn send(builder: RequestBuilder, mut result: ReadResult) -> ReadResult {
        let start = Instant::now();
        match builder.send().await {
            Ok(response) => {
                result.set_status(response.status(), response.version());
                result.set_headers(response.headers());
                match response.bytes().await {
                    Ok(body) => result.set_body(body),
                    Err(e) => result.set_error(e.into()),
                }
            }
            Err(e) => result.set_error(e.into()),
        }

        tracing::debug!(
            method = %result.request.method,
            url = %result.url(),
            status = ?result.status_code(),
            legacy = result.request.legacy_protocol,
            time_ms = start.elapsed().as_millis() as u64,
            "Response"
        );
        result
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, result: ReadResult) -> ReadResult {
        let builder = self.prepare(&result);
        Self::send(builder, result).await
    }

    async fn post(&self, mut result: ReadResult) -> ReadResult {
        match self.post_builder(&result) {
            Ok(builder) => Self::send(builder, result).await,
            Err(e) => {
                result.set_error(e);
                result
            }
        }
    }
}

fn build_client(config: &ConnectionConfig, legacy: bool) -> Result<Client> {
    let transport = config.transport_config();
    let mut builder = Client::builder()
        .user_agent(&transport.user_agent)
        .timeout(transport.timeout)
        .redirect(Policy::none())
        .danger_accept_invalid_certs(config.ssl_mode().accepts_invalid_certs())
        .default_headers(transport.default_headers.clone());

    if legacy {
        // Old servers choke on h2 upgrades, compressed bodies and kept-alive sockets
        builder = builder
            .http1_only()
            .no_gzip()
            .no_brotli()
            .pool_max_idle_per_host(0);
    }

    if let Some(ref proxy_url) = transport.proxy {
        builder = builder.proxy(
            Proxy::all(proxy_url)
                .map_err(|e| Error::config(format!("Invalid proxy URL: {}", e)))?,
        );
    }

    Ok(builder.build()?)
}

/// Transport for connections that never touch the network
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOnlyTransport;

impl LocalOnlyTransport {
    fn refuse(mut result: ReadResult) -> ReadResult {
        let message = format!(
            "network access is disabled: {} {}",
            result.request.method,
            result.url()
        );
        result.set_error(Error::unsupported(message));
        result
    }
}

#[async_trait]
impl Transport for LocalOnlyTransport {
    async fn get(&self, result: ReadResult) -> ReadResult {
        Self::refuse(result)
    }

    async fn post(&self, result: ReadResult) -> ReadResult {
        Self::refuse(result)
    }
}
