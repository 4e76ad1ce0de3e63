// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Scripted transport for pipeline tests

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::{Method, StatusCode, Version};
use url::Url;

use super::result::ReadResult;
use super::transport::Transport;
use crate::error::Error;

/// One scripted answer
#[derive(Debug, Clone)]
pub(crate) enum MockReply {
    Response {
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
    },
    Fail(String),
}

impl MockReply {
    pub(crate) fn status(status: u16) -> Self {
        MockReply::Response {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub(crate) fn ok(body: &str) -> Self {
        Self::status(200).body(body)
    }

    pub(crate) fn fail(reason: &str) -> Self {
        MockReply::Fail(reason.to_string())
    }

    pub(crate) fn body(mut self, text: &str) -> Self {
        if let MockReply::Response { ref mut body, .. } = self {
            *body = text.to_string();
        }
        self
    }

    pub(crate) fn header(mut self, name: &str, value: &str) -> Self {
        if let MockReply::Response {
            ref mut headers, ..
        } = self
        {
            headers.push((name.to_string(), value.to_string()));
        }
        self
    }
}

/// What the pipeline asked the transport to do
#[derive(Debug, Clone)]
pub(crate) struct MockCall {
    pub method: Method,
    pub url: Url,
    pub legacy: bool,
    pub authorization: Option<String>,
    pub media: Option<String>,
}

/// Answers calls from a queue; an empty queue answers 200 with no body
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, reply: MockReply) -> Self {
        self.replies.lock().push_back(reply);
        self
    }

    pub(crate) fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn respond(&self, mut result: ReadResult) -> ReadResult {
        self.calls.lock().push(MockCall {
            method: result.request.method.clone(),
            url: result.url().clone(),
            legacy: result.request.legacy_protocol,
            authorization: result
                .request
                .headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            media: result.media().map(|m| m.file_name.clone()),
        });

        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| MockReply::status(200));
        match reply {
            MockReply::Response {
                status,
                headers,
                body,
            } => {
                let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                result.set_status(status, Version::HTTP_11);
                for (name, value) in headers {
                    result.add_header(name, value);
                }
                result.set_body(Bytes::from(body));
            }
            MockReply::Fail(reason) => {
                let url = result.url().to_string();
                result.set_error(Error::transport(url, reason));
            }
        }
        result
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, result: ReadResult) -> ReadResult {
        self.respond(result)
    }

    async fn post(&self, result: ReadResult) -> ReadResult {
        self.respond(result)
    }
}
