// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Network-level diagnostic records

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use url::Url;

use super::request::Request;
use super::result::ReadResult;

/// What a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Post,
    Response,
    Redirect,
}

/// One structured diagnostic entry
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: DiagnosticKind,
    pub log_name: String,
    pub payload: Value,
}

impl DiagnosticRecord {
    pub fn new(kind: DiagnosticKind, log_name: impl Into<String>, payload: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            log_name: log_name.into(),
            payload,
        }
    }
}

/// Receives diagnostic records
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, record: DiagnosticRecord);
}

/// Emits records as `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, record: DiagnosticRecord) {
        tracing::debug!(
            target: "fedlink::network",
            kind = ?record.kind,
            log_name = %record.log_name,
            payload = %record.payload,
            "Network message"
        );
    }
}

/// Keeps the most recent records in memory, e.g. for a "show log" screen
#[derive(Debug, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<VecDeque<DiagnosticRecord>>>,
    max_records: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max records; older ones are dropped first
    pub fn max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(VecDeque::new())),
            max_records: 1000,
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, record: DiagnosticRecord) {
        let mut records = self.records.lock();
        records.push_back(record);
        while records.len() > self.max_records {
            records.pop_front();
        }
    }
}

/// Outgoing POST: parameters plus `loggedURL` and `loggedMediaUri`
pub fn post_payload(request: &Request) -> Value {
    let mut payload = request.post_params.clone().unwrap_or_else(Map::new);
    let url = request
        .url
        .as_ref()
        .map(Url::to_string)
        .unwrap_or_else(|| request.uri.clone());
    payload.insert("loggedURL".to_string(), Value::String(url));
    if let Some(ref media) = request.media_uri {
        payload.insert("loggedMediaUri".to_string(), Value::String(media.to_string()));
    }
    Value::Object(payload)
}

/// Response summary for diagnostics
pub fn response_payload(result: &ReadResult) -> Value {
    let headers: Map<String, Value> = result
        .headers()
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();
    let mut payload = json!({
        "url": result.url().as_str(),
        "statusLine": result.status_line(),
        "redirected": result.redirected(),
        "legacyProtocol": result.request.legacy_protocol,
        "bodyLength": result.body().len(),
        "headers": headers,
    });
    if let Some(error) = result.error() {
        payload["error"] = Value::String(error.to_string());
    }
    payload
}
