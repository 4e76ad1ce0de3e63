// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! One execution attempt: validate, dispatch, redirect, log, parse

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use url::Url;

use super::diagnostics::{post_payload, response_payload, DiagnosticKind, DiagnosticRecord};
use super::headers;
use super::local::{download_local_file, file_name, guess_mime_type, is_local_file, LocalFiles};
use super::redirect::on_moved;
use super::request::Request;
use super::result::ReadResult;
use super::transport::{MediaPart, Transport};
use crate::connection::{ConnectionConfig, ConnectionContext};
use crate::error::{Error, Result, StatusKind};

/// Everything an attempt needs from its connection
pub(crate) struct Pipeline<'a> {
    pub config: &'a ConnectionConfig,
    pub transport: &'a dyn Transport,
    pub context: &'a ConnectionContext,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(
        config: &'a ConnectionConfig,
        transport: &'a dyn Transport,
        context: &'a ConnectionContext,
    ) -> Self {
        Self {
            config,
            transport,
            context,
        }
    }

    fn record(&self, kind: DiagnosticKind, log_name: String, payload: serde_json::Value) {
        if self.config.transport_config().log_network_messages {
            self.context
                .diagnostics
                .record(DiagnosticRecord::new(kind, log_name, payload));
        }
    }
}

/// Run one attempt of `request` with its current protocol variant
///
/// Returns the parsed result, or the first error any stage produced.
pub(crate) async fn execute_attempt(pipeline: &Pipeline<'_>, request: Request) -> Result<ReadResult> {
    if request.is_post() {
        pipeline.record(
            DiagnosticKind::Post,
            request.display_name(),
            post_payload(&request),
        );
    }

    let url = match request.validate() {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(log_name = %request.display_name(), error = %e, "Request rejected");
            return Err(e);
        }
    };

    let result = ReadResult::new(request, url);
    let result = dispatch(pipeline, result).await;
    let mut result = follow_redirects(pipeline, result).await;
    result.check_status();
    log_response(pipeline, &mut result);
    result.try_to_parse()
}

async fn dispatch(pipeline: &Pipeline<'_>, result: ReadResult) -> ReadResult {
    if result.request.is_post() {
        post_request(pipeline, result).await
    } else {
        get_request(pipeline, result).await
    }
}

async fn get_request(pipeline: &Pipeline<'_>, result: ReadResult) -> ReadResult {
    if is_local_file(&result, pipeline.context.classifier.as_ref()) {
        download_local_file(result, pipeline.context.local_files.as_ref()).await
    } else {
        pipeline.transport.get(result).await
    }
}

async fn post_request(pipeline: &Pipeline<'_>, mut result: ReadResult) -> ReadResult {
    if result.media().is_none() {
        if let Some(media_uri) = result.request.media_uri.clone() {
            match read_media(pipeline.context.local_files.as_ref(), &media_uri).await {
                Ok(part) => result.set_media(part),
                Err(e) => {
                    result.append_to_log(format!("Failed to read media '{}'", media_uri));
                    result.set_error(e);
                    return result;
                }
            }
        }
    }
    pipeline.transport.post(result).await
}

async fn read_media(files: &dyn LocalFiles, uri: &Url) -> Result<MediaPart> {
    let mut stream = files.open(uri).await?;
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).await?;
    Ok(MediaPart {
        file_name: file_name(uri),
        mime_type: guess_mime_type(uri).to_string(),
        bytes: Bytes::from(bytes),
    })
}

async fn follow_redirects(pipeline: &Pipeline<'_>, mut result: ReadResult) -> ReadResult {
    let settings = pipeline.config.transport_config();
    let mut hops = 0;

    while !result.has_error() && result.is_moved() {
        if hops >= settings.max_redirect_hops {
            let url = result.url().to_string();
            result.set_error(Error::protocol(
                StatusKind::Moved,
                url,
                format!("Too many redirects ({})", hops),
            ));
            break;
        }
        let from = result.url().clone();
        if on_moved(&mut result, settings.verbose) {
            break;
        }
        if !matches!(result.url().scheme(), "http" | "https") {
            let reason = format!("Refusing redirect to '{}'", result.url());
            result.set_error(Error::protocol(StatusKind::Moved, from.as_str(), reason));
            break;
        }
        if result.url().origin() != from.origin() {
            strip_credentials(&mut result);
        }
        hops += 1;
        pipeline.record(
            DiagnosticKind::Redirect,
            result.request.display_name(),
            serde_json::json!({
                "from": from.as_str(),
                "to": result.url().as_str(),
                "hop": hops,
            }),
        );
        result.reset_response();
        result = dispatch(pipeline, result).await;
    }
    result
}

/// Credentials never follow a redirect to another origin
fn strip_credentials(result: &mut ReadResult) {
    if result.request.headers.remove(headers::AUTHORIZATION).is_some() {
        tracing::debug!(
            log_name = %result.request.display_name(),
            to = %result.url(),
            "Dropped authorization on cross-origin redirect"
        );
    }
}

fn log_response(pipeline: &Pipeline<'_>, result: &mut ReadResult) {
    let outcome = match result.error() {
        Some(e) => e.to_string(),
        None if result.status_line().is_empty() => "local".to_string(),
        None => result.status_line().to_string(),
    };
    let summary = format!("{} {} -> {}", result.request.method, result.url(), outcome);
    tracing::debug!(
        log_name = %result.request.display_name(),
        legacy = result.request.legacy_protocol,
        redirected = result.redirected(),
        "{}",
        summary
    );
    result.append_to_log(summary);
    pipeline.record(
        DiagnosticKind::Response,
        result.request.display_name(),
        response_payload(result),
    );
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use super::*;
    use crate::connection::{SslMode, TransportConfig};
    use crate::http::mock::{MockReply, MockTransport};
    use crate::http::{ApiRoutine, FsLocalFiles, MemorySink};

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("https://example.social", SslMode::Secure).unwrap()
    }

    fn bound(config: &ConnectionConfig, request: Request) -> Request {
        request.with_connection_config(config)
    }

    #[tokio::test]
    async fn test_get_parses_json() {
        let config = config();
        let transport = MockTransport::new().reply(MockReply::ok(r#"{"id":"7"}"#));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let result = execute_attempt(&pipeline, bound(&config, Request::get("api/notes/7")))
            .await
            .unwrap();
        assert_eq!(result.json_object().unwrap()["id"], "7");
        assert_eq!(
            transport.calls()[0].url.as_str(),
            "https://example.social/api/notes/7"
        );
        assert_eq!(
            result.log().last().map(String::as_str),
            Some("GET https://example.social/api/notes/7 -> HTTP/1.1 200 OK")
        );
    }

    #[tokio::test]
    async fn test_validation_failure_skips_transport() {
        let config = config();
        let transport = MockTransport::new();
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let err = execute_attempt(&pipeline, bound(&config, Request::get("")))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_follows_redirect() {
        let config = config();
        let transport = MockTransport::new()
            .reply(MockReply::status(302).header("Location", "/api/moved/here"))
            .reply(MockReply::ok("[1,2]"));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let result = execute_attempt(&pipeline, bound(&config, Request::get("api/old")))
            .await
            .unwrap();
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].method, reqwest::Method::GET);
        assert_eq!(calls[1].url.as_str(), "https://example.social/api/moved/here");
        assert!(result.redirected());
        assert_eq!(result.json_array().unwrap().len(), 2);
        assert_eq!(result.log()[0], "statusLine:'HTTP/1.1 302 Found'");
    }

    #[tokio::test]
    async fn test_redirect_hop_limit() {
        let config = config().transport(TransportConfig::new().max_redirect_hops(2));
        let transport = MockTransport::new()
            .reply(MockReply::status(301).header("location", "/a"))
            .reply(MockReply::status(301).header("location", "/b"))
            .reply(MockReply::status(301).header("location", "/c"));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let err = execute_attempt(&pipeline, bound(&config, Request::get("start")))
            .await
            .unwrap_err();
        assert_eq!(transport.call_count(), 3);
        assert_eq!(err.status_kind(), Some(StatusKind::Moved));
        assert!(err.to_string().contains("Too many redirects"));
    }

    #[tokio::test]
    async fn test_moved_without_location_stops() {
        let config = config();
        let transport = MockTransport::new().reply(MockReply::status(301));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let err = execute_attempt(&pipeline, bound(&config, Request::get("gone")))
            .await
            .unwrap_err();
        assert_eq!(transport.call_count(), 1);
        assert_eq!(err.status_kind(), Some(StatusKind::Moved));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_kind() {
        let config = config();
        let transport = MockTransport::new().reply(MockReply::status(404).body("no such note"));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let err = execute_attempt(&pipeline, bound(&config, Request::get("api/notes/0")))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.status_kind(), Some(StatusKind::NotFound));
    }

    #[tokio::test]
    async fn test_unparseable_body() {
        let config = config();
        let transport = MockTransport::new().reply(MockReply::ok("<html>"));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let err = execute_attempt(&pipeline, bound(&config, Request::get("api/notes")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[tokio::test]
    async fn test_transport_failure_is_returned() {
        let config = config();
        let transport = MockTransport::new().reply(MockReply::fail("connection reset"));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let err = execute_attempt(&pipeline, bound(&config, Request::get("api/notes")))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_local_file_download_bypasses_transport() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"avatar bytes").unwrap();
        let file_url = Url::from_file_path(file.path()).unwrap();

        let config = config();
        let transport = MockTransport::new();
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let request = Request::get(file_url.as_str()).api_routine(ApiRoutine::DownloadFile);
        let result = execute_attempt(&pipeline, bound(&config, request))
            .await
            .unwrap();
        assert_eq!(transport.call_count(), 0);
        assert_eq!(result.body().as_ref(), b"avatar bytes");
        assert!(result.parsed().is_none());
    }

    #[tokio::test]
    async fn test_remote_download_uses_transport() {
        let config = config();
        let transport = MockTransport::new().reply(MockReply::ok("not json"));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let request = Request::get("media/cat.png").api_routine(ApiRoutine::DownloadFile);
        let result = execute_attempt(&pipeline, bound(&config, request))
            .await
            .unwrap();
        assert_eq!(transport.call_count(), 1);
        assert_eq!(result.text().unwrap(), "not json");
    }

    #[tokio::test]
    async fn test_post_with_media_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, b"png").unwrap();
        let media = Url::from_file_path(&path).unwrap();

        let config = config();
        let transport = MockTransport::new().reply(MockReply::ok(r#"{"id":"m1"}"#));
        let context =
            ConnectionContext::default().local_files(Arc::new(FsLocalFiles::with_root(dir.path())));
        let pipeline = Pipeline::new(&config, &transport, &context);

        let request = Request::post("api/media").media(media);
        execute_attempt(&pipeline, bound(&config, request))
            .await
            .unwrap();
        assert_eq!(transport.calls()[0].media.as_deref(), Some("cat.png"));
    }

    #[tokio::test]
    async fn test_post_with_missing_media_fails_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let media = Url::from_file_path(dir.path().join("missing.png")).unwrap();

        let config = config();
        let transport = MockTransport::new();
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let request = Request::post("api/media").media(media);
        let err = execute_attempt(&pipeline, bound(&config, request))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_network_messages_recorded_when_enabled() {
        let config = config().transport(TransportConfig::new().log_network_messages(true));
        let transport = MockTransport::new().reply(MockReply::ok("{}"));
        let sink = Arc::new(MemorySink::new());
        let context = ConnectionContext::default().diagnostics(sink.clone());
        let pipeline = Pipeline::new(&config, &transport, &context);

        let request = Request::post("api/statuses")
            .log_name("update")
            .param("status", "hi");
        execute_attempt(&pipeline, bound(&config, request))
            .await
            .unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, DiagnosticKind::Post);
        assert_eq!(records[0].log_name, "update");
        assert_eq!(
            records[0].payload["loggedURL"],
            "https://example.social/api/statuses"
        );
        assert_eq!(records[0].payload["status"], "hi");
        assert_eq!(records[1].kind, DiagnosticKind::Response);
    }

    #[tokio::test]
    async fn test_network_messages_silent_by_default() {
        let config = config();
        let transport = MockTransport::new().reply(MockReply::ok("{}"));
        let sink = Arc::new(MemorySink::new());
        let context = ConnectionContext::default().diagnostics(sink.clone());
        let pipeline = Pipeline::new(&config, &transport, &context);

        execute_attempt(&pipeline, bound(&config, Request::post("api/statuses")))
            .await
            .unwrap();
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_cross_origin_redirect_drops_authorization() {
        let config = config();
        let transport = MockTransport::new()
            .reply(MockReply::status(302).header("location", "http://evil.example/steal"))
            .reply(MockReply::ok("{}"));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let request = Request::get("api/notes").header("authorization", "Bearer secret-token");
        execute_attempt(&pipeline, bound(&config, request))
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].authorization.as_deref(), Some("Bearer secret-token"));
        assert_eq!(calls[1].url.as_str(), "http://evil.example/steal");
        assert!(calls[1].authorization.is_none());
    }

    #[tokio::test]
    async fn test_same_origin_redirect_keeps_authorization() {
        let config = config();
        let transport = MockTransport::new()
            .reply(MockReply::status(301).header("location", "/api/v2/notes"))
            .reply(MockReply::ok("{}"));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let request = Request::get("api/notes").header("authorization", "Bearer secret-token");
        execute_attempt(&pipeline, bound(&config, request))
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls[1].authorization.as_deref(), Some("Bearer secret-token"));
    }

    #[tokio::test]
    async fn test_redirect_to_local_file_is_refused() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"PRIVATE-LOCAL-DATA").unwrap();
        let file_url = Url::from_file_path(file.path()).unwrap();

        let config = config();
        let transport = MockTransport::new()
            .reply(MockReply::status(302).header("location", file_url.as_str()));
        let context = ConnectionContext::default();
        let pipeline = Pipeline::new(&config, &transport, &context);

        let request = Request::get("https://cdn.example/avatar.png")
            .api_routine(ApiRoutine::DownloadFile);
        let err = execute_attempt(&pipeline, bound(&config, request))
            .await
            .unwrap_err();

        assert_eq!(transport.call_count(), 1);
        assert_eq!(err.status_kind(), Some(StatusKind::Moved));
        assert!(err.to_string().contains("Refusing redirect"));
    }
}
