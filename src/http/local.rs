// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Local-file reads and the local-vs-remote decision

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use url::Url;

use super::result::ReadResult;
use crate::error::{Error, Result};

/// Byte stream opened from local storage
pub type LocalStream = Pin<Box<dyn AsyncRead + Send>>;

/// Decides whether a URI is fetched over the network
pub trait UriClassifier: Send + Sync {
    fn is_downloadable(&self, uri: &Url) -> bool;
}

/// Only http and https URIs are downloadable
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemeClassifier;

impl UriClassifier for SchemeClassifier {
    fn is_downloadable(&self, uri: &Url) -> bool {
        matches!(uri.scheme(), "http" | "https")
    }
}

/// Opens local content for reading
#[async_trait]
pub trait LocalFiles: Send + Sync {
    async fn open(&self, uri: &Url) -> Result<LocalStream>;
}

/// Opens `file://` URIs from the filesystem
///
/// With a root set, paths must stay inside it.
#[derive(Debug, Default, Clone)]
pub struct FsLocalFiles {
    root: Option<PathBuf>,
}

impl FsLocalFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict reads to files under `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

#[async_trait]
impl LocalFiles for FsLocalFiles {
    async fn open(&self, uri: &Url) -> Result<LocalStream> {
        if uri.scheme() != "file" {
            return Err(Error::unsupported(format!(
                "cannot open '{}' as a local file",
                uri
            )));
        }
        let path = uri
            .to_file_path()
            .map_err(|_| Error::invalid_argument(format!("not a file path: '{}'", uri)))?;
        if let Some(ref root) = self.root {
            if !path.starts_with(root) {
                return Err(Error::invalid_argument(format!(
                    "'{}' is outside {}",
                    path.display(),
                    root.display()
                )));
            }
        }
        let file = tokio::fs::File::open(&path).await?;
        Ok(Box::pin(file))
    }
}

/// Whether a request should be served from local storage
///
/// Decided on the URL the request was bound to, never on a redirect target.
pub fn is_local_file(result: &ReadResult, classifier: &dyn UriClassifier) -> bool {
    let bound = result.request.url.as_ref().unwrap_or(result.url());
    result.request.api_routine.is_file_download() && !classifier.is_downloadable(bound)
}

/// Read the result's URL through the local-file capability
///
/// Failures are attached to the result, which is always returned.
pub async fn download_local_file(mut result: ReadResult, files: &dyn LocalFiles) -> ReadResult {
    let what = format!("mediaUri='{}'", result.url());
    match files.open(result.url()).await {
        Ok(stream) => result.read_stream(&what, stream).await,
        Err(e) => {
            tracing::debug!(%what, error = %e, "Failed to open local file");
            result.append_to_log(format!("Failed to open {}", what));
            result.set_error(e);
            result
        }
    }
}

/// MIME type guessed from the URI's extension
pub fn guess_mime_type(uri: &Url) -> &'static str {
    let ext = uri
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// File name of the URI's last path segment
pub fn file_name(uri: &Url) -> String {
    uri.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("media")
        .to_string()
}
