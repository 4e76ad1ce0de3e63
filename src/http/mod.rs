// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request execution layer
//!
//! Requests are validated, dispatched over a [`Transport`] or read from
//! local storage, redirected, logged and parsed. POSTs negotiate between
//! the modern and the legacy protocol variant.

mod diagnostics;
pub(crate) mod executor;
mod local;
pub(crate) mod negotiator;
mod redirect;
mod request;
mod result;
mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use diagnostics::{
    post_payload, response_payload, DiagnosticKind, DiagnosticRecord, DiagnosticSink, MemorySink,
    TracingSink,
};
pub use local::{
    download_local_file, file_name, guess_mime_type, is_local_file, FsLocalFiles, LocalFiles,
    LocalStream, SchemeClassifier, UriClassifier,
};
pub use redirect::on_moved;
pub use request::{ApiRoutine, BodyFormat, Request};
pub use result::ReadResult;
pub use transport::{LocalOnlyTransport, MediaPart, ReqwestTransport, Transport};

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("fedlink/", env!("CARGO_PKG_VERSION"));

/// Redirect hops followed before giving up
pub const MAX_REDIRECT_HOPS: usize = 5;

/// Header names used by the pipeline
pub mod headers {
    pub const ACCEPT: &str = "accept";
    pub const AUTHORIZATION: &str = "authorization";
    pub const CONNECTION: &str = "connection";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const LOCATION: &str = "location";
}
