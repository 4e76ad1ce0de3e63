// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # fedlink - HTTP transport for social-network clients
//!
//! Executes API requests against one server: validation, dispatch over
//! HTTP or from local storage, bounded redirects, diagnostics and JSON
//! parsing. POST requests negotiate between a modern and a legacy
//! protocol variant when the server's capabilities are not yet known.
//!
//! ## Features
//!
//! - One pipeline for every backend; credentials plug in per backend
//! - Modern/legacy protocol negotiation with a single retry
//! - Redirects followed by the pipeline, at most five hops
//! - Local `file://` downloads and multipart media upload
//! - Structured network diagnostics through a pluggable sink
//! - Settings and credentials persisted through a key/value store
//!
//! ## Example
//!
//! ```rust,no_run
//! use fedlink::{Connection, ConnectionConfig, HttpConnection, OAuth, Request, SslMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConnectionConfig::new("example.social", SslMode::Secure)?;
//!     let connection = Connection::new(config, OAuth::new("token", "secret"))?;
//!
//!     let result = connection
//!         .execute(Request::get("api/v1/timelines/home"))
//!         .await?;
//!     for note in result.json_array()? {
//!         println!("{}", note["id"]);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod http;
pub mod tristate;

// Connections
pub use connection::{
    Anonymous, BasicAuth, Connection, ConnectionConfig, ConnectionContext, CredentialStore,
    Credentials, HttpConnection, MemoryCredentialStore, OAuth, OAuthClientKeys, SslMode,
    TransportConfig,
};

// Requests and results
pub use http::{ApiRoutine, BodyFormat, ReadResult, Request};

// Transports and host capabilities
pub use http::{
    DiagnosticSink, FsLocalFiles, LocalFiles, LocalOnlyTransport, MemorySink, ReqwestTransport,
    SchemeClassifier, TracingSink, Transport, UriClassifier,
};

// Error types
pub use error::{Error, Result, StatusKind};

pub use tristate::TriState;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
