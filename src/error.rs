// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for fedlink
//!
//! Every pipeline stage attaches one of these to the request's
//! [`ReadResult`](crate::http::ReadResult) instead of returning early, so the
//! variants carry enough context (URL, status line, headers) for higher
//! layers to render a message without the original response.

use std::fmt;

use thiserror::Error;

/// Result type alias for fedlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fedlink
#[derive(Error, Debug)]
pub enum Error {
    /// Request rejected before any I/O
    #[error("Invalid request '{log_name}': {reason}")]
    Validation { log_name: String, reason: String },

    /// HTTP client failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Transport failure not raised by the HTTP client itself
    #[error("Transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The server broke the protocol (e.g. moved without a location)
    #[error("Protocol error ({kind}) for {url}: {reason}")]
    Protocol {
        kind: StatusKind,
        url: String,
        reason: String,
    },

    /// Non-success HTTP status
    #[error("{status_line} ({kind}) from {url}")]
    HttpStatus {
        status: u16,
        kind: StatusKind,
        url: String,
        status_line: String,
        headers: Vec<(String, String)>,
        body: String,
    },

    /// Response body could not be converted to the expected structure
    #[error("Failed to parse response from {url}: {reason}")]
    Parse { url: String, reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation not available on this connection
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// API misuse by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Classification of HTTP statuses as the social-network layer sees them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Ok,
    Moved,
    BadRequest,
    AuthenticationError,
    Forbidden,
    NotFound,
    LengthRequired,
    RequestEntityTooLarge,
    ClientError,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
    ServerError,
    Unknown,
}

impl StatusKind {
    /// Classify a numeric HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => StatusKind::Ok,
            301 | 302 | 303 | 307 | 308 => StatusKind::Moved,
            400 => StatusKind::BadRequest,
            401 => StatusKind::AuthenticationError,
            403 => StatusKind::Forbidden,
            404 => StatusKind::NotFound,
            411 => StatusKind::LengthRequired,
            413 => StatusKind::RequestEntityTooLarge,
            400..=499 => StatusKind::ClientError,
            500 => StatusKind::InternalServerError,
            502 => StatusKind::BadGateway,
            503 => StatusKind::ServiceUnavailable,
            500..=599 => StatusKind::ServerError,
            _ => StatusKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Ok => "OK",
            StatusKind::Moved => "MOVED",
            StatusKind::BadRequest => "BAD_REQUEST",
            StatusKind::AuthenticationError => "AUTHENTICATION_ERROR",
            StatusKind::Forbidden => "FORBIDDEN",
            StatusKind::NotFound => "NOT_FOUND",
            StatusKind::LengthRequired => "LENGTH_REQUIRED",
            StatusKind::RequestEntityTooLarge => "REQUEST_ENTITY_TOO_LARGE",
            StatusKind::ClientError => "CLIENT_ERROR",
            StatusKind::InternalServerError => "INTERNAL_SERVER_ERROR",
            StatusKind::BadGateway => "BAD_GATEWAY",
            StatusKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            StatusKind::ServerError => "SERVER_ERROR",
            StatusKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Create a validation error
    pub fn validation(log_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            log_name: log_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a transport error
    pub fn transport(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Transport {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(kind: StatusKind, url: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Protocol {
            kind,
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Redirect-class response that carried no `Location` header
    pub fn moved_without_location(url: impl Into<String>) -> Self {
        Error::protocol(
            StatusKind::Moved,
            url,
            "No 'Location' header on MOVED response",
        )
    }

    /// Create a parse error
    pub fn parse(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::Parse {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create an invalid-argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if the request was rejected before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Check if this is a transport-level failure
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Io(_) | Error::Transport { .. })
    }

    /// Check if a later attempt could succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Transport { .. } => true,
            Error::HttpStatus { kind, .. } => matches!(
                kind,
                StatusKind::InternalServerError
                    | StatusKind::BadGateway
                    | StatusKind::ServiceUnavailable
                    | StatusKind::ServerError
            ),
            _ => false,
        }
    }

    /// Programming errors the caller should not retry or mask
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get the status classification if available
    pub fn status_kind(&self) -> Option<StatusKind> {
        match self {
            Error::HttpStatus { kind, .. } | Error::Protocol { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Get URL if available
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::Transport { url, .. }
            | Error::Protocol { url, .. }
            | Error::HttpStatus { url, .. }
            | Error::Parse { url, .. } => Some(url),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Prefix the error with an operation description
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            Error::Other(format!("{}: {}", msg, err))
        })
    }
}
