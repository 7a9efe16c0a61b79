use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// The error type for docpost operations.
///
/// Every error carries an [`ErrorKind`] for branching, a human readable
/// message and an ordered list of context pairs (the failed operation, the
/// target uri, the archive reference or batch uuid, ...).
#[derive(Error, Debug)]
#[error("{message}{}", render_context(.status, .context))]
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: Option<StatusCode>,
    context: Vec<(&'static str, String)>,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Certificate container is malformed, the passphrase is wrong or no key is present.
    KeyLoad,

    /// The signature primitive rejected the key or the input.
    Signing,

    /// Committing an archive failed; the builder is gone and must be rebuilt.
    ArchiveSend,

    /// Attempted transition out of a terminal batch state.
    InvalidBatchState,

    /// A batch with the same uuid already exists.
    DuplicateBatch,

    /// The requested resource does not exist.
    NotFound,

    /// Network failure or unexpected response from the server.
    Transport,

    /// Request cannot be built or signed (missing required fields, etc.)
    RequestInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Unexpected errors (I/O, decoding, etc.)
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            context: Vec::new(),
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach the http status returned by the server.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Append a context pair such as `("operation", "archive.send")`.
    ///
    /// Never pass secrets here: context is part of the display output.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Same as [`Error::with_context`] with key `operation`.
    pub fn with_operation(self, operation: &'static str) -> Self {
        self.with_context("operation", operation)
    }

    /// Re-tag this error with another kind while keeping message, status and context.
    ///
    /// Used to surface transport failures as the operation level error kind,
    /// for example [`ErrorKind::ArchiveSend`].
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the http status returned by the server, if the failure came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Get the context value recorded for `key`.
    pub fn context(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The server answered with a 5xx status.
    pub fn is_server_error(&self) -> bool {
        self.status.is_some_and(|s| s.is_server_error())
    }

    /// The server rejected the request with a 4xx status.
    pub fn is_client_error(&self) -> bool {
        self.status.is_some_and(|s| s.is_client_error())
    }
}

// Convenience constructors
impl Error {
    /// Create a key load error
    pub fn key_load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyLoad, message)
    }

    /// Create a signing error
    pub fn signing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Signing, message)
    }

    /// Create an archive send error
    pub fn archive_send(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArchiveSend, message)
    }

    /// Create an invalid batch state error
    pub fn invalid_batch_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidBatchState, message)
    }

    /// Create a duplicate batch error
    pub fn duplicate_batch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateBatch, message)
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

fn render_context(status: &Option<StatusCode>, context: &[(&'static str, String)]) -> String {
    let mut s = String::new();
    if let Some(status) = status {
        s.push_str(&format!(", status: {}", status.as_u16()));
    }
    for (k, v) in context {
        s.push_str(&format!(", {k}: {v}"));
    }
    s
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::KeyLoad => write!(f, "key load failed"),
            ErrorKind::Signing => write!(f, "signing failed"),
            ErrorKind::ArchiveSend => write!(f, "archive send failed"),
            ErrorKind::InvalidBatchState => write!(f, "invalid batch state"),
            ErrorKind::DuplicateBatch => write!(f, "duplicate batch"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Transport => write!(f, "transport failure"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
