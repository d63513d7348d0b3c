//! Error types for notewise - thin wrapper over transport and decoding errors

use miette::Diagnostic;

/// Errors from the remote notes API.
///
/// The variants exist for logging and diagnostics. UI layers never branch on
/// them: every variant collapses to a single "operation failed" notification.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ApiError {
    /// Connection, TLS, timeout or body read failure
    #[error("transport error: {0}")]
    #[diagnostic(code(notewise::api::transport))]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("server responded with {status}: {body}")]
    #[diagnostic(code(notewise::api::status))]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error(transparent)]
    #[diagnostic(code(notewise::api::decode))]
    Decode(#[from] serde_json::Error),

    /// Endpoint could not be turned into a request URL
    #[error("invalid endpoint: {0}")]
    #[diagnostic(
        code(notewise::api::endpoint),
        help("set NOTEWISE_API_URL or pass --endpoint with an absolute http(s) URL")
    )]
    InvalidEndpoint(String),
}

impl ApiError {
    /// Status code for `Status` errors, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Build a status error, e.g. from a fake collaborator in tests.
    pub fn status_error(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

/// Errors raised before a note is sent upstream.
#[derive(thiserror::Error, Debug, Diagnostic, PartialEq, Eq)]
pub enum NoteValidationError {
    #[error("note title must not be blank")]
    #[diagnostic(code(notewise::note::missing_title))]
    MissingTitle,
}

/// Configuration load/save failures.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(code(notewise::config::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(notewise::config::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(notewise::config::toml))]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    #[diagnostic(code(notewise::config::toml))]
    TomlSer(#[from] toml::ser::Error),

    #[error("unsupported config format: {0}")]
    #[diagnostic(
        code(notewise::config::format),
        help("use a .json or .toml file extension")
    )]
    UnsupportedFormat(String),

    #[error("invalid value for {key}: {value}")]
    #[diagnostic(code(notewise::config::env))]
    InvalidValue { key: &'static str, value: String },
}
