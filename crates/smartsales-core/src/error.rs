//! Error types for SmartSales365

use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when the backend cannot be reached at all
pub const NETWORK_ERROR_MESSAGE: &str =
    "No se pudo conectar al servidor. Revisa tu conexión y la URL del API.";

/// Classification shared by list and export failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request never reached the server or no response arrived
    Network,
    /// Non-2xx response from the backend
    Server,
    /// 2xx response whose body did not have the expected shape
    Decode,
    /// Export requested with zero rows
    EmptyExport,
    /// Export destination could not be created
    SinkUnavailable,
    /// An export is already running for this trigger
    ExportInProgress,
    /// A superseded fetch result was dropped
    StaleResponseDiscarded,
    /// Caller supplied an invalid value
    InvalidArgument,
    /// Configuration could not be read or is incomplete
    Config,
    /// Local filesystem failure
    Io,
}

impl ErrorKind {
    /// Whether the error should ever reach a banner or notice
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, ErrorKind::StaleResponseDiscarded)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {}", .body.message())]
    Server { status: u16, body: ServerErrorBody },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Response discarded: a newer request superseded it")]
    StaleResponseDiscarded,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) => ErrorKind::Network,
            Error::Server { .. } => ErrorKind::Server,
            Error::Decode(_) => ErrorKind::Decode,
            Error::StaleResponseDiscarded => ErrorKind::StaleResponseDiscarded,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::Network(_) => "NetworkError",
            Error::Server { .. } => "ServerError",
            Error::Decode(_) => "DecodeError",
            Error::StaleResponseDiscarded => "StaleResponseDiscarded",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::Config(_) => "ConfigError",
        }
    }

    /// Text suitable for an error banner
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            Error::Server { body, .. } => body.message(),
            other => other.to_string(),
        }
    }

    /// Build a server error from a raw response body
    pub fn server(status: u16, text: &str) -> Self {
        Error::Server {
            status,
            body: ServerErrorBody::from_text(status, text),
        }
    }
}

/// Normalized backend error payload
///
/// Django REST style backends answer either `{"detail": "..."}` or a mapping
/// of field names to message lists (possibly nested one level, e.g. a
/// `profile` object). Every shape is folded into one of these variants once,
/// at the transport boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerErrorBody {
    /// Top-level `detail` string
    Detail(String),
    /// Field-keyed validation messages, in body order
    FieldErrors(Vec<(String, String)>),
    /// Anything else (plain text, HTML error pages, empty bodies)
    Other(String),
}

impl ServerErrorBody {
    /// Normalize a response body that may or may not be JSON
    ///
    /// Bodies that carry no message (`""`, `{}`, `[]`, `null`) fall back to
    /// the status line.
    pub fn from_text(status: u16, text: &str) -> Self {
        let fallback = || ServerErrorBody::Other(format!("Request failed with status {}", status));

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return fallback();
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => {
                let body = Self::from_json(&value);
                if body.message().trim().is_empty() {
                    fallback()
                } else {
                    body
                }
            }
            Err(_) => ServerErrorBody::Other(trimmed.to_string()),
        }
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(detail)) = map.get("detail") {
                    return ServerErrorBody::Detail(detail.clone());
                }

                let fields: Vec<(String, String)> = map
                    .iter()
                    .map(|(key, value)| (key.clone(), flatten_messages(value, 0)))
                    .collect();

                if fields.is_empty() {
                    ServerErrorBody::Other(String::new())
                } else {
                    ServerErrorBody::FieldErrors(fields)
                }
            }
            Value::String(s) => ServerErrorBody::Other(s.clone()),
            other => ServerErrorBody::Other(flatten_messages(other, 1)),
        }
    }

    /// Single-line message, e.g. `"email: ya existe; profile: telefono: inválido"`
    pub fn message(&self) -> String {
        match self {
            ServerErrorBody::Detail(detail) => detail.clone(),
            ServerErrorBody::FieldErrors(fields) => fields
                .iter()
                .map(|(field, message)| format!("{}: {}", field, message))
                .collect::<Vec<_>>()
                .join("; "),
            ServerErrorBody::Other(text) => text.clone(),
        }
    }
}

/// Arrays join with spaces; objects recurse one level as `key: message`.
fn flatten_messages(value: &Value, depth: usize) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| flatten_messages(item, depth + 1))
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(map) if depth == 0 => map
            .iter()
            .map(|(key, value)| format!("{}: {}", key, flatten_messages(value, depth + 1)))
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(map) => map
            .values()
            .map(|value| flatten_messages(value, depth + 1))
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
