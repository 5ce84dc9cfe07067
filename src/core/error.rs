use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error reported by the GraphQL layer: the request reached the cluster and
/// came back with an `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryError {
    pub message: String,
    #[serde(default)]
    pub access_denied: bool,
}

/// Error raised before a usable response arrived (connection refused,
/// timeout, non-2xx status, unreadable body).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportError {
    pub message: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub access_denied: bool,
}

/// The two error families a gateway can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum GatewayError {
    Query(QueryError),
    Transport(TransportError),
}

impl GatewayError {
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(QueryError {
            message: message.into(),
            access_denied: false,
        })
    }

    pub fn query_access_denied(message: impl Into<String>) -> Self {
        Self::Query(QueryError {
            message: message.into(),
            access_denied: true,
        })
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(TransportError {
            message: message.into(),
            status: None,
            access_denied: false,
        })
    }

    pub fn transport_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport(TransportError {
            message: message.into(),
            status: Some(status),
            access_denied: status == 401 || status == 403,
        })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Query(err) => err.message.as_str(),
            Self::Transport(err) => err.message.as_str(),
        }
    }

    pub fn is_access_denied(&self) -> bool {
        match self {
            Self::Query(err) => err.access_denied,
            Self::Transport(err) => err.access_denied,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(err) => write!(f, "{}", err.message),
            Self::Transport(TransportError {
                message,
                status: Some(status),
                ..
            }) => write!(f, "HTTP {}: {}", status, message),
            Self::Transport(err) => write!(f, "{}", err.message),
        }
    }
}

impl std::error::Error for GatewayError {}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdminError {
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Mutation rejected: {0}")]
    MutationRejected(GatewayError),

    #[error("Query failed: {0}")]
    QueryFailed(GatewayError),

    #[error("Transport failure: {0}")]
    TransportFailure(GatewayError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl AdminError {
    /// Wraps a gateway error raised by a read query.
    pub fn from_query(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(_) => Self::TransportFailure(err),
            GatewayError::Query(_) => Self::QueryFailed(err),
        }
    }

    /// Wraps a gateway error raised by a mutation.
    pub fn from_mutation(err: GatewayError) -> Self {
        match err {
            GatewayError::Transport(_) => Self::TransportFailure(err),
            GatewayError::Query(_) => Self::MutationRejected(err),
        }
    }

    /// The gateway error this failure carries, with its family intact.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::MutationRejected(err) | Self::QueryFailed(err) | Self::TransportFailure(err) => {
                Some(err)
            }
            _ => None,
        }
    }

    pub fn is_access_denied(&self) -> bool {
        self.gateway_error()
            .map(GatewayError::is_access_denied)
            .unwrap_or(false)
    }

    /// Text suitable for showing to an operator next to the failed control.
    pub fn user_message(&self) -> String {
        match self {
            Self::MutationRejected(err) | Self::QueryFailed(err) => err.message().to_string(),
            Self::TransportFailure(err) => format!("Request failed: {}", err),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;

impl<T> From<std::sync::PoisonError<T>> for AdminError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
