use thiserror::Error;

/// Unified error type for connection handles and the registry
#[derive(Error, Debug)]
pub enum KvError {
    /// One or more required connection parameters are missing
    #[error("Error with connection parameters: missing {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    /// `connect` was called before the parameters were validated
    #[error("Connection failed: parameters have not been validated")]
    NotValidated,

    /// The transport could not be opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A connection with this name is already registered
    #[error("There is already a connection defined with the name '{0}'")]
    DuplicateName(String),

    /// No connection with this name, and no parameters to create one
    #[error("No connection with the name '{0}' was found, and no parameters to create a new connection were provided")]
    NotFound(String),

    /// A query was issued against a handle that is not connected
    #[error("Query failed: not connected")]
    NotConnected,

    /// Invalid query arguments
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The store rejected or failed the command
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Connect or query did not complete in time
    #[error("{operation} timed out after {millis}ms")]
    Timeout {
        operation: &'static str,
        millis: u64,
    },

    /// JSON encoding/decoding of a stored value failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse error categories callers react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Connection,
    DuplicateName,
    NotFound,
    Query,
}

impl KvError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KvError::Validation { .. } => ErrorKind::Validation,
            KvError::NotValidated | KvError::ConnectionFailed(_) => ErrorKind::Connection,
            KvError::Timeout { operation, .. } if *operation == "connect" => ErrorKind::Connection,
            KvError::DuplicateName(_) => ErrorKind::DuplicateName,
            KvError::NotFound(_) => ErrorKind::NotFound,
            KvError::NotConnected
            | KvError::InvalidQuery(_)
            | KvError::QueryFailed(_)
            | KvError::Timeout { .. }
            | KvError::Serialization(_) => ErrorKind::Query,
        }
    }

    /// Create a connection failure with custom message
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        KvError::ConnectionFailed(msg.into())
    }

    /// Create a query failure with custom message
    pub fn query_failed(msg: impl Into<String>) -> Self {
        KvError::QueryFailed(msg.into())
    }

    /// Create an invalid query error
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        KvError::InvalidQuery(msg.into())
    }
}

impl From<serde_json::Error> for KvError {
    fn from(error: serde_json::Error) -> Self {
        KvError::Serialization(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KvError>;
