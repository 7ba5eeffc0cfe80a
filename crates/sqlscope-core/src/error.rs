//! Error types for sqlscope.
//!
//! Every fallible operation in the workspace reports a single [`Error`] enum.
//! Each variant wraps a structured sub-error carrying a `kind` so callers can
//! branch on the failure class without parsing messages.

use std::error::Error as StdError;
use std::fmt;

/// Boxed source error attached to connection and query failures.
pub type BoxedSource = Box<dyn StdError + Send + Sync>;

/// Result alias used by synchronous operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type.
#[derive(Debug)]
pub enum Error {
    /// Failure establishing, using, or releasing a database connection.
    Connection(ConnectionError),
    /// Failure reported by the database while running a statement.
    Query(QueryError),
    /// Invalid or missing configuration.
    Config(ConfigError),
    /// Misuse of a session, or a failure while closing one.
    Session(SessionError),
    /// Invalid model registration.
    Registry(RegistryError),
    /// Driver-specific failure with no better classification.
    Custom(String),
}

impl Error {
    /// Create an `Error::Custom` from any displayable message.
    pub fn custom(message: impl Into<String>) -> Self {
        Error::Custom(message.into())
    }

    /// Whether this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Whether this error came from using an already-closed session.
    pub fn is_session_closed(&self) -> bool {
        matches!(
            self,
            Error::Session(SessionError {
                kind: SessionErrorKind::Closed,
                ..
            })
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "connection error: {}", e),
            Error::Query(e) => write!(f, "query error: {}", e),
            Error::Config(e) => write!(f, "configuration error: {}", e),
            Error::Session(e) => write!(f, "session error: {}", e),
            Error::Registry(e) => write!(f, "registry error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Connection(e) => e.source.as_deref().map(|s| s as &(dyn StdError + 'static)),
            Error::Query(e) => e.source.as_deref().map(|s| s as &(dyn StdError + 'static)),
            _ => None,
        }
    }
}

// ============================================================================
// Connection Errors
// ============================================================================

/// Class of connection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Could not establish a connection.
    Connect,
    /// The server rejected the credentials.
    Authentication,
    /// An established connection was lost.
    Disconnected,
    /// Failure while closing the connection.
    Close,
    /// The engine was disposed; no new connections are handed out.
    Disposed,
}

/// Failure establishing, using, or releasing a connection.
#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<BoxedSource>,
}

impl ConnectionError {
    pub fn new(kind: ConnectionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

// ============================================================================
// Query Errors
// ============================================================================

/// Class of statement failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// The statement could not be parsed.
    Syntax,
    /// A constraint (unique, foreign key, check) was violated.
    Constraint,
    /// Serialization failure or deadlock.
    Serialization,
    /// Any other database-reported failure.
    Database,
}

/// Failure reported by the database while running a statement.
#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<BoxedSource>,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            sql: None,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the statement that failed.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sql {
            Some(sql) => write!(f, "{} (sql: {})", self.message, sql),
            None => write!(f, "{}", self.message),
        }
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Class of configuration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// A required value was not supplied.
    Missing,
    /// The connection URL is malformed.
    InvalidUrl,
    /// The URL names a backend the driver does not serve.
    UnsupportedScheme,
    /// A value could not be parsed (boolean flag, JSON document).
    InvalidValue,
}

/// Invalid or missing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::InvalidUrl, message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

// ============================================================================
// Session Errors
// ============================================================================

/// Class of session failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// The session was already closed.
    Closed,
}

/// Misuse of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: String,
}

impl SessionError {
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn closed(session_id: u64) -> Self {
        Self::new(
            SessionErrorKind::Closed,
            format!("session {} is closed", session_id),
        )
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        Error::Session(err)
    }
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Class of model registration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryErrorKind {
    /// The model declares an empty table name.
    EmptyTableName,
    /// The model declares no fields.
    NoFields,
    /// A primary-key column is not among the model's fields.
    UnknownPrimaryKey,
    /// Another model already registered the same table.
    DuplicateTable,
}

/// Invalid model registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryError {
    pub kind: RegistryErrorKind,
    pub table: String,
    pub message: String,
}

impl RegistryError {
    pub fn new(kind: RegistryErrorKind, table: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            table: table.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table \"{}\": {}", self.table, self.message)
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Error::Registry(err)
    }
}
