//! Core types and traits for sqlscope.
//!
//! `sqlscope-core` is the **contract layer** of the workspace. It defines the
//! traits and data types the session and facade crates build on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: `Connection` and `Driver` are implemented by database
//!   drivers; `Model` is implemented by application table types.
//! - **Data model**: `Row` and `Value` carry statement inputs and outputs.
//! - **Configuration input**: `DatabaseUrl` parses and validates the
//!   connection string handed over at startup.
//! - **Metadata**: `ModelRegistry` is the explicit table registry populated by
//!   model definitions at startup.
//! - **Structured concurrency**: re-exports `Cx` and `Outcome` from asupersync so
//!   every async database operation is cancel-correct.
//!
//! Most applications should use the `sqlscope` facade; reach for
//! `sqlscope-core` directly when writing drivers.

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Budget, Cx, Outcome};

pub mod connection;
pub mod error;
pub mod model;
pub mod registry;
pub mod row;
pub mod url;
pub mod value;

pub use connection::{Connection, Driver};
pub use error::{
    ConfigError, ConfigErrorKind, ConnectionError, ConnectionErrorKind, Error, QueryError,
    QueryErrorKind, RegistryError, RegistryErrorKind, Result, SessionError, SessionErrorKind,
};
pub use model::{FieldInfo, Model};
pub use registry::{ColumnInfo, ModelRegistry, TableInfo};
pub use row::Row;
pub use url::DatabaseUrl;
pub use value::Value;

/// Unwrap an `Outcome::Ok`, returning any other variant from the enclosing
/// async function unchanged.
#[macro_export]
macro_rules! try_outcome {
    ($expr:expr) => {
        match $expr {
            $crate::Outcome::Ok(value) => value,
            $crate::Outcome::Err(e) => return $crate::Outcome::Err(e),
            $crate::Outcome::Cancelled(reason) => return $crate::Outcome::Cancelled(reason),
            $crate::Outcome::Panicked(payload) => return $crate::Outcome::Panicked(payload),
        }
    };
}
