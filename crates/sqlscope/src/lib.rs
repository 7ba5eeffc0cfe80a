//! sqlscope: one engine per process, one session per unit of work.
//!
//! `sqlscope` is the **user-facing facade** of the workspace. It wires the
//! contract types from `sqlscope-core` and the engine and session machinery
//! from `sqlscope-session` into a single [`SessionProvider`] built from
//! [`Settings`] at startup.
//!
//! # Role In The Architecture
//!
//! - **Startup**: [`Settings`] come from the environment or a JSON document;
//!   [`SessionProvider::initialize`] validates the URL and builds the engine.
//! - **Models**: application tables implement [`Model`] and are registered in
//!   an explicit [`ModelRegistry`] handed to the provider.
//! - **Requests**: [`SessionProvider::acquire_session`] opens a fresh session,
//!   lends it to the handler, and closes it on every exit path.
//!
//! # Example
//!
//! ```ignore
//! use sqlscope::prelude::*;
//!
//! let registry = ModelRegistry::new().with::<Hero>()?;
//! let provider = SessionProvider::initialize(driver, Settings::from_env()?, registry)?;
//!
//! let rows = provider
//!     .acquire_session(&cx, |cx, session| {
//!         Box::pin(async move { session.query(cx, "SELECT id, name FROM heroes", &[]).await })
//!     })
//!     .await;
//!
//! provider.shutdown();
//! ```

pub mod config;
pub mod provider;

pub use config::Settings;
pub use provider::SessionProvider;

pub use sqlscope_core::{
    Budget, ColumnInfo, ConfigError, ConfigErrorKind, Connection, ConnectionError,
    ConnectionErrorKind, Cx, DatabaseUrl, Driver, Error, FieldInfo, Model, ModelRegistry, Outcome,
    QueryError, QueryErrorKind, RegistryError, RegistryErrorKind, Result, Row, SessionError,
    SessionErrorKind, TableInfo, Value, try_outcome,
};
pub use sqlscope_session::{
    Engine, EngineOptions, ScopedFuture, Session, SessionConfig, SessionDebugInfo, SessionFactory,
    SessionState, SessionStats, StagedStatement, with_session,
};

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        Connection, Cx, DatabaseUrl, Driver, Engine, EngineOptions, Error, FieldInfo, Model,
        ModelRegistry, Outcome, Result, Row, ScopedFuture, Session, SessionConfig, SessionFactory,
        SessionProvider, Settings, Value, try_outcome,
    };
}
