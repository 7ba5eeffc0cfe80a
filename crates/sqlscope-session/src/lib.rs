//! Engine, session factory and unit-of-work sessions for sqlscope.
//!
//! The pieces stack up the same way at every call site:
//!
//! - [`Engine`] owns a [`Driver`](sqlscope_core::Driver) and the parsed
//!   connection URL. It is built once at startup and shared by `Arc`.
//! - [`SessionFactory`] is bound to one engine and a [`SessionConfig`]
//!   (autocommit and autoflush both off by default). It manufactures sessions.
//! - [`Session`] is an exclusively-owned unit of work over one connection.
//! - [`with_session`] opens a session, hands it to a body, and closes it on
//!   every exit path.
//!
//! # Example
//!
//! ```ignore
//! let engine = Arc::new(Engine::from_url(driver, "postgresql://localhost/app", EngineOptions::default())?);
//! let factory = SessionFactory::new(Arc::clone(&engine), SessionConfig::default());
//!
//! let outcome = with_session(&factory, &cx, |cx, session| {
//!     Box::pin(async move {
//!         try_outcome!(session.execute(cx, "UPDATE heroes SET age = age + 1", &[]).await);
//!         session.commit(cx).await
//!     })
//! })
//! .await;
//! ```

pub mod config;
pub mod engine;
pub mod factory;
pub mod scope;
pub mod session;

#[cfg(test)]
mod mock;

pub use config::SessionConfig;
pub use engine::{Engine, EngineOptions};
pub use factory::{SessionFactory, SessionStats};
pub use scope::{ScopedFuture, with_session};
pub use session::{Session, SessionDebugInfo, SessionState, StagedStatement};
