//! Session factory bound to one engine.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use asupersync::{Cx, Outcome};
use sqlscope_core::{Driver, Error, try_outcome};

use crate::config::SessionConfig;
use crate::engine::Engine;
use crate::scope::{ScopedFuture, with_session};
use crate::session::{Session, SessionCounters};

/// Snapshot of session bookkeeping for one factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Sessions handed out.
    pub opened: u64,
    /// Sessions closed, explicitly or by drop.
    pub closed: u64,
}

impl SessionStats {
    /// Sessions currently open.
    pub fn active(&self) -> u64 {
        self.opened.saturating_sub(self.closed)
    }
}

/// Manufactures sessions bound to one engine.
///
/// The factory itself is immutable; cloning it shares the engine and the
/// bookkeeping counters.
pub struct SessionFactory<D: Driver> {
    engine: Arc<Engine<D>>,
    config: SessionConfig,
    counters: Arc<SessionCounters>,
}

impl<D: Driver> SessionFactory<D> {
    /// Bind a factory to an engine.
    ///
    /// Statement echo is on if either the engine or `config` asks for it.
    pub fn new(engine: Arc<Engine<D>>, mut config: SessionConfig) -> Self {
        config.echo |= engine.options().echo;
        tracing::debug!(
            autocommit = config.autocommit,
            autoflush = config.autoflush,
            echo = config.echo,
            "Session factory configured"
        );
        Self {
            engine,
            config,
            counters: Arc::new(SessionCounters::default()),
        }
    }

    /// Open a new session over a fresh connection.
    #[tracing::instrument(level = "debug", skip(self, cx))]
    pub async fn open(&self, cx: &Cx) -> Outcome<Session<D::Conn>, Error> {
        let connection = try_outcome!(self.engine.connect(cx).await);
        let id = self.counters.next_id.fetch_add(1, Ordering::AcqRel) + 1;
        self.counters.opened.fetch_add(1, Ordering::AcqRel);

        tracing::info!(session = id, "Session opened");
        Outcome::Ok(Session::attach(
            id,
            connection,
            self.config.clone(),
            Arc::clone(&self.counters),
        ))
    }

    /// Run `body` with a fresh session and close it afterwards.
    ///
    /// See [`with_session`].
    pub async fn scope<T, F>(&self, cx: &Cx, body: F) -> Outcome<T, Error>
    where
        F: for<'s> FnOnce(&'s Cx, &'s mut Session<D::Conn>) -> ScopedFuture<'s, T>,
    {
        with_session(self, cx, body).await
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            opened: self.counters.opened.load(Ordering::Acquire),
            closed: self.counters.closed.load(Ordering::Acquire),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<Engine<D>> {
        &self.engine
    }
}

impl<D: Driver> Clone for SessionFactory<D> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            config: self.config.clone(),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<D: Driver> std::fmt::Debug for SessionFactory<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFactory")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}
