//! Application-wide session provider.
//!
//! One [`SessionProvider`] is built at startup and shared for the life of the
//! process. It owns the engine, the session factory, and the model registry,
//! and hands each unit of work its own session through
//! [`SessionProvider::acquire_session`].

use std::sync::Arc;

use asupersync::{Cx, Outcome};
use sqlscope_core::{Driver, Error, ModelRegistry, Result};
use sqlscope_session::{Engine, EngineOptions, ScopedFuture, Session, SessionFactory, with_session};

use crate::config::Settings;

/// Owns the engine and session factory for one database.
pub struct SessionProvider<D: Driver> {
    settings: Settings,
    factory: SessionFactory<D>,
    registry: Arc<ModelRegistry>,
}

impl<D: Driver> SessionProvider<D> {
    /// Build the engine and session factory from `settings`.
    ///
    /// Fails if the URL does not parse or names a backend `driver` does not
    /// serve. No connection is opened here.
    pub fn initialize(driver: D, settings: Settings, registry: ModelRegistry) -> Result<Self> {
        let url = settings.url()?;
        let engine = Engine::new(
            driver,
            url,
            EngineOptions {
                echo: settings.echo,
            },
        )?;
        let factory = SessionFactory::new(Arc::new(engine), settings.session_config());

        tracing::info!(
            url = %sqlscope_core::url::redact(&settings.database_url),
            tables = registry.len(),
            autocommit = settings.autocommit,
            autoflush = settings.autoflush,
            "Session provider initialized"
        );

        Ok(Self {
            settings,
            factory,
            registry: Arc::new(registry),
        })
    }

    /// [`initialize`](Self::initialize) with settings read from the environment.
    pub fn from_env(driver: D, registry: ModelRegistry) -> Result<Self> {
        Self::initialize(driver, Settings::from_env()?, registry)
    }

    /// Run `body` with a fresh session that is closed when it finishes.
    ///
    /// ```rust,ignore
    /// let heroes = provider
    ///     .acquire_session(&cx, |cx, session| {
    ///         Box::pin(async move { session.query(cx, "SELECT * FROM heroes", &[]).await })
    ///     })
    ///     .await;
    /// ```
    pub async fn acquire_session<T, F>(&self, cx: &Cx, body: F) -> Outcome<T, Error>
    where
        F: for<'s> FnOnce(&'s Cx, &'s mut Session<D::Conn>) -> ScopedFuture<'s, T>,
    {
        with_session(&self.factory, cx, body).await
    }

    /// Dispose the engine. Later acquisitions fail.
    ///
    /// Returns `false` if the engine was already disposed.
    pub fn shutdown(&self) -> bool {
        let disposed = self.factory.engine().dispose();
        if disposed {
            let stats = self.factory.stats();
            tracing::info!(
                opened = stats.opened,
                active = stats.active(),
                "Session provider shut down"
            );
        }
        disposed
    }

    pub fn engine(&self) -> &Arc<Engine<D>> {
        self.factory.engine()
    }

    pub fn session_factory(&self) -> &SessionFactory<D> {
        &self.factory
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl<D: Driver> std::fmt::Debug for SessionProvider<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionProvider")
            .field("settings", &self.settings)
            .field("factory", &self.factory)
            .field("tables", &self.registry.len())
            .finish()
    }
}
