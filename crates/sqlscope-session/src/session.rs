//! The unit-of-work session.
//!
//! A `Session` owns one connection for the duration of one unit of work.
//!
//! # Design Philosophy
//!
//! - **Explicit over implicit**: no autoflush and no autocommit by default;
//!   staged statements are sent on `flush` or `commit`, and the transaction
//!   begun by the first statement must be committed explicitly.
//! - **Ownership clarity**: the session owns the connection and nothing else
//!   can reach it.
//! - **Closed exactly once**: `close` releases the connection; if the session
//!   is dropped first, `Drop` releases it instead. Either way the close is
//!   counted once.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use asupersync::{Cx, Outcome};
use sqlscope_core::error::SessionError;
use sqlscope_core::{Connection, Error, Result, Row, Value, try_outcome};

use crate::config::SessionConfig;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Holding a connection.
    Open,
    /// Connection released; every operation fails.
    Closed,
}

/// A statement queued for the next flush.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Open/close bookkeeping shared by a factory and the sessions it creates.
#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    pub(crate) next_id: AtomicU64,
    pub(crate) opened: AtomicU64,
    pub(crate) closed: AtomicU64,
}

/// The Session is the unit-of-work manager for one connection.
pub struct Session<C: Connection> {
    id: u64,
    /// `None` once the session is closed.
    connection: Option<C>,
    config: SessionConfig,
    in_transaction: bool,
    pending: Vec<StagedStatement>,
    counters: Arc<SessionCounters>,
}

impl<C: Connection> Session<C> {
    /// Create a standalone session over an existing connection.
    pub fn new(connection: C) -> Self {
        Self::with_config(connection, SessionConfig::default())
    }

    /// Create a standalone session with custom configuration.
    pub fn with_config(connection: C, config: SessionConfig) -> Self {
        let counters = Arc::new(SessionCounters::default());
        counters.next_id.store(1, Ordering::Relaxed);
        counters.opened.store(1, Ordering::Relaxed);
        Self::attach(1, connection, config, counters)
    }

    pub(crate) fn attach(
        id: u64,
        connection: C,
        config: SessionConfig,
        counters: Arc<SessionCounters>,
    ) -> Self {
        Self {
            id,
            connection: Some(connection),
            config,
            in_transaction: false,
            pending: Vec::new(),
            counters,
        }
    }

    /// Identifier, unique among sessions of one factory.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if self.connection.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    /// The underlying connection, while the session is open.
    pub fn connection(&self) -> Option<&C> {
        self.connection.as_ref()
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Number of staged statements waiting for flush.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> &[StagedStatement] {
        &self.pending
    }

    // ========================================================================
    // Unit of Work
    // ========================================================================

    /// Queue a statement to be sent on the next flush.
    pub fn stage(&mut self, sql: impl Into<String>, params: Vec<Value>) -> Result<()> {
        if self.is_closed() {
            return Err(SessionError::closed(self.id).into());
        }
        let sql = sql.into();
        tracing::debug!(session = self.id, sql = %sql, "Staged statement");
        self.pending.push(StagedStatement { sql, params });
        Ok(())
    }

    /// Send staged statements in order.
    ///
    /// Begins a transaction first when autocommit is off. This does NOT
    /// commit. If a statement fails, it and every statement after it stay
    /// staged.
    #[tracing::instrument(level = "debug", skip(self, cx))]
    pub async fn flush(&mut self, cx: &Cx) -> Outcome<(), Error> {
        if self.is_closed() {
            return Outcome::Err(SessionError::closed(self.id).into());
        }
        if self.pending.is_empty() {
            return Outcome::Ok(());
        }
        if !self.config.autocommit {
            try_outcome!(self.begin(cx).await);
        }

        let start = std::time::Instant::now();
        let mut staged = std::mem::take(&mut self.pending);
        let conn = match open_connection(&self.connection, self.id) {
            Ok(conn) => conn,
            Err(e) => return Outcome::Err(e),
        };

        let mut sent = 0;
        while sent < staged.len() {
            let stmt = &staged[sent];
            log_statement(self.config.echo, self.id, &stmt.sql);
            let outcome = conn.execute(cx, &stmt.sql, &stmt.params).await;
            match outcome {
                Outcome::Ok(_) => sent += 1,
                Outcome::Err(e) => {
                    self.pending = staged.split_off(sent);
                    return Outcome::Err(e);
                }
                Outcome::Cancelled(r) => {
                    self.pending = staged.split_off(sent);
                    return Outcome::Cancelled(r);
                }
                Outcome::Panicked(p) => {
                    self.pending = staged.split_off(sent);
                    return Outcome::Panicked(p);
                }
            }
        }

        tracing::info!(
            session = self.id,
            statements = sent,
            elapsed_ms = start.elapsed().as_millis(),
            "Flush completed"
        );
        Outcome::Ok(())
    }

    /// Run a statement and return the number of affected rows.
    #[tracing::instrument(level = "debug", skip(self, cx, params))]
    pub async fn execute(&mut self, cx: &Cx, sql: &str, params: &[Value]) -> Outcome<u64, Error> {
        try_outcome!(self.prepare_statement(cx).await);
        let conn = match open_connection(&self.connection, self.id) {
            Ok(conn) => conn,
            Err(e) => return Outcome::Err(e),
        };
        log_statement(self.config.echo, self.id, sql);
        conn.execute(cx, sql, params).await
    }

    /// Run a statement that returns rows.
    #[tracing::instrument(level = "debug", skip(self, cx, params))]
    pub async fn query(
        &mut self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> Outcome<Vec<Row>, Error> {
        try_outcome!(self.prepare_statement(cx).await);
        let conn = match open_connection(&self.connection, self.id) {
            Ok(conn) => conn,
            Err(e) => return Outcome::Err(e),
        };
        log_statement(self.config.echo, self.id, sql);
        conn.query(cx, sql, params).await
    }

    /// Autoflush and auto-begin ahead of a direct statement.
    async fn prepare_statement(&mut self, cx: &Cx) -> Outcome<(), Error> {
        if self.is_closed() {
            return Outcome::Err(SessionError::closed(self.id).into());
        }
        if self.config.autoflush {
            try_outcome!(self.flush(cx).await);
        }
        if !self.config.autocommit {
            try_outcome!(self.begin(cx).await);
        }
        Outcome::Ok(())
    }

    // ========================================================================
    // Transaction Management
    // ========================================================================

    /// Begin a transaction. No-op if one is already open.
    #[tracing::instrument(level = "debug", skip(self, cx))]
    pub async fn begin(&mut self, cx: &Cx) -> Outcome<(), Error> {
        if self.in_transaction {
            return Outcome::Ok(());
        }
        let conn = match open_connection(&self.connection, self.id) {
            Ok(conn) => conn,
            Err(e) => return Outcome::Err(e),
        };

        tracing::info!(session = self.id, "Beginning transaction");
        try_outcome!(conn.execute(cx, "BEGIN", &[]).await);
        self.in_transaction = true;
        Outcome::Ok(())
    }

    /// Flush staged statements and commit the current transaction.
    #[tracing::instrument(level = "debug", skip(self, cx))]
    pub async fn commit(&mut self, cx: &Cx) -> Outcome<(), Error> {
        try_outcome!(self.flush(cx).await);

        if self.in_transaction {
            let conn = match open_connection(&self.connection, self.id) {
                Ok(conn) => conn,
                Err(e) => return Outcome::Err(e),
            };
            tracing::info!(session = self.id, "Committing transaction");
            try_outcome!(conn.execute(cx, "COMMIT", &[]).await);
            self.in_transaction = false;
        }
        Outcome::Ok(())
    }

    /// Roll back the current transaction and discard staged statements.
    #[tracing::instrument(level = "debug", skip(self, cx))]
    pub async fn rollback(&mut self, cx: &Cx) -> Outcome<(), Error> {
        let conn = match open_connection(&self.connection, self.id) {
            Ok(conn) => conn,
            Err(e) => return Outcome::Err(e),
        };

        let discarded = self.pending.len();
        self.pending.clear();

        if self.in_transaction {
            tracing::info!(session = self.id, discarded, "Rolling back transaction");
            try_outcome!(conn.execute(cx, "ROLLBACK", &[]).await);
            self.in_transaction = false;
        }
        Outcome::Ok(())
    }

    // ========================================================================
    // Close
    // ========================================================================

    /// Close the session.
    ///
    /// Rolls back an open transaction, discards staged statements and closes
    /// the connection. The session counts as closed even when one of those
    /// steps fails; the failure is returned. Closing twice is a no-op.
    #[tracing::instrument(level = "debug", skip(self, cx))]
    pub async fn close(&mut self, cx: &Cx) -> Outcome<(), Error> {
        let Some(connection) = self.connection.take() else {
            return Outcome::Ok(());
        };

        let discarded = self.pending.len();
        self.pending.clear();

        let rollback = if self.in_transaction {
            self.in_transaction = false;
            Some(connection.execute(cx, "ROLLBACK", &[]).await)
        } else {
            None
        };
        let closed = connection.close(cx).await;
        self.record_close(discarded);

        if let (Some(outcome), Err(close_err)) = (&rollback, &closed) {
            if !matches!(outcome, Outcome::Ok(_)) {
                tracing::warn!(
                    session = self.id,
                    error = %close_err,
                    "Connection close failed after rollback did not complete"
                );
            }
        }

        match rollback {
            Some(Outcome::Err(e)) => return Outcome::Err(e),
            Some(Outcome::Cancelled(r)) => return Outcome::Cancelled(r),
            Some(Outcome::Panicked(p)) => return Outcome::Panicked(p),
            Some(Outcome::Ok(_)) | None => {}
        }

        match closed {
            Ok(()) => Outcome::Ok(()),
            Err(e) => Outcome::Err(e),
        }
    }

    fn record_close(&self, discarded: usize) {
        let closed = self.counters.closed.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(
            session = self.id,
            discarded,
            closed_total = closed,
            "Session closed"
        );
    }

    // ========================================================================
    // Debug Diagnostics
    // ========================================================================

    /// Dump session state for debugging.
    pub fn debug_state(&self) -> SessionDebugInfo {
        SessionDebugInfo {
            id: self.id,
            state: self.state(),
            pending: self.pending.len(),
            in_transaction: self.in_transaction,
        }
    }
}

impl<C: Connection> Drop for Session<C> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            tracing::warn!(
                session = self.id,
                in_transaction = self.in_transaction,
                pending = self.pending.len(),
                "Session dropped without close; releasing connection"
            );
            drop(connection);
            self.in_transaction = false;
            self.record_close(self.pending.len());
            self.pending.clear();
        }
    }
}

impl<C: Connection> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("in_transaction", &self.in_transaction)
            .field("pending", &self.pending.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Debug information about session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDebugInfo {
    pub id: u64,
    pub state: SessionState,
    /// Statements staged for flush.
    pub pending: usize,
    pub in_transaction: bool,
}

fn open_connection<C>(connection: &Option<C>, id: u64) -> Result<&C> {
    connection
        .as_ref()
        .ok_or_else(|| SessionError::closed(id).into())
}

fn log_statement(echo: bool, session: u64, sql: &str) {
    if echo {
        tracing::info!(session, sql, "Executing statement");
    } else {
        tracing::debug!(session, sql, "Executing statement");
    }
}
