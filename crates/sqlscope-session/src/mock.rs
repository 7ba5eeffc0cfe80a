//! In-memory connection and driver used by unit tests.

#![allow(clippy::manual_async_fn)] // Mock trait impls must match trait signatures

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use asupersync::runtime::RuntimeBuilder;
use asupersync::{CancelReason, Cx, Outcome};
use sqlscope_core::error::{ConnectionError, ConnectionErrorKind, QueryError, QueryErrorKind};
use sqlscope_core::{Connection, DatabaseUrl, Driver, Error, Result, Row, Value};

pub(crate) fn run<F, Fut>(f: F)
where
    F: FnOnce(Cx) -> Fut,
    Fut: Future<Output = ()>,
{
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    rt.block_on(f(cx));
}

pub(crate) fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

/// Shared record of what mock connections did.
#[derive(Debug, Default)]
pub(crate) struct CallLog {
    statements: Mutex<Vec<String>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
    drops: AtomicUsize,
}

impl CallLog {
    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements.lock().expect("call log lock").clone()
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub(crate) struct MockConnection {
    calls: Arc<CallLog>,
    fail_on: Option<String>,
    cancel_on: Option<String>,
    fail_close: bool,
}

impl MockConnection {
    pub(crate) fn new() -> Self {
        Self::with_log(Arc::new(CallLog::default()))
    }

    fn with_log(calls: Arc<CallLog>) -> Self {
        Self {
            calls,
            fail_on: None,
            cancel_on: None,
            fail_close: false,
        }
    }

    /// Fail any statement starting with `prefix`.
    pub(crate) fn fail_on(mut self, prefix: &str) -> Self {
        self.fail_on = Some(prefix.to_string());
        self
    }

    /// Report cancellation for any statement starting with `prefix`.
    pub(crate) fn cancel_on(mut self, prefix: &str) -> Self {
        self.cancel_on = Some(prefix.to_string());
        self
    }

    pub(crate) fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) fn calls(&self) -> Arc<CallLog> {
        Arc::clone(&self.calls)
    }

    fn record(&self, sql: &str) -> Outcome<(), Error> {
        if self.fail_on.as_deref().is_some_and(|p| sql.starts_with(p)) {
            return Outcome::Err(Error::Query(
                QueryError::new(QueryErrorKind::Constraint, "mock failure").with_sql(sql),
            ));
        }
        if self.cancel_on.as_deref().is_some_and(|p| sql.starts_with(p)) {
            return Outcome::Cancelled(CancelReason::user("mock cancellation"));
        }
        self.calls
            .statements
            .lock()
            .expect("call log lock")
            .push(sql.to_string());
        Outcome::Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.calls.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl Connection for MockConnection {
    fn query(
        &self,
        _cx: &Cx,
        sql: &str,
        _params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        let recorded = self.record(sql);
        async move {
            match recorded {
                Outcome::Ok(()) => Outcome::Ok(vec![]),
                Outcome::Err(e) => Outcome::Err(e),
                Outcome::Cancelled(r) => Outcome::Cancelled(r),
                Outcome::Panicked(p) => Outcome::Panicked(p),
            }
        }
    }

    fn execute(
        &self,
        _cx: &Cx,
        sql: &str,
        _params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let recorded = self.record(sql);
        async move {
            match recorded {
                Outcome::Ok(()) => Outcome::Ok(1),
                Outcome::Err(e) => Outcome::Err(e),
                Outcome::Cancelled(r) => Outcome::Cancelled(r),
                Outcome::Panicked(p) => Outcome::Panicked(p),
            }
        }
    }

    fn ping(&self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        async { Outcome::Ok(()) }
    }

    fn close(self, _cx: &Cx) -> impl Future<Output = Result<()>> + Send {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail_close;
        async move {
            if fail {
                Err(Error::Connection(ConnectionError::new(
                    ConnectionErrorKind::Close,
                    "mock close failure",
                )))
            } else {
                Ok(())
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct MockDriver {
    calls: Arc<CallLog>,
    fail_on: Option<String>,
    cancel_on: Option<String>,
    fail_close: bool,
}

impl MockDriver {
    pub(crate) fn new() -> Self {
        Self {
            calls: Arc::new(CallLog::default()),
            fail_on: None,
            cancel_on: None,
            fail_close: false,
        }
    }

    /// Connections fail statements starting with `prefix`.
    pub(crate) fn fail_on(mut self, prefix: &str) -> Self {
        self.fail_on = Some(prefix.to_string());
        self
    }

    /// Connections report cancellation for statements starting with `prefix`.
    pub(crate) fn cancel_on(mut self, prefix: &str) -> Self {
        self.cancel_on = Some(prefix.to_string());
        self
    }

    /// Connections fail to close.
    pub(crate) fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) fn calls(&self) -> Arc<CallLog> {
        Arc::clone(&self.calls)
    }
}

impl Driver for MockDriver {
    type Conn = MockConnection;

    fn name(&self) -> &'static str {
        "mock"
    }

    fn accepts(&self, backend: &str) -> bool {
        backend == "mock"
    }

    fn connect(
        &self,
        _cx: &Cx,
        _url: &DatabaseUrl,
    ) -> impl Future<Output = Outcome<MockConnection, Error>> + Send {
        self.calls.connects.fetch_add(1, Ordering::SeqCst);
        let conn = MockConnection {
            calls: Arc::clone(&self.calls),
            fail_on: self.fail_on.clone(),
            cancel_on: self.cancel_on.clone(),
            fail_close: self.fail_close,
        };
        async move { Outcome::Ok(conn) }
    }
}
