//! In-memory SQLite-flavored driver shared by the integration tests.

#![allow(clippy::manual_async_fn)]
#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use asupersync::runtime::RuntimeBuilder;
use sqlscope::prelude::*;
use sqlscope::{ConnectionError, ConnectionErrorKind, QueryError, QueryErrorKind};

pub fn run<F, Fut>(f: F)
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

pub fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

/// What every connection opened by one driver did, in order.
#[derive(Debug, Default)]
pub struct Journal {
    events: Mutex<Vec<String>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
    drops: AtomicUsize,
    fail_close: AtomicBool,
    fail_prefix: Mutex<Option<String>>,
}

impl Journal {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("journal lock").clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn drops(&self) -> usize {
        self.drops.load(Ordering::SeqCst)
    }

    /// Make every later `close` fail.
    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    /// Make every later statement starting with `prefix` fail.
    pub fn fail_on(&self, prefix: &str) {
        *self.fail_prefix.lock().expect("journal lock") = Some(prefix.to_string());
    }

    fn push(&self, event: String) {
        self.events.lock().expect("journal lock").push(event);
    }
}

#[derive(Debug)]
pub struct MemoryConnection {
    serial: usize,
    journal: Arc<Journal>,
}

impl MemoryConnection {
    fn record(&self, sql: &str) -> std::result::Result<(), Error> {
        let failing = self
            .journal
            .fail_prefix
            .lock()
            .expect("journal lock")
            .as_deref()
            .is_some_and(|p| sql.starts_with(p));
        if failing {
            return Err(Error::Query(
                QueryError::new(QueryErrorKind::Constraint, "UNIQUE constraint failed").with_sql(sql),
            ));
        }
        self.journal.push(format!("conn{}: {}", self.serial, sql));
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.journal.drops.fetch_add(1, Ordering::SeqCst);
    }
}

impl Connection for MemoryConnection {
    fn query(
        &self,
        _cx: &Cx,
        sql: &str,
        _params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        let recorded = self.record(sql);
        async move {
            match recorded {
                Ok(()) => Outcome::Ok(vec![Row::new(
                    vec!["id".to_string(), "name".to_string()].into(),
                    vec![Value::BigInt(1), Value::Text("Deadpond".to_string())],
                )]),
                Err(e) => Outcome::Err(e),
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
                Ok(()) => Outcome::Ok(1),
                Err(e) => Outcome::Err(e),
            }
        }
    }

    fn ping(&self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        async { Outcome::Ok(()) }
    }

    fn close(self, _cx: &Cx) -> impl Future<Output = Result<()>> + Send {
        self.journal.closes.fetch_add(1, Ordering::SeqCst);
        self.journal.push(format!("conn{}: <close>", self.serial));
        let fail = self.journal.fail_close.load(Ordering::SeqCst);
        async move {
            if fail {
                Err(Error::Connection(ConnectionError::new(
                    ConnectionErrorKind::Close,
                    "database is locked",
                )))
            } else {
                Ok(())
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryDriver {
    journal: Arc<Journal>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Arc<Journal> {
        Arc::clone(&self.journal)
    }
}

impl Driver for MemoryDriver {
    type Conn = MemoryConnection;

    fn name(&self) -> &'static str {
        "memory-sqlite"
    }

    fn accepts(&self, backend: &str) -> bool {
        backend == "sqlite"
    }

    fn connect(
        &self,
        _cx: &Cx,
        _url: &DatabaseUrl,
    ) -> impl Future<Output = Outcome<MemoryConnection, Error>> + Send {
        let serial = self.journal.connects.fetch_add(1, Ordering::SeqCst) + 1;
        let conn = MemoryConnection {
            serial,
            journal: Arc::clone(&self.journal),
        };
        async move { Outcome::Ok(conn) }
    }
}

pub struct Hero;

impl Model for Hero {
    const TABLE_NAME: &'static str = "heroes";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        static FIELDS: [FieldInfo; 3] = [
            FieldInfo::new("id", "INTEGER").primary_key(true),
            FieldInfo::new("name", "TEXT"),
            FieldInfo::new("age", "INTEGER").nullable(true),
        ];
        &FIELDS
    }
}
