//! Connection and driver contracts.
//!
//! Drivers implement [`Driver`] to turn a [`DatabaseUrl`] into a live
//! [`Connection`]. The session layer only ever talks to these two traits, so
//! it stays independent of any particular database.

use std::future::Future;

use asupersync::{Cx, Outcome};

use crate::error::Result;
use crate::{DatabaseUrl, Error, Row, Value};

/// A live connection to a database.
///
/// All async methods take a `Cx` so drivers can observe cancellation.
/// Transaction control is plain SQL (`BEGIN` / `COMMIT` / `ROLLBACK`) sent
/// through [`Connection::execute`].
pub trait Connection: Send + Sync {
    /// Run a statement that returns rows.
    fn query(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;

    /// Check that the connection is still usable.
    fn ping(&self, cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send;

    /// Close the connection, releasing its server-side resources.
    fn close(self, cx: &Cx) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}

/// A connector that opens connections for one kind of database.
pub trait Driver: Send + Sync + 'static {
    /// The connection type this driver produces.
    type Conn: Connection + 'static;

    /// Human-readable driver name, used in logs.
    fn name(&self) -> &'static str;

    /// Whether this driver serves the given URL backend
    /// (the scheme part before any `+driver` suffix).
    fn accepts(&self, backend: &str) -> bool;

    /// Open a new connection to the database described by `url`.
    fn connect(
        &self,
        cx: &Cx,
        url: &DatabaseUrl,
    ) -> impl Future<Output = Outcome<Self::Conn, Error>> + Send;
}
