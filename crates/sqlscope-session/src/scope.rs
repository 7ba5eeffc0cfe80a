//! Scoped session acquisition.
//!
//! [`with_session`] is the per-request entry point: it opens exactly one
//! session, lends it to a body for one unit of work, then closes it whether
//! the body succeeded or failed. If the body's future is dropped part-way
//! (cancellation) or unwinds, the session's `Drop` releases the connection.

use std::future::Future;
use std::pin::Pin;

use asupersync::{Cx, Outcome};
use sqlscope_core::{Driver, Error, try_outcome};

use crate::factory::SessionFactory;
use crate::session::Session;

/// Future returned by a scoped session body.
///
/// Bodies are written as `|cx, session| Box::pin(async move { ... })`.
pub type ScopedFuture<'s, T> = Pin<Box<dyn Future<Output = Outcome<T, Error>> + Send + 's>>;

/// Open a session, run `body` with it, and close it.
///
/// - A failure from `body` is returned unchanged, after the session closed.
/// - If `body` succeeded but closing failed, the close failure is returned.
/// - If both failed, the body's failure is returned and the close failure is
///   logged.
/// - If opening the session fails, `body` never runs.
pub async fn with_session<D, T, F>(factory: &SessionFactory<D>, cx: &Cx, body: F) -> Outcome<T, Error>
where
    D: Driver,
    F: for<'s> FnOnce(&'s Cx, &'s mut Session<D::Conn>) -> ScopedFuture<'s, T>,
{
    let mut session = try_outcome!(factory.open(cx).await);
    let id = session.id();

    let result = body(cx, &mut session).await;
    let closed = session.close(cx).await;

    match result {
        Outcome::Ok(value) => match closed {
            Outcome::Ok(()) => Outcome::Ok(value),
            Outcome::Err(e) => {
                tracing::warn!(session = id, error = %e, "Unit of work succeeded but session close failed");
                Outcome::Err(e)
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        },
        failure => {
            match &closed {
                Outcome::Ok(()) => {}
                Outcome::Err(e) => {
                    tracing::error!(session = id, error = %e, "Session close failed after unit of work failed");
                }
                Outcome::Cancelled(reason) => {
                    tracing::error!(session = id, reason = ?reason, "Session close cancelled after unit of work failed");
                }
                Outcome::Panicked(payload) => {
                    tracing::error!(session = id, panic = ?payload, "Session close panicked after unit of work failed");
                }
            }
            failure
        }
    }
}
