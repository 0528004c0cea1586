//! Bounded-time transactional unit of work.
//!
//! [`Store`] is the process-wide handle constructed once at startup. Every
//! data-access operation runs inside [`Store::run_in_transaction`] (or its
//! void flavor), which opens a transaction, derives a [`QueryContext`] with a
//! fixed deadline, runs the caller's unit of work and then commits on `Ok` or
//! rolls back on `Err`.
//!
//! A statement abandoned at the deadline leaves its connection busy on the
//! server. The rollback that follows gets [`ROLLBACK_GRACE`]; past that the
//! connection is detached from the pool and dropped instead of awaited.
//!
//! ```ignore
//! let tag = store
//!     .run_in_transaction(|tx, ctx| Box::pin(async move { TagRepo::find_by_id(tx, ctx, id).await }))
//!     .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{Connection, PgConnection};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{DbError, QueryFailure};
use crate::DbPool;

/// Connection handle, inside an open transaction, passed to a unit of work.
pub type Tx = PgConnection;

/// How long a rollback may take before its connection is abandoned.
pub const ROLLBACK_GRACE: Duration = Duration::from_millis(250);

/// Deadline and cancellation signal shared by every statement of one unit of work.
#[derive(Debug, Clone)]
pub struct QueryContext {
    deadline: Instant,
    token: CancellationToken,
}

impl QueryContext {
    /// A root context expiring `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            token: CancellationToken::new(),
        }
    }

    /// A context expiring `timeout` from now that is also cancelled when
    /// `parent` is.
    pub fn child_of(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            token: parent.child_token(),
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Cancel this context. Statements issued afterwards fail with
    /// [`QueryFailure::Canceled`], and so does a statement in flight.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// `Err` once the context is cancelled or past its deadline.
    pub fn check(&self) -> Result<(), QueryFailure> {
        if self.token.is_cancelled() {
            return Err(QueryFailure::Canceled);
        }
        if Instant::now() >= self.deadline {
            return Err(QueryFailure::DeadlineExceeded);
        }
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// Drive one round-trip to the store under this context.
    ///
    /// Whichever comes first wins: the driver result, cancellation, or the
    /// deadline. A context that is already done never polls `fut`.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, QueryFailure>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(QueryFailure::Canceled),
            () = tokio::time::sleep_until(self.deadline) => Err(QueryFailure::DeadlineExceeded),
            result = fut => result.map_err(QueryFailure::from),
        }
    }
}

/// Explicit store handle: the connection pool plus the per-transaction timeout.
///
/// Cheaply cloneable; the pool is internally reference-counted.
#[derive(Debug, Clone)]
pub struct Store {
    pool: DbPool,
    tx_timeout: Duration,
}

impl Store {
    pub fn new(pool: DbPool, tx_timeout: Duration) -> Self {
        Self { pool, tx_timeout }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn tx_timeout(&self) -> Duration {
        self.tx_timeout
    }

    /// Run `work` in a fresh transaction and return its result.
    ///
    /// - Begin failure: returns [`DbError::Begin`] without invoking `work`.
    /// - `work` fails: rolls back and returns the error unchanged.
    /// - Commit failure: returns [`DbError::Commit`].
    pub async fn run_in_transaction<T, F>(&self, work: F) -> Result<T, DbError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Tx, &'t QueryContext) -> BoxFuture<'t, Result<T, DbError>>
            + Send,
    {
        let ctx = QueryContext::with_timeout(self.tx_timeout);
        self.execute(ctx, work).await
    }

    /// Like [`run_in_transaction`](Self::run_in_transaction), with the
    /// context also bound to an external cancellation token (e.g. the
    /// lifetime of an inbound request).
    pub async fn run_in_transaction_with<T, F>(
        &self,
        parent: &CancellationToken,
        work: F,
    ) -> Result<T, DbError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Tx, &'t QueryContext) -> BoxFuture<'t, Result<T, DbError>>
            + Send,
    {
        let ctx = QueryContext::child_of(parent, self.tx_timeout);
        self.execute(ctx, work).await
    }

    /// Void flavor for operations whose only output is success or failure.
    pub async fn run_in_transaction_void<F>(&self, work: F) -> Result<(), DbError>
    where
        F: for<'t> FnOnce(&'t mut Tx, &'t QueryContext) -> BoxFuture<'t, Result<(), DbError>>
            + Send,
    {
        self.run_in_transaction(work).await
    }

    async fn execute<T, F>(&self, ctx: QueryContext, work: F) -> Result<T, DbError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Tx, &'t QueryContext) -> BoxFuture<'t, Result<T, DbError>>
            + Send,
    {
        let mut conn = ctx.run(self.pool.acquire()).await.map_err(DbError::Begin)?;
        let (result, reusable) = Self::transact(&mut conn, &ctx, work).await;
        if !reusable {
            tracing::warn!("Detaching connection left with an interrupted statement");
            drop(conn.detach());
        }
        result
    }

    /// Run `work` between `BEGIN` and `COMMIT`/`ROLLBACK` on `conn`.
    ///
    /// The flag is `false` when `conn` may still be executing a statement
    /// on the server and must not go back to the pool.
    async fn transact<T, F>(
        conn: &mut PgConnection,
        ctx: &QueryContext,
        work: F,
    ) -> (Result<T, DbError>, bool)
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Tx, &'t QueryContext) -> BoxFuture<'t, Result<T, DbError>>
            + Send,
    {
        let mut tx = match ctx.run(conn.begin()).await {
            Ok(tx) => tx,
            Err(failure) => {
                let reusable = !failure.is_interruption();
                return (Err(DbError::Begin(failure)), reusable);
            }
        };

        // Each statement is capped server-side at the budget left now, so the
        // store abandons work the client has given up on.
        let statement_timeout = ctx.remaining().as_millis().max(1).to_string();
        let configured = ctx
            .run(
                sqlx::query("SELECT set_config('statement_timeout', $1, true)")
                    .bind(statement_timeout)
                    .execute(&mut *tx),
            )
            .await;
        let outcome = match configured {
            Ok(_) => work(&mut *tx, ctx).await,
            Err(failure) => Err(DbError::Begin(failure)),
        };

        match outcome {
            Ok(value) => match ctx.run(tx.commit()).await {
                Ok(()) => {
                    tracing::debug!("Transaction committed");
                    (Ok(value), true)
                }
                Err(failure) => {
                    let reusable = !failure.is_interruption();
                    (Err(DbError::Commit(failure)), reusable)
                }
            },
            Err(err) => {
                let reusable = match tokio::time::timeout(ROLLBACK_GRACE, tx.rollback()).await {
                    Ok(Ok(())) => true,
                    Ok(Err(rollback_err)) => {
                        tracing::warn!(error = %rollback_err, "Transaction rollback failed");
                        false
                    }
                    Err(_) => {
                        tracing::warn!(
                            grace_ms = ROLLBACK_GRACE.as_millis() as u64,
                            "Transaction rollback timed out"
                        );
                        false
                    }
                };
                tracing::debug!(error = %err, "Transaction rolled back");
                (Err(err), reusable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_context_is_live() {
        let ctx = QueryContext::with_timeout(Duration::from_secs(5));
        assert!(ctx.check().is_ok());
        assert!(!ctx.is_done());
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits() {
        let ctx = QueryContext::with_timeout(Duration::from_secs(5));
        ctx.cancel();
        let result = ctx.run(async { Ok::<_, sqlx::Error>(1) }).await;
        assert!(matches!(result, Err(QueryFailure::Canceled)));
    }

    #[tokio::test]
    async fn expired_context_reports_deadline_exceeded() {
        let ctx = QueryContext::with_timeout(Duration::from_millis(10));
        tokio::time::sleep_until(ctx.deadline()).await;
        assert!(matches!(ctx.check(), Err(QueryFailure::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn deadline_interrupts_slow_future() {
        let ctx = QueryContext::with_timeout(Duration::from_millis(20));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, sqlx::Error>(())
            })
            .await;
        assert!(matches!(result, Err(QueryFailure::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn remaining_budget_shrinks_to_zero() {
        let ctx = QueryContext::with_timeout(Duration::from_millis(10));
        assert!(ctx.remaining() <= Duration::from_millis(10));
        tokio::time::sleep_until(ctx.deadline()).await;
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn parent_cancellation_propagates_to_child() {
        let parent = CancellationToken::new();
        let ctx = QueryContext::child_of(&parent, Duration::from_secs(5));
        parent.cancel();
        assert!(matches!(ctx.check(), Err(QueryFailure::Canceled)));
    }

    #[tokio::test]
    async fn cancelling_child_leaves_parent_untouched() {
        let parent = CancellationToken::new();
        let ctx = QueryContext::child_of(&parent, Duration::from_secs(5));
        ctx.cancel();
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn driver_result_passes_through() {
        let ctx = QueryContext::with_timeout(Duration::from_secs(5));
        let result = ctx.run(async { Err::<(), _>(sqlx::Error::RowNotFound) }).await;
        assert!(matches!(
            result,
            Err(QueryFailure::Sqlx(sqlx::Error::RowNotFound))
        ));
    }
}
