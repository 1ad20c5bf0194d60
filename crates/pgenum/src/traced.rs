//! The database seam.
//!
//! pgenum only ever runs three kinds of statements: catalog queries, the
//! `current_schema()` lookup and `ALTER TYPE` commands. [`Connection`]
//! abstracts over whatever issues them, and [`TracedConn`] wraps each one in
//! a `pgenum.statement` span.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use tokio_postgres::types::ToSql;
use tokio_postgres::{Error, Row};
use tracing::Instrument;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// Something pgenum can run statements on.
///
/// Implemented for `tokio_postgres::Client`, `tokio_postgres::Transaction`
/// and pooled `deadpool_postgres::Object`s.
pub trait Connection: Send + Sync {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, u64>;

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, Vec<Row>>;

    /// Fails unless the query yields exactly one row.
    fn query_one<'a>(
        &'a self,
        sql: &'a str,
        params: &'a [&'a (dyn ToSql + Sync)],
    ) -> BoxFuture<'a, Row>;
}

/// Forward [`Connection`] to the inherent methods of a tokio-postgres client.
macro_rules! forward_connection {
    ($ty:ty => |$conn:ident| $client:expr) => {
        impl Connection for $ty {
            fn execute<'a>(
                &'a self,
                sql: &'a str,
                params: &'a [&'a (dyn ToSql + Sync)],
            ) -> BoxFuture<'a, u64> {
                let $conn = self;
                Box::pin($client.execute(sql, params))
            }

            fn query<'a>(
                &'a self,
                sql: &'a str,
                params: &'a [&'a (dyn ToSql + Sync)],
            ) -> BoxFuture<'a, Vec<Row>> {
                let $conn = self;
                Box::pin($client.query(sql, params))
            }

            fn query_one<'a>(
                &'a self,
                sql: &'a str,
                params: &'a [&'a (dyn ToSql + Sync)],
            ) -> BoxFuture<'a, Row> {
                let $conn = self;
                Box::pin($client.query_one(sql, params))
            }
        }
    };
}

forward_connection!(tokio_postgres::Client => |client| client);
forward_connection!(tokio_postgres::Transaction<'_> => |tx| tx);
// A pooled object derefs to its client.
forward_connection!(deadpool_postgres::Object => |object| &**object);

/// A [`Connection`] whose statements are logged.
///
/// Each statement runs inside a `pgenum.statement` debug span carrying
/// `kind`, `sql`, `params`, and once it finishes `rows` and `elapsed_ms`.
/// Failures are logged inside the span before being returned.
pub struct TracedConn<'a, C: Connection + ?Sized> {
    conn: &'a C,
}

impl<'a, C: Connection + ?Sized> TracedConn<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Run a statement, returning the number of rows it affected.
    pub async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<u64, Error> {
        let fut = self.conn.execute(sql, params);
        run("execute", sql, params.len(), fut, |affected| *affected).await
    }

    /// Run a query, returning every row.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Error> {
        let fut = self.conn.query(sql, params);
        run("query", sql, params.len(), fut, |rows| rows.len() as u64).await
    }

    /// Run a query expected to yield exactly one row.
    pub async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Row, Error> {
        let fut = self.conn.query_one(sql, params);
        run("query_one", sql, params.len(), fut, |_| 1).await
    }
}

async fn run<T>(
    kind: &'static str,
    sql: &str,
    params: usize,
    fut: BoxFuture<'_, T>,
    rows: impl FnOnce(&T) -> u64,
) -> Result<T, Error> {
    let span = tracing::debug_span!(
        "pgenum.statement",
        kind,
        sql = %sql.trim(),
        params,
        rows = tracing::field::Empty,
        elapsed_ms = tracing::field::Empty,
    );

    let started = Instant::now();
    let result = fut.instrument(span.clone()).await;
    span.record("elapsed_ms", started.elapsed().as_millis() as u64);

    match &result {
        Ok(value) => {
            span.record("rows", rows(value));
        }
        Err(e) => span.in_scope(|| tracing::debug!(error = %e, "statement failed")),
    }
    result
}

/// Adds [`ConnectionExt::traced`] to every [`Connection`].
pub trait ConnectionExt: Connection {
    fn traced(&self) -> TracedConn<'_, Self> {
        TracedConn::new(self)
    }
}

impl<C: Connection + ?Sized> ConnectionExt for C {}
