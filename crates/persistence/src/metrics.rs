//! Database metrics.
//!
//! Every repository query is wrapped in a [`QueryTimer`]. The sample is taken
//! when the timer is dropped, so queries that bail out with `?` halfway
//! through a transaction are still timed, labelled `result="error"`.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// How a timed query ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    Ok,
    Error,
}

impl QueryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOutcome::Ok => "ok",
            QueryOutcome::Error => "error",
        }
    }
}

/// Records one sample of `database_query_duration_seconds`.
pub fn record_query_duration(query_name: &'static str, outcome: QueryOutcome, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name,
        "result" => outcome.as_str()
    )
    .record(duration_secs);
}

/// Record database connection pool metrics.
///
/// Called from the readiness probe, so the gauges refresh at the probe interval.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times a query or transaction and records it on drop.
///
/// A timer counts as failed until [`succeed`](Self::succeed) or
/// [`finish`](Self::finish) marks it otherwise.
#[derive(Debug)]
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
    outcome: QueryOutcome,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
            outcome: QueryOutcome::Error,
        }
    }

    pub fn succeed(&mut self) {
        self.outcome = QueryOutcome::Ok;
    }

    /// Labels the sample from a single-statement result and passes it through.
    pub fn finish<T>(mut self, result: Result<T, sqlx::Error>) -> Result<T, sqlx::Error> {
        if result.is_ok() {
            self.succeed();
        }
        result
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        record_query_duration(
            self.query_name,
            self.outcome,
            self.start.elapsed().as_secs_f64(),
        );
    }
}
