//! Pool gauges and acquire timings exported on the service's `/metrics` page.

use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};
use sqlx::{pool::PoolConnection, PgPool, Postgres};
use std::time::Instant;

const ACQUIRE_BUCKETS: &[f64] = &[0.001, 0.005, 0.025, 0.1, 0.25, 1.0, 2.5, 10.0];

lazy_static::lazy_static! {
    static ref POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "Open, idle and maximum pooled connections",
        &["service", "state"]
    ).expect("db_pool_connections registers once");

    static ref POOL_ACQUIRE_SECONDS: HistogramVec = register_histogram_vec!(
        "db_pool_acquire_duration_seconds",
        "Wait for a pooled connection",
        &["service"],
        ACQUIRE_BUCKETS.to_vec()
    ).expect("db_pool_acquire_duration_seconds registers once");

    static ref POOL_ACQUIRE_FAILURES: IntCounterVec = register_int_counter_vec!(
        "db_pool_acquire_failures_total",
        "Failed connection acquisitions by reason",
        &["service", "reason"]
    ).expect("db_pool_acquire_failures_total registers once");
}

/// Point-in-time view of the pool's connection counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolSnapshot {
    pub open: u32,
    pub idle: u32,
    pub max: u32,
}

impl PoolSnapshot {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            open: pool.size(),
            idle: pool.num_idle() as u32,
            max: pool.options().get_max_connections(),
        }
    }

    /// Connections currently checked out by request handlers.
    pub fn in_use(&self) -> u32 {
        self.open.saturating_sub(self.idle)
    }

    pub fn publish(&self, service: &str) {
        for (state, value) in [
            ("in_use", self.in_use()),
            ("idle", self.idle),
            ("max", self.max),
        ] {
            POOL_CONNECTIONS
                .with_label_values(&[service, state])
                .set(i64::from(value));
        }
    }
}

pub(crate) fn update_pool_metrics(pool: &PgPool, service: &str) {
    PoolSnapshot::of(pool).publish(service);
}

/// `pool.acquire()` that also records the wait and any failure reason.
pub async fn acquire_with_metrics(
    pool: &PgPool,
    service: &str,
) -> Result<PoolConnection<Postgres>, sqlx::Error> {
    let started = Instant::now();
    let acquired = pool.acquire().await;

    POOL_ACQUIRE_SECONDS
        .with_label_values(&[service])
        .observe(started.elapsed().as_secs_f64());
    if let Err(err) = &acquired {
        POOL_ACQUIRE_FAILURES
            .with_label_values(&[service, failure_reason(err)])
            .inc();
    }

    acquired
}

fn failure_reason(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::PoolTimedOut => "timeout",
        sqlx::Error::PoolClosed => "closed",
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => "network",
        _ => "other",
    }
}
