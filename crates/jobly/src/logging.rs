//! `tracing` instrumentation for SQL execution.
//!
//! [`TracedClient`] wraps any [`GenericClient`] and emits one event per
//! statement under the `jobly.sql` target: the SQL that ran (optionally
//! truncated), the number of bound parameters, the row count and the elapsed
//! time. Failures and slow statements are reported at `WARN` regardless of the
//! configured level. Installing a subscriber is left to the application.

use crate::client::GenericClient;
use crate::error::JoblyResult;
use std::time::{Duration, Instant};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use tracing::Level;

/// How [`TracedClient`] reports statements.
#[derive(Debug, Clone)]
pub struct SqlLogConfig {
    /// Emit an event for every successful statement.
    pub enabled: bool,
    /// Tracing event level for successful statements.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Statements slower than this are reported at `WARN`.
    pub slow_query_threshold: Option<Duration>,
}

impl Default for SqlLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: Level::DEBUG,
            max_sql_length: Some(200),
            slow_query_threshold: None,
        }
    }
}

impl SqlLogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that only reports failures and slow statements.
    pub fn quiet() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    fn truncate_sql<'s>(&self, sql: &'s str) -> std::borrow::Cow<'s, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                format!("{}...", truncate_sql_bytes(sql, max)).into()
            }
            _ => sql.into(),
        }
    }
}

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// A client that logs every statement it runs.
pub struct TracedClient<C> {
    client: C,
    config: SqlLogConfig,
}

impl<C: GenericClient> TracedClient<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, SqlLogConfig::default())
    }

    pub fn with_config(client: C, config: SqlLogConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &SqlLogConfig {
        &self.config
    }

    /// Get a reference to the inner client.
    pub fn inner(&self) -> &C {
        &self.client
    }

    /// Get a mutable reference to the inner client (e.g. to open a transaction).
    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Get the inner client, consuming this wrapper.
    pub fn into_inner(self) -> C {
        self.client
    }

    fn record<T>(
        &self,
        sql: &str,
        param_count: usize,
        started: Instant,
        result: &JoblyResult<T>,
        rows: impl FnOnce(&T) -> u64,
    ) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let sql = self.config.truncate_sql(sql);

        match result {
            Err(err) => tracing::warn!(
                target: "jobly.sql",
                sql = %sql,
                param_count,
                elapsed_ms,
                error = %err,
                "statement failed"
            ),
            Ok(value) => {
                let rows = rows(value);
                let slow = self
                    .config
                    .slow_query_threshold
                    .is_some_and(|threshold| elapsed >= threshold);
                if slow {
                    tracing::warn!(
                        target: "jobly.sql",
                        sql = %sql,
                        param_count,
                        rows,
                        elapsed_ms,
                        "slow statement"
                    );
                } else if self.config.enabled {
                    emit_at_level!(
                        self.config.level,
                        target: "jobly.sql",
                        sql = %sql,
                        param_count,
                        rows,
                        elapsed_ms,
                    );
                }
            }
        }
    }
}

impl<C: GenericClient> GenericClient for TracedClient<C> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<Vec<Row>> {
        let started = Instant::now();
        let result = self.client.query(sql, params).await;
        self.record(sql, params.len(), started, &result, |rows| rows.len() as u64);
        result
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> JoblyResult<u64> {
        let started = Instant::now();
        let result = self.client.execute(sql, params).await;
        self.record(sql, params.len(), started, &result, |affected| *affected);
        result
    }
}
