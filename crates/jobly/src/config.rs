//! Database connection configuration.

use crate::error::{JoblyError, JoblyResult};
use crate::logging::{SqlLogConfig, TracedClient};
use std::time::Duration;
use tokio_postgres::NoTls;

/// Environment variable holding the connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Server-side statement timeout in milliseconds.
pub const STATEMENT_TIMEOUT_ENV: &str = "JOBLY_STATEMENT_TIMEOUT_MS";
/// `true`/`false`: log every statement (failures are always logged).
pub const LOG_SQL_ENV: &str = "JOBLY_LOG_SQL";
/// Maximum SQL length in logged events; `0` disables truncation.
pub const LOG_SQL_MAX_LEN_ENV: &str = "JOBLY_LOG_SQL_MAX_LEN";

/// Configuration for [`connect`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// libpq-style connection string or URL.
    pub database_url: String,
    /// Server-side `statement_timeout`. `None` keeps the server default.
    pub statement_timeout: Option<Duration>,
    /// How executed statements are logged.
    pub sql_log: SqlLogConfig,
}

impl DbConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            statement_timeout: None,
            sql_log: SqlLogConfig::default(),
        }
    }

    /// Load configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> JoblyResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> JoblyResult<Self> {
        let database_url = lookup(DATABASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| JoblyError::Config(format!("{DATABASE_URL_ENV} is not set")))?;

        let mut config = Self::new(database_url);

        if let Some(raw) = lookup(STATEMENT_TIMEOUT_ENV) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                JoblyError::Config(format!("{STATEMENT_TIMEOUT_ENV} must be milliseconds, got {raw:?}"))
            })?;
            config = config.statement_timeout(Duration::from_millis(ms));
        }

        if let Some(raw) = lookup(LOG_SQL_ENV) {
            config.sql_log.enabled = parse_bool(&raw).ok_or_else(|| {
                JoblyError::Config(format!("{LOG_SQL_ENV} must be true or false, got {raw:?}"))
            })?;
        }

        if let Some(raw) = lookup(LOG_SQL_MAX_LEN_ENV) {
            let len: usize = raw.trim().parse().map_err(|_| {
                JoblyError::Config(format!("{LOG_SQL_MAX_LEN_ENV} must be a number, got {raw:?}"))
            })?;
            config.sql_log.max_sql_length = (len > 0).then_some(len);
        }

        Ok(config)
    }

    /// Set the server-side statement timeout.
    pub fn statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }

    /// Replace the SQL logging configuration.
    pub fn sql_log(mut self, sql_log: SqlLogConfig) -> Self {
        self.sql_log = sql_log;
        self
    }

    /// Parsed `tokio_postgres` configuration, including session options.
    pub fn pg_config(&self) -> JoblyResult<tokio_postgres::Config> {
        let mut pg_config: tokio_postgres::Config = self
            .database_url
            .parse()
            .map_err(|e: tokio_postgres::Error| JoblyError::Connection(e.to_string()))?;

        if let Some(timeout) = self.statement_timeout {
            pg_config.options(&format!("-c statement_timeout={}", timeout.as_millis()));
        }
        Ok(pg_config)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Open a connection and drive it on a background task.
///
/// Must be called within a Tokio runtime. The returned client logs statements
/// according to [`DbConfig::sql_log`].
pub async fn connect(config: &DbConfig) -> JoblyResult<TracedClient<tokio_postgres::Client>> {
    let (client, connection) = config
        .pg_config()?
        .connect(NoTls)
        .await
        .map_err(|e| JoblyError::Connection(e.to_string()))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(target: "jobly.db", error = %e, "connection closed with error");
        }
    });

    tracing::debug!(target: "jobly.db", "connected");
    Ok(TracedClient::with_config(client, config.sql_log.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn requires_database_url() {
        let err = DbConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, JoblyError::Config(_)));

        let err = DbConfig::from_lookup(lookup_from(&[(DATABASE_URL_ENV, "  ")])).unwrap_err();
        assert!(matches!(err, JoblyError::Config(_)));
    }

    #[test]
    fn reads_optional_settings() {
        let config = DbConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_ENV, "postgres://localhost/jobly"),
            (STATEMENT_TIMEOUT_ENV, "1500"),
            (LOG_SQL_ENV, "off"),
            (LOG_SQL_MAX_LEN_ENV, "0"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://localhost/jobly");
        assert_eq!(config.statement_timeout, Some(Duration::from_millis(1500)));
        assert!(!config.sql_log.enabled);
        assert_eq!(config.sql_log.max_sql_length, None);
    }

    #[test]
    fn rejects_malformed_settings() {
        let err = DbConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_ENV, "postgres://localhost/jobly"),
            (STATEMENT_TIMEOUT_ENV, "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(STATEMENT_TIMEOUT_ENV));

        let err = DbConfig::from_lookup(lookup_from(&[
            (DATABASE_URL_ENV, "postgres://localhost/jobly"),
            (LOG_SQL_ENV, "maybe"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(LOG_SQL_ENV));
    }

    #[test]
    fn statement_timeout_becomes_session_option() {
        let config = DbConfig::new("postgres://user@localhost/jobly")
            .statement_timeout(Duration::from_secs(2));
        let pg = config.pg_config().unwrap();

        assert_eq!(pg.get_options(), Some("-c statement_timeout=2000"));
        assert_eq!(pg.get_dbname(), Some("jobly"));
    }

    #[test]
    fn malformed_url_is_connection_error() {
        let err = DbConfig::new("host=localhost port=notaport").pg_config().unwrap_err();
        assert!(matches!(err, JoblyError::Connection(_)));
    }
}
