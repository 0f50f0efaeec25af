//! Query logging: the observer interface and a driver wrapper that feeds
//! it.
//!
//! [`LoggedDriver`] wraps any driver transparently: it starts a monotonic
//! timer before each `exec`, invokes the logger afterwards regardless of
//! success, then propagates the original outcome. A panicking logger is
//! tolerated; it never alters the query result.

use crate::driver::{Driver, ExecResult};
use crate::error::QuillResult;
use crate::value::Value;
use async_trait::async_trait;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Observer invoked after every statement execution.
pub trait QueryLogger: Send + Sync {
    /// Called with the statement, its parameters, and the elapsed time.
    fn log(&self, sql: &str, params: &[Value], elapsed: Duration);
}

/// A logger that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl QueryLogger for NoopLogger {
    fn log(&self, _sql: &str, _params: &[Value], _elapsed: Duration) {}
}

/// A logger that prints to stderr.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    /// Minimum duration to log (filters out fast queries).
    pub min_duration: Option<Duration>,
    /// Maximum SQL length to display before truncating.
    pub max_sql_len: Option<usize>,
    /// Prefix for log lines.
    pub prefix: String,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self {
            min_duration: None,
            max_sql_len: Some(200),
            prefix: "[pgquill]".to_string(),
        }
    }
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only log queries slower than this duration.
    pub fn min_duration(mut self, duration: Duration) -> Self {
        self.min_duration = Some(duration);
        self
    }

    /// Set the maximum SQL length to display.
    pub fn max_sql_len(mut self, len: usize) -> Self {
        self.max_sql_len = Some(len);
        self
    }

    /// Set the log-line prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn display_sql<'a>(&self, sql: &'a str) -> (&'a str, &'static str) {
        match self.max_sql_len {
            Some(max) if sql.len() > max => (truncate_at_char_boundary(sql, max), "..."),
            _ => (sql, ""),
        }
    }
}

impl QueryLogger for ConsoleLogger {
    fn log(&self, sql: &str, params: &[Value], elapsed: Duration) {
        if let Some(min) = self.min_duration {
            if elapsed < min {
                return;
            }
        }
        let (shown, ellipsis) = self.display_sql(sql);
        eprintln!(
            "{} {:?} | {} param(s) | {}{}",
            self.prefix,
            elapsed,
            params.len(),
            shown,
            ellipsis
        );
    }
}

/// A logger emitting `tracing` debug events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl QueryLogger for TracingLogger {
    fn log(&self, sql: &str, params: &[Value], elapsed: Duration) {
        tracing::debug!(
            target: "pgquill",
            elapsed_ms = elapsed.as_millis() as u64,
            params = params.len(),
            sql,
            "query"
        );
    }
}

fn truncate_at_char_boundary(sql: &str, max: usize) -> &str {
    let mut end = max;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Wraps a driver; times every `exec` and reports it to the logger.
pub struct LoggedDriver {
    inner: Arc<dyn Driver>,
    logger: Arc<dyn QueryLogger>,
}

impl LoggedDriver {
    pub fn new(inner: Arc<dyn Driver>, logger: Arc<dyn QueryLogger>) -> Self {
        Self { inner, logger }
    }
}

#[async_trait]
impl Driver for LoggedDriver {
    async fn exec(&self, sql: &str, params: &[Value]) -> QuillResult<ExecResult> {
        let started = Instant::now();
        let outcome = self.inner.exec(sql, params).await;
        let elapsed = started.elapsed();
        let _ = catch_unwind(AssertUnwindSafe(|| self.logger.log(sql, params, elapsed)));
        outcome
    }

    async fn begin(&self) -> QuillResult<Arc<dyn Driver>> {
        let tx = self.inner.begin().await?;
        Ok(Arc::new(LoggedDriver {
            inner: tx,
            logger: self.logger.clone(),
        }))
    }

    async fn commit(&self) -> QuillResult<()> {
        self.inner.commit().await
    }

    async fn rollback(&self) -> QuillResult<()> {
        self.inner.rollback().await
    }

    async fn close(&self) -> QuillResult<()> {
        self.inner.close().await
    }
}
