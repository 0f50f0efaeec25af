//! An in-memory driver that records every statement and replays canned
//! results. The execution backend for unit tests.

use crate::driver::{Driver, ExecResult, Row};
use crate::error::{QuillError, QuillResult};
use crate::value::Value;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One recorded statement with its parameter vector.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub sql: String,
    pub params: Vec<Value>,
}

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<RecordedCall>>,
    canned: Mutex<VecDeque<ExecResult>>,
}

/// Records `(sql, params)` pairs and pops canned results in FIFO order;
/// when the queue is empty an empty result is returned.
///
/// Clones share the same recording, so a clone kept by the test still sees
/// statements executed through the handle that owns the driver.
#[derive(Clone, Default)]
pub struct RecordingDriver {
    shared: Arc<Shared>,
    in_transaction: bool,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a canned result for an upcoming `exec`.
    pub fn push_result(&self, result: ExecResult) {
        self.shared.canned.lock().unwrap().push_back(result);
    }

    /// Queue a canned result made of the given rows.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.push_result(ExecResult::with_rows(rows));
    }

    /// All recorded calls, in execution order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.shared.calls.lock().unwrap().clone()
    }

    /// Just the SQL strings, in execution order.
    pub fn statements(&self) -> Vec<String> {
        self.shared
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.sql.clone())
            .collect()
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.shared.calls.lock().unwrap().push(RecordedCall {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    async fn exec(&self, sql: &str, params: &[Value]) -> QuillResult<ExecResult> {
        self.record(sql, params);
        let canned = self.shared.canned.lock().unwrap().pop_front();
        Ok(canned.unwrap_or_default())
    }

    async fn begin(&self) -> QuillResult<Arc<dyn Driver>> {
        self.record("BEGIN", &[]);
        Ok(Arc::new(Self {
            shared: self.shared.clone(),
            in_transaction: true,
        }))
    }

    async fn commit(&self) -> QuillResult<()> {
        if !self.in_transaction {
            return Err(QuillError::driver("COMMIT outside of a transaction"));
        }
        self.record("COMMIT", &[]);
        Ok(())
    }

    async fn rollback(&self) -> QuillResult<()> {
        if !self.in_transaction {
            return Err(QuillError::driver("ROLLBACK outside of a transaction"));
        }
        self.record("ROLLBACK", &[]);
        Ok(())
    }

    async fn close(&self) -> QuillResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_replays_canned_results() {
        let driver = RecordingDriver::new();
        driver.push_rows(vec![Row::new().set("id", 1i64)]);

        let result = driver.exec("SELECT 1", &[]).await.unwrap();
        assert_eq!(result.row_count, 1);

        let empty = driver.exec("SELECT 2", &[Value::Int(5)]).await.unwrap();
        assert_eq!(empty.row_count, 0);

        let calls = driver.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].params, vec![Value::Int(5)]);
    }

    #[tokio::test]
    async fn transaction_markers_are_recorded() {
        let driver = RecordingDriver::new();
        let tx = driver.begin().await.unwrap();
        tx.exec("UPDATE x", &[]).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(driver.statements(), vec!["BEGIN", "UPDATE x", "COMMIT"]);
    }

    #[tokio::test]
    async fn commit_outside_transaction_fails() {
        let driver = RecordingDriver::new();
        assert!(driver.commit().await.is_err());
    }
}
