//! Per-item runner.
//!
//! Runs one operation once per input item, in order. With `continue_on_fail`
//! a failing item becomes an error record and the run goes on; without it the
//! first failure ends the run.

use serde_json::Value;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::OperationError;
use crate::logging::redact_sensitive;
use crate::registry;
use crate::response::StepRecord;
use crate::session::Session;

pub struct ItemRunner<'a> {
    session: &'a Session,
    continue_on_fail: bool,
    cancel: CancellationToken,
}

impl<'a> ItemRunner<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            continue_on_fail: false,
            cancel: CancellationToken::new(),
        }
    }

    pub fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run one item and produce its record.
    pub async fn run_item(
        &self,
        resource: &str,
        operation: &str,
        index: usize,
        params: Value,
    ) -> Result<StepRecord, OperationError> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "item",
            request_id = %request_id,
            operation = %format!("{resource}.{operation}"),
            index
        );
        debug!(parent: &span, input = %redact_sensitive(&params), "item input");

        let start = Instant::now();
        let outcome = registry::execute(self.session, resource, operation, params, &self.cancel)
            .instrument(span.clone())
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                info!(parent: &span, duration_ms, success = true, "item finished");
                Ok(StepRecord::ok(format!("{resource}.{operation}"), index, result)
                    .with_request_id(request_id)
                    .with_duration(duration_ms))
            }
            Err(err) => {
                warn!(
                    parent: &span,
                    duration_ms,
                    success = false,
                    error = %err,
                    "item failed"
                );
                Err(err)
            }
        }
    }

    /// Run every item; see the module docs for failure handling.
    pub async fn run(
        &self,
        resource: &str,
        operation: &str,
        items: Vec<Value>,
    ) -> Result<Vec<StepRecord>, OperationError> {
        let mut records = Vec::with_capacity(items.len());
        for (index, params) in items.into_iter().enumerate() {
            let start = Instant::now();
            match self.run_item(resource, operation, index, params).await {
                Ok(record) => records.push(record),
                Err(err) if self.continue_on_fail => {
                    records.push(
                        StepRecord::from_error(index, &err)
                            .with_duration(start.elapsed().as_millis() as u64),
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(records)
    }
}
