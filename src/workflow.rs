//! Workflow envelope for embedding the pipeline in a request/response
//! service.
//!
//! A [`Workflow`] takes a JSON request and produces a JSON payload; the
//! [`run`] driver wraps either outcome in a uniform envelope
//! (`status`/`message`/`data`) and writes an audit line per invocation.
//! Hosting layers (HTTP handlers, queue consumers) only ever deal with the
//! envelope, so a workflow that errors looks structurally identical to one
//! that succeeds.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::process;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{error, info};

/// A named unit of work driven by JSON in, JSON out.
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Stable identifier, used in audit logs and routing.
    fn name(&self) -> &str;

    /// Execute the workflow against one request.
    async fn execute(&self, request: Value) -> Result<Value, PipelineError>;
}

/// Run a workflow and fold the outcome into the response envelope.
///
/// The envelope always has `status` (`"success"` or `"error"`) and
/// `message`; `data` carries the workflow's payload on success.
pub async fn run(workflow: &dyn Workflow, request: Value) -> Value {
    let started = Instant::now();
    info!(workflow = workflow.name(), "workflow started");

    match workflow.execute(request).await {
        Ok(data) => {
            info!(
                workflow = workflow.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "workflow completed"
            );
            json!({
                "status": "success",
                "message": format!("workflow '{}' completed", workflow.name()),
                "data": data,
            })
        }
        Err(e) => {
            error!(
                workflow = workflow.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "workflow failed: {e}"
            );
            json!({
                "status": "error",
                "message": e.to_string(),
            })
        }
    }
}

/// Document-processing workflow: request names a document on disk, the
/// payload is the full [`crate::output::PipelineResult`].
pub struct FilingWorkflow {
    config: PipelineConfig,
}

impl FilingWorkflow {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Workflow for FilingWorkflow {
    fn name(&self) -> &str {
        "filing-extraction"
    }

    async fn execute(&self, request: Value) -> Result<Value, PipelineError> {
        let path = request
            .get("document_path")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PipelineError::InvalidConfig("request is missing 'document_path'".into())
            })?;

        let result = process::process_document(path, &self.config).await;
        serde_json::to_value(result)
            .map_err(|e| PipelineError::Internal(format!("serialising result: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoWorkflow;

    #[async_trait]
    impl Workflow for EchoWorkflow {
        fn name(&self) -> &str {
            "echo"
        }

        async fn execute(&self, request: Value) -> Result<Value, PipelineError> {
            Ok(request)
        }
    }

    struct FailingWorkflow;

    #[async_trait]
    impl Workflow for FailingWorkflow {
        fn name(&self) -> &str {
            "failing"
        }

        async fn execute(&self, _request: Value) -> Result<Value, PipelineError> {
            Err(PipelineError::NoTextExtracted)
        }
    }

    #[tokio::test]
    async fn success_envelope_carries_data() {
        let envelope = run(&EchoWorkflow, json!({"k": 1})).await;
        assert_eq!(envelope["status"], "success");
        assert_eq!(envelope["data"]["k"], 1);
        assert!(envelope["message"].as_str().unwrap().contains("echo"));
    }

    #[tokio::test]
    async fn error_envelope_has_no_data() {
        let envelope = run(&FailingWorkflow, json!({})).await;
        assert_eq!(envelope["status"], "error");
        assert!(envelope.get("data").is_none());
        assert!(envelope["message"].as_str().unwrap().contains("no text"));
    }

    #[tokio::test]
    async fn filing_workflow_requires_document_path() {
        let workflow = FilingWorkflow::new(PipelineConfig::default());
        let err = workflow.execute(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("document_path"));
    }

    #[tokio::test]
    async fn filing_workflow_folds_missing_file_into_result_payload() {
        // A nonexistent document is a pipeline-level failure, not a
        // workflow error: the envelope is success and the payload carries
        // the failed status.
        let workflow = FilingWorkflow::new(PipelineConfig::default());
        let envelope = run(&workflow, json!({"document_path": "/nonexistent.pdf"})).await;
        assert_eq!(envelope["status"], "success");
        assert_eq!(envelope["data"]["status"], "failed");
    }
}
