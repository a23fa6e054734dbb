//! Where each vendor keeps job status inside its JSON.
//!
//! Payload shapes stay opaque to the poller. A [`StatusMapping`] only knows
//! the status endpoint and a handful of JSON pointers: the status string,
//! the result to hand back on completion, the failure message and the job
//! id returned on submission.

use serde_json::Value;
use tracing::debug;

use tales_models::{JobId, StatusSample, Vendor};

use crate::error::{VendorError, VendorResult};

/// Placeholder replaced by the (URL-encoded) job id in `status_path`.
pub const JOB_ID_PLACEHOLDER: &str = "{job_id}";

/// How to read one vendor's job status responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMapping {
    /// Status endpoint relative to the base URL, containing `{job_id}`
    pub status_path: String,
    /// JSON pointer to the status string
    pub status_pointer: String,
    /// JSON pointer to the payload returned on completion (whole body if unset)
    pub result_pointer: Option<String>,
    /// JSON pointer to the failure message
    pub error_pointer: Option<String>,
    /// JSON pointer to the job id in a submission response
    pub id_pointer: String,
    /// Status values meaning the job finished successfully
    pub completed: Vec<String>,
    /// Status values meaning the vendor gave up on the job
    pub failed: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl StatusMapping {
    /// Mapping for a known vendor's public API.
    pub fn for_vendor(vendor: Vendor) -> Self {
        match vendor {
            Vendor::Wavespeed => Self {
                status_path: "/api/v3/predictions/{job_id}/result".to_string(),
                status_pointer: "/data/status".to_string(),
                result_pointer: Some("/data/outputs/0".to_string()),
                error_pointer: Some("/data/error".to_string()),
                id_pointer: "/data/id".to_string(),
                completed: strings(&["completed"]),
                failed: strings(&["failed"]),
            },
            Vendor::Fal => Self {
                status_path: "/requests/{job_id}/status".to_string(),
                status_pointer: "/status".to_string(),
                result_pointer: Some("/response_url".to_string()),
                error_pointer: Some("/error".to_string()),
                id_pointer: "/request_id".to_string(),
                completed: strings(&["COMPLETED"]),
                failed: strings(&["FAILED", "ERROR"]),
            },
            Vendor::Runway => Self {
                status_path: "/v1/tasks/{job_id}".to_string(),
                status_pointer: "/status".to_string(),
                result_pointer: Some("/output/0".to_string()),
                error_pointer: Some("/failure".to_string()),
                id_pointer: "/id".to_string(),
                completed: strings(&["SUCCEEDED"]),
                failed: strings(&["FAILED", "CANCELLED"]),
            },
            Vendor::Sora => Self {
                status_path: "/v1/videos/{job_id}".to_string(),
                status_pointer: "/status".to_string(),
                result_pointer: None,
                error_pointer: Some("/error/message".to_string()),
                id_pointer: "/id".to_string(),
                completed: strings(&["completed"]),
                failed: strings(&["failed"]),
            },
            Vendor::Suno => Self {
                status_path: "/api/v1/generate/record-info?taskId={job_id}".to_string(),
                status_pointer: "/data/status".to_string(),
                result_pointer: Some("/data/response/sunoData/0/audioUrl".to_string()),
                error_pointer: Some("/data/errorMessage".to_string()),
                id_pointer: "/data/taskId".to_string(),
                completed: strings(&["SUCCESS"]),
                failed: strings(&[
                    "CREATE_TASK_FAILED",
                    "GENERATE_AUDIO_FAILED",
                    "CALLBACK_EXCEPTION",
                    "SENSITIVE_WORD_ERROR",
                ]),
            },
            Vendor::GoApi => Self {
                status_path: "/api/v1/task/{job_id}".to_string(),
                status_pointer: "/data/status".to_string(),
                result_pointer: Some("/data/output".to_string()),
                error_pointer: Some("/data/error/message".to_string()),
                id_pointer: "/data/task_id".to_string(),
                completed: strings(&["completed"]),
                failed: strings(&["failed"]),
            },
        }
    }

    /// Full status URL for a job.
    pub fn status_url(&self, base_url: &str, job_id: &JobId) -> String {
        let path = self
            .status_path
            .replace(JOB_ID_PLACEHOLDER, &urlencoding::encode(job_id.as_str()));
        format!("{}{}", base_url.trim_end_matches('/'), path)
    }

    /// Interpret a status response body.
    ///
    /// Unknown status values (queued, throttled, ...) count as still running.
    /// A body without a status string is a malformed response.
    pub fn parse_sample(&self, body: &Value) -> VendorResult<StatusSample<Value, String>> {
        let status = body
            .pointer(&self.status_pointer)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VendorError::invalid_response(format!(
                    "no status string at {}",
                    self.status_pointer
                ))
            })?;

        if matches_any(&self.completed, status) {
            let payload = self
                .result_pointer
                .as_deref()
                .and_then(|p| body.pointer(p))
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| body.clone());
            return Ok(StatusSample::Completed(payload));
        }

        if matches_any(&self.failed, status) {
            let reason = self
                .error_pointer
                .as_deref()
                .and_then(|p| body.pointer(p))
                .and_then(describe)
                .unwrap_or_else(|| format!("vendor reported status {}", status));
            return Ok(StatusSample::Failed(reason));
        }

        debug!(status = status, "Job not finished yet");
        Ok(StatusSample::Running)
    }

    /// Extract the job id from a submission response.
    pub fn parse_job_id(&self, body: &Value) -> VendorResult<JobId> {
        let id = match body.pointer(&self.id_pointer) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(VendorError::invalid_response(format!(
                    "no job id at {}",
                    self.id_pointer
                )))
            }
        };

        let job_id = JobId::from(id);
        if job_id.is_empty() {
            return Err(VendorError::invalid_response("vendor returned an empty job id"));
        }
        Ok(job_id)
    }
}

fn matches_any(values: &[String], status: &str) -> bool {
    values.iter().any(|v| v.eq_ignore_ascii_case(status))
}

/// Render a failure field as a message; empty values say nothing.
fn describe(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
