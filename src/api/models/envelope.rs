//! Response envelope shared by every endpoint
//!
//! Success: `{"status":"success","payload":...,"message":"..."}`
//! Failure: `{"status":"failed","payload":null,"message":"...","error":"...","traceId":"..."}`

use serde::{Deserialize, Serialize};

/// Outcome marker carried in the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub payload: Option<T>,
    pub message: String,
    /// Error type identifier, failures only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Trace ID for correlating a failure with server logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(payload: T, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            payload: Some(payload),
            message: message.into(),
            error: None,
            trace_id: None,
        }
    }

    pub fn failed(
        message: impl Into<String>,
        error: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        Self {
            status: ResponseStatus::Failed,
            payload: None,
            message: message.into(),
            error: Some(error.into()),
            trace_id: Some(trace_id.into()),
        }
    }
}
