//! HTTP plumbing shared by the network backends.

use crate::backend::{LlmConfig, LlmError, LlmResult};
use std::time::Duration;

pub(crate) fn build_client(config: &LlmConfig) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs as u64))
        .build()
        .map_err(|e| LlmError::ApiError(format!("failed to create HTTP client: {e}")))
}

pub(crate) fn map_send_error(err: reqwest::Error, target: &str, config: &LlmConfig) -> LlmError {
    if err.is_connect() {
        LlmError::ConnectionFailed(format!("Cannot connect to {target}"))
    } else if err.is_timeout() {
        LlmError::Timeout(config.timeout_secs)
    } else {
        LlmError::ApiError(err.to_string())
    }
}
