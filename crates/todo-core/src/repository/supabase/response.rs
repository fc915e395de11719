//! Response checking shared by the auth and REST clients.

use reqwest::{Response, StatusCode};
use serde::Deserialize;

use crate::domain::{DomainError, DomainResult};

/// Union of the error bodies GoTrue and PostgREST produce
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Pass successful responses through; turn anything else into a service error
pub(crate) async fn ensure_success(response: Response) -> DomainResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DomainError::service(status.as_u16(), error_message(status, &body)))
}

pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.msg.or(b.message).or(b.error_description).or(b.error))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body.trim().to_string()
            }
        })
}
