//! Normalized outcome of a RapidCoin call.
//!
//! # Design
//! Once a request has passed validation, the caller always gets an
//! `ApiResult` back: the decoded payload on 2xx, or a `FailureEnvelope`
//! carrying the HTTP status and decoded error body. When no response exists
//! at all the envelope has status `0` and an `error` object with a
//! `transport` marker, so callers can branch on `status` uniformly.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, TransportError};
use crate::http::HttpResponse;

/// Status used in a `FailureEnvelope` when the transport produced no response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// A non-success outcome described as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEnvelope {
    pub status: u16,
    pub error: Value,
}

impl FailureEnvelope {
    /// True when the request never got a response.
    pub fn is_transport(&self) -> bool {
        self.status == TRANSPORT_FAILURE_STATUS
    }

    /// The `message` string of the error body, looking one level into a
    /// nested `error` object as the payout endpoint uses.
    pub fn message(&self) -> Option<&str> {
        self.error
            .get("message")
            .or_else(|| self.error.get("error").and_then(|inner| inner.get("message")))
            .and_then(Value::as_str)
    }
}

impl fmt::Display for FailureEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}: {}", self.status, self.error)
    }
}

impl From<TransportError> for FailureEnvelope {
    fn from(err: TransportError) -> Self {
        FailureEnvelope {
            status: TRANSPORT_FAILURE_STATUS,
            error: json!({
                "message": err.message,
                "transport": err.kind.as_str(),
            }),
        }
    }
}

/// Either the decoded success payload or a `FailureEnvelope`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResult {
    Success(Value),
    Failure(FailureEnvelope),
}

impl ApiResult {
    /// Normalize a raw response. Status codes are not interpreted beyond
    /// 2xx versus everything else.
    pub fn from_response(response: HttpResponse) -> Self {
        let body = decode_body(&response.body);
        if response.is_success() {
            ApiResult::Success(body)
        } else {
            ApiResult::Failure(FailureEnvelope {
                status: response.status,
                error: body,
            })
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success(_))
    }

    /// The HTTP status for failures; `None` on success.
    pub fn failure_status(&self) -> Option<u16> {
        match self {
            ApiResult::Success(_) => None,
            ApiResult::Failure(envelope) => Some(envelope.status),
        }
    }

    pub fn into_result(self) -> Result<Value, FailureEnvelope> {
        match self {
            ApiResult::Success(payload) => Ok(payload),
            ApiResult::Failure(envelope) => Err(envelope),
        }
    }

    /// Decode the success payload into a typed view such as `Invoice`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let payload = self.into_result().map_err(ApiError::Failure)?;
        serde_json::from_value(payload).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

impl From<Result<HttpResponse, TransportError>> for ApiResult {
    fn from(outcome: Result<HttpResponse, TransportError>) -> Self {
        match outcome {
            Ok(response) => ApiResult::from_response(response),
            Err(err) => ApiResult::Failure(err.into()),
        }
    }
}

/// Empty bodies become `null`; bodies that are not JSON are kept as a string.
fn decode_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
