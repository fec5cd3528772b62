//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! JSON request envelope and response decoding shared by all requests.
//!
//! Requests are posted as
//! `{"version": 4, "op": "PUT", "table_name": "t", "timeout_ms": 30000, "payload": {...}}`.
//! Any response may carry a non-zero `error_code` with an `exception` message.

use crate::error::{NoSQLError, NoSQLErrorCode};
use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use std::result::Result;
use std::time::Duration;

pub(crate) const PROTOCOL_VERSION: i16 = 4;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum OpCode {
    TableRequest,
    GetTable,
    Put,
    Get,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestEnvelope<'a, P> {
    pub(crate) version: i16,
    pub(crate) op: OpCode,
    pub(crate) table_name: &'a str,
    pub(crate) timeout_ms: u64,
    pub(crate) payload: P,
}

impl<'a, P: serde::Serialize> RequestEnvelope<'a, P> {
    pub(crate) fn new(op: OpCode, table_name: &'a str, timeout: &Duration, payload: P) -> Self {
        RequestEnvelope {
            version: PROTOCOL_VERSION,
            op,
            table_name,
            timeout_ms: timeout.as_millis() as u64,
            payload,
        }
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, NoSQLError> {
        Ok(serde_json::to_vec(self)?)
    }
}

// Only the error fields; everything else is ignored here
#[derive(Debug, Default, Deserialize)]
struct ErrorFields {
    #[serde(default)]
    error_code: i32,
    #[serde(default)]
    exception: String,
}

/// Returns the error described by a response body, if it describes one.
pub(crate) fn check_for_error(body: &[u8]) -> Option<NoSQLError> {
    let ef: ErrorFields = serde_json::from_slice(body).ok()?;
    if ef.error_code == 0 {
        return None;
    }
    Some(NoSQLError::from_int(ef.error_code, &ef.exception))
}

/// Decode a successful response body into its result struct.
pub(crate) fn decode_response<T: DeserializeOwned>(body: &[u8]) -> Result<T, NoSQLError> {
    if let Some(e) = check_for_error(body) {
        return Err(e);
    }
    serde_json::from_slice(body).map_err(|e| {
        NoSQLError::new(
            NoSQLErrorCode::BadProtocolMessage,
            &format!("malformed response body: {}", e),
        )
    })
}

/// Map a non-2xx http status to an error, preferring the code in the body.
pub(crate) fn error_from_status(status: reqwest::StatusCode, body: &[u8]) -> NoSQLError {
    if let Some(mut e) = check_for_error(body) {
        e.message = format!("{} (http status {})", e.message, status);
        return e;
    }
    let code = match status.as_u16() {
        400 => NoSQLErrorCode::IllegalArgument,
        401 => NoSQLErrorCode::InvalidAuthorization,
        403 => NoSQLErrorCode::InsufficientPermission,
        404 => NoSQLErrorCode::ResourceNotFound,
        408 | 504 => NoSQLErrorCode::RequestTimeout,
        429 => NoSQLErrorCode::ReadLimitExceeded,
        503 => NoSQLErrorCode::ServiceUnavailable,
        _ => NoSQLErrorCode::ServerError,
    };
    NoSQLError::new(
        code,
        &format!(
            "got unexpected http status: {}, response text: {}",
            status,
            String::from_utf8_lossy(body)
        ),
    )
}
