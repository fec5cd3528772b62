//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use num_enum::TryFromPrimitive;

include!(concat!(env!("OUT_DIR"), "/ua.rs"));

pub(crate) fn crate_version() -> &'static str {
    CRATE_VERSION
}

pub(crate) fn user_agent() -> &'static str {
    USER_AGENT
}

/// Error returned by every fallible operation in this crate.
///
/// The `code` identifies the precise failure; [`NoSQLError::kind()`] groups
/// codes into the broad categories an application usually reacts to.
#[derive(Debug, Clone)]
pub struct NoSQLError {
    pub code: NoSQLErrorCode,
    pub message: String,
}

impl std::error::Error for NoSQLError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::fmt::Display for NoSQLError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "code={:?} message=\"{}\"", self.code, self.message)
    }
}

impl NoSQLError {
    pub fn new(code: NoSQLErrorCode, msg: &str) -> NoSQLError {
        NoSQLError {
            code,
            message: msg.to_string(),
        }
    }

    pub fn from_int(icode: i32, msg: &str) -> NoSQLError {
        if let Ok(code) = NoSQLErrorCode::try_from(icode) {
            return NoSQLError {
                code,
                message: msg.to_string(),
            };
        }
        NoSQLError {
            code: NoSQLErrorCode::UnknownError,
            message: format!("invalid integer error code {}: {}", icode, msg),
        }
    }

    /// The category this error belongs to.
    pub fn kind(&self) -> NoSQLErrorKind {
        self.code.kind()
    }
}

macro_rules! ia_error {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        NoSQLError {
            code: crate::error::NoSQLErrorCode::IllegalArgument,
            message: format!("{} ({})", m, crate::error::crate_version()),
        }
    }};
}

pub(crate) use ia_error;

macro_rules! ia_err {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        Err(NoSQLError {
            code: crate::error::NoSQLErrorCode::IllegalArgument,
            message: format!("{} ({})", m, crate::error::crate_version()),
        })
    }};
}

pub(crate) use ia_err;

macro_rules! schema_err {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        Err(NoSQLError {
            code: crate::error::NoSQLErrorCode::SchemaMismatch,
            message: m,
        })
    }};
}

pub(crate) use schema_err;

impl From<reqwest::Error> for NoSQLError {
    fn from(e: reqwest::Error) -> Self {
        let mut code = NoSQLErrorCode::ServerError;
        if e.is_timeout() {
            code = NoSQLErrorCode::RequestTimeout;
        } else if e.is_connect() {
            code = NoSQLErrorCode::ServiceUnavailable;
        }
        NoSQLError {
            code,
            message: format!("reqwest error: {} ({})", e, crate_version()),
        }
    }
}

impl From<reqwest::header::InvalidHeaderValue> for NoSQLError {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Self {
        ia_error!("invalid header value: {}", e)
    }
}

impl From<url::ParseError> for NoSQLError {
    fn from(e: url::ParseError) -> Self {
        ia_error!("error parsing url: {}", e)
    }
}

impl From<serde_json::Error> for NoSQLError {
    fn from(e: serde_json::Error) -> Self {
        NoSQLError {
            code: NoSQLErrorCode::BadProtocolMessage,
            message: format!("malformed response body: {}", e),
        }
    }
}

impl From<ini::Error> for NoSQLError {
    fn from(e: ini::Error) -> Self {
        ia_error!("error reading credentials file: {}", e)
    }
}

/// Broad categories of [`NoSQLError`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NoSQLErrorKind {
    /// Obtaining or presenting a credential failed.
    Auth,
    /// The service rejected a request, or the response could not be understood.
    Service,
    /// A deadline passed before the operation completed.
    Timeout,
    /// A row or key does not match the table's declared columns.
    Schema,
    /// The service reported that a table transition failed.
    Table,
    /// The application passed an invalid argument or used a closed handle.
    Client,
}

// Codes below 1000 are the ones the service sends back in the
// "error_code" field of a response. Codes from 1000 up are produced
// by this crate only.
#[derive(Debug, Clone, Copy, Eq, PartialEq, TryFromPrimitive)]
#[repr(i32)]
pub enum NoSQLErrorCode {
    /// NoError represents there is no error.
    NoError = 0,

    /// UnknownOperation error represents the operation attempted is unknown.
    UnknownOperation = 1,

    /// TableNotFound error represents the operation attempted to access a table
    /// that does not exist or is not in a visible state.
    TableNotFound = 2,

    /// IllegalArgument error represents the application provided an illegal
    /// argument for the operation.
    IllegalArgument = 4,

    /// TableExists error represents the operation attempted to create a table
    /// but the named table already exists.
    TableExists = 9,

    /// InvalidAuthorization error represents the client provides an invalid
    /// authorization string in the request header.
    InvalidAuthorization = 11,

    /// InsufficientPermission error represents an application does not have
    /// sufficient permission to perform a request.
    InsufficientPermission = 12,

    /// ResourceNotFound error represents the operation attempted to access a
    /// resource that does not exist or is not in a visible state.
    ResourceNotFound = 14,

    /// BadProtocolMessage error represents a request or response body that
    /// does not follow the wire format.
    BadProtocolMessage = 17,

    /// OperationNotSupported error represents the operation attempted is not supported.
    OperationNotSupported = 21,

    /// ReadLimitExceeded error represents that the provisioned read throughput
    /// has been exceeded.
    ReadLimitExceeded = 50,

    /// WriteLimitExceeded error represents that the provisioned write throughput
    /// has been exceeded.
    WriteLimitExceeded = 51,

    /// RequestTimeout error represents the request cannot be processed or does
    /// not complete when the specified timeout duration elapses.
    RequestTimeout = 100,

    /// ServerError represents there is an internal system problem.
    ServerError = 101,

    /// ServiceUnavailable error represents the requested service is currently unavailable.
    ServiceUnavailable = 102,

    /// TableBusy error represents the table is in use or busy.
    TableBusy = 103,

    /// RetryAuthentication error represents the authentication failed and may need to retry.
    RetryAuthentication = 105,

    /// UnknownError represents an unknown error has occurred on the server.
    UnknownError = 125,

    /// IllegalState error represents an illegal state, such as using a closed handle.
    IllegalState = 126,

    /// AuthenticationFailed is returned when the identity service refuses to
    /// issue an access token, or cannot be reached.
    AuthenticationFailed = 1002,

    /// SchemaMismatch is returned when a row or key does not carry the table's
    /// primary key columns, or carries values of the wrong type.
    SchemaMismatch = 1003,

    /// TableFailed is returned when the service reports a table in the FAILED state.
    TableFailed = 1004,
}

impl NoSQLErrorCode {
    pub fn kind(&self) -> NoSQLErrorKind {
        use NoSQLErrorCode::*;
        match self {
            AuthenticationFailed | InvalidAuthorization | InsufficientPermission
            | RetryAuthentication => NoSQLErrorKind::Auth,
            RequestTimeout => NoSQLErrorKind::Timeout,
            SchemaMismatch => NoSQLErrorKind::Schema,
            TableFailed => NoSQLErrorKind::Table,
            IllegalArgument | IllegalState => NoSQLErrorKind::Client,
            _ => NoSQLErrorKind::Service,
        }
    }
}
