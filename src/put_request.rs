//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::{ia_err, NoSQLError};
use crate::handle::Handle;
use crate::handle::SendOptions;
use crate::protocol::OpCode;
use crate::table_descriptor::validate_table_name;
use crate::types::MapValue;
use crate::Version;
use serde_derive::{Deserialize, Serialize};
use std::result::Result;
use std::time::Duration;
use tracing::debug;

/// Struct used for inserting a single row of data into a NoSQL table.
///
/// This request can be used to insert a new row or overwrite an existing row.
/// The row must carry every primary key column of the table with a value of
/// the declared type, and may only carry declared columns. Rows that do not
/// are rejected with [`SchemaMismatch`](crate::NoSQLErrorCode::SchemaMismatch)
/// before anything is sent.
///
/// Example:
/// ```no_run
/// use nosql_cloud_quickstart::PutRequest;
/// use nosql_cloud_quickstart::types::*;
/// # use nosql_cloud_quickstart::Handle;
/// # #[tokio::main]
/// # pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let handle = Handle::builder().build().await?;
///     let putres = PutRequest::new("HelloWorldTable")
///         .value(MapValue::new().i32("id", 29).str("name", "Tracy"))
///         .execute(&handle)
///         .await?;
///     println!("PutResult={:?}", putres);
/// # Ok(())
/// # }
/// ```
#[derive(Default, Debug)]
pub struct PutRequest {
    pub(crate) table_name: String,
    pub(crate) compartment_id: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) value: MapValue,
}

/// Struct representing the result of a [`PutRequest`] execution.
///
/// This struct is returned from a [`PutRequest::execute()`] call.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct PutResult {
    pub(crate) success: bool,
    #[serde(default, deserialize_with = "crate::types::base64_version::deserialize")]
    pub(crate) version: Option<Version>,
}

impl PutResult {
    /// Returns true if the row was written.
    pub fn success(&self) -> bool {
        self.success
    }
    /// Get the Version of the now-current record. This value is `Some` if the put operation succeeded.
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }
}

#[derive(Debug, Serialize)]
struct PutPayload<'a> {
    row: &'a MapValue,
}

impl PutRequest {
    /// Create a new PutRequest.
    ///
    /// `table_name` should be the name of the table to insert the record into. It is required to be non-empty.
    pub fn new(table_name: &str) -> PutRequest {
        PutRequest {
            table_name: table_name.to_string(),
            ..Default::default()
        }
    }

    /// Set the row value to use for the put operation, from a [`MapValue`].
    pub fn value(mut self, val: MapValue) -> PutRequest {
        self.value = val;
        self
    }

    /// Specify the timeout value for the request.
    ///
    /// This is optional.
    /// If set, it must be greater than or equal to 1 millisecond, otherwise an
    /// IllegalArgument error will be returned.
    /// If not set, the default timeout value configured for the [`Handle`](crate::HandleBuilder::timeout()) is used.
    pub fn timeout(mut self, t: &Duration) -> PutRequest {
        self.timeout = Some(*t);
        self
    }

    /// Cloud Service only: set the name or id of a compartment to be used for this operation.
    ///
    /// If no compartment is given, the compartment configured on the handle is used.
    pub fn compartment_id(mut self, compartment_id: &str) -> PutRequest {
        self.compartment_id = compartment_id.to_string();
        self
    }

    pub async fn execute(&self, h: &Handle) -> Result<PutResult, NoSQLError> {
        validate_table_name(&self.table_name)?;
        if self.value.is_empty() {
            return ia_err!("put on table {} has no row value", self.table_name);
        }
        if let Some(t) = &self.timeout {
            if *t < Duration::from_millis(1) {
                return ia_err!("timeout must be at least 1 millisecond");
            }
        }
        let schema = h.table_schema(&self.table_name).await?;
        schema.validate_row(&self.table_name, &self.value)?;

        let opts = SendOptions {
            timeout: h.get_timeout(&self.timeout),
            compartment_id: self.compartment_id.clone(),
        };
        let payload = PutPayload { row: &self.value };
        let res: PutResult = h
            .send_and_receive(OpCode::Put, &self.table_name, payload, &opts)
            .await?;
        debug!(
            "put into {}: success={} version={:?}",
            self.table_name, res.success, res.version
        );
        Ok(res)
    }
}

impl Handle {
    /// Write one row into `table_name`, replacing any row with the same primary key.
    pub async fn put(&self, table_name: &str, row: &MapValue) -> Result<PutResult, NoSQLError> {
        PutRequest::new(table_name)
            .value(row.clone())
            .execute(self)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_result_decodes_version() {
        let r: PutResult = serde_json::from_str(r#"{"success": true, "version": "AQID"}"#).unwrap();
        assert!(r.success());
        assert_eq!(r.version(), Some(&vec![1u8, 2, 3]));

        let r: PutResult = serde_json::from_str(r#"{"success": false, "version": null}"#).unwrap();
        assert!(!r.success());
        assert!(r.version().is_none());
    }

    #[test]
    fn payload_uses_tagged_values() {
        let row = MapValue::new().i32("id", 29).str("name", "Tracy");
        let v = serde_json::to_value(PutPayload { row: &row }).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"row": {"id": {"INTEGER": 29}, "name": {"STRING": "Tracy"}}})
        );
    }
}
