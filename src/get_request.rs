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
use crate::types::{Consistency, MapValue};
use crate::Version;
use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::result::Result;
use std::time::Duration;
use tracing::debug;

/// Struct used for getting a single row of data from a NoSQL table.
///
/// The key must contain exactly the primary key columns of the table.
#[derive(Default, Debug)]
pub struct GetRequest {
    pub(crate) table_name: String,
    pub(crate) compartment_id: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) key: MapValue,
    pub(crate) consistency: Consistency,
}

/// Struct representing the result of a [`GetRequest`] operation.
///
/// This struct is returned from a [`GetRequest::execute()`] call.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct GetResult {
    // must be present; null means no row matched
    #[serde(deserialize_with = "required_row")]
    pub(crate) row: Option<MapValue>,
    #[serde(default)]
    pub(crate) modification_time: i64,
    #[serde(default, deserialize_with = "crate::types::base64_version::deserialize")]
    pub(crate) version: Option<Version>,
}

fn required_row<'de, D>(deserializer: D) -> Result<Option<MapValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    <Option<MapValue> as serde::Deserialize>::deserialize(deserializer)
}

impl GetResult {
    /// Get the returned row. If the row does not exist in the table, this value will be `None`.
    pub fn row(&self) -> Option<&MapValue> {
        self.row.as_ref()
    }
    /// Get the last modification time of the row. This is only valid if the operation succeeded.
    /// Its value is the number of milliseconds since the epoch (Jan 1 1970).
    pub fn modification_time(&self) -> i64 {
        self.modification_time
    }
    /// The last modification time of the row as a UTC timestamp, if one was returned.
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        if self.modification_time <= 0 {
            return None;
        }
        DateTime::<Utc>::from_timestamp_millis(self.modification_time)
    }
    /// Get the Version of the row. This is only valid if the row was found.
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }
}

#[derive(Debug, Serialize)]
struct GetPayload<'a> {
    key: &'a MapValue,
    consistency: Consistency,
}

impl GetRequest {
    /// Create a new `GetRequest`.
    ///
    /// `table_name` is required and must be non-empty.
    pub fn new(table_name: &str) -> GetRequest {
        GetRequest {
            table_name: table_name.to_string(),
            ..Default::default()
        }
    }

    /// Specify the timeout value for the request.
    ///
    /// This is optional.
    /// If set, it must be greater than or equal to 1 millisecond, otherwise an
    /// IllegalArgument error will be returned.
    /// If not set, the default timeout value configured for the [`Handle`](crate::HandleBuilder::timeout()) is used.
    pub fn timeout(mut self, t: &Duration) -> Self {
        self.timeout = Some(*t);
        self
    }

    /// Cloud Service only: set the name or id of a compartment to be used for this operation.
    ///
    /// If no compartment is given, the compartment configured on the handle is used.
    pub fn compartment_id(mut self, compartment_id: &str) -> Self {
        self.compartment_id = compartment_id.to_string();
        self
    }

    /// Specify the primary key to use to find the row (record) in the table, from a [`MapValue`].
    pub fn key(mut self, key: MapValue) -> GetRequest {
        self.key = key;
        self
    }

    /// Specify the desired [`Consistency`] for the operation.
    pub fn consistency(mut self, c: Consistency) -> GetRequest {
        self.consistency = c;
        self
    }

    /// Execute the request, returning a [`GetResult`].
    ///
    /// If the record exists in the table, [`GetResult::row`] will be `Some()`.
    pub async fn execute(&self, h: &Handle) -> Result<GetResult, NoSQLError> {
        validate_table_name(&self.table_name)?;
        if let Some(t) = &self.timeout {
            if *t < Duration::from_millis(1) {
                return ia_err!("timeout must be at least 1 millisecond");
            }
        }
        let schema = h.table_schema(&self.table_name).await?;
        schema.validate_key(&self.table_name, &self.key)?;

        let opts = SendOptions {
            timeout: h.get_timeout(&self.timeout),
            compartment_id: self.compartment_id.clone(),
        };
        let payload = GetPayload {
            key: &self.key,
            consistency: self.consistency,
        };
        let res: GetResult = h
            .send_and_receive(OpCode::Get, &self.table_name, payload, &opts)
            .await?;
        debug!(
            "get from {}: found={}",
            self.table_name,
            res.row.is_some()
        );
        Ok(res)
    }
}

impl Handle {
    /// Read the row of `table_name` with the given primary key.
    ///
    /// Returns `None` when there is no such row.
    pub async fn get(
        &self,
        table_name: &str,
        key: &MapValue,
    ) -> Result<Option<MapValue>, NoSQLError> {
        let res = GetRequest::new(table_name)
            .key(key.clone())
            .execute(self)
            .await?;
        Ok(res.row)
    }
}
