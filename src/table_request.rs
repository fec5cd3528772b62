//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::NoSQLErrorCode::{RequestTimeout, TableFailed, TableNotFound};
use crate::error::{ia_err, NoSQLError, NoSQLErrorCode};
use crate::handle::Handle;
use crate::handle::SendOptions;
use crate::protocol::OpCode;
use crate::table_descriptor::{drop_ddl, validate_table_name, TableDescriptor, TableSchema};
use crate::types::{TableLimits, TableState};
use serde_derive::{Deserialize, Serialize};
use std::future::Future;
use std::result::Result;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

/// Struct used for creating or dropping a table in the NoSQL Database.
///
/// Most applications use [`Handle::create_table_if_not_exists()`] and
/// [`Handle::drop_table_if_exists()`], which build the DDL statement from a
/// [`TableDescriptor`]. This struct sends a statement as given.
///
/// Example:
/// ```no_run
/// use nosql_cloud_quickstart::TableRequest;
/// use nosql_cloud_quickstart::types::*;
/// # use nosql_cloud_quickstart::Handle;
/// # #[tokio::main]
/// # pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let handle = Handle::builder().build().await?;
///     TableRequest::new("testusers")
///         .statement(
///             "CREATE TABLE IF NOT EXISTS testusers(id INTEGER, name STRING, PRIMARY KEY(id))",
///         )
///         // the following line is only needed for Cloud mode
///         .limits(&TableLimits::provisioned(1, 2, 1))
///         .execute(&handle)
///         .await?
///         // wait up to 60 seconds for table to be created
///         .wait_for_completion_ms(&handle, 60000, 1000)
///         .await?;
/// # Ok(())
/// # }
///```
#[derive(Default, Debug)]
pub struct TableRequest {
    pub(crate) table_name: String,
    pub(crate) compartment_id: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) statement: String,
    pub(crate) limits: Option<TableLimits>,
}

/// Struct used to get information about a table in the NoSQL Database.
#[derive(Default, Debug)]
pub struct GetTableRequest {
    pub(crate) table_name: String,
    pub(crate) compartment_id: String,
    pub(crate) operation_id: String,
    pub(crate) timeout: Option<Duration>,
}

/// Struct representing the result of a [`TableRequest`] or a [`GetTableRequest`].
#[derive(Default, Debug, Clone, Deserialize)]
pub struct TableResult {
    #[serde(default)]
    pub(crate) table_name: String,
    #[serde(default)]
    pub(crate) compartment_id: String,
    #[serde(default)]
    pub(crate) ddl: String,
    #[serde(default)]
    pub(crate) operation_id: String,
    #[serde(default)]
    pub(crate) schema: Option<TableSchema>,
    pub(crate) state: TableState,
    #[serde(default)]
    pub(crate) limits: Option<TableLimits>,
}

#[derive(Debug, Serialize)]
struct TableRequestPayload<'a> {
    statement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    limits: Option<&'a TableLimits>,
}

#[derive(Debug, Serialize)]
struct GetTablePayload<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    operation_id: &'a str,
}

fn check_timeout(t: &Option<Duration>) -> Result<(), NoSQLError> {
    if let Some(d) = t {
        if *d < Duration::from_millis(1) {
            return ia_err!("timeout must be at least 1 millisecond");
        }
    }
    Ok(())
}

impl TableRequest {
    /// Create a new TableRequest.
    ///
    /// `table_name` is required and must be non-empty.
    pub fn new(table_name: &str) -> TableRequest {
        TableRequest {
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
    ///
    /// Note this is just the timeout for the initial request. The actual operation may take significantly longer,
    /// and its completion should be waited for by calling [`TableResult::wait_for_completion()`].
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

    /// Set the DDL statement for the table operation.
    pub fn statement(mut self, stmt: &str) -> TableRequest {
        self.statement = stmt.to_string();
        self
    }

    /// Cloud only: specify table limits for the table.
    pub fn limits(mut self, limits: &TableLimits) -> TableRequest {
        self.limits = Some(limits.clone());
        self
    }

    /// Execute the table request.
    ///
    /// This starts the asynchronous execution of the request in the system. The returned result should be
    /// used to wait for completion by calling [`TableResult::wait_for_completion()`].
    pub async fn execute(&self, h: &Handle) -> Result<TableResult, NoSQLError> {
        validate_table_name(&self.table_name)?;
        if self.statement.trim().is_empty() {
            return ia_err!("table request for {} has no statement", self.table_name);
        }
        check_timeout(&self.timeout)?;
        let timeout = h.get_timeout(&self.timeout);
        let opts = SendOptions {
            timeout,
            compartment_id: self.compartment_id.clone(),
        };
        let payload = TableRequestPayload {
            statement: &self.statement,
            limits: self.limits.as_ref(),
        };
        debug!("table request: {}", self.statement);
        let mut res: TableResult = h
            .send_and_receive(OpCode::TableRequest, &self.table_name, payload, &opts)
            .await?;
        if res.table_name.is_empty() {
            res.table_name = self.table_name.clone();
        }
        res.update_schema_cache(h);
        Ok(res)
    }
}

impl GetTableRequest {
    pub fn new(table_name: &str) -> GetTableRequest {
        GetTableRequest {
            table_name: table_name.to_string(),
            ..Default::default()
        }
    }

    /// Specify the timeout value for the request.
    ///
    /// If not set, the default timeout value configured for the [`Handle`](crate::HandleBuilder::timeout()) is used.
    pub fn timeout(mut self, t: &Duration) -> Self {
        self.timeout = Some(*t);
        self
    }

    /// Cloud Service only: set the name or id of a compartment to be used for this operation.
    pub fn compartment_id(mut self, compartment_id: &str) -> Self {
        self.compartment_id = compartment_id.to_string();
        self
    }

    pub fn operation_id(mut self, op_id: &str) -> GetTableRequest {
        self.operation_id = op_id.to_string();
        self
    }

    pub async fn execute(&self, h: &Handle) -> Result<TableResult, NoSQLError> {
        validate_table_name(&self.table_name)?;
        check_timeout(&self.timeout)?;
        let timeout = h.get_timeout(&self.timeout);
        let opts = SendOptions {
            timeout,
            compartment_id: self.compartment_id.clone(),
        };
        let payload = GetTablePayload {
            operation_id: &self.operation_id,
        };
        let mut res: TableResult = h
            .send_and_receive(OpCode::GetTable, &self.table_name, payload, &opts)
            .await?;
        if res.table_name.is_empty() {
            res.table_name = self.table_name.clone();
        }
        res.update_schema_cache(h);
        trace!("table {} is {}", res.table_name, res.state);
        Ok(res)
    }
}

/// Poll until `is_done` accepts the polled state, the table fails, or `wait` elapses.
///
/// The first poll happens immediately. After each unfinished poll the loop
/// sleeps `delay`; once the deadline has passed no further poll is made.
pub(crate) async fn poll_until_state<F, Fut>(
    wait: Duration,
    delay: Duration,
    is_done: impl Fn(TableState) -> bool,
    mut poll: F,
) -> Result<TableResult, NoSQLError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<TableResult, NoSQLError>>,
{
    if wait < delay {
        return ia_err!("wait duration must be greater than delay duration");
    }
    let start_time = Instant::now();
    let deadline = start_time + wait;
    loop {
        let res = poll().await?;
        if is_done(res.state) {
            return Ok(res);
        }
        if res.state == TableState::Failed {
            return Err(NoSQLError::new(
                TableFailed,
                &format!("operation on table {} failed", res.table_name),
            ));
        }
        trace!(
            "table {} is {}, elapsed={:?}",
            res.table_name,
            res.state,
            start_time.elapsed()
        );
        sleep(delay).await;
        if Instant::now() >= deadline {
            return Err(NoSQLError::new(
                RequestTimeout,
                &format!(
                    "operation not completed in expected time: table {} still {} after {}ms",
                    res.table_name,
                    res.state,
                    wait.as_millis()
                ),
            ));
        }
    }
}

impl TableResult {
    /// Wait for a TableRequest to complete.
    ///
    /// This method will loop, polling the system for the status of the table
    /// until it reaches `Active` or `Dropped`, gets an error, or times out.
    pub async fn wait_for_completion(
        &mut self,
        h: &Handle,
        wait: Duration,
        delay: Duration,
    ) -> Result<(), NoSQLError> {
        if self.is_terminal() {
            return Ok(());
        }
        let get_request = GetTableRequest::new(self.table_name.as_str())
            .operation_id(self.operation_id.as_str())
            .compartment_id(self.compartment_id.as_str());
        let res = poll_until_state(
            wait,
            delay,
            |s| s == TableState::Active || s == TableState::Dropped,
            || get_request.execute(h),
        )
        .await?;

        self.state = res.state;
        self.limits = res.limits;
        self.schema = res.schema;
        self.ddl = res.ddl;
        Ok(())
    }

    /// Wait for a TableRequest to complete.
    ///
    /// This is a convenience method to allow direct millisecond values instead of creating
    /// `Duration` structs.
    pub async fn wait_for_completion_ms(
        &mut self,
        h: &Handle,
        wait_ms: u64,
        delay_ms: u64,
    ) -> Result<(), NoSQLError> {
        self.wait_for_completion(
            h,
            Duration::from_millis(wait_ms),
            Duration::from_millis(delay_ms),
        )
        .await
    }

    fn is_terminal(&self) -> bool {
        self.state == TableState::Active || self.state == TableState::Dropped
    }

    // Result for a table that is known not to exist
    fn dropped(table_name: &str) -> TableResult {
        TableResult {
            table_name: table_name.to_string(),
            state: TableState::Dropped,
            ..Default::default()
        }
    }

    /// Get the table name.
    // Dropped tables leave the registry; live ones refresh it.
    fn update_schema_cache(&self, h: &Handle) {
        match (self.state, &self.schema) {
            (TableState::Dropping | TableState::Dropped, _) => h.forget_schema(&self.table_name),
            (_, Some(s)) => h.remember_schema(&self.table_name, s),
            _ => {}
        }
    }

    pub fn table_name(&self) -> String {
        self.table_name.clone()
    }
    /// Cloud only: get the compartment id of the table.
    pub fn compartment_id(&self) -> String {
        self.compartment_id.clone()
    }
    /// Get the DDL statement that was used to create the table.
    pub fn ddl(&self) -> String {
        self.ddl.clone()
    }
    /// Get the internal operation ID for an in-progress table request.
    ///
    /// This is typically not needed by applications.
    /// Internally, [`TableResult::wait_for_completion()`] uses this value when polling the system.
    pub fn operation_id(&self) -> String {
        self.operation_id.clone()
    }
    /// Get the declared columns and primary key of the table, if the service returned them.
    pub fn schema(&self) -> Option<&TableSchema> {
        self.schema.as_ref()
    }
    /// Get the current state of the table.
    pub fn state(&self) -> TableState {
        self.state
    }
    /// Cloud only: get the table limits.
    pub fn limits(&self) -> Option<TableLimits> {
        self.limits.clone()
    }
}

/// Find the table named by a `CREATE TABLE` or `DROP TABLE` statement.
pub(crate) fn table_name_from_ddl(ddl: &str) -> Option<String> {
    let spaced = ddl.replace('(', " ( ");
    let mut words = spaced.split_whitespace();
    words.find(|w| w.eq_ignore_ascii_case("table"))?;
    words
        .find(|w| {
            !w.eq_ignore_ascii_case("if")
                && !w.eq_ignore_ascii_case("not")
                && !w.eq_ignore_ascii_case("exists")
        })
        .filter(|w| *w != "(")
        .map(|w| w.to_string())
}

impl Handle {
    /// Send a DDL statement, with optional table limits.
    ///
    /// The result is returned as soon as the service accepts the statement;
    /// use [`Handle::wait_for_state()`] or [`TableResult::wait_for_completion()`]
    /// to wait for the table to settle.
    pub async fn execute_table_request(
        &self,
        ddl: &str,
        limits: Option<&TableLimits>,
    ) -> Result<TableResult, NoSQLError> {
        let table_name = match table_name_from_ddl(ddl) {
            Some(n) => n,
            None => return ia_err!("cannot find a table name in statement '{}'", ddl),
        };
        let mut req = TableRequest::new(&table_name).statement(ddl);
        if let Some(l) = limits {
            req = req.limits(l);
        }
        req.execute(self).await
    }

    /// Create the described table unless it already exists.
    ///
    /// Returns without waiting; the table is usually still `Creating`. If the
    /// service reports that the table exists, its current description is returned.
    pub async fn create_table_if_not_exists(
        &self,
        td: &TableDescriptor,
    ) -> Result<TableResult, NoSQLError> {
        let ddl = td.create_ddl()?;
        match self.execute_table_request(&ddl, td.table_limits()).await {
            Ok(mut res) => {
                if res.schema.is_none() {
                    res.schema = Some(td.schema().clone());
                }
                self.remember_schema(td.name(), td.schema());
                Ok(res)
            }
            Err(e) if e.code == NoSQLErrorCode::TableExists => {
                debug!("table {} already exists", td.name());
                self.describe_table(td.name()).await
            }
            Err(e) => Err(e),
        }
    }

    /// Drop the named table if it exists.
    ///
    /// Returns without waiting. If the service reports that there is no such
    /// table, the returned result is already `Dropped`.
    pub async fn drop_table_if_exists(&self, table_name: &str) -> Result<TableResult, NoSQLError> {
        let ddl = drop_ddl(table_name)?;
        self.forget_schema(table_name);
        match self.execute_table_request(&ddl, None).await {
            Ok(res) => Ok(res),
            Err(e) if e.code == TableNotFound => {
                debug!("table {} does not exist", table_name);
                Ok(TableResult::dropped(table_name))
            }
            Err(e) => Err(e),
        }
    }

    /// Get the current state and schema of the named table.
    pub async fn describe_table(&self, table_name: &str) -> Result<TableResult, NoSQLError> {
        GetTableRequest::new(table_name).execute(self).await
    }

    /// Poll the named table until it reaches `target`.
    ///
    /// The table is described every `poll_interval_ms` for at most `timeout_ms`.
    /// Fails with [`RequestTimeout`](NoSQLErrorCode::RequestTimeout) when the
    /// time runs out, and with [`TableFailed`](NoSQLErrorCode::TableFailed)
    /// if the service reports the table as failed. While waiting for `Dropped`,
    /// a table that no longer exists counts as dropped.
    pub async fn wait_for_state(
        &self,
        table_name: &str,
        target: TableState,
        timeout_ms: u64,
        poll_interval_ms: u64,
    ) -> Result<TableState, NoSQLError> {
        let res = poll_until_state(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_interval_ms),
            |s| s == target,
            move || async move {
                match self.describe_table(table_name).await {
                    Err(e) if e.code == TableNotFound && target == TableState::Dropped => {
                        Ok(TableResult::dropped(table_name))
                    }
                    r => r,
                }
            },
        )
        .await?;
        Ok(res.state)
    }
}
