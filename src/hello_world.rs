//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! The hello-world sequence: create a table, write a row, read it back, and
//! optionally drop the table.
//!
//! This is the library half of the `hello-world` program. The binary parses
//! the command line and calls [`run()`].

use crate::auth_common::file_credentials_provider::DEFAULT_CREDENTIALS_FILE_PATH;
use crate::endpoint::Endpoint;
use crate::error::{NoSQLError, NoSQLErrorCode};
use crate::handle::Handle;
use crate::handle_builder::{AuthProvider, HandleBuilder};
use crate::table_descriptor::TableDescriptor;
use crate::types::{FieldType, MapValue, TableLimits, TableState};
use std::result::Result;
use tracing::{debug, info};

pub const TABLE_NAME: &str = "HelloWorldTable";

pub const USAGE: &str = "Usage: hello-world <endpoint> [-drop]";

/// Settings for one run of the sequence.
///
/// The create and drop waits differ; both are kept as given.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub table_name: String,
    pub limits: TableLimits,
    /// How long to wait for the table to become `Active`.
    pub create_timeout_ms: u64,
    /// How long to wait for the table to become `Dropped`.
    pub drop_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            table_name: TABLE_NAME.to_string(),
            limits: TableLimits::provisioned(1, 2, 1),
            create_timeout_ms: 60_000,
            drop_timeout_ms: 100_000,
            poll_interval_ms: 1_000,
        }
    }
}

impl DemoConfig {
    /// `<table>(id INTEGER, name STRING, PRIMARY KEY(id))` with the configured limits.
    pub fn table_descriptor(&self) -> TableDescriptor {
        TableDescriptor::new(&self.table_name)
            .column("id", FieldType::Integer)
            .column("name", FieldType::String)
            .primary_key(&["id"])
            .limits(self.limits.clone())
    }
}

/// Progress of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoState {
    Start,
    TableCreating,
    TableActive,
    RowWritten,
    RowRead,
    TableDropping,
    TableDropped,
    Done,
    Error,
}

impl DemoState {
    /// Returns true if a run may move from this state to `next`.
    pub fn can_advance_to(&self, next: DemoState) -> bool {
        use DemoState::*;
        match (*self, next) {
            (Start, TableCreating)
            | (TableCreating, TableActive)
            | (TableActive, RowWritten)
            | (RowWritten, RowRead)
            | (RowRead, Done)
            | (Start, TableDropping)
            | (TableDropping, TableDropped)
            | (TableDropped, Done) => true,
            (Done, _) | (Error, _) => false,
            (_, Error) => true,
            _ => false,
        }
    }
}

/// Returns true if the optional second argument asks for the table to be dropped.
///
/// ```
/// use nosql_cloud_quickstart::hello_world::is_drop;
/// assert!(is_drop(Some("-DROP")));
/// assert!(!is_drop(None));
/// ```
pub fn is_drop(arg: Option<&str>) -> bool {
    arg.map_or(false, |a| a.eq_ignore_ascii_case("-drop"))
}

/// One run of the sequence against a handle.
#[derive(Debug)]
pub struct Demo {
    config: DemoConfig,
    state: DemoState,
    history: Vec<DemoState>,
    row_written: Option<MapValue>,
    row_read: Option<MapValue>,
}

impl Demo {
    pub fn new(config: DemoConfig) -> Demo {
        Demo {
            config,
            state: DemoState::Start,
            history: vec![DemoState::Start],
            row_written: None,
            row_read: None,
        }
    }

    pub fn state(&self) -> DemoState {
        self.state
    }

    /// Every state the run has been in, in order.
    pub fn history(&self) -> &[DemoState] {
        &self.history
    }

    pub fn row_written(&self) -> Option<&MapValue> {
        self.row_written.as_ref()
    }

    pub fn row_read(&self) -> Option<&MapValue> {
        self.row_read.as_ref()
    }

    fn advance(&mut self, next: DemoState) -> Result<(), NoSQLError> {
        if !self.state.can_advance_to(next) {
            return Err(NoSQLError::new(
                NoSQLErrorCode::IllegalState,
                &format!("cannot move from {:?} to {:?}", self.state, next),
            ));
        }
        debug!("demo state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    fn finish(&mut self, r: Result<(), NoSQLError>) -> Result<(), NoSQLError> {
        match r {
            Ok(()) => self.advance(DemoState::Done),
            Err(e) => {
                let _ = self.advance(DemoState::Error);
                Err(e)
            }
        }
    }

    /// Create the table, wait for it, write a row and read it back.
    pub async fn run_hello_world(&mut self, h: &Handle) -> Result<(), NoSQLError> {
        let r = self.hello_world_steps(h).await;
        self.finish(r)
    }

    /// Drop the table and wait for it to be gone.
    pub async fn run_drop(&mut self, h: &Handle) -> Result<(), NoSQLError> {
        let r = self.drop_steps(h).await;
        self.finish(r)
    }

    async fn hello_world_steps(&mut self, h: &Handle) -> Result<(), NoSQLError> {
        let table = self.config.table_name.clone();
        let td = self.config.table_descriptor();

        println!("Creating table {}", table);
        self.advance(DemoState::TableCreating)?;
        let res = h.create_table_if_not_exists(&td).await?;
        info!("create table {} returned state {}", table, res.state());

        println!("Waiting for {} to become active", table);
        h.wait_for_state(
            &table,
            TableState::Active,
            self.config.create_timeout_ms,
            self.config.poll_interval_ms,
        )
        .await?;
        println!("Table {} is active", table);
        self.advance(DemoState::TableActive)?;

        let row = MapValue::new().i32("id", 29).str("name", "Tracy");
        h.put(&table, &row).await?;
        println!("Wrote {}", row);
        self.row_written = Some(row);
        self.advance(DemoState::RowWritten)?;

        let key = MapValue::new().i32("id", 29);
        let got = h.get(&table, &key).await?;
        match &got {
            Some(r) => println!("Read {}", r),
            None => println!("Read null"),
        }
        self.row_read = got;
        self.advance(DemoState::RowRead)
    }

    async fn drop_steps(&mut self, h: &Handle) -> Result<(), NoSQLError> {
        let table = self.config.table_name.clone();

        println!("Dropping table {}", table);
        self.advance(DemoState::TableDropping)?;
        let res = h.drop_table_if_exists(&table).await?;
        info!("drop table {} returned state {}", table, res.state());

        println!("Waiting for {} to be dropped", table);
        h.wait_for_state(
            &table,
            TableState::Dropped,
            self.config.drop_timeout_ms,
            self.config.poll_interval_ms,
        )
        .await?;
        println!("Table {} has been dropped", table);
        self.advance(DemoState::TableDropped)
    }
}

/// The builder used by the program for `endpoint`.
///
/// Settings come from the environment (see [`HandleBuilder::from_environment()`]);
/// the endpoint given here takes precedence. Without an `ORACLE_NOSQL_AUTH`
/// setting, credentials are read from `~/.nosql/credentials`.
pub fn handle_builder(endpoint: &str) -> Result<HandleBuilder, NoSQLError> {
    let mut b = Handle::builder().from_environment()?;
    if let AuthProvider::None = b.auth {
        b = b.cloud_auth_from_file(DEFAULT_CREDENTIALS_FILE_PATH)?;
    }
    b.endpoint(endpoint)
}

/// Run the create, put and get sequence, or only the drop sequence if `drop`.
///
/// The handle is closed before returning, whether the run succeeded or not.
pub async fn run_with_handle(
    handle: &Handle,
    drop: bool,
    config: DemoConfig,
) -> Result<Demo, NoSQLError> {
    let mut demo = Demo::new(config);
    let r = if drop {
        demo.run_drop(handle).await
    } else {
        demo.run_hello_world(handle).await
    };
    handle.close().await;
    r.map(|_| demo)
}

/// Build a handle for `endpoint` and run the sequence with the default settings.
pub async fn run(endpoint: &str, drop: bool) -> Result<Demo, NoSQLError> {
    println!("Using endpoint: {}", Endpoint::parse(endpoint)?);
    let handle = handle_builder(endpoint)?.build().await?;
    run_with_handle(&handle, drop, DemoConfig::default()).await
}
