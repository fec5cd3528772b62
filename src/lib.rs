//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! NoSQL Database Cloud Service quickstart client
//!
//! This crate holds the small client needed to talk to the
//! [Oracle NoSQL Database Cloud Service](https://www.oracle.com/database/nosql-cloud.html)
//! and to a local cloud simulator: obtain an access token, create a table,
//! write a row, read it back and drop the table. The `hello-world` program
//! built from this crate runs exactly that sequence.
//!
//! All network methods are Rust `async` methods, using the [tokio](https://crates.io/crates/tokio) runtime.
//!
//! The general flow for an application is:
//! - Create a [`HandleBuilder`] with all needed parameters
//! - Create a [`Handle`] from the [`HandleBuilder`] that will be used throughout the application, across all threads
//! - Create tables with [`Handle::create_table_if_not_exists()`] and wait for them with [`Handle::wait_for_state()`]
//! - Write and read rows with [`Handle::put()`] and [`Handle::get()`], or with [`PutRequest`] and [`GetRequest`]
//! - Call [`Handle::close()`] when done
//!
//! ## Simple Example
//! ```no_run
//! use nosql_cloud_quickstart::{Handle, TableDescriptor};
//! use nosql_cloud_quickstart::types::{FieldType, MapValue, TableLimits, TableState};
//! use std::error::Error;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn Error>> {
//!     let handle = Handle::builder()
//!         .endpoint("ndcs.uscom-east-1.oraclecloud.com")?
//!         .cloud_auth_from_file("~/.nosql/credentials")?
//!         .build()
//!         .await?;
//!     let td = TableDescriptor::new("HelloWorldTable")
//!         .column("id", FieldType::Integer)
//!         .column("name", FieldType::String)
//!         .primary_key(&["id"])
//!         .limits(TableLimits::provisioned(1, 2, 1));
//!     handle.create_table_if_not_exists(&td).await?;
//!     handle
//!         .wait_for_state("HelloWorldTable", TableState::Active, 60000, 1000)
//!         .await?;
//!     handle
//!         .put("HelloWorldTable", &MapValue::new().i32("id", 29).str("name", "Tracy"))
//!         .await?;
//!     let row = handle
//!         .get("HelloWorldTable", &MapValue::new().i32("id", 29))
//!         .await?;
//!     println!("Read {:?}", row);
//!     handle.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuring the client
//!
//! ### Cloud Service
//!
//! The Cloud Service authenticates every request with an access token issued
//! by the identity service (IDCS). The token is obtained from an OAuth client
//! id and secret plus a cloud user name and password. These are usually kept
//! in a credentials file, by default `~/.nosql/credentials`:
//! ```ini
//! [DEFAULT]
//! idcs_url=https://idcs-xxxxxxxx.identity.oraclecloud.com
//! entitlement_id=<your-entitlement-id>
//! client_id=<oauth-client-id>
//! client_secret=<oauth-client-secret>
//! username=<cloud-user-name>
//! password=<cloud-user-password>
//! ```
//! Use [`HandleBuilder::cloud_auth_from_file()`] to read it, or build an
//! [`AccessTokenProvider`] with a [`StaticCredentialsProvider`] and pass it to
//! [`HandleBuilder::cloud_auth()`].
//!
//! ### Cloud Simulator
//!
//! A local cloud simulator needs no credentials:
//! ```no_run
//! # use nosql_cloud_quickstart::{Handle, HandleMode};
//! # async fn f() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = Handle::builder()
//!     .endpoint("http://localhost:8080")?
//!     .mode(HandleMode::Cloudsim)?
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Environment
//!
//! [`HandleBuilder::from_environment()`] reads `ORACLE_NOSQL_ENDPOINT`,
//! `ORACLE_NOSQL_AUTH` (`idcs` or `cloudsim`), `ORACLE_NOSQL_CREDENTIALS_FILE`,
//! `ORACLE_NOSQL_CREDENTIALS_PROFILE`, `ORACLE_NOSQL_COMPARTMENT` and
//! `ORACLE_NOSQL_TIMEOUT_MS`.
//!
//! ## Logging
//!
//! The crate logs with [tracing](https://crates.io/crates/tracing). Install a
//! subscriber to see the output, for example:
//! ```no_run
//! tracing_subscriber::fmt()
//!     .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
//!     .with_ansi(false)
//!     .compact()
//!     .init();
//! ```

pub mod auth_common;
pub(crate) mod endpoint;
pub(crate) mod error;
pub(crate) mod get_request;
pub(crate) mod handle;
pub(crate) mod handle_builder;
pub mod hello_world;
pub(crate) mod protocol;
pub(crate) mod put_request;
pub(crate) mod table_descriptor;
pub(crate) mod table_request;
pub mod types;

pub use crate::auth_common::access_token_provider::{AccessToken, AccessTokenProvider};
pub use crate::auth_common::credentials_provider::{
    CredentialsProvider, IdcsCredentials, StaticCredentialsProvider,
};
pub use crate::auth_common::file_credentials_provider::FileCredentialsProvider;
pub use crate::endpoint::Endpoint;
pub use crate::error::{NoSQLError, NoSQLErrorCode, NoSQLErrorKind};
pub use crate::get_request::{GetRequest, GetResult};
pub use crate::handle::Handle;
pub use crate::handle_builder::{HandleBuilder, HandleMode};
pub use crate::put_request::{PutRequest, PutResult};
pub use crate::table_descriptor::{drop_ddl, ColumnDef, TableDescriptor, TableSchema};
pub use crate::table_request::{GetTableRequest, TableRequest, TableResult};

/// The version of a row: opaque bytes returned by put and get operations.
pub type Version = Vec<u8>;

#[cfg(test)]
mod mapvalue_tests;
