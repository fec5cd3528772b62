//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
//! Builder for creating a [`NoSQL Handle`](crate::Handle)
//!

use std::default::Default;
use std::env;
use std::result::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::auth_common::access_token_provider::AccessTokenProvider;
use crate::auth_common::file_credentials_provider::DEFAULT_CREDENTIALS_FILE_PATH;
use crate::endpoint::Endpoint;
use crate::error::{ia_err, NoSQLError};
use crate::handle::Handle;
use reqwest::Client;

/// Builder used to set all the parameters to create a [`NoSQL Handle`](crate::Handle).
///
/// A handle needs an endpoint and an authentication method. Both can be given
/// in code or collected from the environment with
/// [`from_environment()`](HandleBuilder::from_environment()).
#[derive(Default, Debug, Clone)]
pub struct HandleBuilder {
    pub(crate) endpoint: Option<Endpoint>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) mode: HandleMode,
    pub(crate) compartment_id: Option<String>,
    pub(crate) client: Option<Client>,
    pub(crate) auth: AuthProvider,
    // For error messaging
    pub(crate) from_environment: bool,
}

#[derive(Default, Debug, Clone)]
pub(crate) enum AuthProvider {
    Idcs {
        provider: Arc<AccessTokenProvider>,
    },
    Cloudsim,
    #[default]
    None,
}

/// The kind of service the handle talks to.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleMode {
    /// Connect to the NoSQL Database Cloud Service, authenticating with an
    /// access token from the identity service.
    #[default]
    Cloud,
    /// Connect to a local cloud simulator. No token exchange takes place.
    Cloudsim,
}

impl HandleBuilder {
    /// Create a new HandleBuilder struct.
    ///
    /// The default HandleBuilder does not set an authentication method. Consider calling
    /// [`from_environment()`](HandleBuilder::from_environment()) to collect all parameters from
    /// the local environment by default.
    pub fn new() -> Self {
        HandleBuilder {
            ..Default::default()
        }
    }
    /// Build a new [`Handle`].
    ///
    /// Note: Internally, if the [`HandleBuilder`] contains
    /// a reference to an existing [`reqwest::Client`], it will clone and
    /// use that. Otherwise, it will create a new [`reqwest::Client`] for its
    /// own internal use. See [`reqwest_client()`](HandleBuilder::reqwest_client()).
    pub async fn build(self) -> Result<Handle, NoSQLError> {
        Handle::new(&self).await
    }
    /// Gather configuration settings from the current environment.
    ///
    /// Values set here can be overridden by calling other methods afterwards:
    ///```no_run
    /// # use nosql_cloud_quickstart::Handle;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    ///   let handle = Handle::builder()
    ///       .from_environment()?
    ///       .endpoint("ndcs.uscom-east-1.oraclecloud.com")?
    ///       .build()
    ///       .await?;
    /// # Ok(())
    /// # }
    ///```
    /// The following environment variables are used:
    ///
    /// | variable | description |
    /// | -------- | ----------- |
    /// | `ORACLE_NOSQL_ENDPOINT` | The endpoint to use. See [`HandleBuilder::endpoint()`]. |
    /// | `ORACLE_NOSQL_AUTH` | The auth mechanism: `idcs` or `cloudsim`. |
    /// | `ORACLE_NOSQL_CREDENTIALS_FILE` | For `idcs` auth, the credentials file. Default `~/.nosql/credentials`. |
    /// | `ORACLE_NOSQL_CREDENTIALS_PROFILE` | For `idcs` auth, the profile in the credentials file. Default `DEFAULT`. |
    /// | `ORACLE_NOSQL_COMPARTMENT` | The compartment sent with every request. |
    /// | `ORACLE_NOSQL_TIMEOUT_MS` | The default request timeout in milliseconds. |
    ///
    pub fn from_environment(mut self) -> Result<Self, NoSQLError> {
        self.from_environment = true;
        if let Ok(val) = env::var("ORACLE_NOSQL_ENDPOINT") {
            self = self.endpoint(&val)?;
        }
        if let Ok(val) = env::var("ORACLE_NOSQL_COMPARTMENT") {
            self = self.compartment_id(&val)?;
        }
        if let Ok(val) = env::var("ORACLE_NOSQL_TIMEOUT_MS") {
            match val.trim().parse::<u64>() {
                Ok(ms) => self = self.timeout(Duration::from_millis(ms))?,
                Err(_) => {
                    return ia_err!("invalid value '{}' for ORACLE_NOSQL_TIMEOUT_MS", val);
                }
            }
        }
        if let Ok(val) = env::var("ORACLE_NOSQL_AUTH") {
            let v = val.to_lowercase();
            match v.as_str() {
                "idcs" => {
                    let file = env::var("ORACLE_NOSQL_CREDENTIALS_FILE")
                        .unwrap_or_else(|_| DEFAULT_CREDENTIALS_FILE_PATH.to_string());
                    let profile = env::var("ORACLE_NOSQL_CREDENTIALS_PROFILE")
                        .unwrap_or_else(|_| "DEFAULT".to_string());
                    self = self.cloud_auth_from_file_with_profile(&file, &profile)?;
                }
                "cloudsim" => self = self.mode(HandleMode::Cloudsim)?,
                _ => {
                    return ia_err!("invalid value '{}' for ORACLE_NOSQL_AUTH", v);
                }
            }
        }
        Ok(self)
    }
    /// Set the endpoint of the service.
    ///
    /// A bare host name means `https` on port 443. Examples:
    /// ```text
    ///     // Cloud service
    ///     ndcs.uscom-east-1.oraclecloud.com
    ///
    ///     // Local cloud simulator
    ///     http://localhost:8080
    /// ```
    pub fn endpoint(mut self, endpoint: &str) -> Result<Self, NoSQLError> {
        self.endpoint = Some(Endpoint::parse(endpoint)?);
        Ok(self)
    }
    /// Set the mode for the handle.
    ///
    /// Use [`HandleMode::Cloudsim`] to specify connection to a local cloud simulator.
    /// By default, HandleBuilder assumes [`HandleMode::Cloud`].
    pub fn mode(mut self, mode: HandleMode) -> Result<Self, NoSQLError> {
        self.mode = mode;
        if self.mode == HandleMode::Cloudsim {
            self.auth = AuthProvider::Cloudsim;
        } else if let AuthProvider::Cloudsim = self.auth {
            self.auth = AuthProvider::None;
        }
        Ok(self)
    }
    /// Authenticate with access tokens from the given provider.
    pub fn cloud_auth(mut self, provider: AccessTokenProvider) -> Result<Self, NoSQLError> {
        self.auth = AuthProvider::Idcs {
            provider: Arc::new(provider),
        };
        self.mode = HandleMode::Cloud;
        Ok(self)
    }
    /// Authenticate with credentials read from a credentials file, using the
    /// `"DEFAULT"` profile.
    ///
    /// See [`FileCredentialsProvider`](crate::FileCredentialsProvider) for the file format.
    pub fn cloud_auth_from_file(self, credentials_file: &str) -> Result<Self, NoSQLError> {
        self.cloud_auth_from_file_with_profile(credentials_file, "DEFAULT")
    }
    /// Authenticate with credentials read from the given profile of a credentials file.
    pub fn cloud_auth_from_file_with_profile(
        self,
        credentials_file: &str,
        profile: &str,
    ) -> Result<Self, NoSQLError> {
        let p = AccessTokenProvider::from_file(credentials_file, profile)?;
        self.cloud_auth(p)
    }
    /// Specify a [`reqwest::Client`] to use for all http/s connections.
    ///
    /// By default, the [`NoSQL Handle`](crate::Handle) creates an internal [`reqwest::Client`] to use for
    /// all communications. If your application already has a reqwest Client, you can pass that
    /// into the HandleBuilder to avoid creating multiple connection pools.
    pub fn reqwest_client(mut self, client: &Client) -> Result<Self, NoSQLError> {
        self.client = Some(client.clone());
        Ok(self)
    }
    /// Specify the timeout used for operations.
    ///
    /// Currently this is used for both connection and request timeouts.
    /// Note that the request timeout can be set on a per-request basis.
    ///
    /// The default timeout is 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Result<Self, NoSQLError> {
        if timeout.is_zero() {
            return ia_err!("timeout must be greater than zero");
        }
        self.timeout = Some(timeout);
        Ok(self)
    }
    /// Set the compartment sent with every request, unless a request names its own.
    pub fn compartment_id(mut self, compartment_id: &str) -> Result<Self, NoSQLError> {
        if compartment_id.is_empty() {
            self.compartment_id = None;
        } else {
            self.compartment_id = Some(compartment_id.to_string());
        }
        Ok(self)
    }
}
