//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::endpoint::Endpoint;
use crate::error::{ia_err, user_agent};
use crate::error::{NoSQLError, NoSQLErrorCode};
use crate::handle_builder::AuthProvider;
use crate::handle_builder::HandleBuilder;
use crate::handle_builder::HandleMode;
use crate::protocol::{decode_response, error_from_status, OpCode, RequestEnvelope};
use crate::table_descriptor::TableSchema;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;

use std::collections::HashMap;
use std::result::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

const REQUEST_ID_HEADER: &str = "x-nosql-request-id";
const COMPARTMENT_HEADER: &str = "x-nosql-compartment-id";
const CLOUDSIM_AUTH: &str = "Bearer rust";

/// **The main database handle**.
///
/// This should be created once and used
/// throughout the application lifetime, across all threads.
///
/// Note: there is no need to enclose this struct in an `Rc` or [`Arc`], as it uses an
/// [`Arc`] internally, so calling `.clone()` on this struct will always return the
/// same underlying handle.
#[derive(Clone, Debug)]
pub struct Handle {
    // Use an inner Arc so cloning keeps the same contents
    pub(crate) inner: Arc<HandleRef>,
}

#[derive(Debug)]
pub(crate) struct HandleRef {
    pub(crate) client: reqwest::Client,
    pub(crate) endpoint: Endpoint,
    data_url: String,
    pub(crate) builder: HandleBuilder,
    // never held across awaits, so a std Mutex is enough
    schemas: std::sync::Mutex<HashMap<String, TableSchema>>,
    request_id: AtomicUsize,
    closed: AtomicBool,
    timeout: Duration,
}

impl Handle {
    /// Create a new [`HandleBuilder`].
    pub fn builder() -> HandleBuilder {
        HandleBuilder::new()
    }

    // Create the new Handle based on builder configuration
    pub(crate) async fn new(b: &HandleBuilder) -> Result<Handle, NoSQLError> {
        if let AuthProvider::None = b.auth {
            if b.from_environment {
                return ia_err!("cannot build handle: no auth type specified. set ORACLE_NOSQL_AUTH environment.");
            }
            return ia_err!("cannot build handle: no auth type specified");
        }
        let endpoint = match &b.endpoint {
            Some(ep) => ep.clone(),
            None => {
                if b.from_environment {
                    return ia_err!("can't determine NoSQL endpoint: set ORACLE_NOSQL_ENDPOINT");
                }
                return ia_err!("can't determine NoSQL endpoint: call HandleBuilder::endpoint()");
            }
        };

        let builder = b.clone();
        // default timeout to 30 seconds
        let timeout = builder.timeout.unwrap_or(Duration::from_secs(30));
        let c = {
            if let Some(c) = &builder.client {
                c.clone()
            } else {
                reqwest::Client::builder()
                    .timeout(timeout)
                    .connect_timeout(timeout)
                    .build()?
            }
        };
        let data_url = endpoint.data_url();
        debug!(
            "Creating new Handle: {:?}, https={}, endpoint={}",
            builder.mode,
            endpoint.is_https(),
            data_url
        );
        Ok(Handle {
            inner: Arc::new(HandleRef {
                client: c,
                endpoint,
                data_url,
                builder,
                schemas: std::sync::Mutex::new(HashMap::new()),
                request_id: AtomicUsize::new(1),
                closed: AtomicBool::new(false),
                timeout,
            }),
        })
    }

    /// The endpoint this handle sends requests to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    pub fn mode(&self) -> HandleMode {
        self.inner.builder.mode
    }

    /// Release the resources held by this handle.
    ///
    /// The cached access token and table schemas are discarded. Calling this
    /// more than once, or on a handle that never sent a request, is harmless.
    /// Every request made on a closed handle fails with
    /// [`IllegalState`](NoSQLErrorCode::IllegalState). Since clones share
    /// the same handle, closing one closes them all.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            trace!("handle already closed");
            return;
        }
        self.schema_map().clear();
        if let AuthProvider::Idcs { provider } = &self.inner.builder.auth {
            provider.clear().await;
        }
        debug!("Closed handle for {}", self.inner.endpoint);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn schema_map(&self) -> std::sync::MutexGuard<'_, HashMap<String, TableSchema>> {
        // a panic while holding the lock cannot leave the map half-updated
        self.inner
            .schemas
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Table names are case-insensitive
    pub(crate) fn cached_schema(&self, table_name: &str) -> Option<TableSchema> {
        self.schema_map().get(&table_name.to_lowercase()).cloned()
    }

    pub(crate) fn remember_schema(&self, table_name: &str, schema: &TableSchema) {
        if schema.columns.is_empty() {
            return;
        }
        trace!("caching schema for table {}", table_name);
        self.schema_map()
            .insert(table_name.to_lowercase(), schema.clone());
    }

    pub(crate) fn forget_schema(&self, table_name: &str) {
        self.schema_map().remove(&table_name.to_lowercase());
    }

    /// The schema of `table_name`, described from the service if not already known.
    pub(crate) async fn table_schema(&self, table_name: &str) -> Result<TableSchema, NoSQLError> {
        if let Some(s) = self.cached_schema(table_name) {
            return Ok(s);
        }
        debug!("schema of table {} is not known, describing it", table_name);
        let res = self.describe_table(table_name).await?;
        match res.schema() {
            Some(s) if !s.columns.is_empty() => Ok(s.clone()),
            _ => Err(NoSQLError::new(
                NoSQLErrorCode::TableNotFound,
                &format!("no schema available for table {}", table_name),
            )),
        }
    }

    fn get_usize_header(headers: &HeaderMap, field: &str) -> Result<usize, NoSQLError> {
        let val = match headers.get(field) {
            Some(v) => v,
            None => return ia_err!("missing \"{}\" value in return headers", field),
        };
        let valstr = match val.to_str() {
            Ok(s) => s,
            Err(_) => {
                return ia_err!(
                    "\"{}\" value in return headers is not a valid string",
                    field
                );
            }
        };
        match valstr.trim().parse::<usize>() {
            Ok(v) => Ok(v),
            Err(_) => ia_err!("\"{}\" value in return headers is not an integer", field),
        }
    }

    async fn auth_header(&self) -> Result<HeaderValue, NoSQLError> {
        match &self.inner.builder.auth {
            AuthProvider::Idcs { provider } => {
                let token = provider.get_token(&self.inner.client).await?;
                Ok(HeaderValue::from_str(&format!("Bearer {}", token.token()))?)
            }
            AuthProvider::Cloudsim => Ok(HeaderValue::from_static(CLOUDSIM_AUTH)),
            AuthProvider::None => ia_err!("handle has no auth provider"),
        }
    }

    async fn post_data(
        &self,
        data: Vec<u8>,
        send_options: &SendOptions,
    ) -> Result<Vec<u8>, NoSQLError> {
        if self.is_closed() {
            return Err(NoSQLError::new(
                NoSQLErrorCode::IllegalState,
                "handle is closed",
            ));
        }
        let request_id = self.inner.request_id.fetch_add(1, Ordering::Relaxed);
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from(request_id));
        headers.insert(AUTHORIZATION, self.auth_header().await?);

        // let send_options.compartment_id override the handle compartment
        if !send_options.compartment_id.is_empty() {
            headers.insert(
                COMPARTMENT_HEADER,
                HeaderValue::from_str(&send_options.compartment_id)?,
            );
        } else if let Some(c) = &self.inner.builder.compartment_id {
            headers.insert(COMPARTMENT_HEADER, HeaderValue::from_str(c)?);
        }

        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent())?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        trace!("POST {} request_id={}", self.inner.data_url, request_id);
        let resp = self
            .inner
            .client
            .post(&self.inner.data_url)
            .body(data)
            .timeout(send_options.timeout)
            .headers(headers)
            .send()
            .await?;
        // check resp status for 200, err on others
        if !resp.status().is_success() {
            let status = resp.status();
            let content = resp.bytes().await?;
            return Err(error_from_status(status, &content));
        }

        // read request id in return, validate
        match Self::get_usize_header(resp.headers(), REQUEST_ID_HEADER) {
            Ok(rid) => {
                if request_id != rid {
                    return Err(NoSQLError::new(
                        NoSQLErrorCode::BadProtocolMessage,
                        &format!("expected request_id {}, found {}", request_id, rid),
                    ));
                }
            }
            Err(e) => {
                return Err(NoSQLError::new(
                    NoSQLErrorCode::BadProtocolMessage,
                    &format!("can't get request_id from response: {}", e.message),
                ));
            }
        }
        let result = resp.bytes().await?;
        Ok(result.to_vec())
    }

    /// Send one request and decode its response into `T`.
    pub(crate) async fn send_and_receive<P, T>(
        &self,
        op: OpCode,
        table_name: &str,
        payload: P,
        send_options: &SendOptions,
    ) -> Result<T, NoSQLError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let env = RequestEnvelope::new(op, table_name, &send_options.timeout, payload);
        let bytes = self.post_data(env.to_bytes()?, send_options).await?;
        trace!("{:?} on {}: {} bytes returned", op, table_name, bytes.len());
        decode_response(&bytes)
    }

    pub(crate) fn get_timeout(&self, t: &Option<Duration>) -> Duration {
        // if t is given, use that. If not, use handle's timeout
        if let Some(d) = t {
            return *d;
        }
        self.inner.timeout
    }
}

#[derive(Debug, Default)]
pub(crate) struct SendOptions {
    pub(crate) timeout: Duration,
    pub(crate) compartment_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use crate::TableDescriptor;

    async fn cloudsim_handle() -> Handle {
        Handle::builder()
            .endpoint("http://127.0.0.1:1")
            .unwrap()
            .mode(HandleMode::Cloudsim)
            .unwrap()
            .timeout(Duration::from_secs(2))
            .unwrap()
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn build_requires_auth_and_endpoint() {
        let e = Handle::builder()
            .endpoint("http://localhost:8080")
            .unwrap()
            .build()
            .await
            .unwrap_err();
        assert_eq!(e.code, NoSQLErrorCode::IllegalArgument);

        let e = Handle::builder()
            .mode(HandleMode::Cloudsim)
            .unwrap()
            .build()
            .await
            .unwrap_err();
        assert!(e.message.contains("endpoint"));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let h = cloudsim_handle().await;
        assert!(!h.is_closed());
        h.close().await;
        h.close().await;
        assert!(h.is_closed());
        let e = h.describe_table("t").await.unwrap_err();
        assert_eq!(e.code, NoSQLErrorCode::IllegalState);
    }

    #[tokio::test]
    async fn schema_registry_is_case_insensitive() {
        let h = cloudsim_handle().await;
        let td = TableDescriptor::new("Users")
            .column("id", FieldType::Integer)
            .primary_key(&["id"]);
        h.remember_schema(td.name(), td.schema());
        assert_eq!(h.cached_schema("USERS").as_ref(), Some(td.schema()));
        h.forget_schema("users");
        assert!(h.cached_schema("Users").is_none());
    }

    #[test]
    fn request_id_header_parsing() {
        let mut hm = HeaderMap::new();
        assert!(Handle::get_usize_header(&hm, REQUEST_ID_HEADER).is_err());
        hm.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc"));
        assert!(Handle::get_usize_header(&hm, REQUEST_ID_HEADER).is_err());
        hm.insert(REQUEST_ID_HEADER, HeaderValue::from_static("17"));
        assert_eq!(Handle::get_usize_header(&hm, REQUEST_ID_HEADER).unwrap(), 17);
    }
}
