//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::{ia_err, NoSQLError};
use std::result::Result;
use url::Url;

const DATA_PATH: &str = "V2/nosql/data";

/// The network address of the NoSQL service: scheme, host and port.
///
/// An `Endpoint` is validated when it is created and cannot be changed afterwards.
///
/// A bare host name is taken to mean `https://<host>:443/`:
/// ```
/// use nosql_cloud_quickstart::Endpoint;
/// let ep = Endpoint::parse("nosql.us-ashburn-1.oci.oraclecloud.com").unwrap();
/// assert_eq!(ep.scheme(), "https");
/// assert_eq!(ep.port(), 443);
/// assert_eq!(ep.to_string(), "https://nosql.us-ashburn-1.oci.oraclecloud.com:443/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint from its parts.
    ///
    /// `scheme` must be `http` or `https`, and `host` must be non-empty.
    pub fn new(scheme: &str, host: &str, port: u16) -> Result<Endpoint, NoSQLError> {
        let scheme = scheme.to_lowercase();
        if scheme != "http" && scheme != "https" {
            return ia_err!("invalid endpoint scheme '{}': must be http or https", scheme);
        }
        if host.is_empty() {
            return ia_err!("endpoint host must be non-empty");
        }
        if port == 0 {
            return ia_err!("endpoint port must be non-zero");
        }
        // Let the url parser reject anything that isn't a valid host
        let u = Url::parse(&format!("{}://{}:{}/", scheme, host, port))?;
        let host = match u.host_str() {
            Some(h) => h.to_string(),
            None => return ia_err!("invalid endpoint host '{}'", host),
        };
        Ok(Endpoint { scheme, host, port })
    }

    /// Parse an endpoint string.
    ///
    /// Accepted forms are `host`, `host:port`, `scheme://host` and
    /// `scheme://host:port[/]`. The scheme defaults to `https`; the port
    /// defaults to 443 for `https` and 80 for `http`.
    pub fn parse(endpoint: &str) -> Result<Endpoint, NoSQLError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return ia_err!("endpoint must be non-empty");
        }
        let full = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("https://{}", endpoint)
        };
        let u = Url::parse(&full)?;
        if u.path() != "/" && !u.path().is_empty() {
            return ia_err!("endpoint '{}' must not contain a path", endpoint);
        }
        let host = match u.host_str() {
            Some(h) => h,
            None => return ia_err!("endpoint '{}' has no host", endpoint),
        };
        let port = match u.port_or_known_default() {
            Some(p) => p,
            None => return ia_err!("endpoint '{}' has no usable port", endpoint),
        };
        Endpoint::new(u.scheme(), host, port)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub(crate) fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    // Full url of the data service
    pub(crate) fn data_url(&self) -> String {
        format!("{}{}", self, DATA_PATH)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}://{}:{}/", self.scheme, self.host, self.port)
    }
}
