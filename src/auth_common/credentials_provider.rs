//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::NoSQLError;
use std::fmt::Debug;

/// A name and secret pair used with the identity service.
///
/// This is used both for the OAuth client (client id and secret) and for the
/// cloud user (user name and password). The secret is never shown by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct IdcsCredentials {
    id: String,
    secret: String,
}

impl IdcsCredentials {
    pub fn new(id: &str, secret: &str) -> IdcsCredentials {
        IdcsCredentials {
            id: id.to_string(),
            secret: secret.to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl Debug for IdcsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdcsCredentials")
            .field("id", &self.id)
            .field("secret", &"****")
            .finish()
    }
}

/// Trait defining a source of credentials for the access token provider.
///
/// The provider supplies the OAuth client credentials and the user
/// credentials used to obtain an access token, and keeps the refresh token
/// the identity service hands back so later exchanges can use it.
pub trait CredentialsProvider: Send + Sync + Debug {
    /// Returns the OAuth client id and secret.
    fn oauth_client_credentials(&self) -> Result<IdcsCredentials, NoSQLError>;
    /// Returns the cloud user name and password.
    fn user_credentials(&self) -> Result<IdcsCredentials, NoSQLError>;
    /// Keep a refresh token issued by the identity service. An empty token clears it.
    fn store_service_refresh_token(&mut self, token: &str);
    /// Returns the last stored refresh token, if any.
    fn service_refresh_token(&self) -> Option<String>;
}

/// A credentials provider holding fixed values given in code or configuration.
#[derive(Debug, Clone)]
pub struct StaticCredentialsProvider {
    client: IdcsCredentials,
    user: IdcsCredentials,
    refresh_token: Option<String>,
}

impl StaticCredentialsProvider {
    pub fn new(client: IdcsCredentials, user: IdcsCredentials) -> StaticCredentialsProvider {
        StaticCredentialsProvider {
            client,
            user,
            refresh_token: None,
        }
    }
}

impl CredentialsProvider for StaticCredentialsProvider {
    fn oauth_client_credentials(&self) -> Result<IdcsCredentials, NoSQLError> {
        Ok(self.client.clone())
    }
    fn user_credentials(&self) -> Result<IdcsCredentials, NoSQLError> {
        Ok(self.user.clone())
    }
    fn store_service_refresh_token(&mut self, token: &str) {
        if token.is_empty() {
            self.refresh_token = None;
        } else {
            self.refresh_token = Some(token.to_string());
        }
    }
    fn service_refresh_token(&self) -> Option<String> {
        self.refresh_token.clone()
    }
}
