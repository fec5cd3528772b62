//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::auth_common::credentials_provider::{
    CredentialsProvider, IdcsCredentials, StaticCredentialsProvider,
};
use crate::auth_common::file_utils::expand_user_home;
use crate::error::{ia_err, NoSQLError};
use ini::Ini;

pub(crate) const DEFAULT_CREDENTIALS_FILE_PATH: &str = "~/.nosql/credentials";
const IDCS_URL: &str = "idcs_url";
const ENTITLEMENT_ID: &str = "entitlement_id";
const CLIENT_ID: &str = "client_id";
const CLIENT_SECRET: &str = "client_secret";
const USERNAME: &str = "username";
const PASSWORD: &str = "password";

/// A credentials provider that reads all of its values from a credentials file.
///
/// The file uses the ini format, with one section per profile:
/// ```ini
/// [DEFAULT]
/// idcs_url=https://idcs-xxxxxxxx.identity.oraclecloud.com
/// entitlement_id=<your-entitlement-id>
/// client_id=<oauth-client-id>
/// client_secret=<oauth-client-secret>
/// username=<cloud-user-name>
/// password=<cloud-user-password>
/// ```
#[derive(Debug, Clone)]
pub struct FileCredentialsProvider {
    idcs_url: String,
    entitlement_id: String,
    credentials: StaticCredentialsProvider,
}

fn get_section_variable(
    file: &str,
    props: &ini::Properties,
    var: &str,
) -> Result<String, NoSQLError> {
    match props.get(var) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => ia_err!(
            "error reading credentials file '{}': missing field '{}'",
            file,
            var
        ),
    }
}

impl FileCredentialsProvider {
    /// Read credentials from `config_file_path`, using the section named `profile_name`.
    pub fn new_from_file(config_file_path: &str, profile_name: &str) -> Result<Self, NoSQLError> {
        tracing::debug!(
            "Creating a FileCredentialsProvider from file {} and profile {}",
            config_file_path,
            profile_name
        );
        let file_path = expand_user_home(config_file_path)?;
        let config = match Ini::load_from_file(&file_path) {
            Ok(c) => c,
            Err(e) => {
                return ia_err!("error reading credentials file '{}': {}", file_path, e);
            }
        };
        let profile_data = match config.section(Some(profile_name)) {
            Some(p) => p,
            None => {
                return ia_err!(
                    "error reading credentials file '{}': missing profile '{}'",
                    file_path,
                    profile_name
                );
            }
        };

        let idcs_url = get_section_variable(&file_path, profile_data, IDCS_URL)?;
        let entitlement_id = get_section_variable(&file_path, profile_data, ENTITLEMENT_ID)?;
        let client = IdcsCredentials::new(
            &get_section_variable(&file_path, profile_data, CLIENT_ID)?,
            &get_section_variable(&file_path, profile_data, CLIENT_SECRET)?,
        );
        let user = IdcsCredentials::new(
            &get_section_variable(&file_path, profile_data, USERNAME)?,
            &get_section_variable(&file_path, profile_data, PASSWORD)?,
        );
        Ok(FileCredentialsProvider {
            idcs_url,
            entitlement_id,
            credentials: StaticCredentialsProvider::new(client, user),
        })
    }

    /// Read credentials from the default file `~/.nosql/credentials`.
    pub fn new(profile_name: &str) -> Result<Self, NoSQLError> {
        Self::new_from_file(DEFAULT_CREDENTIALS_FILE_PATH, profile_name)
    }

    pub fn idcs_url(&self) -> &str {
        &self.idcs_url
    }

    pub fn entitlement_id(&self) -> &str {
        &self.entitlement_id
    }
}

impl CredentialsProvider for FileCredentialsProvider {
    fn oauth_client_credentials(&self) -> Result<IdcsCredentials, NoSQLError> {
        self.credentials.oauth_client_credentials()
    }
    fn user_credentials(&self) -> Result<IdcsCredentials, NoSQLError> {
        self.credentials.user_credentials()
    }
    fn store_service_refresh_token(&mut self, token: &str) {
        self.credentials.store_service_refresh_token(token)
    }
    fn service_refresh_token(&self) -> Option<String> {
        self.credentials.service_refresh_token()
    }
}
