//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::auth_common::credentials_provider::{CredentialsProvider, IdcsCredentials};
use crate::auth_common::file_credentials_provider::FileCredentialsProvider;
use crate::error::{ia_err, NoSQLError, NoSQLErrorCode};
use chrono::{DateTime, TimeDelta, Utc};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_derive::Deserialize;
use std::result::Result;
use std::time::Duration;
use tracing::{debug, trace};

const TOKEN_PATH: &str = "/oauth2/v1/token";
const SCOPE_PREFIX: &str = "urn:opc:andc:entitlementid=";
const SCOPE_SUFFIX: &str = "urn:opc:andc:resource:consumer::all";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(300_000);
const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(85_400);
// A token is treated as expired this long before it actually expires,
// capped at half its lifetime
const REFRESH_MARGIN: Duration = Duration::from_secs(10);

/// An access token issued by the identity service.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    issued_at: DateTime<Utc>,
    expires_in: Duration,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("issued_at", &self.issued_at)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

impl AccessToken {
    pub fn new(token: &str, issued_at: DateTime<Utc>, expires_in: Duration) -> AccessToken {
        AccessToken {
            token: token.to_string(),
            issued_at,
            expires_in,
        }
    }

    /// The opaque token string sent as `Authorization: Bearer <token>`.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.expires_in)
            .ok()
            .and_then(|d| self.issued_at.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns true if the token must not be used any more.
    ///
    /// Tokens are considered expired a few seconds early, so a token handed
    /// out by [`AccessTokenProvider::get_token()`] is still valid when it reaches the service.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub(crate) fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let margin = REFRESH_MARGIN.min(self.expires_in / 2);
        TimeDelta::from_std(margin)
            .ok()
            .and_then(|m| now.checked_add_signed(m))
            .map_or(true, |n| n >= self.expires_at())
    }
}

#[derive(Debug)]
struct TokenState {
    credentials: Box<dyn CredentialsProvider>,
    cached: Option<AccessToken>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Obtains access tokens from the identity service and caches them.
///
/// A new token is only requested when there is no cached token or the cached
/// one has expired. Concurrent callers wait on the same refresh, so at most one
/// exchange is in flight at a time.
#[derive(Debug)]
pub struct AccessTokenProvider {
    entitlement_id: String,
    token_url: String,
    request_timeout: Duration,
    cache_duration: Duration,
    // tokio Mutex: the lock is held across the token exchange
    state: tokio::sync::Mutex<TokenState>,
}

impl AccessTokenProvider {
    /// Create a provider for the given entitlement and identity service URL.
    pub fn new(
        entitlement_id: &str,
        idcs_url: &str,
        credentials: Box<dyn CredentialsProvider>,
    ) -> Result<AccessTokenProvider, NoSQLError> {
        if entitlement_id.is_empty() {
            return ia_err!("entitlement id must be non-empty");
        }
        let base = url::Url::parse(idcs_url)?;
        if base.scheme() != "https" && base.scheme() != "http" {
            return ia_err!("invalid identity service url '{}'", idcs_url);
        }
        let token_url = format!("{}{}", idcs_url.trim_end_matches('/'), TOKEN_PATH);
        Ok(AccessTokenProvider {
            entitlement_id: entitlement_id.to_string(),
            token_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache_duration: DEFAULT_CACHE_DURATION,
            state: tokio::sync::Mutex::new(TokenState {
                credentials,
                cached: None,
            }),
        })
    }

    /// Create a provider from a credentials file that also names the
    /// identity service URL and entitlement id.
    pub fn from_file(path: &str, profile: &str) -> Result<AccessTokenProvider, NoSQLError> {
        let fcp = FileCredentialsProvider::new_from_file(path, profile)?;
        let idcs_url = fcp.idcs_url().to_string();
        let entitlement_id = fcp.entitlement_id().to_string();
        AccessTokenProvider::new(&entitlement_id, &idcs_url, Box::new(fcp))
    }

    /// Timeout for each request to the identity service. Default 300 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Upper bound on how long a token is cached, regardless of the lifetime
    /// reported by the identity service. Default 85400 seconds.
    pub fn cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Return a valid access token, exchanging credentials for a new one if needed.
    pub async fn get_token(&self, client: &reqwest::Client) -> Result<AccessToken, NoSQLError> {
        let mut state = self.state.lock().await;
        if let Some(t) = &state.cached {
            if !t.is_expired() {
                trace!("using cached access token");
                return Ok(t.clone());
            }
            debug!("cached access token expired at {}", t.expires_at());
        }
        state.cached = None;
        let token = self.exchange(client, &mut state).await?;
        state.cached = Some(token.clone());
        Ok(token)
    }

    /// Forget the cached token. The stored refresh token is kept.
    pub async fn clear(&self) {
        self.state.lock().await.cached = None;
    }

    async fn exchange(
        &self,
        client: &reqwest::Client,
        state: &mut TokenState,
    ) -> Result<AccessToken, NoSQLError> {
        let oauth = state.credentials.oauth_client_credentials()?;
        if let Some(rt) = state.credentials.service_refresh_token() {
            let body = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("grant_type", "refresh_token")
                .append_pair("refresh_token", &rt)
                .finish();
            match self.post_token_request(client, &oauth, body).await {
                Ok(resp) => return Ok(self.accept(state, resp)),
                Err(e) => {
                    debug!("refresh token was rejected, using password grant: {}", e);
                    state.credentials.store_service_refresh_token("");
                }
            }
        }
        let user = state.credentials.user_credentials()?;
        let scope = format!("{}{}{}", SCOPE_PREFIX, self.entitlement_id, SCOPE_SUFFIX);
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "password")
            .append_pair("username", user.id())
            .append_pair("password", user.secret())
            .append_pair("scope", &scope)
            .finish();
        let resp = self.post_token_request(client, &oauth, body).await?;
        Ok(self.accept(state, resp))
    }

    fn accept(&self, state: &mut TokenState, resp: TokenResponse) -> AccessToken {
        if let Some(rt) = &resp.refresh_token {
            state.credentials.store_service_refresh_token(rt);
        }
        let reported = resp
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(self.cache_duration);
        let token = AccessToken::new(
            &resp.access_token,
            Utc::now(),
            reported.min(self.cache_duration),
        );
        debug!(
            "obtained access token, expires in {}s",
            token.expires_in().as_secs()
        );
        token
    }

    async fn post_token_request(
        &self,
        client: &reqwest::Client,
        oauth: &IdcsCredentials,
        body: String,
    ) -> Result<TokenResponse, NoSQLError> {
        trace!("POST {}", self.token_url);
        let mut headers = HeaderMap::new();
        // Authorization: Basic base64(client_id:client_secret)
        let up = format!("{}:{}", oauth.id(), oauth.secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", BASE64_STANDARD.encode(up)))?,
        );
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let resp = client
            .post(&self.token_url)
            .headers(headers)
            .body(body)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| auth_error(&format!("identity service request failed: {}", e)))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| auth_error(&format!("error reading identity service response: {}", e)))?;
        if !status.is_success() {
            return Err(auth_error(&format!(
                "identity service returned http status {}: {}",
                status, text
            )));
        }
        let tr: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| auth_error(&format!("malformed identity service response: {}", e)))?;
        if tr.access_token.is_empty() {
            return Err(auth_error("identity service response has no access_token"));
        }
        Ok(tr)
    }
}

fn auth_error(msg: &str) -> NoSQLError {
    NoSQLError::new(NoSQLErrorCode::AuthenticationFailed, msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_common::credentials_provider::StaticCredentialsProvider;

    fn creds() -> Box<dyn CredentialsProvider> {
        Box::new(StaticCredentialsProvider::new(
            IdcsCredentials::new("client", "secret"),
            IdcsCredentials::new("user", "pw"),
        ))
    }

    #[test]
    fn token_expires_early() {
        let issued = Utc::now();
        let t = AccessToken::new("abc", issued, Duration::from_secs(60));
        assert!(!t.is_expired_at(issued));
        assert!(!t.is_expired_at(issued + TimeDelta::seconds(49)));
        assert!(t.is_expired_at(issued + TimeDelta::seconds(50)));
        assert!(t.is_expired_at(issued + TimeDelta::seconds(61)));

        let short = AccessToken::new("abc", issued, Duration::from_secs(0));
        assert!(short.is_expired_at(issued));
    }

    #[test]
    fn short_lived_token_is_usable_for_half_its_life() {
        let issued = Utc::now();
        let t = AccessToken::new("abc", issued, Duration::from_secs(5));
        assert!(!t.is_expired_at(issued));
        assert!(!t.is_expired_at(issued + TimeDelta::milliseconds(2499)));
        assert!(t.is_expired_at(issued + TimeDelta::milliseconds(2500)));

        let t = AccessToken::new("abc", issued, Duration::from_secs(10));
        assert!(!t.is_expired_at(issued + TimeDelta::seconds(4)));
        assert!(t.is_expired_at(issued + TimeDelta::seconds(5)));
    }

    #[test]
    fn debug_hides_token() {
        let t = AccessToken::new("very-secret-token", Utc::now(), Duration::from_secs(5));
        assert!(!format!("{:?}", t).contains("very-secret-token"));
    }

    #[test]
    fn token_url_and_validation() {
        let p = AccessTokenProvider::new("ent", "https://idcs.example.com/", creds()).unwrap();
        assert_eq!(p.token_url(), "https://idcs.example.com/oauth2/v1/token");

        let e = AccessTokenProvider::new("", "https://idcs.example.com", creds()).unwrap_err();
        assert_eq!(e.code, NoSQLErrorCode::IllegalArgument);
        assert!(AccessTokenProvider::new("ent", "not a url", creds()).is_err());
        assert!(AccessTokenProvider::new("ent", "ftp://idcs.example.com", creds()).is_err());
    }

    #[tokio::test]
    async fn unreachable_identity_service_is_auth_error() {
        let p = AccessTokenProvider::new("ent", "http://127.0.0.1:1", creds())
            .unwrap()
            .request_timeout(Duration::from_secs(2));
        let e = p.get_token(&reqwest::Client::new()).await.unwrap_err();
        assert_eq!(e.code, NoSQLErrorCode::AuthenticationFailed);
        assert_eq!(e.kind(), crate::error::NoSQLErrorKind::Auth);
    }
}
