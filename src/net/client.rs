//! HTTP layer shared by every endpoint wrapper.
//!
//! SYSTEM CONTEXT
//! ==============
//! All requests go through `ApiClient::send`, which owns the two cross-cutting
//! auth policies:
//!
//! - Bearer attachment: non-public paths carry `Authorization: Bearer <access>`
//!   read from the session store at send time.
//! - Global 401: a 401 from a non-public path logs the user out through the
//!   coordinator and hard-navigates to the login route, unless the navigator
//!   is already there. The caller still receives `ApiError::Unauthorized`.
//!   Credential checks on an authenticated session (`CREDENTIAL_CHECK_ENDPOINTS`)
//!   are exempt: their 401 rejects the submitted password, not the token.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::UserProfile;
use crate::config::ClientConfig;
use crate::state::auth::AuthSession;
use crate::state::profile::ProfileFetcher;
use crate::util::route_guard::Navigator;

/// Endpoints that never carry a bearer token and never trigger the 401 policy.
pub const PUBLIC_ENDPOINTS: &[&str] = &[
    "/auth/send-otp/",
    "/auth/verify-otp/",
    "/auth/register/",
    "/auth/login-password/",
    "/auth/reset-password/request/",
    "/auth/reset-password/confirm/",
];

/// Authenticated endpoints whose 401 means a rejected credential in the body.
pub const CREDENTIAL_CHECK_ENDPOINTS: &[&str] = &["/auth/set-password/"];

/// `true` when a 401 from `path` says nothing about the session token.
#[must_use]
pub fn is_credential_check(path: &str) -> bool {
    is_public_endpoint(path) || CREDENTIAL_CHECK_ENDPOINTS.iter().any(|endpoint| path.contains(endpoint))
}

/// `true` when `path` targets one of the public auth endpoints.
#[must_use]
pub fn is_public_endpoint(path: &str) -> bool {
    PUBLIC_ENDPOINTS.iter().any(|endpoint| path.contains(endpoint))
}

/// Typed REST client bound to one auth session. Cloning is cheap.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthSession,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBaseUrl` if the configured URL does not parse, or the
    /// transport error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, auth: AuthSession, navigator: Arc<dyn Navigator>) -> Result<Self, ApiError> {
        reqwest::Url::parse(&config.api_url).map_err(|_| ApiError::InvalidBaseUrl(config.api_url.clone()))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            auth,
            navigator,
            login_route: config.login_route.clone(),
        })
    }

    #[must_use]
    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the profile through the profile store, which owns caching and
    /// the loading flag.
    pub async fn load_profile(&self) -> Option<UserProfile> {
        self.auth.profile().load_profile(self).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(path, self.request(Method::GET, path)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(path, self.request(Method::GET, path).query(query)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(path, self.request(Method::POST, path).json(body)).await
    }

    /// POST without a request body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(path, self.request(Method::POST, path)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        self.send(path, self.request(Method::POST, path).multipart(form)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(path, self.request(Method::PUT, path).json(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(path, self.request(Method::PATCH, path).json(body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(path, self.request(Method::DELETE, path)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, format!("{}{path}", self.base_url));
        if is_public_endpoint(path) {
            return request;
        }
        match self.auth.session().access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a prepared request and decode its JSON body.
    ///
    /// An empty success body decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// - `Http` on transport failure or timeout.
    /// - `Unauthorized` on a 401 from a protected path other than a credential check.
    /// - `Status` on any other non-success status, with the backend message.
    /// - `Decode` if the body does not match `T`.
    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T, ApiError> {
        tracing::debug!(%path, "sending request");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%path, status = status.as_u16(), "request complete");

        if status == StatusCode::UNAUTHORIZED && !is_credential_check(path) {
            self.handle_unauthorized(path);
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        let body = body.trim();
        Ok(serde_json::from_str(if body.is_empty() { "null" } else { body })?)
    }

    fn handle_unauthorized(&self, path: &str) {
        let current = self.navigator.current_path();
        if current.contains(&self.login_route) {
            return;
        }
        tracing::warn!(%path, from = %current, "session rejected by backend; logging out");
        self.auth.logout();
        self.navigator.navigate(&self.login_route);
    }
}

#[async_trait]
impl ProfileFetcher for ApiClient {
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.get(super::auth_api::PROFILE_PATH).await
    }
}
