//! Auth endpoints and the composite login flows.
//!
//! The backend has no logout endpoint; logging out is purely client-side and
//! goes through the auth coordinator.

use serde_json::json;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{LoginResponse, MessageResponse, OtpSent, UserProfile};
use crate::util::phone;

pub(crate) const PROFILE_PATH: &str = "/auth/profile/";

/// Validate and normalize a user-entered phone number.
fn normalized_phone(raw: &str) -> Result<String, ApiError> {
    let normalized = phone::normalize(raw);
    if !phone::is_valid(&normalized) {
        return Err(ApiError::InvalidPhone(raw.to_owned()));
    }
    Ok(normalized)
}

impl ApiClient {
    /// Ask the backend to send an OTP to `phone_number`.
    ///
    /// # Errors
    ///
    /// `InvalidPhone` for malformed input, otherwise any request error.
    pub async fn send_otp(&self, phone_number: &str) -> Result<OtpSent, ApiError> {
        let phone_number = normalized_phone(phone_number)?;
        self.post("/auth/send-otp/", &json!({ "phone_number": phone_number })).await
    }

    /// Exchange phone and OTP code for a token pair. Does not touch the session.
    ///
    /// # Errors
    ///
    /// `InvalidPhone` for malformed input, otherwise any request error.
    pub async fn verify_otp(&self, phone_number: &str, code: &str) -> Result<LoginResponse, ApiError> {
        let phone_number = normalized_phone(phone_number)?;
        self.post("/auth/verify-otp/", &json!({ "phone_number": phone_number, "code": code.trim() }))
            .await
    }

    /// Exchange phone and password for a token pair. Does not touch the session.
    ///
    /// # Errors
    ///
    /// `InvalidPhone` for malformed input, otherwise any request error.
    pub async fn login_password(&self, phone_number: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let phone_number = normalized_phone(phone_number)?;
        self.post("/auth/login-password/", &json!({ "phone_number": phone_number, "password": password }))
            .await
    }

    /// # Errors
    ///
    /// `Status { status: 401, .. }` when the current password is rejected, which
    /// leaves the session logged in. Otherwise any request error.
    pub async fn set_password(
        &self,
        new_password: &str,
        current_password: Option<&str>,
    ) -> Result<MessageResponse, ApiError> {
        self.post(
            "/auth/set-password/",
            &json!({ "new_password": new_password, "current_password": current_password }),
        )
        .await
    }

    /// # Errors
    ///
    /// `InvalidPhone` for malformed input, otherwise any request error.
    pub async fn reset_password_request(&self, phone_number: &str) -> Result<MessageResponse, ApiError> {
        let phone_number = normalized_phone(phone_number)?;
        self.post("/auth/reset-password/request/", &json!({ "phone_number": phone_number })).await
    }

    /// # Errors
    ///
    /// `InvalidPhone` for malformed input, otherwise any request error.
    pub async fn reset_password_confirm(
        &self,
        phone_number: &str,
        code: &str,
        new_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        let phone_number = normalized_phone(phone_number)?;
        self.post(
            "/auth/reset-password/confirm/",
            &json!({ "phone_number": phone_number, "code": code.trim(), "new_password": new_password }),
        )
        .await
    }

    /// Fetch the profile directly, bypassing the profile store.
    ///
    /// # Errors
    ///
    /// Any request error.
    pub async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.get(PROFILE_PATH).await
    }

    /// OTP login: exchange, record the session, then load the profile.
    ///
    /// Returns the profile if it could be loaded; a failed profile load does
    /// not undo the login.
    ///
    /// # Errors
    ///
    /// Any error from the exchange, or `Session` if the tokens are rejected.
    pub async fn login_with_otp(&self, phone_number: &str, code: &str) -> Result<Option<UserProfile>, ApiError> {
        let response = self.verify_otp(phone_number, code).await?;
        self.finish_login(response).await
    }

    /// Password login: exchange, record the session, then load the profile.
    ///
    /// # Errors
    ///
    /// Any error from the exchange, or `Session` if the tokens are rejected.
    pub async fn login_with_password(
        &self,
        phone_number: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, ApiError> {
        let response = self.login_password(phone_number, password).await?;
        self.finish_login(response).await
    }

    /// Coordinated logout of session and profile.
    pub fn logout(&self) {
        self.auth().logout();
    }

    async fn finish_login(&self, response: LoginResponse) -> Result<Option<UserProfile>, ApiError> {
        self.auth().complete_login(response)?;
        Ok(self.load_profile().await)
    }
}
