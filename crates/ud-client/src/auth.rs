//! Admin login and logout

use std::sync::Arc;
use tracing::info;
use ud_core::{UdError, UdResult, ValidationErrors};
use ud_models::{AuthUser, LoginRequest, LoginResponse};
use validator::Validate;

use crate::client::{check_status, decode_json, transport_error, ApiClient};
use crate::credentials::{Credential, CredentialStore};

pub struct AuthApi {
    client: ApiClient,
    auth_base_url: String,
}

impl AuthApi {
    /// Login lives under `auth_base_url`, which may differ from the API base
    pub fn new(client: ApiClient, auth_base_url: impl Into<String>) -> Self {
        Self {
            client,
            auth_base_url: auth_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn store(&self) -> &Arc<dyn CredentialStore> {
        self.client.credentials()
    }

    /// Exchange username and password for a bearer token and store it
    pub async fn login(&self, request: &LoginRequest) -> UdResult<LoginResponse> {
        request.validate().map_err(|e| {
            let mut errors = ValidationErrors::new();
            for field in e.field_errors().keys() {
                errors.add(*field, "is required");
            }
            UdError::Validation(errors)
        })?;

        let response = self
            .client
            .http()
            .post(format!("{}/auth/login", self.auth_base_url))
            .form(request)
            .send()
            .await
            .map_err(transport_error)?;
        let response: LoginResponse = decode_json(check_status(response).await?).await?;

        self.store().save(&Credential::from(&response)).await?;
        info!(
            username = %response.username,
            superadmin = response.is_superadmin,
            "Logged in"
        );
        Ok(response)
    }

    /// Forget the stored token
    pub async fn logout(&self) -> UdResult<()> {
        self.store().clear().await?;
        info!("Logged out");
        Ok(())
    }

    /// The admin the stored token belongs to
    pub async fn current_user(&self) -> UdResult<Option<AuthUser>> {
        Ok(self.store().load().await?.map(|c| c.user))
    }

    pub async fn is_authenticated(&self) -> UdResult<bool> {
        Ok(self.store().load().await?.is_some())
    }
}
