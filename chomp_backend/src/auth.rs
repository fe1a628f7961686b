use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{BackendError, check_status};
use crate::http::REQUEST_TIMEOUT;

/// Email-verification side of the auth provider: create a ticket for an
/// address, then confirm the one-time code the user received.
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    /// Returns the verification id of the created ticket.
    async fn request_email_verification(&self, email: &str) -> Result<String, BackendError>;

    /// `Ok(false)` means the code was wrong; errors mean the provider could
    /// not be asked at all.
    async fn verify_otp(&self, verification_id: &str, code: &str)
    -> Result<bool, BackendError>;
}

#[derive(Debug, Serialize)]
struct EmailVerificationRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmailVerificationResponse {
    #[serde(rename = "verificationUUID")]
    verification_uuid: String,
}

#[derive(Debug, Serialize)]
struct OtpRequest<'a> {
    #[serde(rename = "verificationUUID")]
    verification_uuid: &'a str,
    #[serde(rename = "verificationToken")]
    verification_token: &'a str,
}

pub struct HttpAuthProvider {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpAuthProvider {
    pub fn new(base_url: String, api_token: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn request_email_verification(&self, email: &str) -> Result<String, BackendError> {
        let response = self
            .http
            .post(format!("{}/verifications/email", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&EmailVerificationRequest { email })
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: EmailVerificationResponse = response.json().await?;
        Ok(body.verification_uuid)
    }

    async fn verify_otp(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<bool, BackendError> {
        let response = self
            .http
            .post(format!("{}/verifications/otp", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&OtpRequest {
                verification_uuid: verification_id,
                verification_token: code,
            })
            .send()
            .await?;

        // A client error here is the provider saying "wrong code", not an
        // outage.
        if response.status().is_client_error() {
            return Ok(false);
        }

        check_status(response).await?;
        Ok(true)
    }
}
