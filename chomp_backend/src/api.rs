use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use chomp_models::question::Question;
use chomp_models::user::{ChompUser, SubscribedUser, TelegramProfile};

#[derive(Debug, Error)]
pub enum BackendError {
    /// Network failure or timeout; nothing is known about the request's fate.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The backend answered with a non-success status.
    #[error("backend rejected the request: {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        BackendError::Unavailable(error.to_string())
    }
}

pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// A completed two-order answer, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnswer {
    pub question_id: i64,
    pub option_id: i64,
    /// Second-order estimate: how much of the crowd picked the same option.
    pub percentage_given: u8,
    pub elapsed: Duration,
    /// Routes the submission to the deck endpoint when present.
    pub deck_id: Option<i64>,
}

/// The Chomp backend, the system of record for users, questions and answers.
#[async_trait]
pub trait ChompApi: Send + Sync + 'static {
    async fn get_user(
        &self,
        profile: &TelegramProfile,
    ) -> Result<Option<ChompUser>, BackendError>;

    async fn create_user(&self, profile: &TelegramProfile) -> Result<ChompUser, BackendError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<ChompUser>, BackendError>;

    async fn next_question(&self, user_id: &str) -> Result<Option<Question>, BackendError>;

    async fn reveal_count(&self, user_id: &str) -> Result<u32, BackendError>;

    async fn submit_answer(&self, user_id: &str, answer: NewAnswer) -> Result<(), BackendError>;

    async fn set_subscription(
        &self,
        profile: &TelegramProfile,
        subscribed: bool,
    ) -> Result<(), BackendError>;

    async fn subscribed_users(&self) -> Result<Vec<SubscribedUser>, BackendError>;
}
