use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use chomp_models::question::Question;
use chomp_models::user::{ChompUser, SubscribedUser, TelegramProfile};

use crate::api::{BackendError, ChompApi, NewAnswer, check_status};
use crate::model::{
    AnswerRequest, NextQuestionResponse, ProfileResponse, RevealCountResponse,
    SetSubscriptionRequest, SubscribedUsersResponse, TokenRequest,
};
use crate::telegram_auth::TelegramAuthSigner;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `ChompApi` over the backend's REST endpoints. One shared client, a static
/// `api-key` header, and a signed Telegram token wherever the backend needs
/// to know who is asking.
pub struct HttpChompApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    signer: TelegramAuthSigner,
}

impl HttpChompApi {
    pub fn new(base_url: String, api_key: String, bot_token: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            signer: TelegramAuthSigner::new(bot_token),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn signed_token(&self, profile: &TelegramProfile) -> Result<String, BackendError> {
        self.signer
            .sign(profile, Utc::now())
            .map_err(|error| BackendError::Unavailable(format!("auth token signing: {error}")))
    }
}

#[async_trait]
impl ChompApi for HttpChompApi {
    async fn get_user(
        &self,
        profile: &TelegramProfile,
    ) -> Result<Option<ChompUser>, BackendError> {
        let token = self.signed_token(profile)?;
        let response = self
            .http
            .get(self.url("/api/user/getUserByTelegram"))
            .header("api-key", &self.api_key)
            .query(&[("telegramAuthToken", token.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let body: ProfileResponse = response.json().await?;
        Ok(body.profile)
    }

    async fn create_user(&self, profile: &TelegramProfile) -> Result<ChompUser, BackendError> {
        let token = self.signed_token(profile)?;
        let response = self
            .http
            .post(self.url("/api/user/createUserByTelegram"))
            .header("api-key", &self.api_key)
            .json(&TokenRequest {
                telegram_auth_token: token,
            })
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: ProfileResponse = response.json().await?;
        body.profile
            .ok_or_else(|| BackendError::Unavailable("user creation returned no profile".into()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<ChompUser>, BackendError> {
        let response = self
            .http
            .get(self.url("/api/user/getUserByEmail"))
            .header("api-key", &self.api_key)
            .query(&[("email", email)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let body: ProfileResponse = response.json().await?;
        Ok(body.profile)
    }

    async fn next_question(&self, user_id: &str) -> Result<Option<Question>, BackendError> {
        let response = self
            .http
            .get(self.url("/api/question/getNextQuestion"))
            .header("api-key", &self.api_key)
            .query(&[("userId", user_id)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        let body: NextQuestionResponse = response.json().await?;
        Ok(body.question)
    }

    async fn reveal_count(&self, user_id: &str) -> Result<u32, BackendError> {
        let response = self
            .http
            .get(self.url("/api/question/getRevealQuestionsCount"))
            .header("api-key", &self.api_key)
            .query(&[("userId", user_id)])
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: RevealCountResponse = response.json().await?;
        Ok(body.count)
    }

    async fn submit_answer(&self, user_id: &str, answer: NewAnswer) -> Result<(), BackendError> {
        // Deck questions go to the deck endpoint, standalone questions to
        // the single-question one.
        let path = if answer.deck_id.is_some() {
            "/api/deck/answerDeckQuestion"
        } else {
            "/api/question/answerQuestion"
        };

        let response = self
            .http
            .post(self.url(path))
            .header("api-key", &self.api_key)
            .json(&AnswerRequest::new(user_id, answer))
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn set_subscription(
        &self,
        profile: &TelegramProfile,
        subscribed: bool,
    ) -> Result<(), BackendError> {
        let token = self.signed_token(profile)?;
        let response = self
            .http
            .post(self.url("/api/user/setUserSubscription"))
            .header("api-key", &self.api_key)
            .json(&SetSubscriptionRequest {
                telegram_auth_token: token,
                is_bot_subscriber: subscribed,
            })
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn subscribed_users(&self) -> Result<Vec<SubscribedUser>, BackendError> {
        let response = self
            .http
            .get(self.url("/api/users/getSubscribedUsers"))
            .header("api-key", &self.api_key)
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: SubscribedUsersResponse = response.json().await?;
        Ok(body.users)
    }
}
