use serde::{Deserialize, Serialize};

use chomp_models::question::Question;
use chomp_models::user::{ChompUser, SubscribedUser};

use crate::api::NewAnswer;

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileResponse {
    #[serde(default)]
    pub profile: Option<ChompUser>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscribedUsersResponse {
    #[serde(default)]
    pub users: Vec<SubscribedUser>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NextQuestionResponse {
    #[serde(default)]
    pub question: Option<Question>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevealCountResponse {
    #[serde(default)]
    pub count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenRequest {
    pub telegram_auth_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SetSubscriptionRequest {
    pub telegram_auth_token: String,
    pub is_bot_subscriber: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnswerRequest {
    pub user_id: String,
    pub question_id: i64,
    pub option_id: i64,
    pub percentage_given: u8,
    pub elapsed_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<i64>,
}

impl AnswerRequest {
    pub(crate) fn new(user_id: &str, answer: NewAnswer) -> Self {
        Self {
            user_id: user_id.to_string(),
            question_id: answer.question_id,
            option_id: answer.option_id,
            percentage_given: answer.percentage_given,
            elapsed_time_ms: answer.elapsed.as_millis() as u64,
            deck_id: answer.deck_id,
        }
    }
}
