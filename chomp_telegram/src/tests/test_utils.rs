use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use chomp_backend::{AuthProvider, BackendError, ChompApi, NewAnswer};
use chomp_models::question::{Question, QuestionOption, QuestionType};
use chomp_models::user::{ChompUser, SubscribedUser, TelegramProfile, Wallet};
use chomp_rounds::{CountdownChannel, CountdownEvent, PlayerId, RoundTimer};

pub(crate) fn profile() -> TelegramProfile {
    TelegramProfile {
        id: 1,
        first_name: "Ada".to_string(),
        last_name: None,
        username: Some("ada".to_string()),
    }
}

pub(crate) fn chomp_user(id: &str) -> ChompUser {
    ChompUser {
        id: id.to_string(),
        telegram_id: Some(1),
        telegram_username: Some("ada".to_string()),
        username: None,
        is_bot_subscriber: true,
        wallets: Vec::new(),
    }
}

pub(crate) fn wallet_user(id: &str) -> ChompUser {
    let mut user = chomp_user(id);
    user.wallets.push(Wallet {
        address: "So1aNaAddr".to_string(),
    });
    user
}

pub(crate) fn question() -> Question {
    Question {
        id: 42,
        question: "Will it rain tomorrow?".to_string(),
        duration_ms: 10_000,
        kind: QuestionType::BinaryQuestion,
        question_options: vec![
            QuestionOption {
                id: 1,
                text: "Yes".to_string(),
                is_left: true,
            },
            QuestionOption {
                id: 2,
                text: "No".to_string(),
                is_left: false,
            },
        ],
        deck_id: None,
    }
}

pub(crate) fn deck_question() -> Question {
    let mut question = question();
    question.deck_id = Some(7);
    question
}

fn unavailable() -> BackendError {
    BackendError::Unavailable("test outage".to_string())
}

#[derive(Default)]
pub(crate) struct FakeBackendState {
    pub user: Option<ChompUser>,
    pub email_user: Option<ChompUser>,
    pub next_question: Option<Question>,
    pub reveal_count: u32,
    pub fail: bool,
    pub get_calls: usize,
    pub create_calls: usize,
    pub submitted: Vec<(String, NewAnswer)>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    pub state: Arc<Mutex<FakeBackendState>>,
}

impl FakeBackend {
    pub(crate) fn with_user(user: ChompUser) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().user = Some(user);
        backend
    }
}

#[async_trait]
impl ChompApi for FakeBackend {
    async fn get_user(
        &self,
        _profile: &TelegramProfile,
    ) -> Result<Option<ChompUser>, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(unavailable());
        }
        state.get_calls += 1;
        Ok(state.user.clone())
    }

    async fn create_user(&self, profile: &TelegramProfile) -> Result<ChompUser, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(unavailable());
        }
        state.create_calls += 1;

        let mut user = chomp_user("created-user");
        user.telegram_id = Some(profile.id);
        state.user = Some(user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, _email: &str) -> Result<Option<ChompUser>, BackendError> {
        let state = self.state.lock().unwrap();
        if state.fail {
            return Err(unavailable());
        }
        Ok(state.email_user.clone())
    }

    async fn next_question(&self, _user_id: &str) -> Result<Option<Question>, BackendError> {
        let state = self.state.lock().unwrap();
        if state.fail {
            return Err(unavailable());
        }
        Ok(state.next_question.clone())
    }

    async fn reveal_count(&self, _user_id: &str) -> Result<u32, BackendError> {
        let state = self.state.lock().unwrap();
        if state.fail {
            return Err(unavailable());
        }
        Ok(state.reveal_count)
    }

    async fn submit_answer(&self, user_id: &str, answer: NewAnswer) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(unavailable());
        }
        state.submitted.push((user_id.to_string(), answer));
        Ok(())
    }

    async fn set_subscription(
        &self,
        _profile: &TelegramProfile,
        _subscribed: bool,
    ) -> Result<(), BackendError> {
        if self.state.lock().unwrap().fail {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn subscribed_users(&self) -> Result<Vec<SubscribedUser>, BackendError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuthState {
    pub requested: Vec<String>,
    pub accept_code: Option<String>,
    pub fail: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeAuth {
    pub state: Arc<Mutex<FakeAuthState>>,
}

#[async_trait]
impl AuthProvider for FakeAuth {
    async fn request_email_verification(&self, email: &str) -> Result<String, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(unavailable());
        }
        state.requested.push(email.to_string());
        Ok("verification-1".to_string())
    }

    async fn verify_otp(
        &self,
        _verification_id: &str,
        code: &str,
    ) -> Result<bool, BackendError> {
        let state = self.state.lock().unwrap();
        if state.fail {
            return Err(unavailable());
        }
        Ok(state.accept_code.as_deref() == Some(code))
    }
}

struct NullChannel;

#[async_trait]
impl CountdownChannel for NullChannel {
    async fn send_countdown_event(&self, _player: PlayerId, _event: CountdownEvent) {}
}

pub(crate) fn silent_timer() -> RoundTimer {
    RoundTimer::new(Arc::new(NullChannel))
}
