use std::time::Duration;

use crate::question::Question;
use crate::user::ChompUser;

/// The question round a player is currently inside of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAnswer {
    pub question: Question,
    /// Message carrying the option buttons and the countdown line.
    pub prompt_message_id: Option<i32>,
    pub chosen_option_id: Option<i64>,
    /// Time spent until the first-order answer was captured.
    pub elapsed: Option<Duration>,
}

impl PendingAnswer {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            prompt_message_id: None,
            chosen_option_id: None,
            elapsed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTicket {
    pub email: String,
    pub verification_id: String,
    pub verified: bool,
}

/// Per-chat transient state. Everything the bot remembers between updates
/// lives here, keyed by chat id in the session store, and dies with the
/// process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user: Option<ChompUser>,
    pub pending_answer: Option<PendingAnswer>,
    pub email_ticket: Option<EmailTicket>,
}
