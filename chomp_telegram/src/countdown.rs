use std::sync::Arc;

use async_trait::async_trait;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::payloads::EditMessageTextSetters;
use teloxide::prelude::*;
use teloxide::types::MessageId;

use chomp_rounds::{CountdownChannel, CountdownEvent, PlayerId};

use crate::answer_questions::{options_keyboard, render_question};
use crate::menu;
use crate::session::SessionStore;
use crate::GlobalState;

/// Delivers round ticks and expiries to the chat. The edited countdown line
/// is best-effort UI; the timer registry stays the source of truth, so every
/// Telegram failure here is logged and swallowed.
pub(crate) struct TelegramCountdownChannel {
    bot: Bot,
    sessions: SessionStore,
    dialogues: Arc<InMemStorage<GlobalState>>,
}

impl TelegramCountdownChannel {
    pub(crate) fn new(
        bot: Bot,
        sessions: SessionStore,
        dialogues: Arc<InMemStorage<GlobalState>>,
    ) -> Self {
        Self {
            bot,
            sessions,
            dialogues,
        }
    }
}

/// Clears the expired round from the session, forces the dialogue back to
/// the menu, and hands back the prompt message that should be removed.
pub(crate) async fn end_expired_round(
    sessions: &SessionStore,
    dialogues: &Arc<InMemStorage<GlobalState>>,
    player: PlayerId,
) -> Option<i32> {
    let pending = sessions
        .get(player)
        .await
        .and_then(|session| session.pending_answer);

    sessions
        .update(player, |session| session.pending_answer = None)
        .await;

    let dialogue = Dialogue::new(Arc::clone(dialogues), ChatId(player));
    if let Err(error) = dialogue.update(GlobalState::Menu).await {
        log::warn!("Could not reset the dialogue for chat {player}: {error}");
    }

    pending.and_then(|pending| pending.prompt_message_id)
}

#[async_trait]
impl CountdownChannel for TelegramCountdownChannel {
    async fn send_countdown_event(&self, player: PlayerId, event: CountdownEvent) {
        let chat_id = ChatId(player);

        match event {
            CountdownEvent::Tick { remaining } => {
                let Some(pending) = self
                    .sessions
                    .get(player)
                    .await
                    .and_then(|session| session.pending_answer)
                else {
                    return;
                };
                let Some(message_id) = pending.prompt_message_id else {
                    return;
                };

                let text = format!(
                    "{}\n\n⏳ {}s left",
                    render_question(&pending.question),
                    remaining.as_secs()
                );
                if let Err(error) = self
                    .bot
                    .edit_message_text(chat_id, MessageId(message_id), text)
                    .reply_markup(options_keyboard(&pending.question))
                    .await
                {
                    log::debug!("Countdown edit failed for chat {player}: {error}");
                }
            }
            CountdownEvent::Expired => {
                let prompt = end_expired_round(&self.sessions, &self.dialogues, player).await;

                if let Some(message_id) = prompt
                    && let Err(error) =
                        self.bot.delete_message(chat_id, MessageId(message_id)).await
                {
                    log::debug!("Could not remove the expired prompt for chat {player}: {error}");
                }

                if let Err(error) = self
                    .bot
                    .send_message(chat_id, "⏰ Time is up for this one!")
                    .await
                {
                    log::warn!("Could not notify chat {player} about the expiry: {error}");
                    return;
                }
                if let Err(error) = menu::show_menu(&self.bot, chat_id).await {
                    log::warn!("Could not show the menu to chat {player}: {error}");
                }
            }
        }
    }
}
