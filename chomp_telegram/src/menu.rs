use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};

use chomp_backend::{BackendError, ChompApi};
use chomp_models::user::{ChompUser, TelegramId, TelegramProfile};

use crate::callback::CallbackAction;
use crate::session::SessionStore;
use crate::{GlobalDialogue, GlobalState, HandlerResult, SERVICE_TROUBLE_TEXT, WebAppUrl};

const MENU_TEXT: &str = "What would you like to do?";

fn welcome_text(user: &ChompUser, profile: &TelegramProfile) -> String {
    let name = user.display_name().unwrap_or(&profile.first_name);
    format!("Welcome to Chomp, {name}! Answer questions, guess the crowd, earn rewards. 🍪")
}

pub(crate) fn menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🍴 Answer questions",
            CallbackAction::AnswerQuestions.encode(),
        )],
        vec![InlineKeyboardButton::callback(
            "👀 Reveal answers",
            CallbackAction::RevealAnswers.encode(),
        )],
    ])
}

pub(crate) async fn show_menu(bot: &Bot, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, MENU_TEXT)
        .reply_markup(menu_keyboard())
        .await?;
    Ok(())
}

fn welcome_keyboard(webapp: &WebAppUrl) -> InlineKeyboardMarkup {
    match webapp.0.parse() {
        Ok(url) => InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::web_app(
            "Open the app",
            WebAppInfo { url },
        )]]),
        Err(_) => InlineKeyboardMarkup::default(),
    }
}

pub(crate) fn profile_from_message(msg: &Message) -> Option<TelegramProfile> {
    let from = msg.from.as_ref()?;

    Some(TelegramProfile {
        id: from.id.0 as i64,
        first_name: from.first_name.clone(),
        last_name: from.last_name.clone(),
        username: from.username.clone(),
    })
}

/// Looks the player up by their signed Telegram identity and creates the
/// account on first contact; either way the result is cached in the
/// session. Repeat calls only ever issue lookups.
pub(crate) async fn ensure_user(
    api: &dyn ChompApi,
    sessions: &SessionStore,
    chat: TelegramId,
    profile: &TelegramProfile,
) -> Result<ChompUser, BackendError> {
    let user = match api.get_user(profile).await? {
        Some(user) => user,
        None => api.create_user(profile).await?,
    };

    sessions
        .update(chat, |session| session.user = Some(user.clone()))
        .await;

    Ok(user)
}

pub(crate) async fn start(
    bot: Bot,
    dialogue: GlobalDialogue,
    sessions: SessionStore,
    api: Arc<dyn ChompApi>,
    webapp: WebAppUrl,
    msg: Message,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(profile) = profile_from_message(&msg) else {
        bot.send_message(chat_id, "I could not read your Telegram profile.")
            .await?;
        return Ok(());
    };

    match ensure_user(api.as_ref(), &sessions, chat_id.0, &profile).await {
        Ok(user) => {
            bot.send_message(chat_id, welcome_text(&user, &profile))
                .reply_markup(welcome_keyboard(&webapp))
                .await?;
            show_menu(&bot, chat_id).await?;
            dialogue.update(GlobalState::Menu).await?;
        }
        Err(error) => {
            log::warn!("Could not load the user for chat {chat_id}: {error}");
            bot.send_message(chat_id, SERVICE_TROUBLE_TEXT).await?;
        }
    }

    Ok(())
}

pub(crate) async fn unsubscribe(
    bot: Bot,
    sessions: SessionStore,
    api: Arc<dyn ChompApi>,
    msg: Message,
) -> HandlerResult {
    set_subscription(&bot, &sessions, api.as_ref(), &msg, false).await
}

pub(crate) async fn resubscribe(
    bot: Bot,
    sessions: SessionStore,
    api: Arc<dyn ChompApi>,
    msg: Message,
) -> HandlerResult {
    set_subscription(&bot, &sessions, api.as_ref(), &msg, true).await
}

async fn set_subscription(
    bot: &Bot,
    sessions: &SessionStore,
    api: &dyn ChompApi,
    msg: &Message,
    subscribed: bool,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(profile) = profile_from_message(msg) else {
        bot.send_message(chat_id, "I could not read your Telegram profile.")
            .await?;
        return Ok(());
    };

    match api.set_subscription(&profile, subscribed).await {
        Ok(()) => {
            sessions
                .update(chat_id.0, |session| {
                    if let Some(user) = session.user.as_mut() {
                        user.is_bot_subscriber = subscribed;
                    }
                })
                .await;

            let text = if subscribed {
                "You are subscribed to Chomp updates again. 🔔"
            } else {
                "You will no longer receive Chomp updates. 🔕"
            };
            bot.send_message(chat_id, text).await?;
        }
        Err(error) => {
            log::warn!("Could not update the subscription for chat {chat_id}: {error}");
            bot.send_message(chat_id, SERVICE_TROUBLE_TEXT).await?;
        }
    }

    Ok(())
}
