use std::sync::{Arc, OnceLock};

use regex::Regex;
use teloxide::dispatching::UpdateHandler;
use teloxide::dptree::{self, case};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use chomp_backend::{AuthProvider, ChompApi};
use chomp_models::session::EmailTicket;
use chomp_models::user::TelegramId;

use crate::callback::CallbackAction;
use crate::menu;
use crate::session::SessionStore;
use crate::util::{clear_message_buttons, parsed_action, try_get_message_from_query};
use crate::{GlobalDialogue, GlobalState, HandlerResult, SERVICE_TROUBLE_TEXT, WebAppUrl};

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub(super) enum RevealingState {
    #[default]
    AwaitingConfirmation,
    CollectingEmail,
    AwaitingOtp,
}

pub(crate) fn is_email(text: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
        .is_match(text)
}

pub(crate) fn is_otp(text: &str) -> bool {
    static OTP_RE: OnceLock<Regex> = OnceLock::new();
    OTP_RE
        .get_or_init(|| Regex::new(r"^\d{6}$").unwrap())
        .is_match(text)
}

#[derive(Debug, PartialEq)]
pub(crate) enum RevealGate {
    NoSession,
    Nothing,
    Eligible(u32),
    Unavailable,
}

pub(crate) async fn check_reveal(
    api: &dyn ChompApi,
    sessions: &SessionStore,
    chat: TelegramId,
) -> RevealGate {
    let Some(user) = sessions.get(chat).await.and_then(|session| session.user) else {
        return RevealGate::NoSession;
    };

    match api.reveal_count(&user.id).await {
        Ok(0) => RevealGate::Nothing,
        Ok(count) => RevealGate::Eligible(count),
        Err(error) => {
            log::warn!("Could not fetch the reveal count for chat {chat}: {error}");
            RevealGate::Unavailable
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum RevealPath {
    Launch,
    NeedsEmail,
}

pub(crate) async fn confirm_reveal(sessions: &SessionStore, chat: TelegramId) -> Option<RevealPath> {
    let user = sessions.get(chat).await?.user?;

    Some(if user.has_wallet() {
        RevealPath::Launch
    } else {
        RevealPath::NeedsEmail
    })
}

#[derive(Debug, PartialEq)]
pub(crate) enum EmailRequest {
    Invalid,
    Sent,
    Unavailable,
}

pub(crate) async fn request_verification(
    auth: &dyn AuthProvider,
    sessions: &SessionStore,
    chat: TelegramId,
    text: &str,
) -> EmailRequest {
    let email = text.trim();
    if !is_email(email) {
        return EmailRequest::Invalid;
    }

    match auth.request_email_verification(email).await {
        Ok(verification_id) => {
            sessions
                .update(chat, |session| {
                    session.email_ticket = Some(EmailTicket {
                        email: email.to_string(),
                        verification_id,
                        verified: false,
                    });
                })
                .await;

            EmailRequest::Sent
        }
        Err(error) => {
            log::warn!("Could not request email verification for chat {chat}: {error}");
            EmailRequest::Unavailable
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum OtpOutcome {
    NotACode,
    NotAwaiting,
    Rejected,
    Verified,
    Unavailable,
}

pub(crate) async fn confirm_verification(
    auth: &dyn AuthProvider,
    api: &dyn ChompApi,
    sessions: &SessionStore,
    chat: TelegramId,
    text: &str,
) -> OtpOutcome {
    let code = text.trim();
    if !is_otp(code) {
        return OtpOutcome::NotACode;
    }

    let Some(ticket) = sessions
        .get(chat)
        .await
        .and_then(|session| session.email_ticket)
        .filter(|ticket| !ticket.verified)
    else {
        return OtpOutcome::NotAwaiting;
    };

    match auth.verify_otp(&ticket.verification_id, code).await {
        Ok(true) => {
            sessions
                .update(chat, |session| {
                    if let Some(ticket) = session.email_ticket.as_mut() {
                        ticket.verified = true;
                    }
                })
                .await;
        }
        Ok(false) => return OtpOutcome::Rejected,
        Err(error) => {
            log::warn!("Could not verify the code for chat {chat}: {error}");
            return OtpOutcome::Unavailable;
        }
    }

    // The permanent, wallet-bound account replaces the Telegram-only one
    // everywhere from here on.
    match api.get_user_by_email(&ticket.email).await {
        Ok(Some(user)) => {
            sessions
                .update(chat, |session| session.user = Some(user.clone()))
                .await;
            OtpOutcome::Verified
        }
        Ok(None) => {
            // Wallet binding finishes inside the web app; keep the
            // Telegram-bound account until then.
            log::warn!("No backend account yet for the verified email in chat {chat}");
            OtpOutcome::Verified
        }
        Err(error) => {
            log::warn!("Could not fetch the verified account for chat {chat}: {error}");
            OtpOutcome::Unavailable
        }
    }
}

fn reveal_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Reveal", CallbackAction::RevealConfirm.encode()),
        InlineKeyboardButton::callback("❌ Not now", CallbackAction::RevealCancel.encode()),
    ]])
}

pub(crate) async fn send_launch_link(
    bot: &Bot,
    chat_id: ChatId,
    webapp: &WebAppUrl,
) -> HandlerResult {
    match webapp.0.parse() {
        Ok(url) => {
            let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
                "🚀 Launch Chomp",
                url,
            )]]);
            bot.send_message(chat_id, "Claim your rewards in the app:")
                .reply_markup(keyboard)
                .await?;
        }
        Err(error) => {
            log::warn!("The web app URL does not parse: {error}");
            bot.send_message(
                chat_id,
                format!("Claim your rewards in the app: {}", webapp.0),
            )
            .await?;
        }
    }

    Ok(())
}

async fn reveal_entry_handler(
    bot: Bot,
    dialogue: GlobalDialogue,
    sessions: SessionStore,
    api: Arc<dyn ChompApi>,
    query: CallbackQuery,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();

    if let Some(message) = try_get_message_from_query(&query) {
        clear_message_buttons(&bot, message).await?;
    }

    match check_reveal(api.as_ref(), &sessions, chat_id.0).await {
        RevealGate::Eligible(count) => {
            bot.send_message(
                chat_id,
                format!("You have {count} question(s) ready to reveal. Reveal them now?"),
            )
            .reply_markup(reveal_keyboard())
            .await?;

            dialogue
                .update(GlobalState::Revealing(RevealingState::AwaitingConfirmation))
                .await?;
        }
        RevealGate::Nothing => {
            bot.send_message(
                chat_id,
                "Nothing to reveal yet — answer a few more questions first.",
            )
            .await?;
            menu::show_menu(&bot, chat_id).await?;
        }
        RevealGate::NoSession => {
            bot.send_message(chat_id, "I seem to have lost track of you. Please send /start.")
                .await?;
        }
        RevealGate::Unavailable => {
            bot.send_message(chat_id, SERVICE_TROUBLE_TEXT).await?;
            menu::show_menu(&bot, chat_id).await?;
        }
    }

    bot.answer_callback_query(query.id).await?;
    Ok(())
}

async fn reveal_confirm_handler(
    bot: Bot,
    dialogue: GlobalDialogue,
    sessions: SessionStore,
    webapp: WebAppUrl,
    query: CallbackQuery,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();

    if let Some(message) = try_get_message_from_query(&query) {
        clear_message_buttons(&bot, message).await?;
    }

    match confirm_reveal(&sessions, chat_id.0).await {
        Some(RevealPath::Launch) => {
            send_launch_link(&bot, chat_id, &webapp).await?;
            dialogue.update(GlobalState::Menu).await?;
        }
        Some(RevealPath::NeedsEmail) => {
            bot.send_message(
                chat_id,
                "Connect an email to claim your rewards. What is your email address?",
            )
            .await?;
            dialogue
                .update(GlobalState::Revealing(RevealingState::CollectingEmail))
                .await?;
        }
        None => {
            bot.send_message(chat_id, "I seem to have lost track of you. Please send /start.")
                .await?;
            dialogue.update(GlobalState::Menu).await?;
        }
    }

    bot.answer_callback_query(query.id).await?;
    Ok(())
}

async fn reveal_cancel_handler(
    bot: Bot,
    dialogue: GlobalDialogue,
    query: CallbackQuery,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();

    if let Some(message) = try_get_message_from_query(&query) {
        clear_message_buttons(&bot, message).await?;
    }

    menu::show_menu(&bot, chat_id).await?;
    dialogue.update(GlobalState::Menu).await?;
    bot.answer_callback_query(query.id).await?;
    Ok(())
}

async fn collect_email_handler(
    bot: Bot,
    dialogue: GlobalDialogue,
    sessions: SessionStore,
    auth: Arc<dyn AuthProvider>,
    msg: Message,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        bot.send_message(chat_id, "Please send your email address as text.")
            .await?;
        return Ok(());
    };

    match request_verification(auth.as_ref(), &sessions, chat_id.0, text).await {
        EmailRequest::Sent => {
            bot.send_message(
                chat_id,
                "We sent a 6-digit code to your email. Reply with it here.",
            )
            .await?;
            dialogue
                .update(GlobalState::Revealing(RevealingState::AwaitingOtp))
                .await?;
        }
        EmailRequest::Invalid => {
            bot.send_message(
                chat_id,
                "That does not look like an email address. Please try again.",
            )
            .await?;
        }
        EmailRequest::Unavailable => {
            bot.send_message(chat_id, SERVICE_TROUBLE_TEXT).await?;
        }
    }

    Ok(())
}

async fn confirm_otp_handler(
    bot: Bot,
    dialogue: GlobalDialogue,
    sessions: SessionStore,
    auth: Arc<dyn AuthProvider>,
    api: Arc<dyn ChompApi>,
    webapp: WebAppUrl,
    msg: Message,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        bot.send_message(chat_id, "Please send the 6-digit code from the email.")
            .await?;
        return Ok(());
    };

    match confirm_verification(auth.as_ref(), api.as_ref(), &sessions, chat_id.0, text).await {
        OtpOutcome::Verified => {
            bot.send_message(chat_id, "Email verified! 🎉").await?;
            send_launch_link(&bot, chat_id, &webapp).await?;
            dialogue.update(GlobalState::Menu).await?;
        }
        OtpOutcome::Rejected => {
            bot.send_message(chat_id, "That code does not match. Double-check and try again.")
                .await?;
        }
        OtpOutcome::NotACode => {
            bot.send_message(chat_id, "Please send the 6-digit code from the email.")
                .await?;
        }
        OtpOutcome::NotAwaiting => {
            bot.send_message(
                chat_id,
                "There is no verification in progress. Please send /start to begin again.",
            )
            .await?;
        }
        OtpOutcome::Unavailable => {
            bot.send_message(chat_id, SERVICE_TROUBLE_TEXT).await?;
        }
    }

    Ok(())
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(
            case![GlobalState::Menu].branch(
                Update::filter_callback_query()
                    .chain(parsed_action())
                    .branch(case![CallbackAction::RevealAnswers].endpoint(reveal_entry_handler)),
            ),
        )
        .branch(
            case![GlobalState::Revealing(x)]
                .branch(
                    Update::filter_callback_query()
                        .chain(parsed_action())
                        .branch(
                            case![RevealingState::AwaitingConfirmation]
                                .branch(
                                    case![CallbackAction::RevealConfirm]
                                        .endpoint(reveal_confirm_handler),
                                )
                                .branch(
                                    case![CallbackAction::RevealCancel]
                                        .endpoint(reveal_cancel_handler),
                                ),
                        ),
                )
                .branch(
                    Update::filter_message()
                        .branch(
                            case![RevealingState::CollectingEmail].endpoint(collect_email_handler),
                        )
                        .branch(case![RevealingState::AwaitingOtp].endpoint(confirm_otp_handler)),
                ),
        )
}
