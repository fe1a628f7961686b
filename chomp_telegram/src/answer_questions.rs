use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::dptree::{self, case};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use chomp_backend::{ChompApi, NewAnswer};
use chomp_models::question::{Question, QuestionType};
use chomp_models::session::PendingAnswer;
use chomp_models::user::TelegramId;
use chomp_rounds::RoundTimer;

use crate::callback::CallbackAction;
use crate::menu;
use crate::session::SessionStore;
use crate::util::{clear_message_buttons, parsed_action, try_get_message_from_query};
use crate::{GlobalDialogue, GlobalState, HandlerResult, SERVICE_TROUBLE_TEXT};

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub(super) enum AnsweringState {
    /// Waiting for the player to pick an option.
    #[default]
    AwaitingFirstOrder,
    /// Waiting for the crowd-agreement percentage.
    AwaitingSecondOrder,
}

#[derive(Debug, PartialEq)]
pub(crate) enum RoundStart {
    NoSession,
    Exhausted,
    Unavailable,
    Started(Question),
}

pub(crate) async fn begin_round(
    api: &dyn ChompApi,
    sessions: &SessionStore,
    timer: &RoundTimer,
    chat: TelegramId,
) -> RoundStart {
    let Some(user) = sessions.get(chat).await.and_then(|session| session.user) else {
        return RoundStart::NoSession;
    };

    match api.next_question(&user.id).await {
        Ok(Some(question)) => {
            sessions
                .update(chat, |session| {
                    session.pending_answer = Some(PendingAnswer::new(question.clone()))
                })
                .await;
            timer.start(chat, question.duration()).await;

            RoundStart::Started(question)
        }
        Ok(None) => RoundStart::Exhausted,
        Err(error) => {
            log::warn!("Could not fetch the next question for chat {chat}: {error}");
            RoundStart::Unavailable
        }
    }
}

#[derive(Debug, PartialEq)]
pub(crate) enum FirstOrder {
    NoRound,
    UnknownOption,
    Chosen { option_text: String },
}

/// Stops the clock and records the chosen option. The elapsed time captured
/// here is what gets reported with the final submission.
pub(crate) async fn capture_first_order(
    sessions: &SessionStore,
    timer: &RoundTimer,
    chat: TelegramId,
    option_id: i64,
) -> FirstOrder {
    let Some(pending) = sessions.get(chat).await.and_then(|s| s.pending_answer) else {
        return FirstOrder::NoRound;
    };
    let Some(option) = pending.question.option(option_id) else {
        return FirstOrder::UnknownOption;
    };
    let option_text = option.text.clone();

    let elapsed = match timer.stop(chat).await {
        Some(stopped) => stopped.elapsed,
        // The clock is already gone; charge the full duration.
        None => pending.question.duration(),
    };

    sessions
        .update(chat, |session| {
            if let Some(pending) = session.pending_answer.as_mut() {
                pending.chosen_option_id = Some(option_id);
                pending.elapsed = Some(elapsed);
            }
        })
        .await;

    FirstOrder::Chosen { option_text }
}

#[derive(Debug, PartialEq)]
pub(crate) enum SecondOrder {
    NoRound,
    Unavailable,
    Submitted { option_text: String },
}

pub(crate) async fn submit_second_order(
    api: &dyn ChompApi,
    sessions: &SessionStore,
    chat: TelegramId,
    option_id: i64,
    percentage: u8,
) -> SecondOrder {
    let Some(session) = sessions.get(chat).await else {
        return SecondOrder::NoRound;
    };
    let (Some(user), Some(pending)) = (session.user, session.pending_answer) else {
        return SecondOrder::NoRound;
    };

    let option_text = pending
        .question
        .option(option_id)
        .map(|option| option.text.clone())
        .unwrap_or_default();

    let answer = NewAnswer {
        question_id: pending.question.id,
        option_id,
        percentage_given: percentage,
        elapsed: pending
            .elapsed
            .unwrap_or_else(|| pending.question.duration()),
        deck_id: pending.question.deck_id,
    };

    // The round is over whether or not the submission sticks.
    sessions
        .update(chat, |session| session.pending_answer = None)
        .await;

    match api.submit_answer(&user.id, answer).await {
        Ok(()) => SecondOrder::Submitted { option_text },
        Err(error) => {
            log::warn!("Could not submit the answer for chat {chat}: {error}");
            SecondOrder::Unavailable
        }
    }
}

pub(crate) fn render_question(question: &Question) -> String {
    format!("❓ {}", question.question)
}

pub(crate) fn options_keyboard(question: &Question) -> InlineKeyboardMarkup {
    let buttons = question.question_options.iter().map(|option| {
        InlineKeyboardButton::callback(
            option.text.clone(),
            CallbackAction::FirstOrder {
                option_id: option.id,
            }
            .encode(),
        )
    });

    match question.kind {
        QuestionType::BinaryQuestion => InlineKeyboardMarkup::new(vec![buttons.collect()]),
        QuestionType::MultiChoice => {
            InlineKeyboardMarkup::new(buttons.map(|button| vec![button]).collect::<Vec<_>>())
        }
    }
}

fn confidence_keyboard(option_id: i64) -> InlineKeyboardMarkup {
    let buttons = (0..=100u8)
        .step_by(10)
        .map(|percentage| {
            InlineKeyboardButton::callback(
                format!("{percentage}%"),
                CallbackAction::SecondOrder {
                    percentage,
                    option_id,
                }
                .encode(),
            )
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(buttons.chunks(4).map(<[_]>::to_vec).collect::<Vec<_>>())
}

async fn begin_round_handler(
    bot: Bot,
    dialogue: GlobalDialogue,
    sessions: SessionStore,
    timer: Arc<RoundTimer>,
    api: Arc<dyn ChompApi>,
    query: CallbackQuery,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();

    if let Some(message) = try_get_message_from_query(&query) {
        clear_message_buttons(&bot, message).await?;
    }

    match begin_round(api.as_ref(), &sessions, &timer, chat_id.0).await {
        RoundStart::Started(question) => {
            let prompt = bot
                .send_message(
                    chat_id,
                    format!(
                        "{}\n\n⏳ {}s left",
                        render_question(&question),
                        question.duration().as_secs()
                    ),
                )
                .reply_markup(options_keyboard(&question))
                .await?;

            sessions
                .update(chat_id.0, |session| {
                    if let Some(pending) = session.pending_answer.as_mut() {
                        pending.prompt_message_id = Some(prompt.id.0);
                    }
                })
                .await;

            dialogue
                .update(GlobalState::Answering(AnsweringState::AwaitingFirstOrder))
                .await?;
        }
        RoundStart::Exhausted => {
            bot.send_message(
                chat_id,
                "You have CHOMPed through every question! Check back later for more. 🎉",
            )
            .await?;
            menu::show_menu(&bot, chat_id).await?;
        }
        RoundStart::NoSession => {
            bot.send_message(chat_id, "I seem to have lost track of you. Please send /start.")
                .await?;
        }
        RoundStart::Unavailable => {
            bot.send_message(chat_id, SERVICE_TROUBLE_TEXT).await?;
            menu::show_menu(&bot, chat_id).await?;
        }
    }

    bot.answer_callback_query(query.id).await?;
    Ok(())
}

async fn first_order_handler(
    bot: Bot,
    dialogue: GlobalDialogue,
    sessions: SessionStore,
    timer: Arc<RoundTimer>,
    option_id: i64,
    query: CallbackQuery,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();

    match capture_first_order(&sessions, &timer, chat_id.0, option_id).await {
        FirstOrder::Chosen { option_text } => {
            if let Some(message) = try_get_message_from_query(&query) {
                clear_message_buttons(&bot, message).await?;
            }

            bot.send_message(
                chat_id,
                format!(
                    "You picked \"{option_text}\". What percentage of players do you think picked the same?"
                ),
            )
            .reply_markup(confidence_keyboard(option_id))
            .await?;

            dialogue
                .update(GlobalState::Answering(AnsweringState::AwaitingSecondOrder))
                .await?;
        }
        FirstOrder::UnknownOption => {
            // Stale button from an earlier question; the round keeps running.
            log::warn!("Unknown option {option_id} pressed in chat {chat_id}");
        }
        FirstOrder::NoRound => {
            bot.send_message(chat_id, "That round is already over.").await?;
            menu::show_menu(&bot, chat_id).await?;
            dialogue.update(GlobalState::Menu).await?;
        }
    }

    bot.answer_callback_query(query.id).await?;
    Ok(())
}

async fn second_order_handler(
    bot: Bot,
    dialogue: GlobalDialogue,
    sessions: SessionStore,
    api: Arc<dyn ChompApi>,
    (percentage, option_id): (u8, i64),
    query: CallbackQuery,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();

    if let Some(message) = try_get_message_from_query(&query) {
        clear_message_buttons(&bot, message).await?;
    }

    match submit_second_order(api.as_ref(), &sessions, chat_id.0, option_id, percentage).await {
        SecondOrder::Submitted { option_text } => {
            bot.send_message(
                chat_id,
                format!("Locked in: \"{option_text}\" with {percentage}% agreement. 🍽️"),
            )
            .await?;
        }
        SecondOrder::NoRound => {
            bot.send_message(chat_id, "That round is already over.").await?;
        }
        SecondOrder::Unavailable => {
            bot.send_message(chat_id, SERVICE_TROUBLE_TEXT).await?;
        }
    }

    menu::show_menu(&bot, chat_id).await?;
    dialogue.update(GlobalState::Menu).await?;
    bot.answer_callback_query(query.id).await?;
    Ok(())
}

pub(super) fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(
            case![GlobalState::Menu].branch(
                Update::filter_callback_query()
                    .chain(parsed_action())
                    .branch(case![CallbackAction::AnswerQuestions].endpoint(begin_round_handler)),
            ),
        )
        .branch(
            case![GlobalState::Answering(x)].branch(
                Update::filter_callback_query()
                    .chain(parsed_action())
                    .branch(
                        case![AnsweringState::AwaitingFirstOrder].branch(
                            case![CallbackAction::FirstOrder { option_id }]
                                .endpoint(first_order_handler),
                        ),
                    )
                    .branch(
                        case![AnsweringState::AwaitingSecondOrder].branch(
                            case![CallbackAction::SecondOrder {
                                percentage,
                                option_id
                            }]
                            .endpoint(second_order_handler),
                        ),
                    ),
            ),
        )
}
