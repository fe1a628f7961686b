mod answer_questions;
mod callback;
mod countdown;
mod menu;
mod reveal_answers;
mod session;
mod util;

#[cfg(test)]
mod tests;

pub use session::SessionStore;

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::dptree::{self, case};
use teloxide::types::{
    InlineQuery, InlineQueryResult, InlineQueryResultArticle, InputMessageContent,
    InputMessageContentText,
};
use teloxide::{
    dispatching::dialogue::{self, InMemStorage},
    macros::BotCommands,
    prelude::*,
};

use chomp_backend::{AuthProvider, ChompApi};
use chomp_rounds::RoundTimer;

use answer_questions::AnsweringState;
use countdown::TelegramCountdownChannel;
use reveal_answers::RevealingState;

type GlobalDialogue = Dialogue<GlobalState, InMemStorage<GlobalState>>;
type HandlerResult = anyhow::Result<()>;

pub(crate) const SERVICE_TROUBLE_TEXT: &str =
    "Chomp is having trouble right now. Please try again in a bit. 🙏";

/// Base URL of the Chomp web app, used for launch and mini-app buttons.
#[derive(Clone)]
pub struct WebAppUrl(pub String);

#[derive(Default, Clone, Debug, PartialEq, Eq)]
enum GlobalState {
    #[default]
    New,
    Menu,
    Answering(AnsweringState),
    Revealing(RevealingState),
}

pub struct TelegramInteractionInterface;

impl TelegramInteractionInterface {
    pub async fn start(
        bot: Bot,
        api: Arc<dyn ChompApi>,
        auth: Arc<dyn AuthProvider>,
        webapp: WebAppUrl,
    ) {
        log::info!("Starting the Chomp Telegram UI.");

        let dialogue_storage = InMemStorage::<GlobalState>::new();
        let sessions = SessionStore::new();
        let countdown = TelegramCountdownChannel::new(
            bot.clone(),
            sessions.clone(),
            Arc::clone(&dialogue_storage),
        );
        let timer = Arc::new(RoundTimer::new(Arc::new(countdown)));

        let invalid_state_handler =
            Update::filter_message().branch(dptree::endpoint(invalid_state));

        let invalid_callback_handler =
            Update::filter_callback_query().branch(dptree::endpoint(invalid_query));

        // Inline queries carry no chat, so they are dispatched before the
        // dialogue layer gets a chance to filter them out.
        let dialogue_schema = dialogue::enter::<Update, InMemStorage<GlobalState>, GlobalState, _>()
            .branch(command_handler())
            .branch(answer_questions::schema())
            .branch(reveal_answers::schema())
            .branch(invalid_state_handler)
            .branch(invalid_callback_handler);

        let schema = dptree::entry()
            .branch(inline_query_handler())
            .branch(dialogue_schema);

        Dispatcher::builder(bot, schema)
            .dependencies(dptree::deps![
                dialogue_storage,
                sessions,
                timer,
                api,
                auth,
                webapp
            ])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await
    }
}

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum GlobalCommand {
    #[command(description = "start CHOMPing")]
    Start,
    #[command(description = "stop receiving Chomp updates")]
    Unsubscribe,
    #[command(description = "receive Chomp updates again")]
    Resubscribe,
}

fn command_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_message().branch(
        teloxide::filter_command::<GlobalCommand, _>()
            .branch(case![GlobalCommand::Start].endpoint(menu::start))
            .branch(case![GlobalCommand::Unsubscribe].endpoint(menu::unsubscribe))
            .branch(case![GlobalCommand::Resubscribe].endpoint(menu::resubscribe)),
    )
}

fn inline_query_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_inline_query().branch(dptree::endpoint(answer_inline_query))
}

async fn answer_inline_query(bot: Bot, query: InlineQuery, webapp: WebAppUrl) -> HandlerResult {
    let content = InputMessageContent::Text(InputMessageContentText::new(format!(
        "Open the app to start CHOMPing! {}",
        webapp.0
    )));
    let article = InlineQueryResultArticle::new("chomp.launch", "Play Chomp", content);

    bot.answer_inline_query(query.id, vec![InlineQueryResult::Article(article)])
        .await?;
    Ok(())
}

async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "I did not catch that. Use the buttons below, or send /start to begin again.",
    )
    .await?;
    Ok(())
}

async fn invalid_query(bot: Bot, dialogue: GlobalDialogue, query: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(query.id).await?;
    bot.send_message(
        dialogue.chat_id(),
        "That button no longer works. Send /start to get a fresh menu.",
    )
    .await?;
    Ok(())
}
