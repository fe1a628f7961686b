use teloxide::{
    Bot,
    dispatching::UpdateHandler,
    dptree,
    payloads::EditMessageReplyMarkupSetters,
    sugar::bot::BotMessagesExt,
    types::{CallbackQuery, InlineKeyboardMarkup, MaybeInaccessibleMessage, Message},
};

use crate::callback::CallbackAction;

/// Injects the parsed `CallbackAction` for callback-query branches; queries
/// without a recognizable payload fall through to the fallback handler.
pub(crate) fn parsed_action() -> UpdateHandler<anyhow::Error> {
    dptree::filter_map(|query: CallbackQuery| {
        query.data.as_deref().and_then(CallbackAction::parse)
    })
}

pub(crate) fn try_get_message_from_query(query: &CallbackQuery) -> Option<&Message> {
    query.message.as_ref().and_then(|msg| match msg {
        MaybeInaccessibleMessage::Inaccessible(_) => None,
        MaybeInaccessibleMessage::Regular(message) => Some(message.as_ref()),
    })
}

pub(crate) async fn clear_message_buttons(
    bot: &Bot,
    message: &Message,
) -> Result<(), anyhow::Error> {
    bot.edit_reply_markup(message)
        .reply_markup(InlineKeyboardMarkup::default())
        .await?;

    Ok(())
}
