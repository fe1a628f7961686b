use std::sync::Arc;

use anyhow::Context;
use teloxide::Bot;

use chomp_backend::{AuthProvider, ChompApi, HttpAuthProvider, HttpChompApi};
use chomp_models::settings::Settings;
use chomp_telegram::{TelegramInteractionInterface, WebAppUrl};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    // Malformed credentials must stop the process before it accepts traffic.
    let settings = Settings::load().context("settings are missing or malformed")?;

    let bot = Bot::new(settings.telegram.token.clone());
    let api: Arc<dyn ChompApi> = Arc::new(HttpChompApi::new(
        settings.backend.base_url.clone(),
        settings.backend.api_key.clone(),
        settings.telegram.token.clone(),
    )?);
    let auth: Arc<dyn AuthProvider> = Arc::new(HttpAuthProvider::new(
        settings.auth.base_url.clone(),
        settings.auth.api_token.clone(),
    )?);

    log::info!("Chomp bot is starting against {}", settings.backend.base_url);

    TelegramInteractionInterface::start(bot, api, auth, WebAppUrl(settings.webapp.url)).await;

    Ok(())
}
