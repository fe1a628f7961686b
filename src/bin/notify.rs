//! Operator script: broadcast a message to every subscribed user.

use std::io::{BufRead, Write};

use teloxide::prelude::*;

use chomp_backend::{ChompApi, HttpChompApi};
use chomp_models::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = Settings::load()?;

    if settings.webapp.url.contains("app.chomp.games") {
        println!("⚠️  WARNING: you are connected to the PRODUCTION environment!\n");
    } else {
        println!("🔧 Running against a development environment\n");
    }

    let message = prompt("Enter the notification message (emoji welcome ✨): ")?;
    println!("\nMessage preview:");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{message}");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    println!("This message goes to every subscribed user.");

    let confirm = prompt("Send it? (y/n): ")?;
    if !confirm.eq_ignore_ascii_case("y") {
        println!("\nNotification cancelled");
        return Ok(());
    }

    let api = HttpChompApi::new(
        settings.backend.base_url.clone(),
        settings.backend.api_key.clone(),
        settings.telegram.token.clone(),
    )?;

    let subscribers = api.subscribed_users().await?;
    if subscribers.is_empty() {
        println!("\nNo subscribed users found");
        return Ok(());
    }

    println!("\nSending the notification to {} users...", subscribers.len());

    let bot = Bot::new(settings.telegram.token.clone());
    let mut sent = 0usize;
    let mut failed = 0usize;

    for subscriber in subscribers {
        match bot
            .send_message(ChatId(subscriber.telegram_id), message.clone())
            .await
        {
            Ok(_) => {
                sent += 1;
                print!(".");
            }
            Err(error) => {
                failed += 1;
                print!("x");
                log::warn!("Failed to reach {}: {error}", subscriber.telegram_id);
            }
        }
        std::io::stdout().flush().ok();
    }

    println!("\n\nNotification delivered to {sent} users");
    if failed > 0 {
        println!("Failed to reach {failed} users");
    }

    Ok(())
}

fn prompt(question: &str) -> anyhow::Result<String> {
    print!("{question}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
