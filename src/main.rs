mod config;
mod context;
mod error;
mod event;
mod guild;
mod handler;
mod helper;
mod logging;
mod parse;
mod plugin;
mod reconcile;

use serenity::{all::GatewayIntents, Client};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = crate::config::Config::load().await?;
    let token = cfg.general.discord_token.clone();
    let handler = handler::Handler::new(cfg);

    // Things we want discord to tell us about.  Member lists need the privileged GUILD_MEMBERS
    // intent and reading referenced lists needs MESSAGE_CONTENT.
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    Client::builder(&token, intents)
        .event_handler(handler)
        .await?
        .start()
        .await
        .map_err(Into::into)
}
