use crate::{event::*, plugin::*};
use anyhow::Result;

/// Swallows messages from bots and webhooks, this bot's own replies included, so a summary that
/// happens to start with the prefix can never run as a command.
pub struct IgnoreBots;

#[serenity::async_trait]
impl Plugin for IgnoreBots {
    fn name(&self) -> &'static str {
        "ignore_bots"
    }

    async fn usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    async fn handle(&self, _ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        match event {
            Event::Message(msg) if msg.author.bot || msg.webhook_id.is_some() => {
                Ok(EventHandled::Yes)
            }
            _ => Ok(EventHandled::No),
        }
    }
}
