use crate::{event::*, log_event, logging::*, plugin::*};
use anyhow::Result;

/// Prints connection and command activity to stdout
pub struct Debug;

#[serenity::async_trait]
impl Plugin for Debug {
    fn name(&self) -> &'static str {
        "debug"
    }

    async fn usage(&self, _ctx: &Context<'_>) -> Option<String> {
        None
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        match event {
            Event::Ready(ready) => {
                let me = ctx.cache.current_user().color();
                log_event!("Connected to {} server(s) as {}", ready.guilds.len(), me);
            }
            Event::Message(msg) => {
                // Only commands are interesting; ordinary chatter is not logged.
                let prefix = ctx.prefix().await;
                if msg.author.bot || strip_command_prefix(&msg.content, &prefix).is_none() {
                    return Ok(EventHandled::No);
                }
                log_event!(
                    "{}{}{}{}{}{} {}",
                    msg.guild_id.color(ctx.http).await,
                    Glue {}.color(),
                    msg.channel_id.color(ctx.http).await,
                    Glue {}.color(),
                    msg.author.color(),
                    Glue {}.color(),
                    msg.content,
                );
            }
        }

        Ok(EventHandled::No)
    }
}
