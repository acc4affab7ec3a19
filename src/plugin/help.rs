use crate::{event::*, helper::MessageHelper, plugin::*};
use anyhow::Result;

pub struct Help;

#[serenity::async_trait]
impl Plugin for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        Some(usage_line(ctx, self.name(), "", "show this help message").await)
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some((msg, _)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };

        let mut reply = String::new();
        reply.push_str("```\n");
        reply.push_str("Commands:\n");
        for plugin in crate::plugin::plugins() {
            if let Some(usage) = plugin.usage(ctx).await {
                reply.push_str(&usage);
                reply.push('\n');
            }
        }
        reply.push_str("```\n");
        reply.push_str(
            "Lists are read from a message: give its ID, or reply to it when running the command. \
             Quote names that contain spaces.\n",
        );

        msg.reply_chunked(ctx, &reply).await?;
        Ok(EventHandled::Yes)
    }
}
