use crate::{
    error::{user_input, StoreError},
    event::*,
    helper::MessageHelper,
    log_internal,
    logging::AsyncPrintColor,
    parse,
    plugin::*,
};
use anyhow::Result;

/// Posts a message into another channel, by ID, mention or configured alias
pub struct SendMessage;

#[serenity::async_trait]
impl Plugin for SendMessage {
    fn name(&self) -> &'static str {
        "send"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        Some(
            usage_line(
                ctx,
                self.name(),
                "<channel> [text]",
                "post text (or the configured default message) to a channel",
            )
            .await,
        )
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.bot_cmd_text(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };
        msg.require_moderator(ctx).await?;

        // The text goes out as typed: quotes, spacing and line breaks included.
        let Some((target, body)) = parse::first_arg(args) else {
            return user_input("Usage: send <channel-id|#channel|alias> [text]");
        };

        let (channel_id, text) = {
            let cfg = ctx.cfg.read().await;
            let channel_id = parse::channel_ref(&target).or_else(|| cfg.send.channel(&target));
            let text = if body.trim().is_empty() {
                cfg.send.default_message.clone()
            } else {
                Some(body.to_owned())
            };
            (channel_id, text)
        };
        let Some(channel_id) = channel_id else {
            return user_input("Channel not found.");
        };
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return user_input("Nothing to send.");
        };

        channel_id
            .say(ctx.http, &text)
            .await
            .map_err(StoreError::from)?;
        log_internal!("Sent a message to {}", channel_id.color(ctx.http).await);

        msg.reply(ctx.cache_http, format!("Message sent to <#{}>", channel_id))
            .await?;
        Ok(EventHandled::Yes)
    }
}
