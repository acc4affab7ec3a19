use crate::{
    error::user_input,
    event::*,
    guild::GuildSnapshot,
    helper::MessageHelper,
    log_internal,
    logging::PrintColor,
    parse,
    plugin::*,
    reconcile::{apply_operations, discord::ChannelStore, plan_order, verify_order},
};
use anyhow::Result;

/// Orders the channels of one category to match a list, creating missing text channels
pub struct Channel;

#[serenity::async_trait]
impl Plugin for Channel {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn usage(&self, ctx: &Context<'_>) -> Option<String> {
        Some(
            usage_line(
                ctx,
                self.name(),
                "<category> [message-id]",
                "order a category's channels as listed one per line, creating missing ones",
            )
            .await,
        )
    }

    async fn handle(&self, ctx: &Context<'_>, event: &Event) -> Result<EventHandled> {
        let Some((msg, args)) = event.is_bot_cmd(ctx, self.name()).await else {
            return Ok(EventHandled::No);
        };
        let guild_id = msg.require_moderator(ctx).await?;
        let Some(category_name) = args.first() else {
            return user_input("Usage: channel <category> [message-id]");
        };

        let snapshot = GuildSnapshot::fetch(ctx, guild_id).await?;
        let category = snapshot.category_named(category_name)?.id;

        let list = msg.referenced(ctx, args.get(1).map(String::as_str)).await?;
        let desired = parse::ordered_names(&list.content)?;

        log_internal!(
            "Ordering {} channel(s) in category {}",
            desired.len(),
            category_name.color()
        );

        let store = ChannelStore {
            http: ctx.http.clone(),
            guild_id,
            category: Some(category),
        };
        let ops = plan_order(&desired, &snapshot.live_channels(category));
        let mut report = apply_operations(ops, &store).await;

        match GuildSnapshot::fetch(ctx, guild_id).await {
            Ok(after) => {
                for mismatch in verify_order(&desired, &after.live_channels(category)) {
                    report.warn(format!("after the update, {}", mismatch));
                }
            }
            Err(e) => report.warn(format!("could not re-check the result: {}", e)),
        }

        msg.reply_chunked(
            ctx,
            &format!(
                "Channels in category '{}' have been reorganized.\n{}",
                category_name,
                report.summary()
            ),
        )
        .await?;
        Ok(EventHandled::Yes)
    }
}
